//! Version metadata for a documentation checkout.
//!
//! The combined document is dated with the release the book was built from:
//! the tag pointing at `HEAD` if there is one, otherwise the current branch.
//! [`VersionSource`] abstracts the lookup; [`GitCli`] implements it by
//! running the `git` executable.

use std::path::{Path, PathBuf};
use std::process::Command;

/// Version metadata error.
#[derive(Debug, thiserror::Error)]
pub enum VcsError {
    /// Neither a tag nor a branch points at `HEAD`, or no date was found.
    #[error("No tag or branch found for {}", path.display())]
    VersionMetadataUnavailable { path: PathBuf },

    /// The git executable could not be run.
    #[error("{command} failed: {message}")]
    Command { command: String, message: String },
}

/// Version of a checkout: a tag or branch name and its date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    pub reference: String,
    /// `YYYY-MM-DD`.
    pub date: String,
}

/// Source of version metadata for a checkout.
pub trait VersionSource {
    /// Tag pointing at `HEAD`, else the current branch.
    fn tag_or_ref(&self, path: &Path) -> Result<String, VcsError>;

    /// Date of `reference`.
    fn date(&self, path: &Path, reference: &str) -> Result<String, VcsError>;

    /// Tag-or-branch and its date.
    fn version(&self, path: &Path) -> Result<Version, VcsError> {
        let reference = self.tag_or_ref(path)?;
        let date = self.date(path, &reference)?;
        tracing::debug!(%reference, %date, "Resolved checkout version");
        Ok(Version { reference, date })
    }
}

/// [`VersionSource`] backed by the `git` command line.
#[derive(Debug, Clone)]
pub struct GitCli {
    executable: PathBuf,
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitCli {
    #[must_use]
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Run `git -C path args...` and return trimmed stdout.
    ///
    /// A non-zero exit yields an empty string; only a failure to spawn is an
    /// error.
    fn run(&self, path: &Path, args: &[&str]) -> Result<String, VcsError> {
        let output = Command::new(&self.executable)
            .arg("-C")
            .arg(path)
            .args(args)
            .output()
            .map_err(|e| VcsError::Command {
                command: self.describe(args),
                message: e.to_string(),
            })?;
        if !output.status.success() {
            tracing::debug!(
                command = %self.describe(args),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "git exited with failure"
            );
            return Ok(String::new());
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
    }

    fn describe(&self, args: &[&str]) -> String {
        format!("{} {}", self.executable.display(), args.join(" "))
    }
}

impl VersionSource for GitCli {
    fn tag_or_ref(&self, path: &Path) -> Result<String, VcsError> {
        let tags = self.run(path, &["tag", "--points-at", "HEAD"])?;
        if let Some(tag) = tags.lines().next().filter(|t| !t.is_empty()) {
            return Ok(tag.to_owned());
        }

        let branch = self.run(path, &["symbolic-ref", "--short", "HEAD"])?;
        if branch.is_empty() {
            return Err(VcsError::VersionMetadataUnavailable {
                path: path.to_path_buf(),
            });
        }
        Ok(branch)
    }

    fn date(&self, path: &Path, reference: &str) -> Result<String, VcsError> {
        let tag_ref = format!("refs/tags/{reference}");
        let tagger_date = self.run(
            path,
            &["for-each-ref", "--format", "%(taggerdate:short)", &tag_ref],
        )?;
        if !tagger_date.is_empty() {
            return Ok(tagger_date);
        }

        // Lightweight tags and branches have no tagger date.
        let commit_date = self.run(
            path,
            &["show", "--no-patch", "--pretty=format:%cs", reference],
        )?;
        if commit_date.is_empty() {
            return Err(VcsError::VersionMetadataUnavailable {
                path: path.to_path_buf(),
            });
        }
        Ok(commit_date)
    }
}
