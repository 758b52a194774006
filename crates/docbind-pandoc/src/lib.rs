//! Pandoc invocation.
//!
//! [`Pandoc`] renders the combined document to EPUB and PDF (see
//! [`render_jobs`] for the option sets) and shifts heading levels of the
//! root document as a [`HeadingShifter`].

mod options;

use std::ffi::{OsStr, OsString};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;

use docbind_transpile::HeadingShifter;

pub use options::{OutputFormat, RenderJob, RenderMode, RenderPaths, render_jobs};

/// Renderer invocation error.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Failed to run {command}: {source}")]
    Spawn {
        /// Shell-quoted command line.
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("pandoc command execution failure:\n{command}")]
    Failed {
        /// Shell-quoted command line.
        command: String,
        status: ExitStatus,
    },
}

impl RenderError {
    /// The command line that failed.
    #[must_use]
    pub fn command(&self) -> &str {
        match self {
            Self::Spawn { command, .. } | Self::Failed { command, .. } => command,
        }
    }
}

/// A pandoc executable.
#[derive(Debug, Clone)]
pub struct Pandoc {
    executable: PathBuf,
}

impl Pandoc {
    #[must_use]
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Shell-quoted command line for `args`.
    #[must_use]
    pub fn command_line<S: AsRef<OsStr>>(&self, args: &[S]) -> String {
        std::iter::once(self.executable.as_os_str())
            .chain(args.iter().map(|arg| arg.as_ref()))
            .map(|arg| shell_quote(&arg.to_string_lossy()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run one render job, inheriting stdio.
    ///
    /// # Errors
    ///
    /// [`RenderError::Spawn`] if pandoc cannot be started,
    /// [`RenderError::Failed`] if it exits unsuccessfully.
    pub fn render(&self, job: &RenderJob) -> Result<(), RenderError> {
        let command = self.command_line(job.args.as_slice());
        tracing::info!(format = %job.format, %command, "Running pandoc");

        let status = Command::new(&self.executable)
            .args(&job.args)
            .status()
            .map_err(|source| RenderError::Spawn {
                command: command.clone(),
                source,
            })?;
        if !status.success() {
            return Err(RenderError::Failed { command, status });
        }
        Ok(())
    }
}

impl HeadingShifter for Pandoc {
    fn shift_headings(&self, text: &str, by: i32) -> io::Result<String> {
        let args: [OsString; 5] = [
            "--from".into(),
            "markdown".into(),
            "--to".into(),
            "markdown".into(),
            format!("--shift-heading-level-by={by}").into(),
        ];
        tracing::debug!(command = %self.command_line(&args), "Shifting headings with pandoc");

        let mut child = Command::new(&self.executable)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::other("pandoc stdin unavailable"))?;
        // Feed stdin from a separate thread so a full stdout pipe cannot block the write.
        let output = thread::scope(|scope| {
            let writer = scope.spawn(move || stdin.write_all(text.as_bytes()));
            let output = child.wait_with_output();
            match writer.join() {
                // An early exit closes stdin; the exit status reports it.
                Ok(Err(e)) if e.kind() != io::ErrorKind::BrokenPipe => return Err(e),
                Ok(_) => {}
                Err(_) => return Err(io::Error::other("pandoc stdin writer panicked")),
            }
            output
        })?;

        if !output.status.success() {
            return Err(io::Error::other(format!(
                "{} exited with {}: {}",
                self.command_line(&args),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        String::from_utf8(output.stdout)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// Quote `arg` for a POSIX shell when it contains special characters.
///
/// ```
/// use docbind_pandoc::shell_quote;
///
/// assert_eq!(shell_quote("--toc"), "--toc");
/// assert_eq!(shell_quote("linkcolor=[HTML]{de5d43}"), "'linkcolor=[HTML]{de5d43}'");
/// assert_eq!(shell_quote("it's"), r#"'it'"'"'s'"#);
/// ```
#[must_use]
pub fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "@%+=:,./-_".contains(c));
    if safe {
        arg.to_owned()
    } else {
        format!("'{}'", arg.replace('\'', r#"'"'"'"#))
    }
}
