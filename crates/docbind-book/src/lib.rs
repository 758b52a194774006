//! Combine pipeline for DocC books.
//!
//! [`BookBuilder::combine`] turns a book working copy into the combined
//! pandoc markdown document:
//!
//! 1. index every document under the book directory
//! 2. read the root document and take its title
//! 3. look up the checkout version for the header date
//! 4. shift the root document's headings
//! 5. assemble the chapters and write the result to `book.combined_path`

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use docbind_config::{Config, HeadingShiftEngine};
use docbind_index::{IndexError, ReferenceIndex, extract_title};
use docbind_pandoc::Pandoc;
use docbind_transpile::{
    AssembleOptions, Assembler, CombinedDocument, HeadingShifter, ImageAssets, MetadataHeader,
    NativeHeadingShift, TranspileError,
};
use docbind_vcs::{VcsError, Version, VersionSource};

/// Error returned while combining a book.
#[derive(Debug, thiserror::Error)]
pub enum BookError {
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Transpile(#[from] TranspileError),

    #[error(transparent)]
    Vcs(#[from] VcsError),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to shift headings of {}: {source}", path.display())]
    HeadingShift {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Heading shifter selected by `engine`.
#[must_use]
pub fn heading_shifter(
    engine: HeadingShiftEngine,
    pandoc: &Pandoc,
) -> Box<dyn HeadingShifter> {
    match engine {
        HeadingShiftEngine::Pandoc => Box::new(pandoc.clone()),
        HeadingShiftEngine::Native => Box::new(NativeHeadingShift),
    }
}

/// Result of [`BookBuilder::combine`].
#[derive(Debug)]
pub struct CombinedBook {
    /// Where the combined document was written.
    pub path: PathBuf,
    pub document: CombinedDocument,
    pub version: Version,
}

/// Combines a book working copy into one document.
pub struct BookBuilder<'a> {
    book_dir: PathBuf,
    config: &'a Config,
    shifter: &'a dyn HeadingShifter,
    versions: &'a dyn VersionSource,
}

impl<'a> BookBuilder<'a> {
    #[must_use]
    pub fn new(
        book_dir: impl Into<PathBuf>,
        config: &'a Config,
        shifter: &'a dyn HeadingShifter,
        versions: &'a dyn VersionSource,
    ) -> Self {
        Self {
            book_dir: book_dir.into(),
            config,
            shifter,
            versions,
        }
    }

    /// Build and persist the combined document.
    ///
    /// # Errors
    ///
    /// Fails on the first unresolved reference, missing asset or title,
    /// unavailable version metadata, heading-shift failure or I/O error.
    pub fn combine(&self) -> Result<CombinedBook, BookError> {
        let book = &self.config.book;

        let index = ReferenceIndex::build(&self.book_dir)?;
        tracing::info!(
            documents = index.len(),
            dir = %self.book_dir.display(),
            "Indexed book"
        );

        let root_path = book.root_document_path(&self.book_dir);
        let root_text = fs::read_to_string(&root_path).map_err(|source| BookError::Io {
            path: root_path.clone(),
            source,
        })?;
        let title = extract_title(&root_text).ok_or_else(|| IndexError::MissingTitle {
            identifier: stem(&root_path),
        })?;

        let version = self.versions.version(&self.book_dir)?;

        let shifted = self
            .shifter
            .shift_headings(&root_text, book.root_heading_shift)
            .map_err(|source| BookError::HeadingShift {
                path: root_path.clone(),
                source,
            })?;

        let header =
            MetadataHeader::new(title, version.date.clone(), self.config.header_fields());
        let assets = ImageAssets::new(book.assets_path(&self.book_dir));
        let options = AssembleOptions {
            chapters: book.chapters.clone(),
            strip_html_comments: book.strip_html_comments,
        };
        let document = Assembler::new(&index, &assets)
            .with_options(options)
            .assemble(&header, &shifted)?;

        document.write_to(&book.combined_path)?;
        tracing::info!(path = %book.combined_path.display(), "Wrote combined document");

        Ok(CombinedBook {
            path: book.combined_path.clone(),
            document,
            version,
        })
    }
}

fn stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    struct FixedVersion;

    impl VersionSource for FixedVersion {
        fn tag_or_ref(&self, _path: &Path) -> Result<String, VcsError> {
            Ok("swift-6.0-RELEASE".to_owned())
        }

        fn date(&self, _path: &Path, _reference: &str) -> Result<String, VcsError> {
            Ok("2024-03-05".to_owned())
        }
    }

    struct NoVersion;

    impl VersionSource for NoVersion {
        fn tag_or_ref(&self, path: &Path) -> Result<String, VcsError> {
            Err(VcsError::VersionMetadataUnavailable {
                path: path.to_path_buf(),
            })
        }

        fn date(&self, _path: &Path, _reference: &str) -> Result<String, VcsError> {
            unreachable!()
        }
    }

    const ROOT: &str = "\
# The Swift Programming Language

@Metadata {
  @TechnologyRoot
}

## Topics

### Language Guide

- `<doc:TheBasics>`
- `<doc:Closures>`

### Language Reference

- `<doc:AboutTheLanguageReference>`
";

    fn book(root: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        let docc = dir.path().join("TSPL.docc");
        fs::create_dir_all(docc.join("LanguageGuide")).unwrap();
        fs::create_dir_all(docc.join("ReferenceManual")).unwrap();
        fs::create_dir_all(docc.join("Assets")).unwrap();
        fs::write(docc.join("The-Swift-Programming-Language.md"), root).unwrap();
        fs::write(
            docc.join("LanguageGuide/TheBasics.md"),
            "# The Basics\n\nWork with common kinds of data.\n\n## Constants and Variables\n",
        )
        .unwrap();
        fs::write(
            docc.join("LanguageGuide/Closures.md"),
            "# Closures\n\nSee <doc:TheBasics#Constants-and-Variables>.\n",
        )
        .unwrap();
        fs::write(
            docc.join("ReferenceManual/AboutTheLanguageReference.md"),
            "# About the Language Reference\n\n- term *getter-clause*_?_:\n  Optional.\n",
        )
        .unwrap();
        dir
    }

    fn config(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.book.combined_path = dir.path().join("out/combined.md");
        config
    }

    #[test]
    fn test_combine_writes_document() {
        let dir = book(ROOT);
        let config = config(&dir);
        let builder = BookBuilder::new(dir.path(), &config, &NativeHeadingShift, &FixedVersion);

        let combined = builder.combine().unwrap();

        assert_eq!(combined.path, dir.path().join("out/combined.md"));
        assert_eq!(combined.version.reference, "swift-6.0-RELEASE");
        assert_eq!(
            combined.document.chapters(),
            ["TheBasics", "Closures", "AboutTheLanguageReference"]
        );

        let text = fs::read_to_string(&combined.path).unwrap();
        assert_eq!(text, combined.document.to_text());
        assert!(text.starts_with("---\ntitle: The Swift Programming Language\n"));
        assert!(text.contains("2024-03-05"));
        assert!(text.contains("toc-depth: 4"));
        assert!(!text.contains("@Metadata"));

        let body = text.split_once("# Language Guide").unwrap().1;
        let expected = "

\\newpage{}
## The Basics

Work with common kinds of data.

### Constants and Variables

\\newpage{}
## Closures

See [Constants and Variables](#constants-and-variables).


\\newpage{}
# Language Reference

\\newpage{}
## About the Language Reference

*getter-clause?*

:    Optional.
";
        assert_eq!(body, expected);
    }

    #[test]
    fn test_untitled_root_document() {
        let dir = book("No heading here\n- `<doc:TheBasics>`\n");
        let config = config(&dir);
        let builder = BookBuilder::new(dir.path(), &config, &NativeHeadingShift, &FixedVersion);

        let err = builder.combine().unwrap_err();

        assert!(matches!(
            err,
            BookError::Index(IndexError::MissingTitle { ref identifier })
                if identifier == "The-Swift-Programming-Language"
        ));
    }

    #[test]
    fn test_missing_version_metadata() {
        let dir = book(ROOT);
        let config = config(&dir);
        let builder = BookBuilder::new(dir.path(), &config, &NativeHeadingShift, &NoVersion);

        let err = builder.combine().unwrap_err();

        assert!(matches!(
            err,
            BookError::Vcs(VcsError::VersionMetadataUnavailable { .. })
        ));
        assert!(!config.book.combined_path.exists());
    }

    #[test]
    fn test_unresolved_chapter() {
        let dir = book("# Book\n\n### Part\n\n- `<doc:Missing>`\n");
        let config = config(&dir);
        let builder = BookBuilder::new(dir.path(), &config, &NativeHeadingShift, &FixedVersion);

        let err = builder.combine().unwrap_err();

        assert!(matches!(
            err,
            BookError::Transpile(TranspileError::Index(IndexError::UnresolvedReference { .. }))
        ));
    }

    #[test]
    fn test_heading_shifter_selection() {
        let pandoc = Pandoc::new("/nonexistent/pandoc");
        let native = heading_shifter(HeadingShiftEngine::Native, &pandoc);
        assert_eq!(native.shift_headings("### Part", -2).unwrap(), "# Part");

        let external = heading_shifter(HeadingShiftEngine::Pandoc, &pandoc);
        assert!(external.shift_headings("### Part", -2).is_err());
    }
}
