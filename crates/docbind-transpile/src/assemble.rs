//! Document assembler.
//!
//! Expands the chapter inclusion directives of the (already heading-shifted)
//! root document into one combined pandoc markdown document:
//!
//! ```text
//! ---
//! title: ...
//! ---
//! # Language Guide
//! \newpage{}
//! ## The Basics
//! ...
//! ```
//!
//! Everything before the first top-level heading of the root text is
//! dropped. Chapters appear in the order of their directives.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use docbind_index::ReferenceIndex;
use regex::Regex;

use crate::TranspileError;
use crate::chapter::ChapterTranspiler;
use crate::header::MetadataHeader;
use crate::image::ImageAssets;
use crate::rewrite::LineRewriter;

/// Page break understood by the LaTeX writer and ignored by EPUB.
pub const PAGE_BREAK: &str = r"\newpage{}";

/// Prefix of a top-level heading line.
const TOP_LEVEL_HEADING: &str = "# ";

static INCLUDE_DIRECTIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-\s*`<doc:(\w+)>`.*$").unwrap());

static HTML_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.+?-->").unwrap());

/// Remove HTML comments, including multi-line ones.
///
/// ```
/// assert_eq!(docbind_transpile::strip_html_comments("a<!-- x\ny -->b"), "ab");
/// ```
#[must_use]
pub fn strip_html_comments(text: &str) -> String {
    HTML_COMMENT_RE.replace_all(text, "").into_owned()
}

/// Identifier named by a chapter inclusion directive line.
#[must_use]
pub fn include_directive(line: &str) -> Option<&str> {
    INCLUDE_DIRECTIVE_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Assembly options.
#[derive(Debug, Clone)]
pub struct AssembleOptions {
    /// Chapters to include; empty includes all.
    pub chapters: Vec<String>,
    /// Strip HTML comments from chapter text before transpiling.
    pub strip_html_comments: bool,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            chapters: Vec::new(),
            strip_html_comments: true,
        }
    }
}

impl AssembleOptions {
    fn includes(&self, identifier: &str) -> bool {
        self.chapters.is_empty() || self.chapters.iter().any(|c| c == identifier)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssemblyState {
    WaitingForFirstHeading,
    ProcessingIncludes,
}

/// The assembled document.
#[derive(Debug, Clone, Default)]
pub struct CombinedDocument {
    lines: Vec<String>,
    chapters: Vec<String>,
}

impl CombinedDocument {
    /// Document lines, header included.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Identifiers of the included chapters, in order.
    #[must_use]
    pub fn chapters(&self) -> &[String] {
        &self.chapters
    }

    /// The document text handed to the renderer.
    #[must_use]
    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }

    /// Write the document text to `path`, creating parent directories.
    pub fn write_to(&self, path: &Path) -> Result<(), TranspileError> {
        let io_err = |source| TranspileError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, self.to_text()).map_err(io_err)
    }
}

/// Builds a [`CombinedDocument`] from the root text and the reference index.
#[derive(Debug)]
pub struct Assembler<'a> {
    index: &'a ReferenceIndex,
    rewriter: LineRewriter<'a>,
    options: AssembleOptions,
}

impl<'a> Assembler<'a> {
    #[must_use]
    pub fn new(index: &'a ReferenceIndex, assets: &'a ImageAssets) -> Self {
        Self {
            index,
            rewriter: LineRewriter::new(index, assets),
            options: AssembleOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: AssembleOptions) -> Self {
        self.options = options;
        self
    }

    /// Assemble `root_text` under `header`.
    ///
    /// # Errors
    ///
    /// Fails on the first unresolved directive, unreadable chapter or
    /// chapter rewrite failure.
    pub fn assemble(
        &self,
        header: &MetadataHeader,
        root_text: &str,
    ) -> Result<CombinedDocument, TranspileError> {
        let mut doc = CombinedDocument {
            lines: header.to_lines()?,
            chapters: Vec::new(),
        };

        let mut state = AssemblyState::WaitingForFirstHeading;
        for line in root_text.lines() {
            match state {
                AssemblyState::WaitingForFirstHeading => {
                    if line.starts_with(TOP_LEVEL_HEADING) {
                        doc.lines.push(line.to_owned());
                        state = AssemblyState::ProcessingIncludes;
                    }
                }
                AssemblyState::ProcessingIncludes => {
                    if let Some(identifier) = include_directive(line) {
                        if self.options.includes(identifier) {
                            doc.lines.extend(self.include(identifier)?);
                            doc.chapters.push(identifier.to_owned());
                        } else {
                            tracing::debug!(chapter = identifier, "Skipping chapter");
                        }
                        continue;
                    }
                    if line.starts_with(TOP_LEVEL_HEADING) {
                        doc.lines.push(PAGE_BREAK.to_owned());
                    }
                    doc.lines.push(line.to_owned());
                }
            }
        }

        tracing::info!(chapters = doc.chapters.len(), "Assembled combined document");
        Ok(doc)
    }

    /// Transpiled lines of chapter `identifier`, framed by a page break and a blank line.
    fn include(&self, identifier: &str) -> Result<Vec<String>, TranspileError> {
        let record = self.index.resolve(identifier)?;
        tracing::debug!(chapter = identifier, path = %record.path.display(), "Including chapter");

        let text = read_chapter(&record.path)?;
        let text = if self.options.strip_html_comments {
            strip_html_comments(&text)
        } else {
            text
        };

        let body = ChapterTranspiler::new(&self.rewriter).transpile(text.lines())?;
        let mut lines = Vec::with_capacity(body.len() + 2);
        lines.push(PAGE_BREAK.to_owned());
        lines.extend(body);
        lines.push(String::new());
        Ok(lines)
    }
}

fn read_chapter(path: &Path) -> Result<String, TranspileError> {
    fs::read_to_string(path).map_err(|source| TranspileError::Io {
        path: PathBuf::from(path),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use docbind_index::IndexError;
    use pretty_assertions::assert_eq;
    use serde_yaml::Mapping;
    use tempfile::TempDir;

    const ROOT: &str = "\
The Swift Programming Language

Leftover intro paragraph.

# Language Guide

- `<doc:Alpha>`
- `<doc:Beta>`
- `<doc:Gamma>`

# Language Reference

Reference intro.";

    fn book() -> TempDir {
        let dir = TempDir::new().unwrap();
        let docc = dir.path().join("Book.docc");
        fs::create_dir_all(docc.join("Guide")).unwrap();
        fs::write(docc.join("Guide/Alpha.md"), "# Alpha\n\nAlpha body.").unwrap();
        fs::write(docc.join("Guide/Beta.md"), "# Beta\n\nSee <doc:Alpha>.").unwrap();
        fs::write(
            docc.join("Guide/Gamma.md"),
            "# Gamma\n<!-- hidden\nnote -->\n- term Key:\n  Value.",
        )
        .unwrap();
        dir
    }

    fn header() -> MetadataHeader {
        MetadataHeader::new("The Swift Programming Language", "2024-03-05", Mapping::new())
    }

    fn body(doc: &CombinedDocument) -> Vec<&str> {
        let header_len = header().to_lines().unwrap().len();
        doc.lines()[header_len..].iter().map(String::as_str).collect()
    }

    #[test]
    fn test_assembles_chapters_in_directive_order() {
        let dir = book();
        let index = ReferenceIndex::build(dir.path()).unwrap();
        let assets = ImageAssets::new(dir.path().join("Book.docc/Assets"));

        let doc = Assembler::new(&index, &assets)
            .assemble(&header(), ROOT)
            .unwrap();

        let expected = vec![
            "# Language Guide",
            "",
            PAGE_BREAK,
            "## Alpha",
            "",
            "Alpha body.",
            "",
            PAGE_BREAK,
            "## Beta",
            "",
            "See [Alpha](#alpha).",
            "",
            PAGE_BREAK,
            "## Gamma",
            "",
            "Key",
            "",
            ":    Value.",
            "",
            "",
            PAGE_BREAK,
            "# Language Reference",
            "",
            "Reference intro.",
        ];
        assert_eq!(body(&doc), expected);
        assert_eq!(doc.chapters(), ["Alpha", "Beta", "Gamma"]);
    }

    #[test]
    fn test_header_opens_document() {
        let dir = book();
        let index = ReferenceIndex::build(dir.path()).unwrap();
        let assets = ImageAssets::new(dir.path());

        let doc = Assembler::new(&index, &assets)
            .assemble(&header(), ROOT)
            .unwrap();
        let text = doc.to_text();

        assert!(text.starts_with("---\ntitle: The Swift Programming Language\n"));
        assert!(!text.contains("Leftover intro paragraph."));
    }

    #[test]
    fn test_unresolved_include_fails() {
        let dir = book();
        let index = ReferenceIndex::build(dir.path()).unwrap();
        let assets = ImageAssets::new(dir.path());

        let err = Assembler::new(&index, &assets)
            .assemble(&header(), "# Guide\n- `<doc:Missing>`")
            .unwrap_err();
        assert!(matches!(
            err,
            TranspileError::Index(IndexError::UnresolvedReference { ref identifier })
                if identifier == "Missing"
        ));
    }

    #[test]
    fn test_chapter_subset() {
        let dir = book();
        let index = ReferenceIndex::build(dir.path()).unwrap();
        let assets = ImageAssets::new(dir.path());
        let options = AssembleOptions {
            chapters: vec!["Beta".to_owned()],
            ..AssembleOptions::default()
        };

        let doc = Assembler::new(&index, &assets)
            .with_options(options)
            .assemble(&header(), ROOT)
            .unwrap();

        assert_eq!(doc.chapters(), ["Beta"]);
        assert!(!doc.to_text().contains("Alpha body."));
    }

    #[test]
    fn test_html_comments_kept_when_disabled() {
        let dir = book();
        let index = ReferenceIndex::build(dir.path()).unwrap();
        let assets = ImageAssets::new(dir.path());
        let options = AssembleOptions {
            chapters: vec!["Gamma".to_owned()],
            strip_html_comments: false,
        };

        let doc = Assembler::new(&index, &assets)
            .with_options(options)
            .assemble(&header(), ROOT)
            .unwrap();

        assert!(doc.to_text().contains("<!-- hidden"));
    }

    #[test]
    fn test_include_directive() {
        assert_eq!(include_directive("- `<doc:TheBasics>`"), Some("TheBasics"));
        assert_eq!(include_directive("-`<doc:A_b1>` trailing"), Some("A_b1"));
        assert_eq!(include_directive("- <doc:TheBasics>"), None);
        assert_eq!(include_directive("- `<doc:Closures#Capturing>`"), None);
    }

    #[test]
    fn test_write_to_creates_parent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/combined.md");
        let doc = CombinedDocument {
            lines: vec!["a".to_owned(), "b".to_owned()],
            chapters: Vec::new(),
        };

        doc.write_to(&path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "a\nb");
    }
}
