//! Document discovery by filesystem walking.
//!
//! The Scanner only identifies files that could be documents, returning
//! lightweight references. Titles are read afterwards by the index builder.

use std::fs;
use std::path::{Path, PathBuf};

/// Extension of document files.
const DOCUMENT_EXTENSION: &str = "md";

/// Reference to a document file found during the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DocumentRef {
    /// File name without extension (e.g., "Closures").
    pub stem: String,
    /// Path to the document file.
    pub path: PathBuf,
}

/// Discovers document files by walking a directory tree.
///
/// Entries are visited in sorted order, depth-first, so the sequence of
/// returned refs is stable across platforms and runs.
pub(crate) struct Scanner {
    root: PathBuf,
}

impl Scanner {
    /// Create a new Scanner rooted at `root`.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Scan filesystem and return document references in visit order.
    ///
    /// Returns an empty Vec if the root directory doesn't exist.
    pub fn scan(&self) -> Vec<DocumentRef> {
        let mut refs = Vec::new();
        if self.root.exists() {
            Self::scan_directory(&self.root, &mut refs);
        }
        refs
    }

    fn scan_directory(dir_path: &Path, refs: &mut Vec<DocumentRef>) {
        let Ok(entries) = fs::read_dir(dir_path) else {
            tracing::debug!(path = %dir_path.display(), "Skipping unreadable directory");
            return;
        };

        // Collect entries with cached file_type to avoid repeated stat calls
        let mut entries: Vec<_> = entries
            .filter_map(Result::ok)
            .map(|e| {
                let is_dir = e.file_type().is_ok_and(|t| t.is_dir());
                (e, is_dir)
            })
            .collect();
        entries.sort_by_key(|(e, _)| e.file_name());

        for (entry, is_dir) in entries {
            // Skip hidden files/dirs
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }

            let path = entry.path();

            if is_dir {
                Self::scan_directory(&path, refs);
            } else if path.extension().is_some_and(|e| e == DOCUMENT_EXTENSION) {
                let Some(stem) = path.file_stem() else {
                    continue;
                };
                refs.push(DocumentRef {
                    stem: stem.to_string_lossy().into_owned(),
                    path,
                });
            }
        }
    }
}
