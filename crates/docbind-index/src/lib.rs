//! Reference index for DocC documentation trees.
//!
//! DocC inclusion directives and cross-references name documents by their
//! *stem*, the file name without extension. This crate walks a document tree
//! once and builds a [`ReferenceIndex`] mapping each stem to a
//! [`DocumentRecord`] holding the file location and the document title (the
//! text of its first top-level heading).
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use docbind_index::ReferenceIndex;
//!
//! let index = ReferenceIndex::build(Path::new("swift-book"))?;
//! let title = index.title_of("Closures")?;
//! # Ok::<(), docbind_index::IndexError>(())
//! ```
//!
//! Two documents sharing a stem in different directories resolve to the one
//! visited last (entries are visited in sorted order, depth-first). A warning
//! is logged when this happens.

mod scanner;
mod title;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use scanner::Scanner;
pub use title::{extract_title, read_title};

/// Index error.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// An inclusion directive or cross-reference names an unknown document.
    #[error("Unresolved reference: no document named '{identifier}'")]
    UnresolvedReference {
        /// The identifier that could not be resolved.
        identifier: String,
    },
    /// A document without a top-level heading is used where a title is required.
    #[error("Document '{identifier}' has no top-level heading to use as its title")]
    MissingTitle {
        /// The identifier of the untitled document.
        identifier: String,
    },
    /// A document could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// Path of the unreadable file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// A document known to the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    /// File stem, unique within the tree.
    pub identifier: String,
    /// Location of the document file.
    pub path: PathBuf,
    /// Trimmed text of the first top-level heading, if any.
    pub title: Option<String>,
}

impl DocumentRecord {
    /// The document title, or [`IndexError::MissingTitle`] if it has none.
    pub fn require_title(&self) -> Result<&str, IndexError> {
        self.title
            .as_deref()
            .ok_or_else(|| IndexError::MissingTitle {
                identifier: self.identifier.clone(),
            })
    }
}

/// Read-only mapping from document identifier to [`DocumentRecord`].
#[derive(Debug, Default)]
pub struct ReferenceIndex {
    records: HashMap<String, DocumentRecord>,
}

impl ReferenceIndex {
    /// Walk `root` recursively and index every document file.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Io`] if a discovered document cannot be read.
    pub fn build(root: &Path) -> Result<Self, IndexError> {
        let refs = Scanner::new(root.to_path_buf()).scan();

        let mut records = Vec::with_capacity(refs.len());
        for doc_ref in refs {
            let title = read_title(&doc_ref.path).map_err(|source| IndexError::Io {
                path: doc_ref.path.clone(),
                source,
            })?;
            records.push(DocumentRecord {
                identifier: doc_ref.stem,
                path: doc_ref.path,
                title,
            });
        }

        let index = Self::from_records(records);
        tracing::debug!(
            root = %root.display(),
            document_count = index.len(),
            "Reference index built"
        );
        Ok(index)
    }

    /// Build an index from records. Later records replace earlier ones with the same identifier.
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = DocumentRecord>) -> Self {
        let mut map: HashMap<String, DocumentRecord> = HashMap::new();
        for record in records {
            if let Some(previous) = map.get(&record.identifier) {
                tracing::warn!(
                    identifier = %record.identifier,
                    kept = %record.path.display(),
                    replaced = %previous.path.display(),
                    "Duplicate document stem"
                );
            }
            map.insert(record.identifier.clone(), record);
        }
        Self { records: map }
    }

    /// Look up a document by identifier.
    #[must_use]
    pub fn get(&self, identifier: &str) -> Option<&DocumentRecord> {
        self.records.get(identifier)
    }

    /// Look up a document, failing with [`IndexError::UnresolvedReference`] if absent.
    pub fn resolve(&self, identifier: &str) -> Result<&DocumentRecord, IndexError> {
        self.get(identifier)
            .ok_or_else(|| IndexError::UnresolvedReference {
                identifier: identifier.to_owned(),
            })
    }

    /// Title of the document named `identifier`.
    ///
    /// # Errors
    ///
    /// [`IndexError::UnresolvedReference`] if the document is unknown,
    /// [`IndexError::MissingTitle`] if it has no top-level heading.
    pub fn title_of(&self, identifier: &str) -> Result<&str, IndexError> {
        self.resolve(identifier)?.require_title()
    }

    /// Number of indexed documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if no documents are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
