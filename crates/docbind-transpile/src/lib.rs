//! DocC markdown to pandoc markdown transpiler.
//!
//! Turns a DocC book (a root document listing chapters with
//! `` - `<doc:Chapter>` `` directives plus one markdown file per chapter)
//! into a single pandoc markdown document.
//!
//! # Architecture
//!
//! - [`LineRewriter`]: stateless per-line rewrites (cross-references,
//!   optionality markers, retina images, heading shift)
//! - [`ChapterTranspiler`]: per-chapter state machine for definition lists
//! - [`Assembler`]: expands the root document's directives into a
//!   [`CombinedDocument`] opened by a [`MetadataHeader`]
//! - [`HeadingShifter`]: whole-document heading shift applied to the root
//!   document before assembly
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use docbind_index::ReferenceIndex;
//! use docbind_transpile::{Assembler, ImageAssets, MetadataHeader};
//!
//! let index = ReferenceIndex::build(Path::new("swift-book"))?;
//! let assets = ImageAssets::new("swift-book/TSPL.docc/Assets");
//! let header = MetadataHeader::new("The Swift Programming Language", "2024-03-05", Default::default());
//! let root = "# Language Guide\n- `<doc:TheBasics>`";
//! let doc = Assembler::new(&index, &assets).assemble(&header, root)?;
//! doc.write_to(Path::new("swiftbook-combined.md"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod assemble;
mod chapter;
mod fence;
mod header;
mod heading;
mod image;
mod rewrite;

use std::path::PathBuf;

use docbind_index::IndexError;

pub use assemble::{
    AssembleOptions, Assembler, CombinedDocument, PAGE_BREAK, include_directive,
    strip_html_comments,
};
pub use chapter::ChapterTranspiler;
pub use header::MetadataHeader;
pub use heading::{HeadingShifter, NativeHeadingShift};
pub use image::{ImageAssets, png_width, retina_file_name, scale_percentage};
pub use rewrite::{
    LineRewriter, anchor_for, normalize_optionality_markers, resolve_cross_references,
    rewrite_image_reference, shift_heading,
};

/// Transpile error.
#[derive(Debug, thiserror::Error)]
pub enum TranspileError {
    /// Unresolved reference or untitled reference target.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// Image asset missing or without a readable pixel width.
    #[error("Missing image asset {}: {reason}", path.display())]
    MissingAsset { path: PathBuf, reason: String },

    /// Chapter or asset could not be read.
    #[error("Failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Metadata header could not be serialized.
    #[error("Invalid metadata header: {0}")]
    Header(#[from] serde_yaml::Error),
}
