//! CLI error types.

use docbind_book::BookError;
use docbind_config::ConfigError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Book(#[from] BookError),

    #[error("{failed} of {total} pandoc runs failed")]
    Render { failed: usize, total: usize },

    #[error("{0}")]
    Validation(String),
}
