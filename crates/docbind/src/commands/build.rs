//! Book build: combine the chapters, then render with pandoc.

use std::path::{Path, PathBuf};

use clap::Args;
use docbind_book::{BookBuilder, heading_shifter};
use docbind_config::{CliSettings, Config};
use docbind_pandoc::{Pandoc, RenderMode, RenderPaths, render_jobs};
use docbind_vcs::GitCli;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for building a book.
#[derive(Args)]
pub(crate) struct BuildArgs {
    /// Path to the book working copy (e.g. a clone of swiftlang/swift-book).
    pub book_path: PathBuf,

    /// Path to the pandoc executable (overrides config).
    #[arg(long, env = "DOCBIND_PANDOC")]
    pub pandoc_path: Option<PathBuf>,

    /// PDF output path (overrides config).
    #[arg(long)]
    pub output_path_pdf: Option<PathBuf>,

    /// EPUB output path (overrides config).
    #[arg(long)]
    pub output_path_epub: Option<PathBuf>,

    /// Dump the LaTeX intermediate code instead of the final PDF.
    #[arg(long)]
    pub debug_latex: bool,

    /// Stop after writing the combined markdown document.
    #[arg(long, conflicts_with = "debug_latex")]
    pub preprocess_markdown_only: bool,

    /// Only include this chapter (repeatable).
    #[arg(long, value_name = "IDENTIFIER")]
    pub chapter: Vec<String>,

    /// Path to configuration file (default: auto-discover docbind.toml).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl BuildArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let book_dir = expand_home(&self.book_path);
        if !book_dir.is_dir() {
            return Err(CliError::Validation(format!(
                "Book directory not found: {}",
                book_dir.display()
            )));
        }

        let cli_settings = CliSettings {
            pandoc_path: self.pandoc_path.as_deref().map(expand_home),
            output_pdf: self.output_path_pdf.as_deref().map(expand_home),
            output_epub: self.output_path_epub.as_deref().map(expand_home),
            chapters: (!self.chapter.is_empty()).then(|| self.chapter.clone()),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        tracing::debug!(config_path = ?config.config_path, "Loaded configuration");

        let pandoc = Pandoc::new(&config.pandoc.executable);
        let shifter = heading_shifter(config.book.heading_shift, &pandoc);
        let git = GitCli::default();

        let combined = BookBuilder::new(&book_dir, &config, &*shifter, &git).combine()?;
        output.highlight(&format!(
            "{} at {} ({}): {} chapters",
            book_dir.display(),
            combined.version.reference,
            combined.version.date,
            combined.document.chapters().len()
        ));
        output.written("Preprocessed Markdown content", &combined.path);

        if self.preprocess_markdown_only {
            return Ok(());
        }

        let mode = if self.debug_latex {
            RenderMode::DebugLatex
        } else {
            RenderMode::Publish
        };
        let paths = RenderPaths {
            combined: combined.path,
            resource_path: config.book.assets_path(&book_dir),
            pdf: config.output.pdf.clone(),
            epub: config.output.epub.clone(),
        };

        let jobs = render_jobs(&config.pandoc, &paths, mode);
        let mut failed = 0;
        for job in &jobs {
            output.info(&format!("Rendering {}...", job.format));
            match pandoc.render(job) {
                Ok(()) => output.written("Output", &job.output),
                Err(err) => {
                    output.error(&err.to_string());
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            return Err(CliError::Render {
                failed,
                total: jobs.len(),
            });
        }
        Ok(())
    }
}

/// Expand a leading `~` to the home directory.
fn expand_home(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}
