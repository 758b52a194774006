//! docbind CLI - PDF and EPUB editions of DocC books.
//!
//! Combines the chapters of a DocC book working copy into one pandoc
//! markdown document and renders it with pandoc.

mod commands;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use commands::BuildArgs;
use output::Output;

/// docbind - Convert a DocC book to PDF and EPUB using pandoc.
#[derive(Parser)]
#[command(name = "docbind", version, about)]
struct Cli {
    #[command(flatten)]
    build: BuildArgs,
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.build.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = cli.build.execute() {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["docbind", "~/src/swift-book"]).unwrap();
        assert_eq!(cli.build.book_path, PathBuf::from("~/src/swift-book"));
        assert!(!cli.build.debug_latex);
        assert!(!cli.build.preprocess_markdown_only);
        assert!(cli.build.chapter.is_empty());
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "docbind",
            "book",
            "--pandoc-path",
            "/opt/pandoc",
            "--output-path-pdf",
            "out.pdf",
            "--debug-latex",
            "--chapter",
            "Closures",
            "--chapter",
            "Enumerations",
        ])
        .unwrap();
        assert_eq!(cli.build.pandoc_path, Some(PathBuf::from("/opt/pandoc")));
        assert_eq!(cli.build.output_path_pdf, Some(PathBuf::from("out.pdf")));
        assert!(cli.build.debug_latex);
        assert_eq!(cli.build.chapter, ["Closures", "Enumerations"]);
    }

    #[test]
    fn test_book_path_required() {
        assert!(Cli::try_parse_from(["docbind"]).is_err());
    }
}
