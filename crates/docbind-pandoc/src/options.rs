//! Pandoc option sets for each output format.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use docbind_config::PandocConfig;

/// Output format of one pandoc run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Epub,
    Pdf,
    /// LaTeX source of the PDF, for debugging the template.
    Latex,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Epub => "EPUB",
            Self::Pdf => "PDF",
            Self::Latex => "LaTeX",
        })
    }
}

/// What to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// EPUB, then PDF.
    #[default]
    Publish,
    /// Only the LaTeX intermediate, next to the PDF path.
    DebugLatex,
}

/// Files involved in rendering.
#[derive(Debug, Clone)]
pub struct RenderPaths {
    /// Combined markdown document.
    pub combined: PathBuf,
    /// Directory pandoc searches for images.
    pub resource_path: PathBuf,
    pub pdf: PathBuf,
    pub epub: PathBuf,
}

/// One pandoc invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderJob {
    pub format: OutputFormat,
    pub output: PathBuf,
    /// Arguments after the executable.
    pub args: Vec<OsString>,
}

/// Build the pandoc runs for `mode`, in execution order.
#[must_use]
pub fn render_jobs(
    settings: &PandocConfig,
    paths: &RenderPaths,
    mode: RenderMode,
) -> Vec<RenderJob> {
    match mode {
        RenderMode::DebugLatex => {
            let output = paths.pdf.with_extension("tex");
            let mut args = common_options(settings, paths);
            push_all(&mut args, ["--to", "latex"]);
            push_output(&mut args, &output);
            vec![RenderJob {
                format: OutputFormat::Latex,
                output,
                args,
            }]
        }
        RenderMode::Publish => vec![epub_job(settings, paths), pdf_job(settings, paths)],
    }
}

fn common_options(settings: &PandocConfig, paths: &RenderPaths) -> Vec<OsString> {
    let mut args = Vec::new();
    push_all(&mut args, ["--from", "markdown"]);
    args.push(paths.combined.clone().into_os_string());
    args.push("--resource-path".into());
    args.push(paths.resource_path.clone().into_os_string());
    push_all(
        &mut args,
        ["--highlight-style", settings.highlight_style.as_str()],
    );
    args.push("--standalone".into());
    push_all(&mut args, ["--lua-filter", settings.lua_filter.as_str()]);
    args
}

fn epub_job(settings: &PandocConfig, paths: &RenderPaths) -> RenderJob {
    let mut args = common_options(settings, paths);
    push_all(&mut args, ["--to", "epub3", "--toc"]);
    args.push(format!("--split-level={}", settings.split_level).into());
    for font in &settings.epub_fonts {
        let mut arg = OsString::from("--epub-embed-font=");
        arg.push(font);
        args.push(arg);
    }
    push_all(&mut args, ["--css", settings.css.as_str()]);
    push_output(&mut args, &paths.epub);
    RenderJob {
        format: OutputFormat::Epub,
        output: paths.epub.clone(),
        args,
    }
}

fn pdf_job(settings: &PandocConfig, paths: &RenderPaths) -> RenderJob {
    let mut args = common_options(settings, paths);
    push_all(
        &mut args,
        ["--to", "pdf", "--pdf-engine", settings.pdf_engine.as_str()],
    );
    args.push("--variable".into());
    args.push(format!("linkcolor=[HTML]{{{}}}", settings.link_color).into());
    push_all(&mut args, ["--template", settings.template.as_str()]);
    push_output(&mut args, &paths.pdf);
    RenderJob {
        format: OutputFormat::Pdf,
        output: paths.pdf.clone(),
        args,
    }
}

fn push_all<'a>(args: &mut Vec<OsString>, values: impl IntoIterator<Item = &'a str>) {
    args.extend(values.into_iter().map(OsString::from));
}

fn push_output(args: &mut Vec<OsString>, output: &Path) {
    args.push("--output".into());
    args.push(output.as_os_str().to_owned());
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn paths() -> RenderPaths {
        RenderPaths {
            combined: PathBuf::from("swiftbook-combined.md"),
            resource_path: PathBuf::from("/book/TSPL.docc/Assets"),
            pdf: PathBuf::from("out/Book.pdf"),
            epub: PathBuf::from("out/Book.epub"),
        }
    }

    fn strings(job: &RenderJob) -> Vec<String> {
        job.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    const COMMON: [&str; 10] = [
        "--from",
        "markdown",
        "swiftbook-combined.md",
        "--resource-path",
        "/book/TSPL.docc/Assets",
        "--highlight-style",
        "tspl-code-highlight.theme",
        "--standalone",
        "--lua-filter",
        "rewrite-retina-image-references.lua",
    ];

    #[test]
    fn test_publish_runs_epub_then_pdf() {
        let jobs = render_jobs(&PandocConfig::default(), &paths(), RenderMode::Publish);
        let formats: Vec<_> = jobs.iter().map(|j| j.format).collect();
        assert_eq!(formats, [OutputFormat::Epub, OutputFormat::Pdf]);
    }

    #[test]
    fn test_epub_options() {
        let settings = PandocConfig {
            epub_fonts: vec![PathBuf::from("/fonts/A.otf"), PathBuf::from("/fonts/B.ttc")],
            ..PandocConfig::default()
        };
        let jobs = render_jobs(&settings, &paths(), RenderMode::Publish);

        let mut expected: Vec<&str> = COMMON.to_vec();
        expected.extend([
            "--to",
            "epub3",
            "--toc",
            "--split-level=2",
            "--epub-embed-font=/fonts/A.otf",
            "--epub-embed-font=/fonts/B.ttc",
            "--css",
            "tspl-epub.css",
            "--output",
            "out/Book.epub",
        ]);
        assert_eq!(strings(&jobs[0]), expected);
        assert_eq!(jobs[0].output, PathBuf::from("out/Book.epub"));
    }

    #[test]
    fn test_pdf_options() {
        let jobs = render_jobs(&PandocConfig::default(), &paths(), RenderMode::Publish);

        let mut expected: Vec<&str> = COMMON.to_vec();
        expected.extend([
            "--to",
            "pdf",
            "--pdf-engine",
            "lualatex",
            "--variable",
            "linkcolor=[HTML]{de5d43}",
            "--template",
            "tspl-pandoc-template",
            "--output",
            "out/Book.pdf",
        ]);
        assert_eq!(strings(&jobs[1]), expected);
    }

    #[test]
    fn test_debug_latex_only() {
        let jobs = render_jobs(&PandocConfig::default(), &paths(), RenderMode::DebugLatex);

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].format, OutputFormat::Latex);
        assert_eq!(jobs[0].output, PathBuf::from("out/Book.tex"));
        let args = strings(&jobs[0]);
        assert_eq!(&args[..10], COMMON);
        assert_eq!(&args[10..], ["--to", "latex", "--output", "out/Book.tex"]);
    }
}
