//! Configuration management for docbind.
//!
//! Parses `docbind.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories. A missing config
//! file is not an error: every setting has a default matching the layout of
//! the Swift book repository.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `pandoc.executable`
//! - `pandoc.template`
//! - `pandoc.css`
//! - `pandoc.highlight_style`
//! - `pandoc.lua_filter`

mod expand;

use serde::Deserialize;
use serde_yaml::Mapping;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override the pandoc executable.
    pub pandoc_path: Option<PathBuf>,
    /// Override the PDF output path.
    pub output_pdf: Option<PathBuf>,
    /// Override the EPUB output path.
    pub output_epub: Option<PathBuf>,
    /// Override the chapter subset.
    pub chapters: Option<Vec<String>>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "docbind.toml";

/// Metadata header defaults, in the order they appear in the combined document.
const DEFAULT_HEADER: &str = r#"
toc: true
toc-depth: 4
toc-own-page: true
titlepage: true
titlepage-rule-color: "de5d43"
strip-comments: true
sansfont: "SF Pro Text Heavy"
mainfont: "SF Pro Text"
mainfontfallback:
  - "Apple Color Emoji:mode=harf"
  - "Helvetica Neue:mode=harf"
monofont: "Menlo"
monofontoptions:
  - "Scale=0.9"
monofontfallback:
  - "Sathu:mode=harf"
  - "Al Nile:mode=harf"
  - "Apple Color Emoji:mode=harf"
  - "Apple SD Gothic Neo:mode=harf"
  - "Hiragino Sans:mode=harf"
fontsize: "10pt"
listings-disable-line-numbers: true
listings-no-page-break: false
papersize: letter
"#;

/// Application configuration.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Book layout and preprocessing.
    pub book: BookConfig,
    /// Pandoc invocation settings.
    pub pandoc: PandocConfig,
    /// Output file locations.
    pub output: OutputConfig,
    /// Extra metadata header entries (merged over the defaults).
    header: Option<Mapping>,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Which implementation shifts the root document's headings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingShiftEngine {
    /// Run `pandoc --shift-heading-level-by`.
    #[default]
    Pandoc,
    /// Shift headings in-process.
    Native,
}

/// Book layout, relative to the book working copy.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BookConfig {
    /// Root document containing the chapter inclusion directives.
    pub root_document: PathBuf,
    /// Directory holding `{name}@2x.png` image assets.
    pub assets_dir: PathBuf,
    /// Where the combined markdown is written (relative to the working directory).
    pub combined_path: PathBuf,
    /// Heading level shift applied to the root document before assembly.
    pub root_heading_shift: i32,
    /// Heading shift implementation.
    pub heading_shift: HeadingShiftEngine,
    /// Remove `<!-- ... -->` comments from chapters before transpiling.
    pub strip_html_comments: bool,
    /// Chapter identifiers to include. Empty means all.
    pub chapters: Vec<String>,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            root_document: PathBuf::from("TSPL.docc/The-Swift-Programming-Language.md"),
            assets_dir: PathBuf::from("TSPL.docc/Assets"),
            combined_path: PathBuf::from("swiftbook-combined.md"),
            root_heading_shift: -2,
            heading_shift: HeadingShiftEngine::default(),
            strip_html_comments: true,
            chapters: Vec::new(),
        }
    }
}

impl BookConfig {
    /// Absolute location of the root document inside `book_dir`.
    #[must_use]
    pub fn root_document_path(&self, book_dir: &Path) -> PathBuf {
        book_dir.join(&self.root_document)
    }

    /// Absolute location of the image assets inside `book_dir`.
    #[must_use]
    pub fn assets_path(&self, book_dir: &Path) -> PathBuf {
        book_dir.join(&self.assets_dir)
    }
}

/// Pandoc invocation settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PandocConfig {
    /// Pandoc executable name or path.
    pub executable: String,
    /// Syntax highlighting theme file.
    pub highlight_style: String,
    /// Lua filter applied to every conversion.
    pub lua_filter: String,
    /// LaTeX template used for PDF output.
    pub template: String,
    /// PDF engine.
    pub pdf_engine: String,
    /// Hex color (without `#`) for PDF links.
    pub link_color: String,
    /// Stylesheet used for EPUB output.
    pub css: String,
    /// EPUB chapter split level.
    pub split_level: u8,
    /// Fonts embedded into the EPUB.
    pub epub_fonts: Vec<PathBuf>,
}

impl Default for PandocConfig {
    fn default() -> Self {
        Self {
            executable: "pandoc".to_owned(),
            highlight_style: "tspl-code-highlight.theme".to_owned(),
            lua_filter: "rewrite-retina-image-references.lua".to_owned(),
            template: "tspl-pandoc-template".to_owned(),
            pdf_engine: "lualatex".to_owned(),
            link_color: "de5d43".to_owned(),
            css: "tspl-epub.css".to_owned(),
            split_level: 2,
            epub_fonts: [
                "/Library/Fonts/SF-Pro-Text-Regular.otf",
                "/Library/Fonts/SF-Pro-Text-RegularItalic.otf",
                "/Library/Fonts/SF-Pro-Text-Bold.otf",
                "/Library/Fonts/SF-Pro-Text-BoldItalic.otf",
                "/Library/Fonts/SF-Mono.ttc",
            ]
            .into_iter()
            .map(PathBuf::from)
            .collect(),
        }
    }
}

/// Output file locations.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// PDF output path (the `.tex` path is derived from it in debug mode).
    pub pdf: PathBuf,
    /// EPUB output path.
    pub epub: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pdf: PathBuf::from("The-Swift-Programming-Language.pdf"),
            epub: PathBuf::from("The-Swift-Programming-Language.epub"),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`pandoc.executable`").
        field: String,
        /// Error message (e.g., "${`PANDOC`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `docbind.toml` in current directory and parents,
    /// falling back to defaults when none exists.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Metadata header entries: the defaults with `[header]` entries merged over them.
    #[must_use]
    pub fn header_fields(&self) -> Mapping {
        let mut fields: Mapping = serde_yaml::from_str(DEFAULT_HEADER)
            .expect("default metadata header is valid YAML");
        if let Some(extra) = &self.header {
            for (key, value) in extra {
                fields.insert(key.clone(), value.clone());
            }
        }
        fields
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(pandoc_path) = &settings.pandoc_path {
            self.pandoc.executable = pandoc_path.to_string_lossy().into_owned();
        }
        if let Some(pdf) = &settings.output_pdf {
            self.output.pdf.clone_from(pdf);
        }
        if let Some(epub) = &settings.output_epub {
            self.output.epub.clone_from(epub);
        }
        if let Some(chapters) = &settings.chapters {
            self.book.chapters.clone_from(chapters);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;
        config.config_path = Some(path.to_path_buf());
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_book()?;
        self.validate_pandoc()?;
        Ok(())
    }

    fn validate_book(&self) -> Result<(), ConfigError> {
        require_non_empty(
            &self.book.root_document.to_string_lossy(),
            "book.root_document",
        )?;
        require_non_empty(
            &self.book.combined_path.to_string_lossy(),
            "book.combined_path",
        )?;

        if !(-5..=5).contains(&self.book.root_heading_shift) {
            return Err(ConfigError::Validation(
                "book.root_heading_shift must be between -5 and 5".to_owned(),
            ));
        }

        Ok(())
    }

    fn validate_pandoc(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.pandoc.executable, "pandoc.executable")?;

        if !(1..=6).contains(&self.pandoc.split_level) {
            return Err(ConfigError::Validation(
                "pandoc.split_level must be between 1 and 6".to_owned(),
            ));
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        let pandoc = &mut self.pandoc;
        pandoc.executable = expand::expand_env(&pandoc.executable, "pandoc.executable")?;
        pandoc.template = expand::expand_env(&pandoc.template, "pandoc.template")?;
        pandoc.css = expand::expand_env(&pandoc.css, "pandoc.css")?;
        pandoc.highlight_style =
            expand::expand_env(&pandoc.highlight_style, "pandoc.highlight_style")?;
        pandoc.lua_filter = expand::expand_env(&pandoc.lua_filter, "pandoc.lua_filter")?;
        Ok(())
    }
}
