//! Single-line rewriting of DocC constructs into pandoc markdown.
//!
//! [`LineRewriter::rewrite`] applies four rewrites in a fixed order:
//!
//! 1. `<doc:Target>` cross-references become `[Label](#anchor)` links.
//! 2. Emphasized optionality markers (`*_?_`) become `?*`.
//! 3. `![caption](name)` retina images become sized `name@2x.png` images.
//! 4. Headings gain one level.
//!
//! None of the rewrites produces text another one matches, but the heading
//! shift is not idempotent: every line must pass through exactly once.

use std::borrow::Cow;
use std::sync::LazyLock;

use docbind_index::{IndexError, ReferenceIndex};
use regex::Regex;

use crate::TranspileError;
use crate::image::{ImageAssets, retina_file_name};

/// Opening of a DocC cross-reference.
const DOC_REFERENCE_PREFIX: &str = "<doc:";

static DOC_REFERENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<doc:[\w#-]+>").unwrap());

static OPTIONALITY_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\*{1,2})_\?_").unwrap());

static IMAGE_REFERENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^!\[([^\]]*)\]\(([\w-]+)\)").unwrap());

/// Rewrites single lines of a chapter.
#[derive(Debug, Clone, Copy)]
pub struct LineRewriter<'a> {
    index: &'a ReferenceIndex,
    assets: &'a ImageAssets,
}

impl<'a> LineRewriter<'a> {
    /// Create a rewriter resolving references against `index` and images against `assets`.
    #[must_use]
    pub fn new(index: &'a ReferenceIndex, assets: &'a ImageAssets) -> Self {
        Self { index, assets }
    }

    /// Apply all rewrites to `line`.
    ///
    /// # Errors
    ///
    /// Fails on unresolved cross-references, untitled reference targets and
    /// missing image assets.
    pub fn rewrite(&self, line: &str) -> Result<String, TranspileError> {
        let line = resolve_cross_references(line, self.index)?;
        let line = normalize_optionality_markers(&line);
        let line = rewrite_image_reference(&line, self.assets)?;
        Ok(shift_heading(&line).into_owned())
    }
}

/// Anchor pandoc generates for a heading with text `label`.
///
/// ```
/// assert_eq!(docbind_transpile::anchor_for("The Basics"), "the-basics");
/// ```
#[must_use]
pub fn anchor_for(label: &str) -> String {
    label.to_lowercase().replace(' ', "-")
}

/// Replace every `<doc:Target>` / `<doc:Target#fragment>` with a markdown link.
pub fn resolve_cross_references<'l>(
    line: &'l str,
    index: &ReferenceIndex,
) -> Result<Cow<'l, str>, IndexError> {
    if !line.contains(DOC_REFERENCE_PREFIX) {
        return Ok(Cow::Borrowed(line));
    }

    let mut out = String::with_capacity(line.len());
    let mut last = 0;
    for m in DOC_REFERENCE_RE.find_iter(line) {
        out.push_str(&line[last..m.start()]);
        let target = &m.as_str()[DOC_REFERENCE_PREFIX.len()..m.as_str().len() - 1];
        out.push_str(&reference_link(target, index)?);
        last = m.end();
    }
    out.push_str(&line[last..]);
    Ok(Cow::Owned(out))
}

fn reference_link(target: &str, index: &ReferenceIndex) -> Result<String, IndexError> {
    let label = match target.split_once('#') {
        Some((_, fragment)) => fragment.replace('-', " "),
        None => index.title_of(target)?.to_owned(),
    };
    Ok(format!("[{label}](#{})", anchor_for(&label)))
}

/// Move `?` in front of the emphasis markers that wrap it in grammar blocks.
///
/// ```
/// use docbind_transpile::normalize_optionality_markers;
///
/// assert_eq!(normalize_optionality_markers("*type-annotation*_?_"), "*type-annotation?*");
/// ```
#[must_use]
pub fn normalize_optionality_markers(line: &str) -> Cow<'_, str> {
    OPTIONALITY_MARKER_RE.replace_all(line, "?${1}")
}

/// Rewrite a leading `![caption](name)` to the sized retina asset.
///
/// Text after the image reference is kept.
pub fn rewrite_image_reference<'l>(
    line: &'l str,
    assets: &ImageAssets,
) -> Result<Cow<'l, str>, TranspileError> {
    let Some(caps) = IMAGE_REFERENCE_RE.captures(line) else {
        return Ok(Cow::Borrowed(line));
    };
    let (whole, [caption, prefix]) = caps.extract();

    let file_name = retina_file_name(prefix);
    let percent = assets.scale_percentage_of(&file_name)?;
    let rest = &line[whole.len()..];
    Ok(Cow::Owned(format!(
        "![{caption}]({file_name}){{ width={percent}% }}{rest}"
    )))
}

/// Push a heading one level deeper.
///
/// A heading is one or more `#`, a space, and at least one more character.
///
/// ```
/// use docbind_transpile::shift_heading;
///
/// assert_eq!(shift_heading("## Closures"), "### Closures");
/// assert_eq!(shift_heading("#tag"), "#tag");
/// ```
#[must_use]
pub fn shift_heading(line: &str) -> Cow<'_, str> {
    let rest = line.trim_start_matches('#');
    let is_heading =
        rest.len() < line.len() && rest.strip_prefix(' ').is_some_and(|text| !text.is_empty());
    if is_heading {
        Cow::Owned(format!("#{line}"))
    } else {
        Cow::Borrowed(line)
    }
}
