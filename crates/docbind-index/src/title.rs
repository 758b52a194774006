//! Title extraction from the first top-level heading.

use std::fs;
use std::io;
use std::path::Path;

/// Marker that starts a top-level heading line.
const TOP_LEVEL_HEADING: &str = "# ";

/// Extract the title from document content.
///
/// The title is the text after the marker of the first line starting with
/// exactly one `#` followed by a space, with surrounding whitespace trimmed.
///
/// # Examples
///
/// ```
/// use docbind_index::extract_title;
///
/// assert_eq!(extract_title("## Sub\n# The Basics \n").as_deref(), Some("The Basics"));
/// assert_eq!(extract_title("No heading here"), None);
/// ```
#[must_use]
pub fn extract_title(content: &str) -> Option<String> {
    content
        .lines()
        .find_map(|line| line.strip_prefix(TOP_LEVEL_HEADING))
        .map(|title| title.trim().to_owned())
}

/// Read a document file and extract its title.
pub fn read_title(path: &Path) -> io::Result<Option<String>> {
    let content = fs::read_to_string(path)?;
    Ok(extract_title(&content))
}
