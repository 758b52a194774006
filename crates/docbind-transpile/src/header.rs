//! YAML metadata block opening the combined document.

use serde_yaml::{Mapping, Value};

/// YAML metadata block delimiter.
const DELIMITER: &str = "---";

/// Keys always taken from the book itself.
const RESERVED_KEYS: [&str; 2] = ["title", "date"];

/// Metadata header of the combined document.
///
/// `title` and `date` come first; `fields` follow in order. Fields named
/// `title` or `date` are ignored.
#[derive(Debug, Clone)]
pub struct MetadataHeader {
    pub title: String,
    pub date: String,
    pub fields: Mapping,
}

impl MetadataHeader {
    #[must_use]
    pub fn new(title: impl Into<String>, date: impl Into<String>, fields: Mapping) -> Self {
        Self {
            title: title.into(),
            date: date.into(),
            fields,
        }
    }

    /// Render the header as delimited YAML lines.
    pub fn to_lines(&self) -> Result<Vec<String>, serde_yaml::Error> {
        let mut metadata = Mapping::new();
        metadata.insert("title".into(), Value::String(self.title.clone()));
        metadata.insert("date".into(), Value::String(self.date.clone()));
        for (key, value) in &self.fields {
            if key.as_str().is_some_and(|k| RESERVED_KEYS.contains(&k)) {
                tracing::warn!(?key, "Ignoring reserved metadata header field");
                continue;
            }
            metadata.insert(key.clone(), value.clone());
        }

        let yaml = serde_yaml::to_string(&metadata)?;
        let mut lines = Vec::with_capacity(yaml.lines().count() + 2);
        lines.push(DELIMITER.to_owned());
        lines.extend(yaml.lines().map(str::to_owned));
        lines.push(DELIMITER.to_owned());
        Ok(lines)
    }
}
