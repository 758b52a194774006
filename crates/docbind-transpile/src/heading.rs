//! Heading level shifting for whole documents.
//!
//! The root document is shifted before assembly so that the headings that
//! introduce groups of chapters become the top level of the combined
//! document. [`HeadingShifter`] abstracts over who does the shifting: pandoc
//! (see the `docbind-pandoc` crate) or [`NativeHeadingShift`].

use std::io;

use crate::fence::FenceTracker;

/// Deepest ATX heading level.
const MAX_LEVEL: i32 = 6;

/// Shifts every heading in a markdown document by a number of levels.
pub trait HeadingShifter {
    /// Return `text` with heading levels adjusted by `by` (negative = shallower).
    fn shift_headings(&self, text: &str, by: i32) -> io::Result<String>;
}

/// In-process heading shifter.
///
/// Handles ATX headings (`## Title`) outside fenced code blocks. A heading
/// shifted above level 1 becomes a plain paragraph; levels are capped at 6.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeHeadingShift;

impl HeadingShifter for NativeHeadingShift {
    fn shift_headings(&self, text: &str, by: i32) -> io::Result<String> {
        let mut fence = FenceTracker::new();
        let shifted: Vec<String> = text
            .lines()
            .map(|line| {
                if fence.is_code(line) {
                    line.to_owned()
                } else {
                    shift_line(line, by)
                }
            })
            .collect();
        Ok(shifted.join("\n"))
    }
}

/// Split an ATX heading into level and text.
fn parse_atx(line: &str) -> Option<(i32, &str)> {
    let rest = line.trim_start_matches('#');
    let level = line.len() - rest.len();
    if level == 0 || level > 6 {
        return None;
    }
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }
    let text = strip_closing_sequence(rest.trim());
    Some((i32::try_from(level).ok()?, text))
}

/// Drop an optional closing `###` run, which must follow whitespace.
fn strip_closing_sequence(text: &str) -> &str {
    let without = text.trim_end_matches('#');
    if without.is_empty() || without.ends_with([' ', '\t']) {
        without.trim_end()
    } else {
        text
    }
}

fn shift_line(line: &str, by: i32) -> String {
    let Some((level, text)) = parse_atx(line) else {
        return line.to_owned();
    };
    let shifted = level.saturating_add(by);
    if shifted < 1 {
        text.to_owned()
    } else {
        let hashes = "#".repeat(usize::try_from(shifted.min(MAX_LEVEL)).unwrap_or(1));
        format!("{hashes} {text}")
    }
}
