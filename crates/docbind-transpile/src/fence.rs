//! Fenced code block tracking for line-based rewriting.

/// An open code fence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenFence {
    /// Backtick or tilde.
    marker: char,
    /// Length of the opening run; the closing run must be at least as long.
    len: usize,
}

/// Tracks whether the current line sits inside a fenced code block.
#[derive(Debug, Default)]
pub(crate) struct FenceTracker {
    open: Option<OpenFence>,
}

impl FenceTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Feed the next line. Returns `true` if the line is code: either a
    /// fence marker line or a line inside an open fence.
    pub(crate) fn is_code(&mut self, line: &str) -> bool {
        let trimmed = line.trim_start();
        match self.open {
            Some(fence) => {
                if closes(trimmed, fence) {
                    self.open = None;
                }
                true
            }
            None => {
                self.open = opening(trimmed);
                self.open.is_some()
            }
        }
    }
}

fn marker_run(trimmed: &str) -> Option<(char, usize)> {
    let marker = trimmed.chars().next().filter(|c| matches!(c, '`' | '~'))?;
    let len = trimmed.chars().take_while(|&c| c == marker).count();
    (len >= 3).then_some((marker, len))
}

fn opening(trimmed: &str) -> Option<OpenFence> {
    marker_run(trimmed).map(|(marker, len)| OpenFence { marker, len })
}

fn closes(trimmed: &str, fence: OpenFence) -> bool {
    match marker_run(trimmed) {
        Some((marker, len)) if marker == fence.marker && len >= fence.len => {
            // marker chars are single-byte
            trimmed[len..].trim().is_empty()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_lines_are_not_code() {
        let mut fence = FenceTracker::new();
        assert!(!fence.is_code("# Heading"));
        assert!(!fence.is_code("``inline``"));
    }

    #[test]
    fn test_backtick_block() {
        let mut fence = FenceTracker::new();
        assert!(fence.is_code("```swift"));
        assert!(fence.is_code("# not a heading"));
        assert!(fence.is_code("```"));
        assert!(!fence.is_code("# Heading"));
    }

    #[test]
    fn test_closing_needs_same_marker_and_length() {
        let mut fence = FenceTracker::new();
        assert!(fence.is_code("````"));
        assert!(fence.is_code("```"));
        assert!(fence.is_code("~~~~"));
        assert!(fence.is_code("`````"));
        assert!(!fence.is_code("text"));
    }

    #[test]
    fn test_closing_with_info_string_stays_open() {
        let mut fence = FenceTracker::new();
        assert!(fence.is_code("~~~"));
        assert!(fence.is_code("~~~ swift"));
        assert!(fence.is_code("body"));
        assert!(fence.is_code("  ~~~  "));
        assert!(!fence.is_code("after"));
    }
}
