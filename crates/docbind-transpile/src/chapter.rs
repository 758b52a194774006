//! Chapter transpiler: definition-list restructuring over rewritten lines.
//!
//! DocC writes a definition list item as
//!
//! ```text
//! - term Label:
//!   Definition text
//!   continued
//! ```
//!
//! while pandoc expects the label on its own line followed by a blank line
//! and a `:`-marked, four-space indented body. The transpiler runs a small
//! state machine with a single line of pushback.

use std::sync::LazyLock;

use regex::Regex;

use crate::TranspileError;
use crate::rewrite::LineRewriter;

/// Indentation of definition bodies in pandoc markdown.
const DEFINITION_INDENT: &str = "    ";

/// Marker opening the first definition line.
const DEFINITION_MARKER: &str = ":";

static DEFINITION_TERM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^- term (.+):").unwrap());

/// Control state while transpiling one chapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    #[default]
    Normal,
    /// A term label was emitted; the blank separator line is next.
    ListHeaderPending,
    DefinitionFirstLine,
    DefinitionBody,
}

/// Transpiles the lines of one chapter.
///
/// Every input line goes through the [`LineRewriter`] exactly once, when it
/// is first read. A pushed-back line is re-examined as already rewritten.
#[derive(Debug)]
pub struct ChapterTranspiler<'r> {
    rewriter: &'r LineRewriter<'r>,
    state: State,
    pushback: Option<String>,
    output: Vec<String>,
}

impl<'r> ChapterTranspiler<'r> {
    /// Create a transpiler using `rewriter` for single-line rewrites.
    #[must_use]
    pub fn new(rewriter: &'r LineRewriter<'r>) -> Self {
        Self {
            rewriter,
            state: State::default(),
            pushback: None,
            output: Vec::new(),
        }
    }

    /// Transpile `lines` into pandoc markdown lines.
    ///
    /// # Errors
    ///
    /// Propagates the first rewrite failure.
    pub fn transpile<'l, I>(mut self, lines: I) -> Result<Vec<String>, TranspileError>
    where
        I: IntoIterator<Item = &'l str>,
    {
        let mut lines = lines.into_iter();
        loop {
            let line = match self.pushback.take() {
                Some(line) => line,
                None => match lines.next() {
                    Some(raw) => self.rewriter.rewrite(raw)?,
                    None => break,
                },
            };
            self.step(line);
        }
        Ok(self.output)
    }

    fn step(&mut self, line: String) {
        match self.state {
            State::Normal => match definition_term(&line) {
                Some(label) => {
                    self.output.push(label);
                    self.state = State::ListHeaderPending;
                }
                None => self.output.push(line),
            },
            State::ListHeaderPending => {
                self.output.push(String::new());
                self.pushback = Some(line);
                self.state = State::DefinitionFirstLine;
            }
            State::DefinitionFirstLine => {
                self.output.push(format!(
                    "{DEFINITION_MARKER}{DEFINITION_INDENT}{}",
                    line.trim_start()
                ));
                self.state = State::DefinitionBody;
            }
            State::DefinitionBody => {
                if line.is_empty() {
                    self.output.push(String::new());
                } else if line.starts_with(char::is_whitespace) {
                    self.output
                        .push(format!("{DEFINITION_INDENT}{}", line.trim_start()));
                } else {
                    self.pushback = Some(line);
                    self.state = State::Normal;
                }
            }
        }
    }
}

/// Label of a `- term Label:` line.
fn definition_term(line: &str) -> Option<String> {
    DEFINITION_TERM_RE
        .captures(line)
        .map(|caps| caps[1].to_owned())
}
