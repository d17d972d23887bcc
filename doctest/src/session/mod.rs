use std::ops::Range;

use crate::parser::error::StructuralError;

/// The literal ellipsis token. In expected output it stands for an
/// unpredictable span of lines; it is only recognized as a standalone line.
pub const ELLIPSIS: &str = "...";

/// The line that opens a rendered failure report.
pub const TRACEBACK_HEADER: &str = "Traceback (most recent call last):";

/// The prompt and continuation prefixes that mark input lines inside an
/// example block. Both are matched byte-exact and must be followed by a
/// space (or end of line).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSyntax {
    pub prompt: String,
    pub continuation: String,
}

impl SessionSyntax {
    pub fn new(prompt: impl Into<String>, continuation: impl Into<String>) -> Self {
        SessionSyntax {
            prompt: prompt.into(),
            continuation: continuation.into(),
        }
    }

    /// The interactive-interpreter dialect (`>>>` / `...`). With this pair a
    /// line starting with `...` directly after input is a continuation, so a
    /// wildcard can only appear once expected output has begun.
    pub fn interpreter_style() -> Self {
        SessionSyntax::new(">>>", "...")
    }
}

/// The corpus dialect: `sage:` prompts with `....:` continuations.
impl Default for SessionSyntax {
    fn default() -> Self {
        SessionSyntax::new("sage:", "....:")
    }
}

/// One input/expected-output pair within an example block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// Logical input: the prompt line's text with continuation lines joined
    /// by newlines.
    pub input: String,
    /// Expected output, verbatim (indentation beyond the block's opening
    /// indentation preserved). Empty when the statement expects no output.
    pub expected: String,
    /// 1-based source line of the prompt.
    pub line: usize,
    /// Byte span of the whole statement in the scanned source.
    pub span: Range<usize>,
}

/// An ordered sequence of statements extracted from a documentation comment.
///
/// A block that hit a structural problem keeps the statements extracted
/// before the problem and carries the error; the rest of the block's text is
/// skipped. Such a block always verifies as failed.
#[derive(Debug, Clone)]
pub struct ExampleBlock {
    /// The docstring section the block appeared under (e.g. "EXAMPLES",
    /// "TESTS"), when one was in effect.
    pub section: Option<String>,
    /// Opening indentation in columns; every input line aligns to it.
    pub indent: usize,
    /// 1-based source line of the first prompt.
    pub line: usize,
    pub statements: Vec<Statement>,
    /// Set when extraction of this block aborted.
    pub error: Option<StructuralError>,
    /// Byte span of the block in the scanned source.
    pub span: Range<usize>,
}

impl ExampleBlock {
    pub fn is_malformed(&self) -> bool {
        self.error.is_some()
    }
}
