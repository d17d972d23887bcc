use std::fmt;
use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label};

/// Ways an example block can be malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralErrorKind {
    /// A continuation-marked line with no statement to continue.
    ContinuationWithoutStatement,
    /// A prompt or continuation marker not followed by a space.
    MissingSpaceAfterMarker { marker: String },
    /// An input line indented deeper than the block's opening indentation.
    InconsistentIndentation { expected: usize, got: usize },
    /// A prompt with no input text.
    EmptyStatement,
    /// A statement still expecting continuation input when the block ended.
    UnterminatedStatement,
    /// A doc comment delimiter that is never closed.
    UnterminatedComment,
}

/// A malformed block or comment, attributed to a source line.
///
/// Structural errors are always surfaced and never recovered: extraction of
/// the offending block stops, but sibling blocks are still extracted and
/// verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuralError {
    pub kind: StructuralErrorKind,
    /// 1-based source line of the offending text.
    pub line: usize,
    /// Byte span in the scanned source.
    pub span: Range<usize>,
    /// Source file ID for codespan-reporting diagnostics.
    pub file_id: usize,
}

impl StructuralError {
    pub fn new(kind: StructuralErrorKind, line: usize, span: Range<usize>, file_id: usize) -> Self {
        StructuralError {
            kind,
            line,
            span,
            file_id,
        }
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        Diagnostic::error()
            .with_message(self.to_string())
            .with_labels(vec![Label::primary(self.file_id, self.span.clone())])
    }
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            StructuralErrorKind::ContinuationWithoutStatement => {
                write!(f, "line {}: continuation line has no statement to continue", self.line)
            }
            StructuralErrorKind::MissingSpaceAfterMarker { marker } => {
                write!(f, "line {}: missing space after '{}'", self.line, marker)
            }
            StructuralErrorKind::InconsistentIndentation { expected, got } => {
                write!(
                    f,
                    "line {}: input line indented {} columns, block opened at {}",
                    self.line, got, expected
                )
            }
            StructuralErrorKind::EmptyStatement => {
                write!(f, "line {}: prompt with no input", self.line)
            }
            StructuralErrorKind::UnterminatedStatement => {
                write!(f, "line {}: statement is never terminated", self.line)
            }
            StructuralErrorKind::UnterminatedComment => {
                write!(f, "line {}: unterminated doc comment", self.line)
            }
        }
    }
}

impl std::error::Error for StructuralError {}
