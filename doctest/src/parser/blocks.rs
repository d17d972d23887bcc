use std::ops::Range;

use crate::parser::error::{StructuralError, StructuralErrorKind};
use crate::session::{ExampleBlock, SessionSyntax, Statement};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Extract the example blocks of a documentation comment.
///
/// This is a single-pass, non-restartable iterator: blocks are produced in
/// source order, and a malformed block is yielded with its structural error
/// attached rather than dropped.
pub struct Blocks<'a> {
    lines: Vec<Line<'a>>,
    pos: usize,
    syntax: &'a SessionSyntax,
    file_id: usize,
    /// Section heading currently in effect (e.g. "EXAMPLES", "TESTS").
    section: Option<String>,
}

impl<'a> Blocks<'a> {
    /// `base_offset` and `base_line` locate the comment text within the
    /// scanned source, so spans and line numbers come out absolute.
    pub fn new(
        text: &'a str,
        syntax: &'a SessionSyntax,
        file_id: usize,
        base_offset: usize,
        base_line: usize,
    ) -> Self {
        let mut lines = Vec::new();
        let mut offset = 0;
        for (i, raw) in text.split('\n').enumerate() {
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            lines.push(Line {
                text: line,
                offset: base_offset + offset,
                number: base_line + i,
            });
            offset += raw.len() + 1;
        }
        Blocks {
            lines,
            pos: 0,
            syntax,
            file_id,
            section: None,
        }
    }
}

impl<'a> Iterator for Blocks<'a> {
    type Item = ExampleBlock;

    fn next(&mut self) -> Option<ExampleBlock> {
        while self.pos < self.lines.len() {
            let line = &self.lines[self.pos];
            let content = line.text.trim_start();

            match match_marker(content, &self.syntax.prompt) {
                MarkerMatch::Input(_) | MarkerMatch::MissingSpace => {
                    return Some(self.read_block());
                }
                MarkerMatch::None => {}
            }

            // A stray continuation line outside any block. Only flagged for
            // unambiguous markers (ending in ':'); with `...`-style markers
            // the prefix also occurs in narrative text.
            if self.syntax.continuation.ends_with(':')
                && matches!(
                    match_marker(content, &self.syntax.continuation),
                    MarkerMatch::Input(_)
                )
            {
                return Some(self.stray_continuation_block());
            }

            if let Some(name) = section_header(line.text) {
                self.section = Some(name);
            }
            self.pos += 1;
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Block scanning
// ---------------------------------------------------------------------------

struct Line<'a> {
    text: &'a str,
    offset: usize,
    number: usize,
}

impl Line<'_> {
    fn end(&self) -> usize {
        self.offset + self.text.len()
    }

    fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A statement being accumulated: input lines first, then output lines.
struct Pending {
    input: String,
    expected_lines: Vec<String>,
    line: usize,
    span: Range<usize>,
}

impl Pending {
    fn in_input_phase(&self) -> bool {
        self.expected_lines.is_empty()
    }
}

enum MarkerMatch<'t> {
    /// The line does not start with the marker.
    None,
    /// Marker followed by a space (or nothing): the remaining input text.
    Input(&'t str),
    /// Marker followed by something other than a space.
    MissingSpace,
}

fn match_marker<'t>(content: &'t str, marker: &str) -> MarkerMatch<'t> {
    match content.strip_prefix(marker) {
        None => MarkerMatch::None,
        Some("") => MarkerMatch::Input(""),
        Some(rest) => match rest.strip_prefix(' ') {
            Some(r) => MarkerMatch::Input(r),
            None => MarkerMatch::MissingSpace,
        },
    }
}

impl<'a> Blocks<'a> {
    /// Read one block starting at the prompt line at `self.pos`.
    fn read_block(&mut self) -> ExampleBlock {
        let indent = indent_of(self.lines[self.pos].text);
        let block_line = self.lines[self.pos].number;
        let block_start = self.lines[self.pos].offset;
        let mut block_end = self.lines[self.pos].end();

        let mut statements: Vec<Statement> = Vec::new();
        let mut error: Option<StructuralError> = None;
        let mut current: Option<Pending> = None;
        // Blank lines are held back: they belong to the current statement's
        // expected output only if more block content follows before a dedent.
        let mut held_blanks = 0usize;

        while self.pos < self.lines.len() {
            let line = &self.lines[self.pos];

            if line.is_blank() {
                held_blanks += 1;
                self.pos += 1;
                continue;
            }

            let line_indent = indent_of(line.text);
            if line_indent < indent {
                break;
            }

            if held_blanks > 0 {
                if let Some(pending) = current.as_mut() {
                    for _ in 0..held_blanks {
                        pending.expected_lines.push(String::new());
                    }
                }
                held_blanks = 0;
            }

            let content = &line.text[indent..];
            let trimmed = content.trim_start();

            match match_marker(trimmed, &self.syntax.prompt) {
                MarkerMatch::MissingSpace => {
                    error = Some(self.structural(
                        StructuralErrorKind::MissingSpaceAfterMarker {
                            marker: self.syntax.prompt.clone(),
                        },
                        line,
                    ));
                    self.skip_block_remainder(indent, &mut block_end);
                    break;
                }
                MarkerMatch::Input(rest) => {
                    if line_indent != indent {
                        error = Some(self.structural(
                            StructuralErrorKind::InconsistentIndentation {
                                expected: indent,
                                got: line_indent,
                            },
                            line,
                        ));
                        self.skip_block_remainder(indent, &mut block_end);
                        break;
                    }
                    if let Some(pending) = current.take() {
                        match self.finalize(pending) {
                            Ok(stmt) => statements.push(stmt),
                            Err(e) => {
                                error = Some(e);
                                self.skip_block_remainder(indent, &mut block_end);
                                break;
                            }
                        }
                    }
                    current = Some(Pending {
                        input: rest.to_string(),
                        expected_lines: Vec::new(),
                        line: line.number,
                        span: line.offset..line.end(),
                    });
                    block_end = line.end();
                    self.pos += 1;
                    continue;
                }
                MarkerMatch::None => {}
            }

            // Continuation lines are only input while no output has appeared;
            // after that, a line starting with the continuation marker is
            // ordinary output text (this is how `...` wildcards survive with
            // interpreter-style markers).
            let in_input = current.as_ref().is_some_and(Pending::in_input_phase);
            if in_input {
                match match_marker(trimmed, &self.syntax.continuation) {
                    MarkerMatch::MissingSpace => {
                        error = Some(self.structural(
                            StructuralErrorKind::MissingSpaceAfterMarker {
                                marker: self.syntax.continuation.clone(),
                            },
                            line,
                        ));
                        self.skip_block_remainder(indent, &mut block_end);
                        break;
                    }
                    MarkerMatch::Input(rest) => {
                        if line_indent != indent {
                            error = Some(self.structural(
                                StructuralErrorKind::InconsistentIndentation {
                                    expected: indent,
                                    got: line_indent,
                                },
                                line,
                            ));
                            self.skip_block_remainder(indent, &mut block_end);
                            break;
                        }
                        let pending = current.as_mut().unwrap();
                        pending.input.push('\n');
                        pending.input.push_str(rest);
                        pending.span.end = line.end();
                        block_end = line.end();
                        self.pos += 1;
                        continue;
                    }
                    MarkerMatch::None => {}
                }
            }

            // Expected output, verbatim past the block's opening indentation.
            let pending = current
                .as_mut()
                .expect("block scanning starts at a prompt line");
            pending.expected_lines.push(content.to_string());
            pending.span.end = line.end();
            block_end = line.end();
            self.pos += 1;
        }

        // Whatever was extracted before a structural problem is kept, so the
        // runner can still exercise it for diagnostics.
        if let Some(pending) = current.take() {
            match self.finalize(pending) {
                Ok(stmt) => statements.push(stmt),
                Err(e) => {
                    if error.is_none() {
                        error = Some(e);
                    }
                }
            }
        }

        ExampleBlock {
            section: self.section.clone(),
            indent,
            line: block_line,
            statements,
            error,
            span: block_start..block_end,
        }
    }

    /// Close out a statement, checking that its input actually completed.
    fn finalize(&self, pending: Pending) -> Result<Statement, StructuralError> {
        if pending.input.trim().is_empty() {
            return Err(StructuralError::new(
                StructuralErrorKind::EmptyStatement,
                pending.line,
                pending.span,
                self.file_id,
            ));
        }
        let last = pending.input.lines().last().unwrap_or("");
        if last.trim_end().ends_with('\\') {
            return Err(StructuralError::new(
                StructuralErrorKind::UnterminatedStatement,
                pending.line,
                pending.span,
                self.file_id,
            ));
        }
        Ok(Statement {
            input: pending.input,
            expected: pending.expected_lines.join("\n"),
            line: pending.line,
            span: pending.span,
        })
    }

    fn structural(&self, kind: StructuralErrorKind, line: &Line<'_>) -> StructuralError {
        StructuralError::new(kind, line.number, line.offset..line.end(), self.file_id)
    }

    /// Consume the rest of a malformed block so later blocks still extract.
    fn skip_block_remainder(&mut self, indent: usize, block_end: &mut usize) {
        while self.pos < self.lines.len() {
            let line = &self.lines[self.pos];
            if line.is_blank() {
                self.pos += 1;
                continue;
            }
            if indent_of(line.text) < indent {
                return;
            }
            *block_end = line.end();
            self.pos += 1;
        }
    }

    /// A continuation line with no statement to continue.
    fn stray_continuation_block(&mut self) -> ExampleBlock {
        let indent = indent_of(self.lines[self.pos].text);
        let line_no = self.lines[self.pos].number;
        let start = self.lines[self.pos].offset;
        let mut end = self.lines[self.pos].end();
        let error = self.structural(
            StructuralErrorKind::ContinuationWithoutStatement,
            &self.lines[self.pos],
        );
        self.pos += 1;
        self.skip_block_remainder(indent, &mut end);
        ExampleBlock {
            section: self.section.clone(),
            indent,
            line: line_no,
            statements: Vec::new(),
            error: Some(error),
            span: start..end,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Recognize a section heading: an all-caps word (or words) ending with `:`
/// or `::`, e.g. `EXAMPLES:` or `TESTS::`. Directives like `.. NOTE::` do
/// not qualify.
fn section_header(line: &str) -> Option<String> {
    let t = line.trim();
    let t = t.strip_suffix("::").or_else(|| t.strip_suffix(':'))?;
    let t = t.trim_end();
    if t.is_empty() || !t.starts_with(|c: char| c.is_ascii_uppercase()) {
        return None;
    }
    if t.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == ' ')
    {
        Some(t.to_string())
    } else {
        None
    }
}
