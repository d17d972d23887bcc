use std::ops::Range;

use crate::parser::error::{StructuralError, StructuralErrorKind};

/// A docstring located in a source file, before block extraction.
pub(crate) struct RawComment {
    /// Name of the declaration the docstring is attached to.
    pub name: Option<String>,
    /// Byte range of the docstring body (between the delimiters).
    pub span: Range<usize>,
    /// 1-based line where the body starts.
    pub line: usize,
}

/// Scan a function source file for docstrings: a triple-quoted string
/// directly following a `def ...:` header, plus an optional module-level
/// docstring at the top of the file. String prefixes (`r`, `b`, `u`, any
/// case) are accepted; escape sequences inside the delimiters are not
/// interpreted.
pub(crate) fn scan_source(source: &str, file_id: usize) -> Result<Vec<RawComment>, StructuralError> {
    let lines = split_lines(source);
    let mut comments = Vec::new();
    let mut i = 0;

    // Module-level docstring: skip leading blank and `#` comment lines.
    while i < lines.len() {
        let t = lines[i].text.trim();
        if t.is_empty() || t.starts_with('#') {
            i += 1;
        } else {
            break;
        }
    }
    if i < lines.len() && opens_string(lines[i].text.trim_start()).is_some() {
        let comment = read_docstring(source, &lines, &mut i, None, file_id)?;
        comments.push(comment);
    }

    while i < lines.len() {
        let trimmed = lines[i].text.trim_start();
        let Some(rest) = trimmed.strip_prefix("def ") else {
            i += 1;
            continue;
        };
        let name = rest
            .split('(')
            .next()
            .unwrap_or(rest)
            .trim()
            .to_string();

        // The header may span lines; it ends at a `:` once all brackets
        // close.
        let mut depth = 0i32;
        let mut header_done = false;
        while i < lines.len() {
            for c in lines[i].text.chars() {
                match c {
                    '(' | '[' | '{' => depth += 1,
                    ')' | ']' | '}' => depth -= 1,
                    '#' => break,
                    _ => {}
                }
            }
            let ended = depth <= 0 && lines[i].text.trim_end().ends_with(':');
            i += 1;
            if ended {
                header_done = true;
                break;
            }
        }
        if !header_done {
            break;
        }

        // First significant body line: a docstring if it opens one.
        while i < lines.len() && lines[i].text.trim().is_empty() {
            i += 1;
        }
        if i < lines.len() && opens_string(lines[i].text.trim_start()).is_some() {
            let comment = read_docstring(source, &lines, &mut i, Some(name), file_id)?;
            comments.push(comment);
        }
    }

    Ok(comments)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Line<'a> {
    text: &'a str,
    offset: usize,
    number: usize,
}

fn split_lines(source: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut offset = 0;
    for (i, raw) in source.split('\n').enumerate() {
        let text = raw.strip_suffix('\r').unwrap_or(raw);
        lines.push(Line {
            text,
            offset,
            number: i + 1,
        });
        offset += raw.len() + 1;
    }
    lines
}

/// If `text` begins a triple-quoted string, return (prefix length, delimiter).
fn opens_string(text: &str) -> Option<(usize, &'static str)> {
    let prefix_len = text
        .chars()
        .take(2)
        .take_while(|c| matches!(c, 'r' | 'R' | 'b' | 'B' | 'u' | 'U'))
        .count();
    let rest = &text[prefix_len..];
    if rest.starts_with("\"\"\"") {
        Some((prefix_len, "\"\"\""))
    } else if rest.starts_with("'''") {
        Some((prefix_len, "'''"))
    } else {
        None
    }
}

/// Read the docstring opening at line `*i`, advancing past its closing
/// delimiter.
fn read_docstring(
    source: &str,
    lines: &[Line<'_>],
    i: &mut usize,
    name: Option<String>,
    file_id: usize,
) -> Result<RawComment, StructuralError> {
    let line = &lines[*i];
    let trimmed_start = line.text.len() - line.text.trim_start().len();
    let (prefix_len, delim) = opens_string(line.text.trim_start())
        .expect("caller checked the line opens a string");

    let body_start = line.offset + trimmed_start + prefix_len + delim.len();
    let Some(rel_end) = source[body_start..].find(delim) else {
        return Err(StructuralError::new(
            StructuralErrorKind::UnterminatedComment,
            line.number,
            line.offset..line.offset + line.text.len(),
            file_id,
        ));
    };
    let body_end = body_start + rel_end;

    // Advance past the line containing the closing delimiter.
    while *i < lines.len() && lines[*i].offset + lines[*i].text.len() < body_end + delim.len() {
        *i += 1;
    }
    *i += 1;

    Ok(RawComment {
        name,
        span: body_start..body_end,
        line: line.number,
    })
}
