pub mod blocks;
pub mod error;
mod source;

pub use blocks::Blocks;
pub use error::{StructuralError, StructuralErrorKind};

use crate::Suite;
use crate::comment::DocComment;
use crate::session::SessionSyntax;

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
    syntax: SessionSyntax,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser {
            source,
            file_id,
            syntax: SessionSyntax::default(),
        }
    }

    pub fn with_syntax(mut self, syntax: SessionSyntax) -> Self {
        self.syntax = syntax;
        self
    }

    /// Scan a function source file for docstrings and extract the example
    /// blocks of each. Malformed blocks are kept with their structural error
    /// attached; the only hard failure is a docstring delimiter that never
    /// closes.
    pub fn parse_source(&self) -> Result<Suite, StructuralError> {
        let raw = source::scan_source(&self.source, self.file_id)?;
        let comments = raw
            .into_iter()
            .map(|rc| {
                let text = &self.source[rc.span.clone()];
                let blocks = Blocks::new(text, &self.syntax, self.file_id, rc.span.start, rc.line)
                    .collect();
                DocComment {
                    name: rc.name,
                    text: text.to_string(),
                    blocks,
                    span: rc.span,
                    line: rc.line,
                }
            })
            .collect();
        Ok(Suite {
            comments,
            source_id: self.file_id,
        })
    }

    /// Treat the whole source as the text of a single anonymous doc comment.
    pub fn parse_comment(&self) -> Suite {
        let blocks = Blocks::new(&self.source, &self.syntax, self.file_id, 0, 1).collect();
        let comment = DocComment {
            name: None,
            text: self.source.clone(),
            blocks,
            span: 0..self.source.len(),
            line: 1,
        };
        Suite {
            comments: vec![comment],
            source_id: self.file_id,
        }
    }
}
