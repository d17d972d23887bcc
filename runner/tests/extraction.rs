use doctest::parser::{Parser, StructuralErrorKind};
use doctest::session::{ExampleBlock, SessionSyntax};

fn blocks(text: &str) -> Vec<ExampleBlock> {
    let parser = Parser::new(text.to_string(), 0);
    let suite = parser.parse_comment();
    suite.comments.into_iter().next().expect("one comment").blocks
}

fn blocks_with(text: &str, syntax: SessionSyntax) -> Vec<ExampleBlock> {
    let parser = Parser::new(text.to_string(), 0).with_syntax(syntax);
    let suite = parser.parse_comment();
    suite.comments.into_iter().next().expect("one comment").blocks
}

#[test]
fn basic_block() {
    let found = blocks("    sage: 1 + 1\n    2\n");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].statements.len(), 1);
    assert_eq!(found[0].statements[0].input, "1 + 1");
    assert_eq!(found[0].statements[0].expected, "2");
    assert!(found[0].error.is_none());
}

#[test]
fn statement_without_output() {
    let found = blocks("    sage: x = 2\n    sage: x + 3\n    5\n");
    assert_eq!(found[0].statements.len(), 2);
    assert_eq!(found[0].statements[0].expected, "");
    assert_eq!(found[0].statements[1].expected, "5");
}

#[test]
fn continuation_lines_join_input() {
    let found = blocks("    sage: total = (1 +\n    ....: 2)\n    sage: total\n    3\n");
    assert_eq!(found[0].statements.len(), 2);
    assert_eq!(found[0].statements[0].input, "total = (1 +\n2)");
    assert_eq!(found[0].statements[1].expected, "3");
}

#[test]
fn dedent_terminates_block() {
    let text = "    sage: 1 + 1\n    2\nNarrative resumes here.\n\n    sage: 2 + 2\n    4\n";
    let found = blocks(text);
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].statements[0].input, "1 + 1");
    assert_eq!(found[1].statements[0].input, "2 + 2");
}

#[test]
fn blocks_come_out_in_source_order() {
    let text =
        "    sage: 1\n    1\n\nmore prose\n\n    sage: 2\n    2\n\nfinal prose\n\n    sage: 3\n    3\n";
    let found = blocks(text);
    let inputs: Vec<&str> = found
        .iter()
        .map(|b| b.statements[0].input.as_str())
        .collect();
    assert_eq!(inputs, ["1", "2", "3"]);
}

#[test]
fn blank_separated_prompts_at_same_indent_share_a_block() {
    let text = "    sage: x = 1\n\n    sage: x\n    1\n";
    let found = blocks(text);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].statements.len(), 2);
}

#[test]
fn blank_line_inside_output_is_kept() {
    let text = "    sage: 1\n    a\n\n    b\n";
    let found = blocks(text);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].statements[0].expected, "a\n\nb");
}

#[test]
fn trailing_blank_lines_end_with_the_block() {
    let text = "    sage: 1\n    1\n\n\nProse.\n";
    let found = blocks(text);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].statements[0].expected, "1");
}

#[test]
fn deeper_indentation_in_output_is_verbatim() {
    let text = "    sage: print('x')\n    a\n      indented\n";
    let found = blocks(text);
    assert_eq!(found[0].statements[0].expected, "a\n  indented");
}

#[test]
fn sections_attribute_blocks() {
    let text = "\
EXAMPLES::

    sage: 1
    1

TESTS::

    sage: 2
    2
";
    let found = blocks(text);
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].section.as_deref(), Some("EXAMPLES"));
    assert_eq!(found[1].section.as_deref(), Some("TESTS"));
}

#[test]
fn directives_are_not_sections() {
    let text = ".. NOTE::\n\n    narrative\n\n    sage: 1\n    1\n";
    let found = blocks(text);
    assert_eq!(found[0].section, None);
}

#[test]
fn missing_space_after_prompt() {
    let found = blocks("    sage:oops\n");
    assert_eq!(found.len(), 1);
    assert!(found[0].statements.is_empty());
    let error = found[0].error.as_ref().expect("structural error");
    assert_eq!(
        error.kind,
        StructuralErrorKind::MissingSpaceAfterMarker {
            marker: "sage:".to_string()
        }
    );
    assert_eq!(error.line, 1);
}

#[test]
fn misaligned_prompt_is_inconsistent_indentation() {
    let found = blocks("    sage: x = 1\n      sage: y = 2\n");
    let block = &found[0];
    let error = block.error.as_ref().expect("structural error");
    assert_eq!(
        error.kind,
        StructuralErrorKind::InconsistentIndentation {
            expected: 4,
            got: 6
        }
    );
    assert_eq!(error.line, 2);
    // The statement extracted before the problem is retained.
    assert_eq!(block.statements.len(), 1);
    assert_eq!(block.statements[0].input, "x = 1");
}

#[test]
fn bare_prompt_is_an_empty_statement() {
    let found = blocks("    sage: 1\n    1\n    sage:\n");
    let error = found[0].error.as_ref().expect("structural error");
    assert_eq!(error.kind, StructuralErrorKind::EmptyStatement);
    assert_eq!(error.line, 3);
    assert_eq!(found[0].statements.len(), 1);
}

#[test]
fn trailing_backslash_is_unterminated() {
    let found = blocks("    sage: x = (3 +\\\n");
    let error = found[0].error.as_ref().expect("structural error");
    assert_eq!(error.kind, StructuralErrorKind::UnterminatedStatement);
    assert_eq!(error.line, 1);
}

#[test]
fn stray_continuation_line() {
    let found = blocks("narrative\n\n    ....: 2\n");
    assert_eq!(found.len(), 1);
    let error = found[0].error.as_ref().expect("structural error");
    assert_eq!(error.kind, StructuralErrorKind::ContinuationWithoutStatement);
    assert_eq!(error.line, 3);
}

#[test]
fn malformed_block_does_not_stop_later_blocks() {
    let text = "    sage:bad\n\nprose\n\n    sage: 1 + 1\n    2\n";
    let found = blocks(text);
    assert_eq!(found.len(), 2);
    assert!(found[0].error.is_some());
    assert!(found[1].error.is_none());
    assert_eq!(found[1].statements[0].input, "1 + 1");
}

#[test]
fn statement_lines_are_one_based() {
    let text = "narrative\n\n    sage: 1\n    1\n    sage: 2\n    2\n";
    let found = blocks(text);
    assert_eq!(found[0].line, 3);
    assert_eq!(found[0].statements[0].line, 3);
    assert_eq!(found[0].statements[1].line, 5);
}

#[test]
fn interpreter_style_continuation() {
    let text = ">>> total = (1 +\n... 2)\n>>> total\n3\n";
    let found = blocks_with(text, SessionSyntax::interpreter_style());
    assert_eq!(found[0].statements.len(), 2);
    assert_eq!(found[0].statements[0].input, "total = (1 +\n2)");
}

#[test]
fn interpreter_style_wildcard_after_output() {
    // Once output has begun, a `...` line is output text, not continuation.
    let text = ">>> print('a')\na\n...\n";
    let found = blocks_with(text, SessionSyntax::interpreter_style());
    assert_eq!(found[0].statements.len(), 1);
    assert_eq!(found[0].statements[0].expected, "a\n...");
}

// ---------------------------------------------------------------------------
// Source-file scanning
// ---------------------------------------------------------------------------

const POINT_SOURCE: &str = r#"def point(x=1, y=2):
    r"""
    Return the point.

    EXAMPLES::

        sage: 1 + 1
        2
    """
    return (x, y)
"#;

#[test]
fn scans_docstring_after_def() {
    let parser = Parser::new(POINT_SOURCE.to_string(), 0);
    let suite = parser.parse_source().expect("scan failed");
    assert_eq!(suite.comments.len(), 1);
    let comment = &suite.comments[0];
    assert_eq!(comment.name.as_deref(), Some("point"));
    assert_eq!(comment.blocks.len(), 1);
    assert_eq!(comment.blocks[0].section.as_deref(), Some("EXAMPLES"));
    // Line numbers are absolute within the file.
    assert_eq!(comment.blocks[0].statements[0].line, 7);
}

#[test]
fn scans_module_docstring_and_multiple_defs() {
    let source = r#"# header comment
"""
Module docs.

    sage: 0
    0
"""

def first():
    """
    sage: 1
    1
    """

def second(a, b):
    '''
    sage: 2
    2
    '''
"#;
    let parser = Parser::new(source.to_string(), 0);
    let suite = parser.parse_source().expect("scan failed");
    let names: Vec<Option<&str>> = suite
        .comments
        .iter()
        .map(|c| c.name.as_deref())
        .collect();
    assert_eq!(names, [None, Some("first"), Some("second")]);
    assert_eq!(suite.block_count(), 3);
}

#[test]
fn multi_line_def_header() {
    let source = "def spread(a,\n           b):\n    \"\"\"\n    sage: 5\n    5\n    \"\"\"\n";
    let parser = Parser::new(source.to_string(), 0);
    let suite = parser.parse_source().expect("scan failed");
    assert_eq!(suite.comments.len(), 1);
    assert_eq!(suite.comments[0].name.as_deref(), Some("spread"));
}

#[test]
fn def_without_docstring_is_skipped() {
    let source = "def plain():\n    return 1\n\ndef documented():\n    \"\"\"text\"\"\"\n";
    let parser = Parser::new(source.to_string(), 0);
    let suite = parser.parse_source().expect("scan failed");
    assert_eq!(suite.comments.len(), 1);
    assert_eq!(suite.comments[0].name.as_deref(), Some("documented"));
}

#[test]
fn unterminated_docstring_is_a_structural_error() {
    let source = "def broken():\n    \"\"\"never closed\n";
    let parser = Parser::new(source.to_string(), 0);
    let error = parser.parse_source().expect_err("should fail");
    assert_eq!(error.kind, StructuralErrorKind::UnterminatedComment);
    assert_eq!(error.line, 2);
}
