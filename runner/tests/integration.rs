use std::io::Write;

use doctest::parser::Parser;
use runner::{
    BlockState, CommentReport, Evaluator, FailureReport, Interpreter, matcher, verify_comment,
    verify_suite,
};

fn verify(text: &str) -> CommentReport {
    let suite = Parser::new(text.to_string(), 0).parse_comment();
    verify_comment(&suite.comments[0], Interpreter::new)
}

fn eval_one(input: &str) -> Result<String, FailureReport> {
    let mut interp = Interpreter::new();
    let mut out = String::new();
    interp.eval(input, &mut out)?;
    Ok(out)
}

// ---------------------------------------------------------------------------
// Whole-block verification
// ---------------------------------------------------------------------------

#[test]
fn assignment_then_use() {
    let report = verify("    sage: x = 2\n    sage: x + 3\n    5\n");
    assert!(report.passed());
    assert_eq!(report.blocks[0].state, BlockState::Passed);
    assert_eq!(report.blocks[0].statements[0].actual, "");
}

#[test]
fn context_persists_across_statements() {
    let report = verify("    sage: y = []\n    sage: y.append(1); y\n    [1]\n");
    assert!(report.passed());
}

#[test]
fn context_does_not_leak_across_blocks() {
    let text = concat!(
        "    sage: z = 5\n",
        "    sage: z\n",
        "    5\n",
        "\n",
        "Separate session:\n",
        "\n",
        "    sage: z\n",
        "    Traceback (most recent call last):\n",
        "    ...\n",
        "    NameError: name 'z' is not defined\n",
    );
    let report = verify(text);
    assert_eq!(report.blocks.len(), 2);
    assert!(report.passed());
}

#[test]
fn mismatch_fails_the_block() {
    let report = verify("    sage: 1 + 1\n    3\n");
    assert!(!report.passed());
    let block = &report.blocks[0];
    assert_eq!(block.state, BlockState::Failed);
    let failure = block.failures().next().expect("one failure");
    assert_eq!(failure.index, 0);
    assert_eq!(failure.expected, "3");
    assert_eq!(failure.actual, "2\n");
}

#[test]
fn later_statements_still_run_after_a_mismatch() {
    let text = "    sage: 1 + 1\n    3\n    sage: 2 + 2\n    4\n";
    let report = verify(text);
    let block = &report.blocks[0];
    assert_eq!(block.state, BlockState::Failed);
    assert_eq!(block.statements.len(), 2);
    assert!(!block.statements[0].passed);
    assert!(block.statements[1].passed);
}

#[test]
fn one_failed_block_does_not_stop_siblings() {
    let text = "    sage: 1\n    2\n\nprose\n\n    sage: 3\n    3\n";
    let report = verify(text);
    assert_eq!(report.blocks.len(), 2);
    assert!(!report.blocks[0].passed());
    assert!(report.blocks[1].passed());
    assert!(!report.passed());
}

#[test]
fn structurally_broken_block_fails_but_runs_survivors() {
    let text = "    sage: x = 1\n    sage: x\n    1\n      sage: misaligned\n";
    let report = verify(text);
    let block = &report.blocks[0];
    assert_eq!(block.state, BlockState::Failed);
    assert!(block.structural.is_some());
    // Surviving statements are still executed for diagnostics.
    assert_eq!(block.statements.len(), 2);
    assert!(block.statements.iter().all(|s| s.passed));
}

#[test]
fn verdicts_are_repeatable() {
    let suite = Parser::new(
        "    sage: v = [1, 2]\n    sage: v.pop()\n    2\n".to_string(),
        0,
    )
    .parse_comment();
    let first = verify_comment(&suite.comments[0], Interpreter::new);
    let second = verify_comment(&suite.comments[0], Interpreter::new);
    assert_eq!(first.passed(), second.passed());
    assert!(first.passed());
}

#[test]
fn empty_comment_passes() {
    let report = verify("No examples at all.\n");
    assert!(report.passed());
    assert!(report.blocks.is_empty());
}

#[test]
fn suite_verification_covers_every_comment() {
    let source = "\
def good():
    \"\"\"
    sage: 1
    1
    \"\"\"

def bad():
    \"\"\"
    sage: 1
    2
    \"\"\"
";
    let suite = Parser::new(source.to_string(), 0)
        .parse_source()
        .expect("scan failed");
    let report = verify_suite(&suite, Interpreter::new);
    assert_eq!(report.comments.len(), 2);
    assert!(report.comments[0].passed());
    assert!(!report.comments[1].passed());
    assert!(!report.passed());
    assert_eq!(report.block_counts(), (1, 1));
}

// ---------------------------------------------------------------------------
// Failure reports
// ---------------------------------------------------------------------------

#[test]
fn failure_kind_header_with_wildcard() {
    let report = verify("    sage: 1/0\n    ZeroDivisionError\n    ...\n");
    assert!(report.passed());
}

#[test]
fn traceback_form_matches_kind_and_message() {
    let text = concat!(
        "    sage: 1/0\n",
        "    Traceback (most recent call last):\n",
        "    ...\n",
        "    ZeroDivisionError: division by zero\n",
    );
    assert!(verify(text).passed());
}

#[test]
fn wrong_failure_kind_does_not_match() {
    let report = verify("    sage: 1/0\n    TypeError\n    ...\n");
    assert!(!report.passed());
}

#[test]
fn wrong_final_message_does_not_match() {
    let text = concat!(
        "    sage: 1/0\n",
        "    Traceback (most recent call last):\n",
        "    ...\n",
        "    ZeroDivisionError: tangent undefined\n",
    );
    assert!(!verify(text).passed());
}

#[test]
fn trace_detail_is_always_wildcarded() {
    // Fixed detail lines between the header and the final line are ignored
    // even without an explicit `...`.
    let text = concat!(
        "    sage: undefined_name\n",
        "    Traceback (most recent call last):\n",
        "      File \"<doctest>\", line 1, in <module>\n",
        "    NameError: name 'undefined_name' is not defined\n",
    );
    assert!(verify(text).passed());
}

#[test]
fn unexpected_fault_is_a_verification_failure() {
    let report = verify("    sage: 1/0\n    0\n");
    let block = &report.blocks[0];
    assert!(!block.passed());
    let failure = block.failures().next().expect("one failure");
    assert!(failure.actual.contains("Traceback (most recent call last):"));
    assert!(failure.actual.contains("ZeroDivisionError: division by zero"));
}

#[test]
fn output_before_a_fault_is_kept() {
    let text = concat!(
        "    sage: print('partial'); 1/0\n",
        "    partial\n",
        "    Traceback (most recent call last):\n",
        "    ...\n",
        "    ZeroDivisionError: division by zero\n",
    );
    assert!(verify(text).passed());
}

#[test]
fn syntax_errors_surface_as_faults() {
    let report = verify("    sage: 1 +\n    SyntaxError\n    ...\n");
    assert!(report.passed());
}

// ---------------------------------------------------------------------------
// Wildcard matching
// ---------------------------------------------------------------------------

#[test]
fn wildcard_spans_multiple_lines() {
    let text = concat!(
        "    sage: print('a'); print('b'); print('c'); print('d')\n",
        "    a\n",
        "    ...\n",
        "    d\n",
    );
    assert!(verify(text).passed());
}

#[test]
fn wildcard_matches_empty_span() {
    assert!(matcher::output_matches("a\n...\nb", "a\nb\n"));
}

#[test]
fn wildcard_is_anchored_to_fixed_text() {
    assert!(!matcher::output_matches("a\n...\nb", "x\nm\nb\n"));
    assert!(!matcher::output_matches("a\n...\nb", "a\nm\nx\n"));
}

#[test]
fn wildcard_only_matches_anything() {
    assert!(matcher::output_matches("...", ""));
    assert!(matcher::output_matches("...", "anything\nat all\n"));
}

#[test]
fn exact_match_without_wildcards_is_bytewise() {
    assert!(matcher::output_matches("a\nb", "a\nb\n"));
    assert!(!matcher::output_matches("a\nb", "a\nb \nc\n"));
    assert!(!matcher::output_matches("", "output\n"));
    assert!(matcher::output_matches("", ""));
}

#[test]
fn widening_a_wildcard_never_breaks_a_passing_block() {
    let exact = concat!(
        "    sage: print('one'); print('two'); print('three')\n",
        "    one\n",
        "    two\n",
        "    three\n",
    );
    let widened = concat!(
        "    sage: print('one'); print('two'); print('three')\n",
        "    one\n",
        "    ...\n",
        "    three\n",
    );
    assert!(verify(exact).passed());
    assert!(verify(widened).passed());
}

// ---------------------------------------------------------------------------
// The built-in evaluator
// ---------------------------------------------------------------------------

#[test]
fn arithmetic() {
    assert_eq!(eval_one("2 + 3").unwrap(), "5\n");
    assert_eq!(eval_one("10 - 4").unwrap(), "6\n");
    assert_eq!(eval_one("3 * 7").unwrap(), "21\n");
    assert_eq!(eval_one("15 / 3").unwrap(), "5.0\n");
    assert_eq!(eval_one("15 // 3").unwrap(), "5\n");
    assert_eq!(eval_one("10 % 3").unwrap(), "1\n");
    assert_eq!(eval_one("2 ** 10").unwrap(), "1024\n");
}

#[test]
fn operator_precedence() {
    assert_eq!(eval_one("2 + 3 * 4").unwrap(), "14\n");
    assert_eq!(eval_one("(2 + 3) * 4").unwrap(), "20\n");
    assert_eq!(eval_one("-2 ** 2").unwrap(), "-4\n");
    assert_eq!(eval_one("2 ** 3 ** 2").unwrap(), "512\n");
}

#[test]
fn floor_division_rounds_toward_negative_infinity() {
    assert_eq!(eval_one("-7 // 2").unwrap(), "-4\n");
    assert_eq!(eval_one("-7 % 2").unwrap(), "1\n");
}

#[test]
fn comparisons_and_logic() {
    assert_eq!(eval_one("3 < 5").unwrap(), "True\n");
    assert_eq!(eval_one("3 >= 5").unwrap(), "False\n");
    assert_eq!(eval_one("1 == 1.0").unwrap(), "True\n");
    assert_eq!(eval_one("'a' != 'b'").unwrap(), "True\n");
    assert_eq!(eval_one("not False").unwrap(), "True\n");
    assert_eq!(eval_one("0 or 7").unwrap(), "7\n");
    assert_eq!(eval_one("0 and 7").unwrap(), "0\n");
}

#[test]
fn session_echo_uses_reprs() {
    assert_eq!(eval_one("'text'").unwrap(), "'text'\n");
    assert_eq!(eval_one("[1, 'a', True]").unwrap(), "[1, 'a', True]\n");
    assert_eq!(eval_one("(1,)").unwrap(), "(1,)\n");
    assert_eq!(eval_one("(1, 2)").unwrap(), "(1, 2)\n");
    assert_eq!(eval_one("None").unwrap(), "");
    assert_eq!(eval_one("x = 1").unwrap(), "");
}

#[test]
fn print_uses_plain_text() {
    assert_eq!(eval_one("print('a', 1)").unwrap(), "a 1\n");
    assert_eq!(eval_one("print([1, 2])").unwrap(), "[1, 2]\n");
}

#[test]
fn builtins() {
    assert_eq!(eval_one("len('abc')").unwrap(), "3\n");
    assert_eq!(eval_one("len([1, 2, 3])").unwrap(), "3\n");
    assert_eq!(eval_one("abs(-3)").unwrap(), "3\n");
    assert_eq!(eval_one("int('17')").unwrap(), "17\n");
    assert_eq!(eval_one("int(3.9)").unwrap(), "3\n");
    let fault = eval_one("int('x')").unwrap_err();
    assert_eq!(fault.kind, "ValueError");
    assert_eq!(fault.message, "invalid literal for int() with base 10: 'x'");
}

#[test]
fn indexing() {
    assert_eq!(eval_one("[10, 20, 30][1]").unwrap(), "20\n");
    assert_eq!(eval_one("[10, 20, 30][-1]").unwrap(), "30\n");
    assert_eq!(eval_one("'abc'[0]").unwrap(), "'a'\n");
    let fault = eval_one("[1][5]").unwrap_err();
    assert_eq!(fault.kind, "IndexError");
    assert_eq!(fault.message, "list index out of range");
}

#[test]
fn string_concatenation_and_repetition() {
    assert_eq!(eval_one("'ab' + 'cd'").unwrap(), "'abcd'\n");
    assert_eq!(eval_one("'ab' * 3").unwrap(), "'ababab'\n");
    assert_eq!(eval_one("[1] + [2]").unwrap(), "[1, 2]\n");
}

#[test]
fn list_methods_mutate_bindings() {
    let mut interp = Interpreter::new();
    let mut out = String::new();
    interp.eval("v = []", &mut out).unwrap();
    interp.eval("v.append(1)", &mut out).unwrap();
    interp.eval("v.append(2)", &mut out).unwrap();
    interp.eval("v", &mut out).unwrap();
    assert_eq!(out, "[1, 2]\n");
    interp.eval("v.pop()", &mut out).unwrap();
    assert_eq!(out, "[1, 2]\n2\n");
}

#[test]
fn fault_kinds() {
    assert_eq!(eval_one("1/0").unwrap_err().kind, "ZeroDivisionError");
    assert_eq!(eval_one("missing").unwrap_err().kind, "NameError");
    assert_eq!(eval_one("'a' + 1").unwrap_err().kind, "TypeError");
    assert_eq!(eval_one("[].push(1)").unwrap_err().kind, "AttributeError");
    assert_eq!(eval_one("1 +").unwrap_err().kind, "SyntaxError");
    assert_eq!(eval_one("[].pop()").unwrap_err().kind, "IndexError");
}

#[test]
fn fault_messages_follow_the_corpus_convention() {
    let fault = eval_one("missing").unwrap_err();
    assert_eq!(fault.message, "name 'missing' is not defined");
    let fault = eval_one("1/0").unwrap_err();
    assert_eq!(fault.final_line(), "ZeroDivisionError: division by zero");
    let fault = eval_one("'a' + 1").unwrap_err();
    assert_eq!(
        fault.message,
        "unsupported operand type(s) for +: 'str' and 'int'"
    );
}

#[test]
fn float_reprs() {
    assert_eq!(eval_one("2.5 + 2.5").unwrap(), "5.0\n");
    assert_eq!(eval_one("7 / 2").unwrap(), "3.5\n");
}

// ---------------------------------------------------------------------------
// End to end through the filesystem
// ---------------------------------------------------------------------------

#[test]
fn verifies_a_source_file_on_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("point.py");
    let mut file = std::fs::File::create(&path).expect("create");
    write!(
        file,
        "def point(x=1, y=2):\n    r\"\"\"\n    Return the point.\n\n    EXAMPLES::\n\n        sage: (2 ** 5, 3)\n        (32, 3)\n\n    TESTS::\n\n        sage: (42 ** 5, 0)\n        (130691232, 0)\n    \"\"\"\n"
    )
    .expect("write");

    let source = std::fs::read_to_string(&path).expect("read");
    let suite = Parser::new(source, 0).parse_source().expect("scan failed");
    let report = verify_suite(&suite, Interpreter::new);
    assert!(report.passed());
    assert_eq!(report.block_counts(), (2, 0));
}
