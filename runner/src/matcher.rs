use doctest::session::{ELLIPSIS, TRACEBACK_HEADER};

use crate::fault::FailureReport;

/// Compare captured output against expected text.
///
/// Lines compare exactly apart from trailing whitespace. A standalone `...`
/// line matches any run of actual lines (including none), anchored to the
/// fixed lines around it; matching is greedy.
pub fn output_matches(expected: &str, actual: &str) -> bool {
    let exp: Vec<&str> = expected.lines().map(str::trim_end).collect();
    let act: Vec<&str> = actual.lines().map(str::trim_end).collect();
    lines_match(&exp, &act)
}

/// Compare expected text against a statement that faulted: any output the
/// statement printed first, then the failure report. The detail between the
/// report's header and its final line never reproduces, so it is wildcarded
/// whether or not the expected text spells out the `...`.
pub fn failure_matches(expected: &str, printed: &str, report: &FailureReport) -> bool {
    let exp: Vec<&str> = expected.lines().map(str::trim_end).collect();
    let printed_lines: Vec<&str> = printed.lines().map(str::trim_end).collect();

    (0..=exp.len()).any(|split| {
        lines_match(&exp[..split], &printed_lines) && report_matches(&exp[split..], report)
    })
}

fn is_wildcard(line: &str) -> bool {
    line == ELLIPSIS
}

fn lines_match(exp: &[&str], act: &[&str]) -> bool {
    match exp.split_first() {
        None => act.is_empty(),
        Some((first, rest)) if is_wildcard(first) => {
            (0..=act.len()).any(|skip| lines_match(rest, &act[skip..]))
        }
        Some((first, rest)) => match act.split_first() {
            Some((a, arest)) => first == a && lines_match(rest, arest),
            None => false,
        },
    }
}

fn report_matches(exp: &[&str], report: &FailureReport) -> bool {
    let Some((first, rest)) = exp.split_first() else {
        // A fault where no failure was expected is always a mismatch.
        return false;
    };

    if *first == TRACEBACK_HEADER {
        // Only the final fixed line is compared; anything before it is
        // stack-trace detail.
        return match rest.iter().rposition(|l| !is_wildcard(l)) {
            None => true,
            Some(pos) => rest[pos] == report.final_line(),
        };
    }

    // Bare failure-kind header: the kind name (or the full final line),
    // optionally followed by wildcard lines.
    let header_ok = *first == report.kind || *first == report.final_line();
    header_ok && rest.iter().all(|l| is_wildcard(l))
}
