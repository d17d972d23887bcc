use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use similar::{ChangeTag, TextDiff};

use doctest::Suite;
use doctest::parser::Parser;
use doctest::session::SessionSyntax;
use runner::{CommentReport, Interpreter, verify_suite};

/// Extensions scanned for `def`-attached docstrings.
const SOURCE_EXTENSIONS: &[&str] = &["py", "pyx"];
/// Extensions treated as one whole-file doc comment.
const TEXT_EXTENSIONS: &[&str] = &["rst", "txt"];

// ---------------------------------------------------------------------------
// Discovery & parsing
// ---------------------------------------------------------------------------

fn is_doctest_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            SOURCE_EXTENSIONS.contains(&ext) || TEXT_EXTENSIONS.contains(&ext)
        })
}

/// Recursively collect verifiable files under `root`, sorted by path.
pub fn discover(root: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    collect_files(root, &mut out);
    out.sort();
    out
}

fn collect_files(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_files(&path, out);
        } else if is_doctest_file(&path) {
            out.push(path);
        }
    }
}

fn parse_suite(
    path: &Path,
    source: String,
    file_id: usize,
    syntax: &SessionSyntax,
) -> Result<Suite, doctest::parser::StructuralError> {
    let parser = Parser::new(source, file_id).with_syntax(syntax.clone());
    let is_source = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext));
    if is_source {
        parser.parse_source()
    } else {
        Ok(parser.parse_comment())
    }
}

/// Drop blocks outside the requested sections. Comments that end up with no
/// blocks are dropped too; they have nothing to verify.
fn filter_suite(mut suite: Suite, sections: &[String]) -> Suite {
    if sections.is_empty() {
        return suite;
    }
    for comment in &mut suite.comments {
        comment.blocks.retain(|block| {
            block
                .section
                .as_deref()
                .is_some_and(|s| sections.iter().any(|want| want.eq_ignore_ascii_case(s)))
        });
    }
    suite
}

// ---------------------------------------------------------------------------
// Verification run
// ---------------------------------------------------------------------------

/// Verify one file or a directory tree.
/// Returns exit code: 0 = all blocks passed, 1 = any failure.
pub fn run_verify(
    path: &Path,
    no_color: bool,
    sections: &[String],
    syntax: &SessionSyntax,
) -> i32 {
    let targets = if path.is_file() {
        vec![path.to_path_buf()]
    } else {
        discover(path)
    };
    if targets.is_empty() {
        eprintln!("no doctest files found in {}", path.display());
        return 1;
    }

    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let writer = StandardStream::stderr(color_choice);
    let term_config = term::Config::default();
    let mut files = SimpleFiles::new();

    let mut passed_blocks = 0usize;
    let mut failed_blocks = 0usize;
    let mut hard_error = false;
    let mut failures: Vec<(PathBuf, CommentReport)> = Vec::new();

    for target in &targets {
        let source = match std::fs::read_to_string(target) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("error: cannot read '{}': {}", target.display(), e);
                hard_error = true;
                continue;
            }
        };
        let file_id = files.add(target.display().to_string(), source.clone());

        let suite = match parse_suite(target, source, file_id, syntax) {
            Ok(s) => s,
            Err(error) => {
                let _ = term::emit_to_write_style(
                    &mut writer.lock(),
                    &term_config,
                    &files,
                    &error.to_diagnostic(),
                );
                hard_error = true;
                continue;
            }
        };
        let suite = filter_suite(suite, sections);

        let verified = suite
            .comments
            .iter()
            .filter(|c| !c.blocks.is_empty())
            .count();
        if verified == 0 {
            continue;
        }

        eprintln!();
        eprintln!("{}", bold(&target.display().to_string(), no_color));

        let report = verify_suite(&suite, Interpreter::new);
        for comment in report.comments {
            if comment.blocks.is_empty() {
                continue;
            }

            let (ok, bad) = comment_block_counts(&comment);
            passed_blocks += ok;
            failed_blocks += bad;

            let label = comment.label().to_string();
            if comment.passed() {
                eprintln!("  {}  {} (line {})", pass_label(no_color), label, comment.line);
            } else {
                eprintln!("  {}  {} (line {})", fail_label(no_color), label, comment.line);
                // Structural errors get a full spanned diagnostic right away.
                for block in &comment.blocks {
                    if let Some(error) = &block.structural {
                        let _ = term::emit_to_write_style(
                            &mut writer.lock(),
                            &term_config,
                            &files,
                            &error.to_diagnostic(),
                        );
                    }
                }
                failures.push((target.clone(), comment));
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for (file, comment) in &failures {
            print_comment_failures(file, comment, no_color);
        }
    }

    eprintln!();
    if failed_blocks == 0 && !hard_error {
        if no_color {
            eprintln!("doctest result: ok. {} blocks passed, 0 failed", passed_blocks);
        } else {
            eprintln!(
                "doctest result: \x1b[32mok\x1b[0m. {} blocks passed, 0 failed",
                passed_blocks
            );
        }
        0
    } else {
        let total = passed_blocks + failed_blocks;
        if no_color {
            eprintln!(
                "doctest result: FAILED. {} blocks passed, {} failed (of {})",
                passed_blocks, failed_blocks, total
            );
        } else {
            eprintln!(
                "doctest result: \x1b[31mFAILED\x1b[0m. {} blocks passed, {} failed (of {})",
                passed_blocks, failed_blocks, total
            );
        }
        1
    }
}

fn comment_block_counts(comment: &CommentReport) -> (usize, usize) {
    let ok = comment.blocks.iter().filter(|b| b.passed()).count();
    (ok, comment.blocks.len() - ok)
}

fn print_comment_failures(file: &Path, comment: &CommentReport, no_color: bool) {
    for block in &comment.blocks {
        if block.passed() {
            continue;
        }
        eprintln!();
        eprintln!(
            "  --- {}: {}, block at line {}{} ---",
            file.display(),
            comment.label(),
            block.line,
            block
                .section
                .as_deref()
                .map(|s| format!(" ({})", s))
                .unwrap_or_default()
        );
        if let Some(error) = &block.structural {
            eprintln!("  structural error: {}", error);
        }
        for failure in block.failures() {
            eprintln!("  statement {} (line {}):", failure.index, failure.line);
            for line in failure.input.lines() {
                eprintln!("      {}", line);
            }
            eprintln!("  expected:");
            print_indented(&failure.expected);
            eprintln!("  actual:");
            print_indented(&failure.actual);
            eprintln!("  diff:");
            print_diff(&failure.expected, &failure.actual, no_color);
        }
    }
}

fn print_indented(text: &str) {
    if text.is_empty() {
        eprintln!("      (no output)");
        return;
    }
    for line in text.lines() {
        eprintln!("      {}", line);
    }
}

/// Unified line diff of expected vs actual.
fn print_diff(expected: &str, actual: &str, no_color: bool) {
    let diff = TextDiff::from_lines(expected, actual);
    for change in diff.iter_all_changes() {
        let line = change.value().trim_end_matches('\n');
        match change.tag() {
            ChangeTag::Delete => {
                if no_color {
                    eprintln!("      -{}", line);
                } else {
                    eprintln!("      \x1b[31m-{}\x1b[0m", line);
                }
            }
            ChangeTag::Insert => {
                if no_color {
                    eprintln!("      +{}", line);
                } else {
                    eprintln!("      \x1b[32m+{}\x1b[0m", line);
                }
            }
            ChangeTag::Equal => {
                eprintln!("       {}", line);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Section listing
// ---------------------------------------------------------------------------

/// List the sections found under `path` with their block counts.
pub fn list_sections(path: &Path, syntax: &SessionSyntax) {
    let targets = if path.is_file() {
        vec![path.to_path_buf()]
    } else {
        discover(path)
    };
    if targets.is_empty() {
        eprintln!("no doctest files found in {}", path.display());
        return;
    }

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for target in &targets {
        let Ok(source) = std::fs::read_to_string(target) else {
            continue;
        };
        let Ok(suite) = parse_suite(target, source, 0, syntax) else {
            continue;
        };
        for comment in &suite.comments {
            for block in &comment.blocks {
                let key = block
                    .section
                    .clone()
                    .unwrap_or_else(|| "(none)".to_string());
                *counts.entry(key).or_default() += 1;
            }
        }
    }

    if counts.is_empty() {
        eprintln!("no example blocks found");
        return;
    }
    eprintln!("available sections:");
    for (section, count) in &counts {
        eprintln!("  {} ({} blocks)", section, count);
    }
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

fn pass_label(no_color: bool) -> &'static str {
    if no_color { "PASS" } else { "\x1b[32mPASS\x1b[0m" }
}

fn fail_label(no_color: bool) -> &'static str {
    if no_color { "FAIL" } else { "\x1b[31mFAIL\x1b[0m" }
}

fn bold(s: &str, no_color: bool) -> String {
    if no_color {
        s.to_string()
    } else {
        format!("\x1b[1m{}\x1b[0m", s)
    }
}
