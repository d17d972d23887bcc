use doctest::Suite;
use doctest::comment::DocComment;
use doctest::parser::StructuralError;
use doctest::session::ExampleBlock;

use crate::evaluator::Evaluator;
use crate::matcher;

/// Verification state of one example block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    Ready,
    Running,
    Passed,
    Failed,
}

/// The outcome of one statement: what ran, what was expected, what appeared.
/// A failed entry is the verification failure for that statement.
#[derive(Debug, Clone)]
pub struct StatementReport {
    /// Position of the statement within its block.
    pub index: usize,
    /// 1-based source line of the statement's prompt.
    pub line: usize,
    pub input: String,
    pub expected: String,
    pub actual: String,
    pub passed: bool,
}

/// The outcome of one block after all its statements ran.
#[derive(Debug, Clone)]
pub struct BlockReport {
    pub section: Option<String>,
    /// 1-based source line of the block's first prompt.
    pub line: usize,
    pub state: BlockState,
    pub statements: Vec<StatementReport>,
    /// The structural error that aborted extraction, if any.
    pub structural: Option<StructuralError>,
}

impl BlockReport {
    pub fn passed(&self) -> bool {
        self.state == BlockState::Passed
    }

    /// The statements that mismatched, in order.
    pub fn failures(&self) -> impl Iterator<Item = &StatementReport> {
        self.statements.iter().filter(|s| !s.passed)
    }
}

/// The outcome of one doc comment.
#[derive(Debug, Clone)]
pub struct CommentReport {
    pub name: Option<String>,
    /// 1-based source line where the comment body starts.
    pub line: usize,
    pub blocks: Vec<BlockReport>,
}

impl CommentReport {
    pub fn passed(&self) -> bool {
        self.blocks.iter().all(BlockReport::passed)
    }

    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or("<doc>")
    }
}

/// The outcome of a whole suite.
#[derive(Debug, Clone, Default)]
pub struct SuiteReport {
    pub comments: Vec<CommentReport>,
}

impl SuiteReport {
    pub fn passed(&self) -> bool {
        self.comments.iter().all(CommentReport::passed)
    }

    pub fn block_counts(&self) -> (usize, usize) {
        let mut passed = 0;
        let mut failed = 0;
        for comment in &self.comments {
            for block in &comment.blocks {
                if block.passed() {
                    passed += 1;
                } else {
                    failed += 1;
                }
            }
        }
        (passed, failed)
    }
}

/// Run one block against an evaluator.
///
/// The caller supplies a freshly constructed evaluator: the evaluator's
/// state is the block's evaluation context and must not be reused across
/// blocks. A mismatch marks the block failed but the remaining statements
/// still run, so one report shows every deviation in the block. A block
/// whose extraction aborted starts out failed; its surviving statements are
/// run the same way.
pub fn verify_block(block: &ExampleBlock, evaluator: &mut dyn Evaluator) -> BlockReport {
    let mut state = match block.error {
        Some(_) => BlockState::Failed,
        None => BlockState::Ready,
    };
    let mut statements = Vec::with_capacity(block.statements.len());

    for (index, stmt) in block.statements.iter().enumerate() {
        if state == BlockState::Ready {
            state = BlockState::Running;
        }

        let mut printed = String::new();
        let (actual, passed) = match evaluator.eval(&stmt.input, &mut printed) {
            Ok(()) => {
                let ok = matcher::output_matches(&stmt.expected, &printed);
                (printed, ok)
            }
            Err(report) => {
                let ok = matcher::failure_matches(&stmt.expected, &printed, &report);
                let mut actual = printed;
                actual.push_str(&report.render());
                (actual, ok)
            }
        };

        if !passed {
            state = BlockState::Failed;
        }
        statements.push(StatementReport {
            index,
            line: stmt.line,
            input: stmt.input.clone(),
            expected: stmt.expected.clone(),
            actual,
            passed,
        });
    }

    if matches!(state, BlockState::Ready | BlockState::Running) {
        state = BlockState::Passed;
    }

    BlockReport {
        section: block.section.clone(),
        line: block.line,
        state,
        statements,
        structural: block.error.clone(),
    }
}

/// Verify every block of a comment, each against a fresh evaluator.
pub fn verify_comment<E, F>(comment: &DocComment, mut fresh: F) -> CommentReport
where
    E: Evaluator,
    F: FnMut() -> E,
{
    let blocks = comment
        .blocks
        .iter()
        .map(|block| verify_block(block, &mut fresh()))
        .collect();
    CommentReport {
        name: comment.name.clone(),
        line: comment.line,
        blocks,
    }
}

/// Verify every comment of a suite.
pub fn verify_suite<E, F>(suite: &Suite, mut fresh: F) -> SuiteReport
where
    E: Evaluator,
    F: FnMut() -> E,
{
    let comments = suite
        .comments
        .iter()
        .map(|comment| verify_comment(comment, &mut fresh))
        .collect();
    SuiteReport { comments }
}
