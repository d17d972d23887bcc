pub mod ast;
pub mod context;
pub mod evaluator;
pub mod fault;
pub mod matcher;
pub mod parse;
pub mod value;
pub mod verify;

pub use context::EvaluationContext;
pub use evaluator::{Evaluator, Interpreter};
pub use fault::{FailureReport, Fault};
pub use value::Value;
pub use verify::{
    BlockReport, BlockState, CommentReport, StatementReport, SuiteReport, verify_block,
    verify_comment, verify_suite,
};
