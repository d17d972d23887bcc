use std::collections::HashMap;

use crate::value::Value;

/// The binding environment of one example block.
///
/// A context is constructed fresh when a block starts and dropped when the
/// block finishes: it is an owned value of the block's execution, never a
/// shared singleton, so names bound in one block are invisible to every
/// other block. Within a block, later statements see bindings made by
/// earlier ones.
#[derive(Debug, Default)]
pub struct EvaluationContext {
    bindings: HashMap<String, Value>,
}

impl EvaluationContext {
    pub fn new() -> Self {
        EvaluationContext {
            bindings: HashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.bindings.insert(name.to_string(), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }
}
