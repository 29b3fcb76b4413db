//! Control Flow Helpers
//!
//! Label allocation for branch and loop patterns.

use rustc_hash::FxHashMap;

/// Hands out labels that are unique within one compilation.
///
/// Each prefix has its own counter starting at zero, so labels read
/// `and_0`, `and_1`, `join_0`, ...
#[derive(Debug, Default)]
pub struct LabelAllocator {
    counters: FxHashMap<&'static str, usize>,
}

impl LabelAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next label for `prefix`
    pub fn fresh(&mut self, prefix: &'static str) -> String {
        let counter = self.counters.entry(prefix).or_insert(0);
        let label = format!("{}_{}", prefix, counter);
        *counter += 1;
        label
    }

    /// Number of labels handed out so far
    pub fn allocated(&self) -> usize {
        self.counters.values().sum()
    }
}
