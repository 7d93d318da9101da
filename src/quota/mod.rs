//! Quota resolution: which rules bind a principal, and whether a write fits.

mod evaluator;
pub mod gate;
mod operation;

use std::collections::HashSet;

pub use evaluator::{AppliedLimit, Evaluation, evaluate};
pub use gate::QuotaExceeded;
pub use operation::{Operation, Visibility};

use crate::types::Rule;

/// Keeps the first occurrence of each rule name, preserving order.
#[must_use]
pub fn dedup_rules(rules: Vec<Rule>) -> Vec<Rule> {
    let mut seen = HashSet::new();
    rules
        .into_iter()
        .filter(|rule| seen.insert(rule.name.clone()))
        .collect()
}
