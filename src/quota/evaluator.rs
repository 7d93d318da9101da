use serde::{Deserialize, Serialize};

use crate::types::{LimitSubject, Rule, Used};

/// One rule that covered the evaluated subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedLimit {
    pub rule: String,
    pub limit: i64,
    /// Declared subjects of the rule that matched, nearest first.
    pub subjects: Vec<LimitSubject>,
    /// Usage of the broadest matched subject.
    pub used: i64,
    pub allowed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub subject: LimitSubject,
    pub allowed: bool,
    pub applied: Vec<AppliedLimit>,
}

impl Evaluation {
    #[must_use]
    pub fn unrestricted(subject: LimitSubject) -> Self {
        Self {
            subject,
            allowed: true,
            applied: Vec::new(),
        }
    }

    /// The first applied rule that denied, if any.
    #[must_use]
    pub fn binding(&self) -> Option<&AppliedLimit> {
        self.applied.iter().find(|limit| !limit.allowed)
    }

    #[must_use]
    pub fn violations(&self) -> Vec<AppliedLimit> {
        self.applied
            .iter()
            .filter(|limit| !limit.allowed)
            .cloned()
            .collect()
    }
}

/// Checks `subject` against every rule. The result is allowed only when all
/// applied rules allow it; rules that do not cover `subject` are ignored.
/// Every applied rule is reported, including those after the first denial.
#[must_use]
pub fn evaluate(used: &Used, subject: LimitSubject, rules: &[Rule]) -> Evaluation {
    let mut evaluation = Evaluation::unrestricted(subject);

    for rule in rules {
        let (allowed, applied) = rule.evaluate(used, subject);
        if !applied {
            continue;
        }

        let subjects = rule.matching_subjects(subject);
        let used_bytes = subjects
            .iter()
            .map(|s| used.for_subject(*s))
            .max()
            .unwrap_or(0);

        evaluation.allowed &= allowed;
        evaluation.applied.push(AppliedLimit {
            rule: rule.name.clone(),
            limit: rule.limit,
            subjects,
            used: used_bytes,
            allowed,
        });
    }

    evaluation
}
