use serde::{Deserialize, Serialize};

use super::{LimitSubject, Used};
use crate::error::{Error, Result};

/// Limit sentinel: the rule never denies.
pub const UNLIMITED: i64 = -1;

/// Limit sentinel: any write the rule applies to is denied.
pub const DENY: i64 = 0;

/// A named `(limit, subjects)` policy. `limit` is a byte ceiling, or one of
/// [`UNLIMITED`] / [`DENY`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub limit: i64,
    pub subjects: Vec<LimitSubject>,
}

impl Rule {
    /// Builds a validated rule. Duplicate subjects are collapsed.
    pub fn new(name: impl Into<String>, limit: i64, subjects: Vec<LimitSubject>) -> Result<Self> {
        let rule = Self {
            name: name.into(),
            limit,
            subjects: dedup_subjects(subjects),
        };
        rule.validate()?;
        Ok(rule)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidRuleName("rule name cannot be empty".to_string()));
        }
        validate_limit(self.limit)?;
        validate_subjects(&self.subjects)
    }

    /// Declared subjects that bind `for_subject`: the subject itself when
    /// declared directly, otherwise every declared subject covering it.
    #[must_use]
    pub fn matching_subjects(&self, for_subject: LimitSubject) -> Vec<LimitSubject> {
        if self.subjects.contains(&for_subject) {
            return vec![for_subject];
        }

        for_subject
            .indirect_covers()
            .iter()
            .copied()
            .filter(|cover| self.subjects.contains(cover))
            .collect()
    }

    /// Whether `bytes` of usage fits under this rule's limit.
    #[must_use]
    pub fn permits(&self, bytes: i64) -> bool {
        match self.limit {
            UNLIMITED => true,
            DENY => false,
            limit => bytes <= limit,
        }
    }

    /// Returns `(allowed, applied)`. A rule that does not cover `for_subject`
    /// is mute: `(true, false)`. When several declared subjects cover it, all
    /// of them must pass.
    #[must_use]
    pub fn evaluate(&self, used: &Used, for_subject: LimitSubject) -> (bool, bool) {
        let matching = self.matching_subjects(for_subject);
        if matching.is_empty() {
            return (true, false);
        }

        let allowed = matching
            .iter()
            .all(|subject| self.permits(used.for_subject(*subject)));
        (allowed, true)
    }
}

pub fn validate_limit(limit: i64) -> Result<()> {
    if limit < UNLIMITED {
        return Err(Error::InvalidLimit(format!(
            "limit must be -1 (unlimited), 0 (deny) or a positive byte count, got {limit}"
        )));
    }
    Ok(())
}

pub fn validate_subjects(subjects: &[LimitSubject]) -> Result<()> {
    if subjects.is_empty() {
        return Err(Error::InvalidLimit(
            "a rule needs at least one subject".to_string(),
        ));
    }
    Ok(())
}

#[must_use]
pub fn dedup_subjects(subjects: Vec<LimitSubject>) -> Vec<LimitSubject> {
    let mut seen = Vec::with_capacity(subjects.len());
    for subject in subjects {
        if !seen.contains(&subject) {
            seen.push(subject);
        }
    }
    seen
}
