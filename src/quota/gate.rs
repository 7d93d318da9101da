//! Enforcement core, independent of any transport.
//!
//! `check` answers whether a principal may write to a subject; `enforce`
//! turns a denial into [`Error::QuotaExceeded`]. Store failures are returned
//! as errors and never read as "allowed".

use std::fmt;

use serde::Serialize;

use super::{AppliedLimit, Evaluation, Operation, evaluate};
use crate::config::QuotaConfig;
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{LimitSubject, Principal};

/// A rejected write: the first binding rule, plus every rule that denied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuotaExceeded {
    pub principal: Principal,
    pub subject: LimitSubject,
    pub rule_name: String,
    pub limit: i64,
    pub used: i64,
    pub violations: Vec<AppliedLimit>,
}

impl QuotaExceeded {
    fn from_evaluation(principal: Principal, evaluation: &Evaluation) -> Option<Self> {
        let binding = evaluation.binding()?;
        Some(Self {
            principal,
            subject: evaluation.subject,
            rule_name: binding.rule.clone(),
            limit: binding.limit,
            used: binding.used,
            violations: evaluation.violations(),
        })
    }
}

impl fmt::Display for QuotaExceeded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} bytes exceeded (current {})",
            self.rule_name, self.limit, self.used
        )
    }
}

/// Evaluates `subject` for `principal` against one consistent snapshot of
/// groups, rules and usage. Disabled quotas allow everything without
/// touching the store.
pub fn check(
    store: &dyn Store,
    config: &QuotaConfig,
    principal: Principal,
    subject: LimitSubject,
) -> Result<Evaluation> {
    if !config.enabled {
        return Ok(Evaluation::unrestricted(subject));
    }

    let snapshot = store.quota_snapshot(principal, &config.default_groups)?;
    Ok(evaluate(&snapshot.used, subject, &snapshot.rules))
}

pub fn enforce(
    store: &dyn Store,
    config: &QuotaConfig,
    principal: Principal,
    subject: LimitSubject,
) -> Result<Evaluation> {
    let evaluation = check(store, config, principal, subject)?;
    if evaluation.allowed {
        return Ok(evaluation);
    }

    Err(denial(principal, &evaluation))
}

fn denial(principal: Principal, evaluation: &Evaluation) -> Error {
    match QuotaExceeded::from_evaluation(principal, evaluation) {
        Some(exceeded) => {
            tracing::warn!(
                principal = %principal,
                subject = %evaluation.subject,
                rule = %exceeded.rule_name,
                limit = exceeded.limit,
                used = exceeded.used,
                "quota exceeded"
            );
            Error::QuotaExceeded(Box::new(exceeded))
        }
        None => Error::Internal(format!(
            "{} denied for {principal} without a binding rule",
            evaluation.subject
        )),
    }
}

/// Classifies `operation` and enforces its subject. Operations that write
/// nothing pass without a store round trip.
pub fn enforce_operation(
    store: &dyn Store,
    config: &QuotaConfig,
    principal: Principal,
    operation: &Operation,
) -> Result<Option<Evaluation>> {
    match operation.subject() {
        Some(subject) => enforce(store, config, principal, subject).map(Some),
        None => Ok(None),
    }
}
