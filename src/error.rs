use thiserror::Error;

use crate::quota::QuotaExceeded;
use crate::types::Principal;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("token lookup collision")]
    TokenLookupCollision,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid token format")]
    InvalidTokenFormat,

    #[error("rule already exists: {0}")]
    RuleAlreadyExists(String),

    #[error("rule not found: {0}")]
    RuleNotFound(String),

    #[error("group already exists: {0}")]
    GroupAlreadyExists(String),

    #[error("group not found: {0}")]
    GroupNotFound(String),

    #[error("{principal} already in group {group}")]
    UserAlreadyInGroup { group: String, principal: Principal },

    #[error("{principal} not in group {group}")]
    UserNotInGroup { group: String, principal: Principal },

    #[error("rule {rule} already in group {group}")]
    RuleAlreadyInGroup { group: String, rule: String },

    #[error("rule {rule} not in group {group}")]
    RuleNotInGroup { group: String, rule: String },

    #[error("unknown limit subject: {0}")]
    UnknownSubject(String),

    #[error("invalid limit: {0}")]
    InvalidLimit(String),

    #[error("invalid rule name: {0}")]
    InvalidRuleName(String),

    #[error("unknown principal kind: {0}")]
    UnknownPrincipalKind(String),

    #[error("group {0} still has members")]
    GroupInUse(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    QuotaExceeded(Box<QuotaExceeded>),
}

pub type Result<T> = std::result::Result<T, Error>;
