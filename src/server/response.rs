use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::error::Error;
use crate::quota::QuotaExceeded;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    #[must_use]
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
        }
    }
}

/// Paginated response for list endpoints
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    pub data: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

impl<T: Serialize> PaginatedResponse<T> {
    #[must_use]
    pub fn new(data: Vec<T>, next_cursor: Option<String>, has_more: bool) -> Self {
        Self {
            data,
            next_cursor,
            has_more,
        }
    }
}

/// API error that converts to a proper HTTP response
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    /// Extra top-level fields merged into the error body.
    pub details: Option<Value>,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
        }
    }

    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    #[must_use]
    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// 413 naming the binding rule, the subject, and every violated rule.
    #[must_use]
    pub fn quota_exceeded(exceeded: &QuotaExceeded) -> Self {
        Self {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            message: exceeded.to_string(),
            details: Some(json!({
                "subject": exceeded.subject,
                "rule": exceeded.rule_name,
                "limit": exceeded.limit,
                "used": exceeded.used,
                "violations": exceeded.violations,
            })),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::RuleNotFound(_)
            | Error::GroupNotFound(_)
            | Error::UserNotInGroup { .. }
            | Error::RuleNotInGroup { .. } => Self::not_found(err.to_string()),
            Error::RuleAlreadyExists(_)
            | Error::GroupAlreadyExists(_)
            | Error::UserAlreadyInGroup { .. }
            | Error::RuleAlreadyInGroup { .. }
            | Error::GroupInUse(_) => Self::conflict(err.to_string()),
            Error::UnknownSubject(_) | Error::InvalidLimit(_) | Error::InvalidRuleName(_) => {
                Self::unprocessable(err.to_string())
            }
            Error::QuotaExceeded(exceeded) => Self::quota_exceeded(&exceeded),
            other => {
                tracing::error!("internal error: {other}");
                Self::internal("Internal server error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({ "data": null, "error": self.message });
        if let (Some(Value::Object(extra)), Some(object)) = (self.details, body.as_object_mut()) {
            object.extend(extra);
        }
        (self.status, Json(body)).into_response()
    }
}

/// Helper to paginate a slice and determine if there are more results
pub fn paginate<T, F>(items: Vec<T>, limit: usize, get_cursor: F) -> (Vec<T>, Option<String>, bool)
where
    F: Fn(&T) -> String,
{
    let has_more = items.len() > limit;
    let items: Vec<T> = items.into_iter().take(limit).collect();
    let next_cursor = if has_more {
        items.last().map(&get_cursor)
    } else {
        None
    };
    (items, next_cursor, has_more)
}

pub const DEFAULT_PAGE_SIZE: i32 = 50;

/// Parses a numeric row-id cursor; absent means "from the start".
pub fn parse_id_cursor(cursor: Option<&str>) -> Result<i64, ApiError> {
    match cursor {
        None | Some("") => Ok(0),
        Some(raw) => raw
            .parse()
            .map_err(|_| ApiError::bad_request("Invalid cursor")),
    }
}

/// Extension for Option types from store operations.
pub trait StoreOptionExt<T> {
    fn or_not_found(self, message: &'static str) -> Result<T, ApiError>;
}

impl<T> StoreOptionExt<T> for Option<T> {
    fn or_not_found(self, message: &'static str) -> Result<T, ApiError> {
        self.ok_or_else(|| ApiError::not_found(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LimitSubject, Principal};

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (Error::RuleNotFound("r".into()), StatusCode::NOT_FOUND),
            (Error::GroupNotFound("g".into()), StatusCode::NOT_FOUND),
            (
                Error::UserNotInGroup {
                    group: "g".into(),
                    principal: Principal::user(1),
                },
                StatusCode::NOT_FOUND,
            ),
            (Error::RuleAlreadyExists("r".into()), StatusCode::CONFLICT),
            (Error::GroupInUse("g".into()), StatusCode::CONFLICT),
            (
                Error::RuleAlreadyInGroup {
                    group: "g".into(),
                    rule: "r".into(),
                },
                StatusCode::CONFLICT,
            ),
            (Error::UnknownSubject("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (Error::InvalidLimit("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (Error::InvalidRuleName("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (
                Error::UnknownPrincipalKind("team".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (Error::Config("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (Error::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = ApiError::from(Error::Config("secret path".into()));
        assert_eq!(err.message, "Internal server error");
    }

    #[test]
    fn test_quota_exceeded_body() {
        let exceeded = QuotaExceeded {
            principal: Principal::user(1),
            subject: LimitSubject::SizeAssetsAll,
            rule_name: "asset-size".to_string(),
            limit: 15_728_640,
            used: 15_824_123,
            violations: Vec::new(),
        };
        let err = ApiError::from(Error::QuotaExceeded(Box::new(exceeded)));
        assert_eq!(err.status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            err.message,
            "asset-size: 15728640 bytes exceeded (current 15824123)"
        );
        let details = err.details.unwrap();
        assert_eq!(details["subject"], "size:assets:all");
        assert_eq!(details["rule"], "asset-size");
    }

    #[test]
    fn test_parse_id_cursor() {
        assert_eq!(parse_id_cursor(None).unwrap(), 0);
        assert_eq!(parse_id_cursor(Some("")).unwrap(), 0);
        assert_eq!(parse_id_cursor(Some("42")).unwrap(), 42);
        assert!(parse_id_cursor(Some("abc")).is_err());
    }

    #[test]
    fn test_paginate() {
        let (items, cursor, more) = paginate(vec![1, 2, 3], 2, |i| i.to_string());
        assert_eq!(items, vec![1, 2]);
        assert_eq!(cursor.as_deref(), Some("2"));
        assert!(more);
    }
}
