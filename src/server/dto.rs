use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::quota::Operation;
use crate::types::{Principal, Token};

#[derive(Debug, Deserialize)]
pub struct CreateRuleRequest {
    pub name: String,
    pub limit: i64,
    pub subjects: Vec<String>,
}

/// Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateRuleRequest {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub subjects: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SetGroupsRequest {
    pub groups: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckParams {
    pub subject: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuthorizeRequest {
    pub principal: Principal,
    pub operation: Operation,
}

#[derive(Debug, Deserialize)]
pub struct CreateTokenRequest {
    pub principal: Principal,
    #[serde(default)]
    pub expires_in_seconds: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub id: String,
    pub is_admin: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
}

impl From<Token> for TokenResponse {
    fn from(token: Token) -> Self {
        Self {
            id: token.id,
            is_admin: token.is_admin,
            principal: token.principal,
            created_at: token.created_at,
            expires_at: token.expires_at,
            last_used_at: token.last_used_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateTokenResponse {
    pub token: String,
    pub metadata: TokenResponse,
}
