use crate::server::response::ApiError;
use crate::types::LimitSubject;

const MAX_GROUP_NAME_LEN: usize = 64;
const MAX_RULE_NAME_LEN: usize = 64;

fn is_valid_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'
}

fn validate_name(name: &str, entity: &str, max_len: usize) -> Result<(), String> {
    if name.is_empty() {
        return Err(format!("{entity} name cannot be empty"));
    }
    if name.len() > max_len {
        return Err(format!("{entity} name cannot exceed {max_len} characters"));
    }
    if !name.chars().all(is_valid_name_char) {
        return Err(format!(
            "{entity} name can only contain alphanumeric characters, hyphens, underscores, and periods"
        ));
    }
    if name.starts_with('-') || name.starts_with('.') {
        return Err(format!("{entity} name cannot start with a hyphen or period"));
    }
    Ok(())
}

pub fn validate_group_name(name: &str) -> Result<(), ApiError> {
    validate_name(name, "Group", MAX_GROUP_NAME_LEN).map_err(ApiError::bad_request)
}

pub fn validate_rule_name(name: &str) -> Result<(), ApiError> {
    validate_name(name, "Rule", MAX_RULE_NAME_LEN).map_err(ApiError::bad_request)
}

/// Parses canonical subject names; unknown names answer 422.
pub fn parse_subjects(subjects: &[String]) -> Result<Vec<LimitSubject>, ApiError> {
    LimitSubject::parse_many(subjects).map_err(ApiError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_names() {
        assert!(validate_group_name("free-tier").is_ok());
        assert!(validate_group_name("tier_2.eu").is_ok());
        assert!(validate_group_name("").is_err());
        assert!(validate_group_name("-lead").is_err());
        assert!(validate_group_name("has space").is_err());
        assert!(validate_group_name("a/b").is_err());
        assert!(validate_group_name(&"x".repeat(65)).is_err());
    }

    #[test]
    fn test_rule_names() {
        assert!(validate_rule_name("asset-size").is_ok());
        assert!(validate_rule_name("").is_err());
    }

    #[test]
    fn test_parse_subjects_unknown_is_unprocessable() {
        let err = parse_subjects(&["size:all".to_string(), "size:bogus".to_string()]).unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    }
}
