mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
///
/// Every mutating quota operation is atomic: on error nothing is written.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Rule operations
    fn create_rule(&self, rule: &Rule) -> Result<()>;
    fn get_rule(&self, name: &str) -> Result<Option<Rule>>;
    fn list_rules(&self) -> Result<Vec<Rule>>;
    /// Updates only the provided fields and returns the stored rule.
    fn update_rule(
        &self,
        name: &str,
        limit: Option<i64>,
        subjects: Option<Vec<LimitSubject>>,
    ) -> Result<Rule>;
    /// Deletes the rule together with all of its group associations.
    fn delete_rule(&self, name: &str) -> Result<()>;

    // Group operations
    fn create_group(&self, name: &str) -> Result<Group>;
    fn get_group(&self, name: &str) -> Result<Option<Group>>;
    fn list_groups(&self) -> Result<Vec<Group>>;
    /// Fails with `GroupInUse` while the group has members.
    fn delete_group(&self, name: &str) -> Result<()>;
    fn add_rule_to_group(&self, group: &str, rule: &str) -> Result<()>;
    fn remove_rule_from_group(&self, group: &str, rule: &str) -> Result<()>;

    // Membership operations
    fn add_group_member(&self, group: &str, principal: Principal) -> Result<()>;
    fn remove_group_member(&self, group: &str, principal: Principal) -> Result<()>;
    fn list_group_members(&self, group: &str, cursor: i64, limit: i32) -> Result<Vec<GroupMember>>;
    fn list_principal_groups(&self, principal: Principal) -> Result<Vec<Group>>;
    /// Replaces the principal's group set. Unknown names fail the whole call.
    fn set_principal_groups(&self, principal: Principal, groups: &[String]) -> Result<()>;

    // Usage accounting
    fn get_used(&self, principal: Principal) -> Result<Used>;
    /// Groups, their deduplicated rules and usage, read in one transaction.
    /// Principals without any mapping get the existing `default_groups`.
    fn quota_snapshot(&self, principal: Principal, default_groups: &[String])
    -> Result<QuotaSnapshot>;
    fn list_attachments(
        &self,
        principal: Principal,
        cursor: i64,
        limit: i32,
    ) -> Result<Vec<AttachmentUsage>>;
    fn list_artifacts(&self, principal: Principal, cursor: i64, limit: i32)
    -> Result<Vec<ArtifactUsage>>;
    fn list_packages(&self, principal: Principal, cursor: i64, limit: i32)
    -> Result<Vec<PackageUsage>>;

    // Token operations
    fn create_token(&self, token: &Token) -> Result<()>;
    fn get_token_by_id(&self, id: &str) -> Result<Option<Token>>;
    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>>;
    fn list_tokens(&self, cursor: &str, limit: i32) -> Result<Vec<Token>>;
    fn delete_token(&self, id: &str) -> Result<bool>;
    fn update_token_last_used(&self, id: &str) -> Result<()>;

    // Admin token check
    fn has_admin_token(&self) -> Result<bool>;
}
