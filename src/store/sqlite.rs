use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::quota::dedup_rules;
use crate::types::rule::{dedup_subjects, validate_limit, validate_subjects};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows the embedding forge to write its own tables.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

impl ToSql for PrincipalKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for PrincipalKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: Error| FromSqlError::Other(Box::new(e)))
    }
}

fn encode_subjects(subjects: &[LimitSubject]) -> String {
    subjects
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

fn decode_subjects(encoded: &str) -> Result<Vec<LimitSubject>> {
    encoded
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(LimitSubject::parse)
        .collect()
}

fn rule_from_columns(name: String, limit: i64, subjects: &str) -> Result<Rule> {
    Ok(Rule {
        name,
        limit,
        subjects: decode_subjects(subjects)?,
    })
}

fn principal_from_columns(kind: Option<PrincipalKind>, id: Option<i64>) -> Option<Principal> {
    match (kind, id) {
        (Some(kind), Some(id)) => Some(Principal { kind, id }),
        _ => None,
    }
}

// Helpers below take a plain connection so they run the same inside or
// outside a transaction.

fn query_rule(conn: &Connection, name: &str) -> Result<Option<Rule>> {
    let row = conn
        .query_row(
            r#"SELECT name, "limit", subjects FROM quota_rule WHERE name = ?1"#,
            params![name],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                ))
            },
        )
        .optional()?;

    row.map(|(name, limit, subjects)| rule_from_columns(name, limit, &subjects))
        .transpose()
}

fn query_group_id(conn: &Connection, name: &str) -> Result<Option<i64>> {
    conn.query_row(
        "SELECT id FROM quota_group WHERE name = ?1",
        params![name],
        |row| row.get(0),
    )
    .optional()
    .map_err(Error::from)
}

fn require_group_id(conn: &Connection, name: &str) -> Result<i64> {
    query_group_id(conn, name)?.ok_or_else(|| Error::GroupNotFound(name.to_string()))
}

fn query_group_rules(conn: &Connection, group_id: i64) -> Result<Vec<Rule>> {
    let mut stmt = conn.prepare(
        r#"SELECT r.name, r."limit", r.subjects
           FROM quota_rule r
           INNER JOIN quota_group_rule gr ON gr.rule_name = r.name
           WHERE gr.group_id = ?1
           ORDER BY r.name"#,
    )?;

    let rows = stmt
        .query_map(params![group_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?, row.get::<_, String>(2)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(name, limit, subjects)| rule_from_columns(name, limit, &subjects))
        .collect()
}

fn load_group(conn: &Connection, id: i64, name: String) -> Result<Group> {
    Ok(Group {
        id,
        rules: query_group_rules(conn, id)?,
        name,
    })
}

fn query_principal_groups(conn: &Connection, principal: Principal) -> Result<Vec<Group>> {
    let mut stmt = conn.prepare(
        "SELECT g.id, g.name
         FROM quota_group g
         INNER JOIN quota_mapping m ON m.quota_group_id = g.id
         WHERE m.kind = ?1 AND m.mapped_id = ?2
         ORDER BY g.name",
    )?;

    let rows = stmt
        .query_map(params![principal.kind, principal.id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(id, name)| load_group(conn, id, name))
        .collect()
}

/// Forge owner ids share one id space for users and organizations, so only
/// the principal's id takes part in accounting.
fn query_used(conn: &Connection, principal: Principal) -> Result<Used> {
    let owner_id = principal.id;
    let mut used = Used::default();

    let (public, private, lfs): (i64, i64, i64) = conn.query_row(
        "SELECT
             COALESCE(SUM(CASE WHEN is_private = 0 THEN git_size ELSE 0 END), 0),
             COALESCE(SUM(CASE WHEN is_private != 0 THEN git_size ELSE 0 END), 0),
             COALESCE(SUM(lfs_size), 0)
         FROM repository WHERE owner_id = ?1",
        params![owner_id],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;
    used.git.code.public = public.max(0);
    used.git.code.private = private.max(0);
    used.git.lfs = lfs.max(0);

    let (issues, releases): (i64, i64) = conn.query_row(
        "SELECT
             COALESCE(SUM(CASE WHEN a.release_id = 0 THEN a.size ELSE 0 END), 0),
             COALESCE(SUM(CASE WHEN a.release_id != 0 THEN a.size ELSE 0 END), 0)
         FROM attachment a
         INNER JOIN repository r ON r.id = a.repo_id
         WHERE r.owner_id = ?1",
        params![owner_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;
    used.assets.attachments.issues = issues.max(0);
    used.assets.attachments.releases = releases.max(0);

    let artifacts: i64 = conn.query_row(
        "SELECT COALESCE(SUM(a.file_compressed_size), 0)
         FROM action_artifact a
         INNER JOIN repository r ON r.id = a.repo_id
         WHERE r.owner_id = ?1",
        params![owner_id],
        |row| row.get(0),
    )?;
    used.assets.artifacts = artifacts.max(0);

    let packages: i64 = conn.query_row(
        "SELECT COALESCE(SUM(b.size), 0)
         FROM package_blob b
         INNER JOIN package_file f ON f.blob_id = b.id
         INNER JOIN package_version v ON v.id = f.version_id
         INNER JOIN package p ON p.id = v.package_id
         WHERE (p.repo_id = 0 AND p.owner_id = ?1)
            OR p.repo_id IN (SELECT id FROM repository WHERE owner_id = ?1)",
        params![owner_id],
        |row| row.get(0),
    )?;
    used.assets.packages = packages.max(0);

    Ok(used)
}

fn token_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Token> {
    Ok(Token {
        id: row.get(0)?,
        token_hash: row.get(1)?,
        token_lookup: row.get(2)?,
        is_admin: row.get(3)?,
        principal: principal_from_columns(row.get(4)?, row.get(5)?),
        created_at: parse_datetime(&row.get::<_, String>(6)?),
        expires_at: row.get::<_, Option<String>>(7)?.map(|s| parse_datetime(&s)),
        last_used_at: row.get::<_, Option<String>>(8)?.map(|s| parse_datetime(&s)),
    })
}

const TOKEN_COLUMNS: &str = "id, token_hash, token_lookup, is_admin, principal_kind, principal_id, created_at, expires_at, last_used_at";

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // Rule operations

    fn create_rule(&self, rule: &Rule) -> Result<()> {
        rule.validate()?;
        let subjects = dedup_subjects(rule.subjects.clone());

        let result = self.conn().execute(
            r#"INSERT INTO quota_rule (name, "limit", subjects) VALUES (?1, ?2, ?3)"#,
            params![rule.name, rule.limit, encode_subjects(&subjects)],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(Error::RuleAlreadyExists(rule.name.clone()))
            }
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_rule(&self, name: &str) -> Result<Option<Rule>> {
        query_rule(&self.conn(), name)
    }

    fn list_rules(&self) -> Result<Vec<Rule>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare(r#"SELECT name, "limit", subjects FROM quota_rule ORDER BY name"#)?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?, row.get::<_, String>(2)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(name, limit, subjects)| rule_from_columns(name, limit, &subjects))
            .collect()
    }

    fn update_rule(
        &self,
        name: &str,
        limit: Option<i64>,
        subjects: Option<Vec<LimitSubject>>,
    ) -> Result<Rule> {
        if let Some(limit) = limit {
            validate_limit(limit)?;
        }
        let subjects = subjects.map(dedup_subjects);
        if let Some(subjects) = &subjects {
            validate_subjects(subjects)?;
        }

        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut rule = query_rule(&tx, name)?.ok_or_else(|| Error::RuleNotFound(name.to_string()))?;
        if let Some(limit) = limit {
            rule.limit = limit;
        }
        if let Some(subjects) = subjects {
            rule.subjects = subjects;
        }

        tx.execute(
            r#"UPDATE quota_rule SET "limit" = ?1, subjects = ?2 WHERE name = ?3"#,
            params![rule.limit, encode_subjects(&rule.subjects), rule.name],
        )?;
        tx.commit()?;

        Ok(rule)
    }

    fn delete_rule(&self, name: &str) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            "DELETE FROM quota_group_rule WHERE rule_name = ?1",
            params![name],
        )?;
        let rows = tx.execute("DELETE FROM quota_rule WHERE name = ?1", params![name])?;
        if rows == 0 {
            return Err(Error::RuleNotFound(name.to_string()));
        }

        tx.commit()?;
        Ok(())
    }

    // Group operations

    fn create_group(&self, name: &str) -> Result<Group> {
        let conn = self.conn();
        let result = conn.execute("INSERT INTO quota_group (name) VALUES (?1)", params![name]);

        match result {
            Ok(_) => Ok(Group {
                id: conn.last_insert_rowid(),
                name: name.to_string(),
                rules: Vec::new(),
            }),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(Error::GroupAlreadyExists(name.to_string()))
            }
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_group(&self, name: &str) -> Result<Option<Group>> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let group = match query_group_id(&tx, name)? {
            Some(id) => Some(load_group(&tx, id, name.to_string())?),
            None => None,
        };
        tx.commit()?;
        Ok(group)
    }

    fn list_groups(&self) -> Result<Vec<Group>> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let rows = {
            let mut stmt = tx.prepare("SELECT id, name FROM quota_group ORDER BY name")?;
            let rows = stmt
                .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        };

        let groups = rows
            .into_iter()
            .map(|(id, name)| load_group(&tx, id, name))
            .collect::<Result<Vec<_>>>()?;
        tx.commit()?;
        Ok(groups)
    }

    fn delete_group(&self, name: &str) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let group_id = require_group_id(&tx, name)?;
        let members: i64 = tx.query_row(
            "SELECT COUNT(*) FROM quota_mapping WHERE quota_group_id = ?1",
            params![group_id],
            |row| row.get(0),
        )?;
        if members > 0 {
            return Err(Error::GroupInUse(name.to_string()));
        }

        tx.execute("DELETE FROM quota_group WHERE id = ?1", params![group_id])?;
        tx.commit()?;
        Ok(())
    }

    fn add_rule_to_group(&self, group: &str, rule: &str) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let group_id = require_group_id(&tx, group)?;
        if query_rule(&tx, rule)?.is_none() {
            return Err(Error::RuleNotFound(rule.to_string()));
        }

        let rows = tx.execute(
            "INSERT OR IGNORE INTO quota_group_rule (group_id, rule_name) VALUES (?1, ?2)",
            params![group_id, rule],
        )?;
        if rows == 0 {
            return Err(Error::RuleAlreadyInGroup {
                group: group.to_string(),
                rule: rule.to_string(),
            });
        }

        tx.commit()?;
        Ok(())
    }

    fn remove_rule_from_group(&self, group: &str, rule: &str) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let group_id = require_group_id(&tx, group)?;
        let rows = tx.execute(
            "DELETE FROM quota_group_rule WHERE group_id = ?1 AND rule_name = ?2",
            params![group_id, rule],
        )?;
        if rows == 0 {
            return Err(Error::RuleNotInGroup {
                group: group.to_string(),
                rule: rule.to_string(),
            });
        }

        tx.commit()?;
        Ok(())
    }

    // Membership operations

    fn add_group_member(&self, group: &str, principal: Principal) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let group_id = require_group_id(&tx, group)?;
        let rows = tx.execute(
            "INSERT OR IGNORE INTO quota_mapping (kind, mapped_id, quota_group_id) VALUES (?1, ?2, ?3)",
            params![principal.kind, principal.id, group_id],
        )?;
        if rows == 0 {
            return Err(Error::UserAlreadyInGroup {
                group: group.to_string(),
                principal,
            });
        }

        tx.commit()?;
        Ok(())
    }

    fn remove_group_member(&self, group: &str, principal: Principal) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let group_id = require_group_id(&tx, group)?;
        let rows = tx.execute(
            "DELETE FROM quota_mapping WHERE kind = ?1 AND mapped_id = ?2 AND quota_group_id = ?3",
            params![principal.kind, principal.id, group_id],
        )?;
        if rows == 0 {
            return Err(Error::UserNotInGroup {
                group: group.to_string(),
                principal,
            });
        }

        tx.commit()?;
        Ok(())
    }

    fn list_group_members(&self, group: &str, cursor: i64, limit: i32) -> Result<Vec<GroupMember>> {
        let conn = self.conn();
        let group_id = require_group_id(&conn, group)?;

        let mut stmt = conn.prepare(
            "SELECT id, kind, mapped_id FROM quota_mapping
             WHERE quota_group_id = ?1 AND id > ?2
             ORDER BY id LIMIT ?3",
        )?;

        let rows = stmt.query_map(params![group_id, cursor, limit], |row| {
            Ok(GroupMember {
                id: row.get(0)?,
                principal: Principal {
                    kind: row.get(1)?,
                    id: row.get(2)?,
                },
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_principal_groups(&self, principal: Principal) -> Result<Vec<Group>> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let groups = query_principal_groups(&tx, principal)?;
        tx.commit()?;
        Ok(groups)
    }

    fn set_principal_groups(&self, principal: Principal, groups: &[String]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut group_ids = Vec::with_capacity(groups.len());
        for name in groups {
            let id = require_group_id(&tx, name)?;
            if !group_ids.contains(&id) {
                group_ids.push(id);
            }
        }

        tx.execute(
            "DELETE FROM quota_mapping WHERE kind = ?1 AND mapped_id = ?2",
            params![principal.kind, principal.id],
        )?;
        for group_id in group_ids {
            tx.execute(
                "INSERT INTO quota_mapping (kind, mapped_id, quota_group_id) VALUES (?1, ?2, ?3)",
                params![principal.kind, principal.id, group_id],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    // Usage accounting

    fn get_used(&self, principal: Principal) -> Result<Used> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let used = query_used(&tx, principal)?;
        tx.commit()?;
        Ok(used)
    }

    fn quota_snapshot(
        &self,
        principal: Principal,
        default_groups: &[String],
    ) -> Result<QuotaSnapshot> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let mut groups = query_principal_groups(&tx, principal)?;
        if groups.is_empty() {
            for name in default_groups {
                if groups.iter().any(|g| &g.name == name) {
                    continue;
                }
                match query_group_id(&tx, name)? {
                    Some(id) => groups.push(load_group(&tx, id, name.clone())?),
                    None => tracing::debug!("default quota group {} does not exist", name),
                }
            }
        }

        let rules = dedup_rules(groups.iter().flat_map(|g| g.rules.clone()).collect());
        let used = query_used(&tx, principal)?;
        tx.commit()?;

        Ok(QuotaSnapshot {
            used,
            groups,
            rules,
        })
    }

    fn list_attachments(
        &self,
        principal: Principal,
        cursor: i64,
        limit: i32,
    ) -> Result<Vec<AttachmentUsage>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT a.id, a.repo_id, a.name, a.size, a.issue_id, a.release_id
             FROM attachment a
             INNER JOIN repository r ON r.id = a.repo_id
             WHERE r.owner_id = ?1 AND a.id > ?2
             ORDER BY a.id LIMIT ?3",
        )?;

        let rows = stmt.query_map(params![principal.id, cursor, limit], |row| {
            let issue_id: i64 = row.get(4)?;
            let release_id: i64 = row.get(5)?;
            Ok(AttachmentUsage {
                id: row.get(0)?,
                repo_id: row.get(1)?,
                name: row.get(2)?,
                size: row.get(3)?,
                issue_id: (release_id == 0 && issue_id != 0).then_some(issue_id),
                release_id: (release_id != 0).then_some(release_id),
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_artifacts(
        &self,
        principal: Principal,
        cursor: i64,
        limit: i32,
    ) -> Result<Vec<ArtifactUsage>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT a.id, a.repo_id, a.artifact_name, a.file_compressed_size
             FROM action_artifact a
             INNER JOIN repository r ON r.id = a.repo_id
             WHERE r.owner_id = ?1 AND a.id > ?2
             ORDER BY a.id LIMIT ?3",
        )?;

        let rows = stmt.query_map(params![principal.id, cursor, limit], |row| {
            Ok(ArtifactUsage {
                id: row.get(0)?,
                repo_id: row.get(1)?,
                name: row.get(2)?,
                size: row.get(3)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_packages(
        &self,
        principal: Principal,
        cursor: i64,
        limit: i32,
    ) -> Result<Vec<PackageUsage>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT v.id, p.type, p.name, v.version, COALESCE(SUM(b.size), 0)
             FROM package_version v
             INNER JOIN package p ON p.id = v.package_id
             LEFT JOIN package_file f ON f.version_id = v.id
             LEFT JOIN package_blob b ON b.id = f.blob_id
             WHERE ((p.repo_id = 0 AND p.owner_id = ?1)
                    OR p.repo_id IN (SELECT id FROM repository WHERE owner_id = ?1))
               AND v.id > ?2
             GROUP BY v.id
             ORDER BY v.id LIMIT ?3",
        )?;

        let rows = stmt.query_map(params![principal.id, cursor, limit], |row| {
            Ok(PackageUsage {
                id: row.get(0)?,
                package_type: row.get(1)?,
                name: row.get(2)?,
                version: row.get(3)?,
                size: row.get(4)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Token operations

    fn create_token(&self, token: &Token) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO tokens (id, token_hash, token_lookup, is_admin, principal_kind, principal_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                token.id,
                token.token_hash,
                token.token_lookup,
                token.is_admin,
                token.principal.map(|p| p.kind),
                token.principal.map(|p| p.id),
                format_datetime(&token.created_at),
                token.expires_at.as_ref().map(format_datetime),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(Error::TokenLookupCollision)
            }
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_token_by_id(&self, id: &str) -> Result<Option<Token>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {TOKEN_COLUMNS} FROM tokens WHERE id = ?1"),
            params![id],
            token_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {TOKEN_COLUMNS} FROM tokens WHERE token_lookup = ?1"),
            params![lookup],
            token_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_tokens(&self, cursor: &str, limit: i32) -> Result<Vec<Token>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TOKEN_COLUMNS} FROM tokens WHERE id > ?1 ORDER BY id LIMIT ?2"
        ))?;

        let rows = stmt.query_map(params![cursor, limit], token_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_token(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM tokens WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn update_token_last_used(&self, id: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE tokens SET last_used_at = ?1 WHERE id = ?2",
            params![format_datetime(&Utc::now()), id],
        )?;
        Ok(())
    }

    fn has_admin_token(&self) -> Result<bool> {
        let conn = self.conn();
        let count: i32 = conn.query_row(
            "SELECT COUNT(*) FROM tokens WHERE is_admin = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}
