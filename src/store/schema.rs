pub const SCHEMA: &str = r#"
-- Rules are shared between groups and outlive them
CREATE TABLE IF NOT EXISTS quota_rule (
    name TEXT PRIMARY KEY,
    "limit" INTEGER NOT NULL,     -- -1 = unlimited, 0 = deny, >0 = bytes
    subjects TEXT NOT NULL        -- comma separated canonical subject names
);

CREATE TABLE IF NOT EXISTS quota_group (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS quota_group_rule (
    group_id INTEGER NOT NULL REFERENCES quota_group(id) ON DELETE CASCADE,
    rule_name TEXT NOT NULL REFERENCES quota_rule(name) ON DELETE CASCADE ON UPDATE CASCADE,
    PRIMARY KEY (group_id, rule_name)
);

-- Principal to group membership; id doubles as the listing cursor
CREATE TABLE IF NOT EXISTS quota_mapping (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL CHECK (kind IN ('user', 'org')),
    mapped_id INTEGER NOT NULL,
    quota_group_id INTEGER NOT NULL REFERENCES quota_group(id) ON DELETE CASCADE,
    UNIQUE (kind, mapped_id, quota_group_id)
);

CREATE INDEX IF NOT EXISTS idx_quota_mapping_principal ON quota_mapping(kind, mapped_id);

-- Tokens authenticate admins and principals
CREATE TABLE IF NOT EXISTS tokens (
    id TEXT PRIMARY KEY,
    token_hash TEXT NOT NULL,
    token_lookup TEXT NOT NULL UNIQUE,
    is_admin INTEGER NOT NULL DEFAULT 0,
    principal_kind TEXT CHECK (principal_kind IN ('user', 'org')),
    principal_id INTEGER,
    created_at TEXT DEFAULT (datetime('now')),
    expires_at TEXT,
    last_used_at TEXT
);

-- Forge tables. Owned and written by the forge; only read here.
CREATE TABLE IF NOT EXISTS repository (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    is_private INTEGER NOT NULL DEFAULT 0,
    git_size INTEGER NOT NULL DEFAULT 0,
    lfs_size INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_repository_owner ON repository(owner_id);

CREATE TABLE IF NOT EXISTS attachment (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    repo_id INTEGER NOT NULL DEFAULT 0,
    issue_id INTEGER NOT NULL DEFAULT 0,
    comment_id INTEGER NOT NULL DEFAULT 0,
    release_id INTEGER NOT NULL DEFAULT 0,   -- 0 = issue or comment attachment
    name TEXT NOT NULL,
    size INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_attachment_repo ON attachment(repo_id);

CREATE TABLE IF NOT EXISTS action_artifact (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    repo_id INTEGER NOT NULL,
    owner_id INTEGER NOT NULL DEFAULT 0,
    artifact_name TEXT NOT NULL,
    file_compressed_size INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_action_artifact_repo ON action_artifact(repo_id);

CREATE TABLE IF NOT EXISTS package (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner_id INTEGER NOT NULL,
    repo_id INTEGER NOT NULL DEFAULT 0,      -- 0 = attached to the owner only
    type TEXT NOT NULL,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS package_version (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    package_id INTEGER NOT NULL,
    version TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS package_file (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    version_id INTEGER NOT NULL,
    blob_id INTEGER NOT NULL,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS package_blob (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    size INTEGER NOT NULL DEFAULT 0
);
"#;
