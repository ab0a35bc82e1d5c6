//! # SQLite Specific SQL Queries
//!
//! This module centralizes SQL strings for the SQLite provider and the
//! repositories built on top of it.

/// Accounts that can own frameworks.
pub const CREATE_USERS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL,
        last_login TEXT
    );
";

/// Uploaded or pasted source material. Only metadata is stored, never the bytes.
pub const CREATE_MATERIALS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS materials (
        id TEXT PRIMARY KEY,
        type TEXT NOT NULL,
        status TEXT NOT NULL,
        metadata_json TEXT NOT NULL,
        filename TEXT,
        mime TEXT,
        sizebyte INTEGER NOT NULL DEFAULT 0,
        owner_id TEXT,
        created_at TEXT NOT NULL
    );
";

/// Generated frameworks. JSON sections are stored as serialized text.
pub const CREATE_FRAMEWORKS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS frameworks (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        version TEXT NOT NULL,
        creator_id TEXT NOT NULL,
        metadata_json TEXT NOT NULL,
        steps_json TEXT NOT NULL,
        artefacts_json TEXT NOT NULL,
        risks_json TEXT NOT NULL,
        escalation_json TEXT NOT NULL,
        raw_framework_json TEXT NOT NULL,
        raw_metadata_json TEXT NOT NULL,
        pov TEXT,
        family TEXT NOT NULL DEFAULT 'Other',
        confidence REAL NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
";

pub const CREATE_FRAMEWORKS_CREATOR_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_frameworks_creator ON frameworks (creator_id);";

/// Every statement needed for a fresh database, in dependency order.
pub const ALL_TABLE_CREATION_SQL: &[&str] = &[
    CREATE_USERS_TABLE,
    CREATE_MATERIALS_TABLE,
    CREATE_FRAMEWORKS_TABLE,
    CREATE_FRAMEWORKS_CREATOR_INDEX,
];

pub const FRAMEWORK_COLUMNS: &str = "id, title, version, creator_id, metadata_json, steps_json, artefacts_json, risks_json, escalation_json, raw_framework_json, raw_metadata_json, pov, family, confidence, created_at, updated_at";

pub const INSERT_FRAMEWORK: &str = "
    INSERT INTO frameworks (id, title, version, creator_id, metadata_json, steps_json, artefacts_json, risks_json, escalation_json, raw_framework_json, raw_metadata_json, pov, family, confidence, created_at, updated_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16);
";

pub fn select_frameworks_by_creator() -> String {
    format!(
        "SELECT {FRAMEWORK_COLUMNS} FROM frameworks WHERE creator_id = ?1 ORDER BY created_at DESC, rowid DESC;"
    )
}

pub fn select_framework_for_owner() -> String {
    format!("SELECT {FRAMEWORK_COLUMNS} FROM frameworks WHERE id = ?1 AND creator_id = ?2;")
}

pub const UPDATE_FRAMEWORK: &str = "
    UPDATE frameworks
    SET title = ?1, version = ?2, metadata_json = ?3, steps_json = ?4, artefacts_json = ?5,
        risks_json = ?6, escalation_json = ?7, updated_at = ?8
    WHERE id = ?9 AND creator_id = ?10;
";

pub const DELETE_FRAMEWORK: &str = "DELETE FROM frameworks WHERE id = ?1 AND creator_id = ?2;";

pub const INSERT_MATERIAL: &str = "
    INSERT INTO materials (id, type, status, metadata_json, filename, mime, sizebyte, owner_id, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);
";

pub const SELECT_MATERIAL: &str = "
    SELECT id, type, status, metadata_json, filename, mime, sizebyte, owner_id, created_at
    FROM materials WHERE id = ?1;
";
