//! # Core Access Crate
//!
//! This crate is the central authority for identity and authentication (AuthN)
//! in the `valorie` application: account records, password hashing and the
//! validation rules applied at registration.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::info;
use turso::{Database, Error as TursoError, Row, Value, params};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, username, password_hash, created_at, last_login";

#[derive(Error, Debug)]
pub enum CoreAccessError {
    #[error("Database error: {0}")]
    Database(#[from] TursoError),
    #[error("Email already registered")]
    EmailTaken,
    #[error("Username already taken")]
    UsernameTaken,
    #[error("Failed to create or find user for identifier: {0}")]
    UserPersistenceFailed(String),
    #[error("{0}")]
    Validation(String),
}

/// Represents a registered account.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    /// `user_` followed by 12 random characters.
    pub id: String,
    pub email: String,
    pub username: String,
    /// `salt$hash`, see [`hash_password`].
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// RFC 3339 timestamp of registration.
    pub created_at: String,
    pub last_login: Option<String>,
}

impl TryFrom<&Row> for User {
    type Error = CoreAccessError;

    fn try_from(row: &Row) -> std::result::Result<Self, Self::Error> {
        let last_login = match row.get_value(5)? {
            Value::Text(s) => Some(s),
            _ => None,
        };
        Ok(User {
            id: row.get(0)?,
            email: row.get(1)?,
            username: row.get(2)?,
            password_hash: row.get(3)?,
            created_at: row.get(4)?,
            last_login,
        })
    }
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn sha256_hex(input: &str) -> String {
    format!("{:x}", Sha256::digest(input.as_bytes()))
}

/// Hashes a password as `<32 hex salt>$<sha256(salt + password)>`.
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    let digest = sha256_hex(&format!("{salt}{password}"));
    format!("{salt}${digest}")
}

/// Checks a password against a stored `salt$hash`. Malformed hashes never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, expected)) if !expected.contains('$') => {
            sha256_hex(&format!("{salt}{password}")) == expected
        }
        _ => false,
    }
}

/// Minimal shape check: one `@`, a non-empty local part and a dotted domain.
pub fn validate_email(email: &str) -> Result<(), CoreAccessError> {
    let invalid = || CoreAccessError::Validation("value is not a valid email address".into());
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    let labels: Vec<&str> = domain.split('.').collect();
    if local.is_empty() || domain.contains('@') || labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(invalid());
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), CoreAccessError> {
    let len = username.chars().count();
    if len < 3 {
        return Err(CoreAccessError::Validation(
            "Username must be at least 3 characters long".into(),
        ));
    }
    if len > 30 {
        return Err(CoreAccessError::Validation(
            "Username must be less than 30 characters".into(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(CoreAccessError::Validation(
            "Username can only contain letters, numbers, hyphens and underscores".into(),
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), CoreAccessError> {
    if password.chars().count() < 6 {
        return Err(CoreAccessError::Validation(
            "Password must be at least 6 characters long".into(),
        ));
    }
    Ok(())
}

async fn find_user_by(
    db: &Database,
    column: &str,
    value: &str,
) -> Result<Option<User>, CoreAccessError> {
    let conn = db.connect()?;
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?");
    let mut rows = conn.query(&sql, params![value]).await?;
    match rows.next().await? {
        Some(row) => Ok(Some(User::try_from(&row)?)),
        None => Ok(None),
    }
}

pub async fn find_user_by_id(db: &Database, id: &str) -> Result<Option<User>, CoreAccessError> {
    find_user_by(db, "id", id).await
}

pub async fn find_user_by_email(
    db: &Database,
    email: &str,
) -> Result<Option<User>, CoreAccessError> {
    find_user_by(db, "email", email).await
}

pub async fn find_user_by_username(
    db: &Database,
    username: &str,
) -> Result<Option<User>, CoreAccessError> {
    find_user_by(db, "username", username).await
}

pub async fn is_email_available(db: &Database, email: &str) -> Result<bool, CoreAccessError> {
    Ok(find_user_by_email(db, email).await?.is_none())
}

pub async fn is_username_available(
    db: &Database,
    username: &str,
) -> Result<bool, CoreAccessError> {
    Ok(find_user_by_username(db, username).await?.is_none())
}

/// Registers a new account after validating every field.
///
/// Fails with [`CoreAccessError::EmailTaken`] or
/// [`CoreAccessError::UsernameTaken`] when either is already in use.
pub async fn create_user(
    db: &Database,
    email: &str,
    username: &str,
    password: &str,
) -> Result<User, CoreAccessError> {
    validate_email(email)?;
    validate_username(username)?;
    validate_password(password)?;

    if !is_email_available(db, email).await? {
        return Err(CoreAccessError::EmailTaken);
    }
    if !is_username_available(db, username).await? {
        return Err(CoreAccessError::UsernameTaken);
    }

    let hex = Uuid::new_v4().simple().to_string();
    let user_id = format!("user_{}", &hex[..12]);
    let conn = db.connect()?;
    conn.execute(
        "INSERT INTO users (id, email, username, password_hash, created_at) VALUES (?, ?, ?, ?, ?)",
        params![
            user_id.clone(),
            email,
            username,
            hash_password(password),
            now_timestamp()
        ],
    )
    .await?;
    info!(%user_id, "User registered.");

    let user = find_user_by_id(db, &user_id).await?;
    user.ok_or(CoreAccessError::UserPersistenceFailed(user_id))
}

/// Verifies credentials and stamps `last_login`. Returns `None` on any mismatch.
pub async fn authenticate(
    db: &Database,
    email: &str,
    password: &str,
) -> Result<Option<User>, CoreAccessError> {
    let Some(mut user) = find_user_by_email(db, email).await? else {
        return Ok(None);
    };
    if !verify_password(password, &user.password_hash) {
        return Ok(None);
    }

    let now = now_timestamp();
    let conn = db.connect()?;
    conn.execute(
        "UPDATE users SET last_login = ? WHERE id = ?",
        params![now.clone(), user.id.clone()],
    )
    .await?;
    user.last_login = Some(now);
    Ok(Some(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use valorie::providers::db::sqlite::SqliteProvider;

    async fn db() -> Database {
        let provider = SqliteProvider::new(":memory:").await.unwrap();
        provider.initialize_schema().await.unwrap();
        provider.db
    }

    #[test]
    fn test_password_hash_round_trip() {
        let stored = hash_password("hunter22");
        let (salt, digest) = stored.split_once('$').unwrap();
        assert_eq!(salt.len(), 32);
        assert_eq!(digest.len(), 64);
        assert!(verify_password("hunter22", &stored));
        assert!(!verify_password("hunter23", &stored));
        assert_ne!(hash_password("hunter22"), stored, "salts must differ");
    }

    #[test]
    fn test_verify_rejects_malformed_hashes() {
        assert!(!verify_password("x", "no-separator"));
        assert!(!verify_password("x", "a$b$c"));
    }

    #[test]
    fn test_known_digest() {
        let stored = format!("salt${}", sha256_hex("saltpassword"));
        assert!(verify_password("password", &stored));
    }

    #[test]
    fn test_validation_rules() {
        assert!(validate_email("jo@example.com").is_ok());
        assert!(validate_email("jo@localhost").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("jo @example.com").is_err());

        assert!(validate_username("jo_d-1").is_ok());
        assert!(validate_username("jo").is_err());
        assert!(validate_username(&"a".repeat(31)).is_err());
        assert!(validate_username("bad name").is_err());

        assert!(validate_password("123456").is_ok());
        assert!(validate_password("12345").is_err());
    }

    #[tokio::test]
    async fn test_create_and_authenticate_flow() {
        let db = db().await;

        let user = create_user(&db, "jo@example.com", "jo_doe", "secret1")
            .await
            .unwrap();
        assert!(user.id.starts_with("user_"));
        assert_eq!(user.id.len(), 17);
        assert_eq!(user.last_login, None);

        assert!(!is_email_available(&db, "jo@example.com").await.unwrap());
        assert!(is_username_available(&db, "someone").await.unwrap());

        assert!(matches!(
            create_user(&db, "jo@example.com", "other", "secret1").await,
            Err(CoreAccessError::EmailTaken)
        ));
        assert!(matches!(
            create_user(&db, "new@example.com", "jo_doe", "secret1").await,
            Err(CoreAccessError::UsernameTaken)
        ));

        assert!(authenticate(&db, "jo@example.com", "wrong!").await.unwrap().is_none());
        assert!(authenticate(&db, "nobody@example.com", "secret1").await.unwrap().is_none());

        let logged_in = authenticate(&db, "jo@example.com", "secret1")
            .await
            .unwrap()
            .unwrap();
        assert!(logged_in.last_login.is_some());
        let reloaded = find_user_by_id(&db, &user.id).await.unwrap().unwrap();
        assert_eq!(reloaded.last_login, logged_in.last_login);
    }

    #[test]
    fn test_password_hash_is_not_serialized() {
        let user = User {
            id: "user_x".into(),
            email: "a@b.co".into(),
            username: "abc".into(),
            password_hash: "s$h".into(),
            created_at: "2024-01-01T00:00:00Z".into(),
            last_login: None,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
    }
}
