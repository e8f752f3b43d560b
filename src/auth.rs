// Admin credentials and sessions
//
// Credential verification and session issuance both happen inside this
// process, next to the store. Clients only ever hold an opaque token; every
// gated request is checked against the sessions table, so a client-side
// "logged in" flag is nothing more than a UI hint.

use anyhow::{bail, Result};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Default session lifetime in hours.
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 12;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub username: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Salted password hash. The username acts as the salt so equal passwords
/// for different admins never share a hash.
fn hash_password(username: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}", username, password));
    format!("{:x}", hasher.finalize())
}

/// Create an admin account. Fails if the username is taken.
pub fn create_admin(conn: &Connection, username: &str, password: &str) -> Result<()> {
    if username.trim().is_empty() || password.is_empty() {
        bail!("Username and password must be non-empty");
    }

    let result = conn.execute(
        "INSERT INTO admins (username, password_hash, created_at) VALUES (?1, ?2, ?3)",
        params![
            username,
            hash_password(username, password),
            Utc::now().to_rfc3339()
        ],
    );

    match result {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            bail!("Admin '{}' already exists", username)
        }
        Err(e) => Err(e.into()),
    }
}

/// Check a submitted username/password pair against the stored table.
/// Unknown user and wrong password are indistinguishable to the caller.
pub fn verify_credentials(conn: &Connection, username: &str, password: &str) -> Result<bool> {
    let stored: Option<String> = conn
        .query_row(
            "SELECT password_hash FROM admins WHERE username = ?1",
            params![username],
            |row| row.get(0),
        )
        .optional()?;

    match stored {
        Some(hash) => Ok(hash == hash_password(username, password)),
        None => Ok(false),
    }
}

/// Issue a session token for an already-verified admin.
pub fn issue_session(conn: &Connection, username: &str, ttl_hours: i64) -> Result<Session> {
    let now = Utc::now();
    let session = Session {
        token: uuid::Uuid::new_v4().to_string(),
        username: username.to_string(),
        issued_at: now,
        expires_at: now + Duration::hours(ttl_hours),
    };

    conn.execute(
        "INSERT INTO sessions (token, username, issued_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            session.token,
            session.username,
            session.issued_at.to_rfc3339(),
            session.expires_at.to_rfc3339(),
        ],
    )?;

    Ok(session)
}

/// Look up a token and check its expiry. Returns None for unknown, revoked,
/// or expired tokens.
pub fn validate_session(conn: &Connection, token: &str) -> Result<Option<Session>> {
    let row: Option<(String, String, String, String)> = conn
        .query_row(
            "SELECT token, username, issued_at, expires_at FROM sessions WHERE token = ?1",
            params![token],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .optional()?;

    let Some((token, username, issued_at, expires_at)) = row else {
        return Ok(None);
    };

    let session = Session {
        token,
        username,
        issued_at: DateTime::parse_from_rfc3339(&issued_at)?.with_timezone(&Utc),
        expires_at: DateTime::parse_from_rfc3339(&expires_at)?.with_timezone(&Utc),
    };

    if session.is_expired_at(Utc::now()) {
        return Ok(None);
    }

    Ok(Some(session))
}

/// Log out: delete the session row. Deleting an unknown token is a no-op.
pub fn revoke_session(conn: &Connection, token: &str) -> Result<()> {
    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::setup_database;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        conn
    }

    #[test]
    fn test_verify_accepts_correct_password() {
        let conn = test_conn();
        create_admin(&conn, "coordinator", "hunter2").unwrap();

        assert!(verify_credentials(&conn, "coordinator", "hunter2").unwrap());
    }

    #[test]
    fn test_verify_rejects_wrong_password_and_unknown_user() {
        let conn = test_conn();
        create_admin(&conn, "coordinator", "hunter2").unwrap();

        assert!(!verify_credentials(&conn, "coordinator", "wrong").unwrap());
        assert!(!verify_credentials(&conn, "nobody", "hunter2").unwrap());
    }

    #[test]
    fn test_duplicate_admin_rejected() {
        let conn = test_conn();
        create_admin(&conn, "coordinator", "hunter2").unwrap();

        assert!(create_admin(&conn, "coordinator", "other").is_err());
    }

    #[test]
    fn test_same_password_different_hash_per_user() {
        assert_ne!(
            hash_password("alice", "hunter2"),
            hash_password("bob", "hunter2")
        );
    }

    #[test]
    fn test_session_roundtrip() {
        let conn = test_conn();
        create_admin(&conn, "coordinator", "hunter2").unwrap();

        let session = issue_session(&conn, "coordinator", DEFAULT_SESSION_TTL_HOURS).unwrap();
        let validated = validate_session(&conn, &session.token).unwrap();

        assert!(validated.is_some());
        assert_eq!(validated.unwrap().username, "coordinator");
    }

    #[test]
    fn test_expired_session_rejected() {
        let conn = test_conn();

        // TTL of -1 hour: already expired at issue time
        let session = issue_session(&conn, "coordinator", -1).unwrap();
        assert!(validate_session(&conn, &session.token).unwrap().is_none());
    }

    #[test]
    fn test_revoked_session_rejected() {
        let conn = test_conn();

        let session = issue_session(&conn, "coordinator", DEFAULT_SESSION_TTL_HOURS).unwrap();
        revoke_session(&conn, &session.token).unwrap();

        assert!(validate_session(&conn, &session.token).unwrap().is_none());
    }

    #[test]
    fn test_unknown_token_rejected() {
        let conn = test_conn();
        assert!(validate_session(&conn, "not-a-token").unwrap().is_none());
    }
}
