use crate::models::{Account, AuthUser};
use bcrypt::{hash, verify, BcryptError};
use chrono::Utc;
use rusqlite::{params, Connection, Error as RusqliteError, OptionalExtension};
use uuid::Uuid;

fn bcrypt_to_rusqlite_error(e: BcryptError) -> RusqliteError {
    RusqliteError::ToSqlConversionFailure(Box::new(e))
}

/// Emails are stored trimmed and lowercased so sign-in is case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn create_account(conn: &Connection, email: &str, password: &str) -> Result<AuthUser, RusqliteError> {
    let uid = Uuid::new_v4().to_string();
    let email = normalize_email(email);
    let hashed_password = hash(password, bcrypt::DEFAULT_COST).map_err(bcrypt_to_rusqlite_error)?;
    conn.execute(
        "INSERT INTO accounts (uid, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![uid, email, hashed_password, Utc::now().to_rfc3339()],
    )?;
    Ok(AuthUser { uid, email })
}

pub fn read_all_accounts(conn: &Connection) -> Result<Vec<Account>, RusqliteError> {
    let mut stmt = conn.prepare("SELECT uid, email, created_at FROM accounts ORDER BY email")?;
    let account_iter = stmt.query_map([], |row| {
        Ok(Account {
            uid: row.get(0)?,
            email: row.get(1)?,
            created_at: row.get(2)?,
        })
    })?;
    account_iter.collect()
}

pub fn read_account_by_email(conn: &Connection, email: &str) -> Result<Option<Account>, RusqliteError> {
    conn.query_row(
        "SELECT uid, email, created_at FROM accounts WHERE email = ?1",
        [normalize_email(email)],
        |row| {
            Ok(Account {
                uid: row.get(0)?,
                email: row.get(1)?,
                created_at: row.get(2)?,
            })
        },
    )
    .optional()
}

/// Returns the user only when the email exists and the password matches.
pub fn verify_credentials(conn: &Connection, email: &str, password: &str) -> Result<Option<AuthUser>, RusqliteError> {
    let row: Option<(String, String, String)> = conn
        .query_row(
            "SELECT uid, email, password_hash FROM accounts WHERE email = ?1",
            [normalize_email(email)],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;

    if let Some((uid, email, hash)) = row {
        if verify(password, &hash).unwrap_or(false) {
            return Ok(Some(AuthUser { uid, email }));
        }
    }
    Ok(None)
}

pub fn update_password(conn: &Connection, email: &str, new_password: &str) -> Result<usize, RusqliteError> {
    let hashed_password = hash(new_password, bcrypt::DEFAULT_COST).map_err(bcrypt_to_rusqlite_error)?;
    conn.execute(
        "UPDATE accounts SET password_hash = ?1 WHERE email = ?2",
        params![hashed_password, normalize_email(email)],
    )
}
