//! User repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Emails are stored normalized (trimmed, lowercase) and unique.
//! - A user row is created at most once per email.

use crate::model::record::{normalize_email, User, UserId};
use crate::repo::{read_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const USER_SELECT_SQL: &str = "SELECT id, email, first_name, created_at FROM users";

/// Repository interface for user identity.
pub trait UserRepository {
    /// Returns the user for `email`, creating it on first use.
    fn get_or_create_user(&self, email: &str, first_name: Option<&str>) -> RepoResult<User>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn get_or_create_user(&self, email: &str, first_name: Option<&str>) -> RepoResult<User> {
        let email = normalize_email(email)?;
        let first_name = first_name.map(str::trim).filter(|name| !name.is_empty());

        self.conn.execute(
            "INSERT INTO users (id, email, first_name)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(email) DO NOTHING;",
            params![Uuid::new_v4().to_string(), email.as_str(), first_name],
        )?;

        self.find_user_by_email(&email)?.ok_or_else(|| {
            RepoError::InvalidData(format!("user `{email}` missing after upsert"))
        })
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_user_row(row)?)),
            None => Ok(None),
        }
    }

    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let email = normalize_email(email)?;
        let id: Option<String> = self
            .conn
            .query_row("SELECT id FROM users WHERE email = ?1;", [email], |row| {
                row.get(0)
            })
            .optional()?;

        match id {
            Some(id) => {
                let id = Uuid::parse_str(&id).map_err(|_| {
                    RepoError::InvalidData(format!("invalid uuid `{id}` in users.id"))
                })?;
                self.get_user(id)
            }
            None => Ok(None),
        }
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    Ok(User {
        id: read_uuid(row, "id")?,
        email: row.get("email")?,
        first_name: row.get("first_name")?,
        created_at: row.get("created_at")?,
    })
}
