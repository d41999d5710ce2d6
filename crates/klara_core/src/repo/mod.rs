//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per record kind.
//! - Keep SQL details inside the storage boundary.
//! - Assign identifiers; let SQLite assign timestamps and defaults.
//!
//! # Invariants
//! - Write paths validate creation requests before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.

pub mod calendar_repo;
pub mod shopping_repo;
pub mod task_repo;
pub mod user_repo;

use crate::db::DbError;
use crate::model::datetime::{parse_date, parse_time};
use crate::model::record::{RecordId, RecordValidationError};
use chrono::{NaiveDate, NaiveTime};
use rusqlite::Row;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by every record kind.
#[derive(Debug)]
pub enum RepoError {
    Validation(RecordValidationError),
    Db(DbError),
    NotFound(RecordId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted record data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<RecordValidationError> for RepoError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn read_uuid(row: &Row<'_>, column: &str) -> RepoResult<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{text}` in column {column}")))
}

pub(crate) fn read_bool(row: &Row<'_>, column: &str) -> RepoResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean `{other}` in column {column}"
        ))),
    }
}

pub(crate) fn read_minutes(row: &Row<'_>, column: &str) -> RepoResult<Option<u32>> {
    match row.get::<_, Option<i64>>(column)? {
        Some(value) => u32::try_from(value)
            .ok()
            .filter(|minutes| *minutes > 0)
            .map(Some)
            .ok_or_else(|| {
                RepoError::InvalidData(format!("invalid minutes `{value}` in column {column}"))
            }),
        None => Ok(None),
    }
}

pub(crate) fn read_date(row: &Row<'_>, column: &str) -> RepoResult<NaiveDate> {
    let text: String = row.get(column)?;
    parse_date(&text)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid date `{text}` in column {column}")))
}

pub(crate) fn read_opt_date(row: &Row<'_>, column: &str) -> RepoResult<Option<NaiveDate>> {
    match row.get::<_, Option<String>>(column)? {
        Some(text) => parse_date(&text).map(Some).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid date `{text}` in column {column}"))
        }),
        None => Ok(None),
    }
}

pub(crate) fn read_opt_time(row: &Row<'_>, column: &str) -> RepoResult<Option<NaiveTime>> {
    match row.get::<_, Option<String>>(column)? {
        Some(text) => parse_time(&text).map(Some).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid time `{text}` in column {column}"))
        }),
        None => Ok(None),
    }
}
