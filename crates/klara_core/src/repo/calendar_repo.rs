//! Calendar event repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `event_date` is always present; `event_time` is stored as `HH:MM`.

use crate::model::datetime::{format_date, format_time};
use crate::model::record::{CalendarEventRecord, NewCalendarEvent, RecordId, UserId};
use crate::repo::{read_date, read_opt_time, read_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const CALENDAR_EVENT_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    description,
    event_date,
    event_time,
    raw_input,
    created_at
FROM calendar_events";

/// Repository interface for calendar events.
pub trait CalendarEventRepository {
    fn create_calendar_event(&self, event: &NewCalendarEvent) -> RepoResult<CalendarEventRecord>;
    fn get_calendar_event(&self, id: RecordId) -> RepoResult<Option<CalendarEventRecord>>;
    /// Lists a user's events, newest first.
    fn list_calendar_events(&self, user_id: UserId) -> RepoResult<Vec<CalendarEventRecord>>;
}

/// SQLite-backed calendar event repository.
pub struct SqliteCalendarEventRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCalendarEventRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CalendarEventRepository for SqliteCalendarEventRepository<'_> {
    fn create_calendar_event(&self, event: &NewCalendarEvent) -> RepoResult<CalendarEventRecord> {
        event.validate()?;

        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO calendar_events (
                id,
                user_id,
                description,
                event_date,
                event_time,
                raw_input
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                id.to_string(),
                event.user_id.to_string(),
                event.description.trim(),
                format_date(event.event_date),
                event.event_time.map(format_time),
                event.raw_input.as_str(),
            ],
        )?;

        self.get_calendar_event(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("calendar event {id} missing after insert"))
        })
    }

    fn get_calendar_event(&self, id: RecordId) -> RepoResult<Option<CalendarEventRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CALENDAR_EVENT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_calendar_event_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_calendar_events(&self, user_id: UserId) -> RepoResult<Vec<CalendarEventRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CALENDAR_EVENT_SELECT_SQL}
             WHERE user_id = ?1
             ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            events.push(parse_calendar_event_row(row)?);
        }
        Ok(events)
    }
}

fn parse_calendar_event_row(row: &Row<'_>) -> RepoResult<CalendarEventRecord> {
    Ok(CalendarEventRecord {
        id: read_uuid(row, "id")?,
        user_id: read_uuid(row, "user_id")?,
        description: row.get("description")?,
        event_date: read_date(row, "event_date")?,
        event_time: read_opt_time(row, "event_time")?,
        raw_input: row.get("raw_input")?,
        created_at: row.get("created_at")?,
    })
}
