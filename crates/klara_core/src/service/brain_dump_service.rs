//! Brain-dump submission: interpret, then persist.
//!
//! # Responsibility
//! - Validate the submission and its owning user.
//! - Run the orchestrator and map every extracted item into a record.
//!
//! # Invariants
//! - Every record created from one brain dump carries its raw text.
//! - All records of one brain dump are committed together or not at all.
//! - Subtask rows are written after their parent and reference its id.

use crate::model::extraction::BrainDumpExtraction;
use crate::model::record::{
    NewCalendarEvent, NewShoppingItem, NewSubtask, NewTask, PersistedBrainDump, UserId,
};
use crate::pipeline::orchestrator::{BrainDumpOrchestrator, OrchestrationResult};
use crate::repo::calendar_repo::{CalendarEventRepository, SqliteCalendarEventRepository};
use crate::repo::shopping_repo::{ShoppingItemRepository, SqliteShoppingItemRepository};
use crate::repo::task_repo::{SqliteTaskRepository, TaskRepository};
use crate::repo::user_repo::{SqliteUserRepository, UserRepository};
use crate::repo::{RepoError, RepoResult};
use crate::service::record_service::RecordService;
use chrono::NaiveDate;
use log::{error, info};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One submitted brain dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrainDumpInput {
    pub text: String,
    pub user_id: UserId,
}

/// Interpretation result plus the records it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrainDumpOutcome {
    pub result: OrchestrationResult,
    pub persisted: PersistedBrainDump,
}

#[derive(Debug)]
pub enum BrainDumpServiceError {
    EmptyInput,
    UnknownUser(UserId),
    Repo(RepoError),
}

impl Display for BrainDumpServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyInput => write!(f, "brain dump text must not be empty"),
            Self::UnknownUser(id) => write!(f, "unknown user: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BrainDumpServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for BrainDumpServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for BrainDumpServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(value.into())
    }
}

pub struct BrainDumpService<'a> {
    conn: &'a Connection,
    orchestrator: &'a BrainDumpOrchestrator,
}

impl<'a> BrainDumpService<'a> {
    pub fn new(conn: &'a Connection, orchestrator: &'a BrainDumpOrchestrator) -> Self {
        Self { conn, orchestrator }
    }

    /// Interprets `input` without persisting anything.
    pub async fn preview(
        &self,
        input: &BrainDumpInput,
        current_date: NaiveDate,
    ) -> Result<OrchestrationResult, BrainDumpServiceError> {
        self.check_input(input)?;
        Ok(self.orchestrator.process(&input.text, current_date).await)
    }

    /// Interprets `input` and persists every extracted item.
    ///
    /// Pipeline failures never surface here; they arrive as the degraded
    /// fallback task, which is persisted like any other task.
    pub async fn submit(
        &self,
        input: &BrainDumpInput,
        current_date: NaiveDate,
    ) -> Result<BrainDumpOutcome, BrainDumpServiceError> {
        self.check_input(input)?;
        let result = self.orchestrator.process(&input.text, current_date).await;
        let persisted = persist_extraction(self.conn, input.user_id, &input.text, &result.extraction)?;
        Ok(BrainDumpOutcome { result, persisted })
    }

    /// Lists everything `user_id` has saved, newest first per kind.
    pub fn list_for_user(&self, user_id: UserId) -> RepoResult<PersistedBrainDump> {
        RecordService::new(self.conn).list_for_user(user_id)
    }

    fn check_input(&self, input: &BrainDumpInput) -> Result<(), BrainDumpServiceError> {
        if input.text.trim().is_empty() {
            return Err(BrainDumpServiceError::EmptyInput);
        }
        if SqliteUserRepository::new(self.conn)
            .get_user(input.user_id)?
            .is_none()
        {
            return Err(BrainDumpServiceError::UnknownUser(input.user_id));
        }
        Ok(())
    }
}

/// Writes one extraction for `user_id` in a single transaction.
pub fn persist_extraction(
    conn: &Connection,
    user_id: UserId,
    raw_input: &str,
    extraction: &BrainDumpExtraction,
) -> RepoResult<PersistedBrainDump> {
    let tx = conn.unchecked_transaction()?;
    match write_extraction(&tx, user_id, raw_input, extraction) {
        Ok(persisted) => {
            tx.commit()?;
            info!(
                "event=brain_dump_persist module=service status=ok user_id={} tasks={} shopping_items={} calendar_events={}",
                user_id,
                persisted.tasks.len(),
                persisted.shopping_items.len(),
                persisted.calendar_events.len()
            );
            Ok(persisted)
        }
        Err(err) => {
            // Dropping `tx` rolls back.
            error!(
                "event=brain_dump_persist module=service status=error user_id={} error={}",
                user_id, err
            );
            Err(err)
        }
    }
}

fn write_extraction(
    conn: &Connection,
    user_id: UserId,
    raw_input: &str,
    extraction: &BrainDumpExtraction,
) -> RepoResult<PersistedBrainDump> {
    let tasks = SqliteTaskRepository::new(conn);
    let shopping = SqliteShoppingItemRepository::new(conn);
    let calendar = SqliteCalendarEventRepository::new(conn);
    let mut persisted = PersistedBrainDump::default();

    for task in &extraction.tasks {
        let mut record = tasks.create_task(&NewTask::from_extracted(task, user_id, raw_input))?;
        if !task.subtasks.is_empty() {
            let subtasks: Vec<_> = task.subtasks.iter().map(NewSubtask::from_extracted).collect();
            record.subtasks = tasks.create_subtasks(record.id, &subtasks)?;
        }
        persisted.tasks.push(record);
    }
    for item in &extraction.shopping_items {
        persisted.shopping_items.push(
            shopping.create_shopping_item(&NewShoppingItem::from_extracted(item, user_id, raw_input))?,
        );
    }
    for event in &extraction.calendar_events {
        persisted.calendar_events.push(calendar.create_calendar_event(
            &NewCalendarEvent::from_extracted(event, user_id, raw_input),
        )?);
    }
    Ok(persisted)
}
