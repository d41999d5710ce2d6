//! Direct record use-cases: approved creation, completion and listing.
//!
//! # Responsibility
//! - Create tasks with their subtasks, shopping lists and calendar events
//!   from caller-approved data.
//! - Toggle completion flags and list a user's records.
//!
//! # Invariants
//! - Multi-row writes commit all rows or none.
//! - A parent task is inserted before its subtasks, which reference its id.

use crate::model::record::{
    CalendarEventRecord, NewCalendarEvent, NewShoppingItem, NewSubtask, NewTask,
    PersistedBrainDump, RecordId, ShoppingItemRecord, TaskRecord, UserId,
};
use crate::repo::calendar_repo::{CalendarEventRepository, SqliteCalendarEventRepository};
use crate::repo::shopping_repo::{ShoppingItemRepository, SqliteShoppingItemRepository};
use crate::repo::task_repo::{SqliteTaskRepository, TaskRepository};
use crate::repo::RepoResult;
use rusqlite::Connection;

pub struct RecordService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> RecordService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Creates a task and its ordered subtasks in one transaction.
    pub fn create_task(&self, task: &NewTask, subtasks: &[NewSubtask]) -> RepoResult<TaskRecord> {
        let tx = self.conn.unchecked_transaction()?;
        let repo = SqliteTaskRepository::new(&tx);
        let mut created = repo.create_task(task)?;
        if !subtasks.is_empty() {
            created.subtasks = repo.create_subtasks(created.id, subtasks)?;
        }
        tx.commit()?;
        Ok(created)
    }

    /// Creates one shopping item per description in one transaction.
    pub fn create_shopping_items(
        &self,
        user_id: UserId,
        descriptions: &[String],
        raw_input: &str,
    ) -> RepoResult<Vec<ShoppingItemRecord>> {
        let tx = self.conn.unchecked_transaction()?;
        let repo = SqliteShoppingItemRepository::new(&tx);
        let items = descriptions
            .iter()
            .map(|description| {
                repo.create_shopping_item(&NewShoppingItem {
                    user_id,
                    description: description.clone(),
                    raw_input: raw_input.to_string(),
                })
            })
            .collect::<RepoResult<Vec<_>>>()?;
        tx.commit()?;
        Ok(items)
    }

    pub fn create_calendar_event(&self, event: &NewCalendarEvent) -> RepoResult<CalendarEventRecord> {
        SqliteCalendarEventRepository::new(self.conn).create_calendar_event(event)
    }

    pub fn get_task(&self, id: RecordId) -> RepoResult<Option<TaskRecord>> {
        SqliteTaskRepository::new(self.conn).get_task(id)
    }

    pub fn set_task_completed(&self, id: RecordId, completed: bool) -> RepoResult<()> {
        SqliteTaskRepository::new(self.conn).set_task_completed(id, completed)
    }

    pub fn set_subtask_completed(&self, id: RecordId, completed: bool) -> RepoResult<()> {
        SqliteTaskRepository::new(self.conn).set_subtask_completed(id, completed)
    }

    pub fn set_shopping_item_completed(&self, id: RecordId, completed: bool) -> RepoResult<()> {
        SqliteShoppingItemRepository::new(self.conn).set_shopping_item_completed(id, completed)
    }

    /// Lists every record owned by `user_id`, newest first per kind.
    pub fn list_for_user(&self, user_id: UserId) -> RepoResult<PersistedBrainDump> {
        Ok(PersistedBrainDump {
            tasks: SqliteTaskRepository::new(self.conn).list_tasks(user_id)?,
            shopping_items: SqliteShoppingItemRepository::new(self.conn)
                .list_shopping_items(user_id)?,
            calendar_events: SqliteCalendarEventRepository::new(self.conn)
                .list_calendar_events(user_id)?,
        })
    }
}
