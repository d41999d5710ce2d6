//! Task and subtask repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist parent tasks and their ordered subtasks.
//! - Load tasks together with their subtasks sorted by position.
//!
//! # Invariants
//! - Subtasks are created only for an existing parent, with orders `1..=n`.
//! - Subtask `order` is stored in the `position` column.
//! - A task with stored subtasks always has `should_decompose` set.

use crate::model::record::{
    validate_subtasks, NewSubtask, NewTask, RecordId, SubtaskRecord, TaskRecord, UserId,
};
use crate::model::datetime::format_date;
use crate::repo::{
    bool_to_int, read_bool, read_minutes, read_opt_date, read_uuid, RepoError, RepoResult,
};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    description,
    due_date,
    estimated_minutes,
    should_decompose,
    reasoning,
    completed,
    raw_input,
    created_at
FROM tasks";

const SUBTASK_SELECT_SQL: &str = "SELECT
    id,
    parent_task_id,
    description,
    position,
    estimated_minutes,
    due_date,
    completed,
    created_at
FROM subtasks";

/// Repository interface for tasks and their subtasks.
pub trait TaskRepository {
    fn create_task(&self, task: &NewTask) -> RepoResult<TaskRecord>;
    /// Creates the ordered subtasks of an already persisted parent.
    fn create_subtasks(
        &self,
        parent_task_id: RecordId,
        subtasks: &[NewSubtask],
    ) -> RepoResult<Vec<SubtaskRecord>>;
    fn get_task(&self, id: RecordId) -> RepoResult<Option<TaskRecord>>;
    /// Lists a user's tasks, newest first, each with its subtasks.
    fn list_tasks(&self, user_id: UserId) -> RepoResult<Vec<TaskRecord>>;
    fn set_task_completed(&self, id: RecordId, completed: bool) -> RepoResult<()>;
    fn set_subtask_completed(&self, id: RecordId, completed: bool) -> RepoResult<()>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn load_subtasks(&self, parent_task_id: RecordId) -> RepoResult<Vec<SubtaskRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SUBTASK_SELECT_SQL}
             WHERE parent_task_id = ?1
             ORDER BY position ASC;"
        ))?;
        let mut rows = stmt.query([parent_task_id.to_string()])?;
        let mut subtasks = Vec::new();
        while let Some(row) = rows.next()? {
            subtasks.push(parse_subtask_row(row)?);
        }
        Ok(subtasks)
    }

    fn with_subtasks(&self, mut task: TaskRecord) -> RepoResult<TaskRecord> {
        task.subtasks = self.load_subtasks(task.id)?;
        Ok(task)
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, task: &NewTask) -> RepoResult<TaskRecord> {
        task.validate()?;

        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO tasks (
                id,
                user_id,
                description,
                due_date,
                estimated_minutes,
                should_decompose,
                reasoning,
                raw_input
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                id.to_string(),
                task.user_id.to_string(),
                task.description.trim(),
                task.due_date.map(format_date),
                task.estimated_minutes,
                bool_to_int(task.should_decompose),
                task.reasoning.as_deref(),
                task.raw_input.as_str(),
            ],
        )?;

        self.get_task(id)?
            .ok_or_else(|| RepoError::InvalidData(format!("task {id} missing after insert")))
    }

    fn create_subtasks(
        &self,
        parent_task_id: RecordId,
        subtasks: &[NewSubtask],
    ) -> RepoResult<Vec<SubtaskRecord>> {
        validate_subtasks(subtasks)?;

        let parent_exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM tasks WHERE id = ?1);",
            [parent_task_id.to_string()],
            |row| row.get(0),
        )?;
        if !parent_exists {
            return Err(RepoError::NotFound(parent_task_id));
        }

        let mut stmt = self.conn.prepare(
            "INSERT INTO subtasks (
                id,
                parent_task_id,
                description,
                position,
                estimated_minutes,
                due_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
        )?;
        for subtask in subtasks {
            stmt.execute(params![
                Uuid::new_v4().to_string(),
                parent_task_id.to_string(),
                subtask.description.trim(),
                subtask.order,
                subtask.estimated_minutes,
                subtask.due_date.map(format_date),
            ])?;
        }
        if !subtasks.is_empty() {
            self.conn.execute(
                "UPDATE tasks SET should_decompose = 1 WHERE id = ?1;",
                [parent_task_id.to_string()],
            )?;
        }

        self.load_subtasks(parent_task_id)
    }

    fn get_task(&self, id: RecordId) -> RepoResult<Option<TaskRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => {
                let task = parse_task_row(row)?;
                Ok(Some(self.with_subtasks(task)?))
            }
            None => Ok(None),
        }
    }

    fn list_tasks(&self, user_id: UserId) -> RepoResult<Vec<TaskRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE user_id = ?1
             ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            tasks.push(parse_task_row(row)?);
        }
        drop(rows);

        tasks
            .into_iter()
            .map(|task| self.with_subtasks(task))
            .collect()
    }

    fn set_task_completed(&self, id: RecordId, completed: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE tasks SET completed = ?1 WHERE id = ?2;",
            params![bool_to_int(completed), id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn set_subtask_completed(&self, id: RecordId, completed: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE subtasks SET completed = ?1 WHERE id = ?2;",
            params![bool_to_int(completed), id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<TaskRecord> {
    Ok(TaskRecord {
        id: read_uuid(row, "id")?,
        user_id: read_uuid(row, "user_id")?,
        description: row.get("description")?,
        due_date: read_opt_date(row, "due_date")?,
        estimated_minutes: read_minutes(row, "estimated_minutes")?,
        should_decompose: read_bool(row, "should_decompose")?,
        reasoning: row.get("reasoning")?,
        completed: read_bool(row, "completed")?,
        raw_input: row.get("raw_input")?,
        created_at: row.get("created_at")?,
        subtasks: Vec::new(),
    })
}

fn parse_subtask_row(row: &Row<'_>) -> RepoResult<SubtaskRecord> {
    let position: i64 = row.get("position")?;
    let order = u32::try_from(position)
        .ok()
        .filter(|order| *order >= 1)
        .ok_or_else(|| {
            RepoError::InvalidData(format!("invalid position `{position}` in subtasks.position"))
        })?;

    Ok(SubtaskRecord {
        id: read_uuid(row, "id")?,
        parent_task_id: read_uuid(row, "parent_task_id")?,
        description: row.get("description")?,
        order,
        estimated_minutes: read_minutes(row, "estimated_minutes")?,
        due_date: read_opt_date(row, "due_date")?,
        completed: read_bool(row, "completed")?,
        created_at: row.get("created_at")?,
    })
}
