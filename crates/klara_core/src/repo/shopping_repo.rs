//! Shopping item repository contracts and SQLite implementation.

use crate::model::record::{NewShoppingItem, RecordId, ShoppingItemRecord, UserId};
use crate::repo::{bool_to_int, read_bool, read_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const SHOPPING_ITEM_SELECT_SQL: &str = "SELECT
    id,
    user_id,
    description,
    completed,
    raw_input,
    created_at
FROM shopping_items";

/// Repository interface for shopping items.
pub trait ShoppingItemRepository {
    fn create_shopping_item(&self, item: &NewShoppingItem) -> RepoResult<ShoppingItemRecord>;
    fn get_shopping_item(&self, id: RecordId) -> RepoResult<Option<ShoppingItemRecord>>;
    /// Lists a user's items, newest first.
    fn list_shopping_items(&self, user_id: UserId) -> RepoResult<Vec<ShoppingItemRecord>>;
    fn set_shopping_item_completed(&self, id: RecordId, completed: bool) -> RepoResult<()>;
}

/// SQLite-backed shopping item repository.
pub struct SqliteShoppingItemRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteShoppingItemRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ShoppingItemRepository for SqliteShoppingItemRepository<'_> {
    fn create_shopping_item(&self, item: &NewShoppingItem) -> RepoResult<ShoppingItemRecord> {
        item.validate()?;

        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO shopping_items (id, user_id, description, raw_input)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                id.to_string(),
                item.user_id.to_string(),
                item.description.trim(),
                item.raw_input.as_str(),
            ],
        )?;

        self.get_shopping_item(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("shopping item {id} missing after insert"))
        })
    }

    fn get_shopping_item(&self, id: RecordId) -> RepoResult<Option<ShoppingItemRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SHOPPING_ITEM_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_shopping_item_row(row)?)),
            None => Ok(None),
        }
    }

    fn list_shopping_items(&self, user_id: UserId) -> RepoResult<Vec<ShoppingItemRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SHOPPING_ITEM_SELECT_SQL}
             WHERE user_id = ?1
             ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_shopping_item_row(row)?);
        }
        Ok(items)
    }

    fn set_shopping_item_completed(&self, id: RecordId, completed: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE shopping_items SET completed = ?1 WHERE id = ?2;",
            params![bool_to_int(completed), id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

fn parse_shopping_item_row(row: &Row<'_>) -> RepoResult<ShoppingItemRecord> {
    Ok(ShoppingItemRecord {
        id: read_uuid(row, "id")?,
        user_id: read_uuid(row, "user_id")?,
        description: row.get("description")?,
        completed: read_bool(row, "completed")?,
        raw_input: row.get("raw_input")?,
        created_at: row.get("created_at")?,
    })
}
