//! # Database State
//!
//! Wraps the `Database` connection for use in commands.
//!
//! ## Thread Safety
//! The `Database` struct from `carton-db` contains a `SqlitePool` which is
//! inherently thread-safe. Commands can run queries concurrently without
//! explicit locking; checkout atomicity comes from the write batch.
//!
//! ## Usage in Commands
//! ```rust,ignore
//! pub async fn list_items(db: &DbState) -> Result<Vec<InventoryItem>, ApiError> {
//!     Ok(db.inner().items().list().await?)
//! }
//! ```

use carton_db::Database;

/// Wrapper around `Database` for command state.
#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    /// Creates a new DbState wrapping the database connection.
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Returns a reference to the inner Database.
    pub fn inner(&self) -> &Database {
        &self.db
    }
}
