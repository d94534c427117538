//! # Database Pool Management
//!
//! SQLite connection pool and the SQLite implementation of
//! [`DocumentStore`].
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      SQLite Document Store                              │
//! │                                                                         │
//! │  Register startup                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbConfig::new(path) ← Configure pool settings                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Create pool + run migrations            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │  documents (collection, id, fields)     │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  commit(batch) ──► BEGIN; op; op; op; COMMIT                           │
//! │                    any failure → ROLLBACK, nothing applied              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Single writes (`set`, `update`, `delete`) are one-op batches, so merges
//! read and write inside the same transaction.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePoolOptions,
    SqliteSynchronous,
};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::credit::CreditRepository;
use crate::repository::item::ItemRepository;
use crate::repository::sale::SaleRepository;
use crate::repository::user::UserRepository;
use crate::store::{merge_fields, Collection, Document, DocumentStore, Fields, WriteBatch, WriteOp};

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/carton.db")
///     .max_connections(5)
///     .min_connections(1);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5 (plenty for a single register)
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Connection timeout duration.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a configuration for the database file at `path`.
    /// The file is created if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// Each call yields an isolated, empty database.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1, // In-memory requires single connection
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// SQLite-backed document store with repository access.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./carton.db")).await?;
///
/// let items = db.items().list().await?;
/// let sales = db.sales().list().await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    /// The SQLite connection pool.
    pool: SqlitePool,
}

impl Database {
    /// Creates a new database connection pool.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. Configures SQLite:
    ///    - WAL mode for concurrent reads
    ///    - NORMAL synchronous (balance of safety/speed)
    /// 3. Creates the connection pool
    /// 4. Runs migrations (if enabled)
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Runs database migrations. Idempotent.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// This database as a shared store handle.
    pub fn store(&self) -> Arc<dyn DocumentStore> {
        Arc::new(self.clone())
    }

    /// Returns the inventory item repository.
    pub fn items(&self) -> ItemRepository {
        ItemRepository::new(self.store())
    }

    /// Returns the sale repository.
    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.store())
    }

    /// Returns the credit account repository.
    pub fn credits(&self) -> CreditRepository {
        CreditRepository::new(self.store())
    }

    /// Returns the user repository.
    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.store())
    }

    /// Closes the database connection pool.
    ///
    /// ## Note
    /// After calling close, all repository operations will fail.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database is responsive.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// DocumentStore Implementation
// =============================================================================

#[async_trait]
impl DocumentStore for Database {
    async fn get_all(&self, collection: Collection) -> DbResult<Vec<Document>> {
        debug!(%collection, "Loading collection");

        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT id, fields FROM documents WHERE collection = ?1 ORDER BY created_at, rowid",
        )
        .bind(collection.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(id, json)| {
                let fields = parse_fields(collection, &id, &json)?;
                Ok(Document {
                    collection,
                    id,
                    fields,
                })
            })
            .collect()
    }

    async fn get_one(&self, collection: Collection, id: &str) -> DbResult<Option<Document>> {
        debug!(%collection, id, "Loading document");

        let mut conn = self.pool.acquire().await?;
        let fields = load_fields(&mut conn, collection, id).await?;

        Ok(fields.map(|fields| Document {
            collection,
            id: id.to_string(),
            fields,
        }))
    }

    async fn set(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
        merge: bool,
    ) -> DbResult<()> {
        let mut batch = WriteBatch::new();
        batch.set(collection, id, fields, merge);
        self.commit(batch).await
    }

    async fn update(&self, collection: Collection, id: &str, fields: Fields) -> DbResult<()> {
        let mut batch = WriteBatch::new();
        batch.update(collection, id, fields);
        self.commit(batch).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> DbResult<()> {
        let mut batch = WriteBatch::new();
        batch.delete(collection, id);
        self.commit(batch).await
    }

    async fn add(&self, collection: Collection, fields: Fields) -> DbResult<String> {
        let id = Uuid::new_v4().simple().to_string();
        self.set(collection, &id, fields, false).await?;
        Ok(id)
    }

    async fn commit(&self, batch: WriteBatch) -> DbResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        debug!(ops = batch.len(), "Committing write batch");

        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        let mut tx = self.pool.begin().await?;

        for op in batch.ops() {
            // Dropping `tx` on error rolls the whole batch back.
            apply_op(&mut tx, op, &now).await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

async fn apply_op(conn: &mut SqliteConnection, op: &WriteOp, now: &str) -> DbResult<()> {
    match op {
        WriteOp::Set {
            collection,
            id,
            fields,
            merge,
        } => {
            let merged = if *merge {
                load_fields(conn, *collection, id).await?.map(|mut existing| {
                    merge_fields(&mut existing, fields.clone());
                    existing
                })
            } else {
                None
            };
            upsert(conn, *collection, id, merged.as_ref().unwrap_or(fields), now).await
        }
        WriteOp::Update {
            collection,
            id,
            fields,
        } => {
            let mut existing = load_fields(conn, *collection, id)
                .await?
                .ok_or_else(|| DbError::not_found(collection.as_str(), id.as_str()))?;
            merge_fields(&mut existing, fields.clone());
            upsert(conn, *collection, id, &existing, now).await
        }
        WriteOp::Delete { collection, id } => {
            debug!(%collection, id = %id, "Deleting document");
            sqlx::query("DELETE FROM documents WHERE collection = ?1 AND id = ?2")
                .bind(collection.as_str())
                .bind(id)
                .execute(&mut *conn)
                .await?;
            Ok(())
        }
    }
}

async fn load_fields(
    conn: &mut SqliteConnection,
    collection: Collection,
    id: &str,
) -> DbResult<Option<Fields>> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT fields FROM documents WHERE collection = ?1 AND id = ?2")
            .bind(collection.as_str())
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

    row.map(|(json,)| parse_fields(collection, id, &json))
        .transpose()
}

async fn upsert(
    conn: &mut SqliteConnection,
    collection: Collection,
    id: &str,
    fields: &Fields,
    now: &str,
) -> DbResult<()> {
    debug!(%collection, id, "Writing document");

    let json = serde_json::to_string(fields)?;
    sqlx::query(
        r#"
        INSERT INTO documents (collection, id, fields, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?4)
        ON CONFLICT (collection, id)
        DO UPDATE SET fields = excluded.fields, updated_at = excluded.updated_at
        "#,
    )
    .bind(collection.as_str())
    .bind(id)
    .bind(json)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

fn parse_fields(collection: Collection, id: &str, json: &str) -> DbResult<Fields> {
    serde_json::from_str(json).map_err(|e| DbError::invalid(collection.as_str(), id, e))
}

// =============================================================================
// Unit Tests
// =============================================================================
