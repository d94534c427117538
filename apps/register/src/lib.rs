//! # Carton Register Library
//!
//! Application layer of Carton POS: state, commands, identity and startup.
//!
//! ## Module Organization
//! ```text
//! carton_register/
//! ├── lib.rs          ◄─── You are here (tracing, AppState bootstrap)
//! ├── auth.rs         ◄─── IdentityService trait, LocalIdentity (argon2)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── db.rs       ◄─── Database state wrapper
//! │   ├── session.rs  ◄─── Checkout session + in-flight flag
//! │   ├── auth.rs     ◄─── Sign-in gate
//! │   └── config.rs   ◄─── Configuration state
//! ├── commands/
//! │   ├── inventory.rs◄─── Item CRUD, low-stock alerts
//! │   ├── cart.rs     ◄─── Cart ledger commands
//! │   ├── checkout.rs ◄─── Atomic checkout commit
//! │   ├── credit.rs   ◄─── Credit account CRUD
//! │   ├── sales.rs    ◄─── Sales history, dashboard
//! │   └── auth.rs     ◄─── Sign in / out, operator accounts
//! └── error.rs        ◄─── API error type for commands
//! ```

pub mod auth;
pub mod commands;
pub mod error;
pub mod state;

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use carton_db::{Database, DbConfig, DbError};
use state::{AuthState, ConfigError, ConfigState, DbState, SessionState};

/// Startup failures.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Database(#[from] DbError),
}

/// Every piece of state the commands draw from.
#[derive(Clone)]
pub struct AppState {
    pub db: DbState,
    pub session: SessionState,
    pub auth: AuthState,
    pub config: Arc<ConfigState>,
}

impl AppState {
    /// Builds state around an open database.
    pub fn new(db: Database, config: ConfigState) -> Self {
        AppState {
            auth: AuthState::local(&db),
            db: DbState::new(db),
            session: SessionState::new(),
            config: Arc::new(config),
        }
    }

    /// Loads configuration and opens the database.
    ///
    /// ## Startup Sequence
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────────┐
    /// │  1. Load config: defaults → TOML file → CARTON_* env                    │
    /// │  2. Resolve database path (CARTON_DB_PATH or platform data dir)         │
    /// │  3. Connect: SQLite, WAL mode, run pending migrations                   │
    /// │  4. Create state: DbState, SessionState, AuthState, ConfigState         │
    /// └─────────────────────────────────────────────────────────────────────────┘
    /// ```
    pub async fn bootstrap(config_path: Option<&Path>) -> Result<Self, StartupError> {
        let config = ConfigState::load(config_path)?;
        let db_path = config.database_path()?;
        info!(?db_path, "Database path determined");

        let db = Database::new(DbConfig::new(db_path)).await?;
        info!("Database connected and migrations applied");

        Ok(AppState::new(db, config))
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=carton=trace` - Show trace for carton crates only
/// - Default: `info,carton=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,carton=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}
