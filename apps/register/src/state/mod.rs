//! # State Module
//!
//! Application state for the register.
//!
//! Separate state types, one concern each. Commands declare exactly the
//! state they need.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐ ┌──────────────┐ ┌──────────────┐ ┌──────────────┐   │
//! │  │   DbState    │ │ SessionState │ │  AuthState   │ │ ConfigState  │   │
//! │  │              │ │              │ │              │ │              │   │
//! │  │  Database    │ │  Arc<Mutex<  │ │ LocalIdentity│ │ store_name   │   │
//! │  │  (SQLite     │ │   Checkout   │ │ watch<User>  │ │ currency     │   │
//! │  │   pool)      │ │   Session>>  │ │              │ │ item policy  │   │
//! │  └──────────────┘ └──────────────┘ └──────────────┘ └──────────────┘   │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • DbState: Database has internal connection pool (thread-safe)        │
//! │  • SessionState: Arc<Mutex<T>> plus an in-flight checkout flag         │
//! │  • AuthState: current user behind a watch channel                      │
//! │  • ConfigState: Read-only after initialization                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod auth;
mod config;
mod db;
mod session;

pub use auth::AuthState;
pub use config::{ConfigError, ConfigState};
pub use db::DbState;
pub use session::{CheckoutGuard, SessionState};
