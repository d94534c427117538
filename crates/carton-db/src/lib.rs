//! # carton-db: Document Store Layer for Carton POS
//!
//! This crate owns every read and write against the document store: the
//! [`DocumentStore`] trait, its SQLite implementation and one repository per
//! collection.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Carton POS Data Flow                             │
//! │                                                                         │
//! │  Register command (checkout)                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     carton-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │ DocumentStore │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │  (store.rs)   │◄───│ Item  Sale    │    │  (embedded)  │  │   │
//! │  │   │               │    │ Credit User   │    │              │  │   │
//! │  │   │ Database      │    │               │    │ 001_docs.sql │  │   │
//! │  │   │  (pool.rs)    │    │               │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │        SQLite: documents(collection, id, fields JSON)           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`store`] - `DocumentStore` trait, documents, write batches
//! - [`pool`] - SQLite pool and `DocumentStore` implementation
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Store error types
//! - [`repository`] - Typed repositories per collection
//!
//! ## Usage
//!
//! ```rust,ignore
//! use carton_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("carton.db")).await?;
//!
//! let items = db.items().list().await?;
//! let next = db.sales().next_id().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use store::{Collection, Document, DocumentStore, Fields, WriteBatch, WriteOp};

// Repository re-exports for convenience
pub use repository::credit::CreditRepository;
pub use repository::item::ItemRepository;
pub use repository::sale::SaleRepository;
pub use repository::user::{UserRecord, UserRepository};
