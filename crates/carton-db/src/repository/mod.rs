//! # Repository Module
//!
//! Typed access to each collection of the document store.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Register command                                                      │
//! │       │                                                                 │
//! │       │  db.items().list()                                             │
//! │       ▼                                                                 │
//! │  ItemRepository                                                        │
//! │  ├── list / get / insert / update / delete                             │
//! │  └── stage_stock_update(batch, item)  ← part of a checkout batch       │
//! │       │                                                                 │
//! │       │  Document (JSON fields) ⇄ InventoryItem                        │
//! │       ▼                                                                 │
//! │  dyn DocumentStore                                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories hold an `Arc<dyn DocumentStore>`, so they run unchanged
//! against any store implementation.
//!
//! ## Available Repositories
//!
//! - [`item::ItemRepository`] - Inventory CRUD and stock updates
//! - [`sale::SaleRepository`] - Sales history and sale ids
//! - [`credit::CreditRepository`] - Customer credit accounts
//! - [`user::UserRepository`] - Operator accounts for local sign-in

pub mod credit;
pub mod item;
pub mod sale;
pub mod user;

use serde::de::DeserializeOwned;

use crate::error::DbResult;
use crate::store::Document;
use carton_core::{CreditAccount, InventoryItem};

/// A record whose id lives outside its stored fields.
pub(crate) trait Identified: DeserializeOwned {
    fn assign_id(&mut self, id: String);
}

impl Identified for InventoryItem {
    fn assign_id(&mut self, id: String) {
        self.id = id;
    }
}

impl Identified for CreditAccount {
    fn assign_id(&mut self, id: String) {
        self.id = id;
    }
}

/// Decodes a document and copies its id onto the record.
pub(crate) fn decode<T: Identified>(doc: &Document) -> DbResult<T> {
    let mut record: T = doc.decode()?;
    record.assign_id(doc.id.clone());
    Ok(record)
}
