//! # Item Repository
//!
//! Inventory documents in the `Items` collection.
//!
//! ## Stock Writes
//! Only two paths change an item's counts:
//! - the inventory form (`insert` / `update`), which rewrites the whole item
//! - checkout, which stages `{cartons, pieces, totalPieces}` into the commit
//!   batch through [`ItemRepository::stage_stock_update`]
//!
//! Both recompute `totalPieces` from the counts before writing.

use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use super::decode;
use crate::error::{DbError, DbResult};
use crate::store::{to_fields, Collection, DocumentStore, WriteBatch};
use carton_core::InventoryItem;

/// Repository for inventory items.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.items();
///
/// let created = repo.insert(&item).await?;
/// let low = repo.low_stock().await?;
/// ```
#[derive(Clone)]
pub struct ItemRepository {
    store: Arc<dyn DocumentStore>,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        ItemRepository { store }
    }

    /// Every item, oldest first.
    pub async fn list(&self) -> DbResult<Vec<InventoryItem>> {
        let docs = self.store.get_all(Collection::Items).await?;
        let items = docs.iter().map(decode).collect::<DbResult<Vec<InventoryItem>>>()?;

        debug!(count = items.len(), "Loaded items");
        Ok(items)
    }

    /// A single item, or `None`.
    pub async fn get(&self, id: &str) -> DbResult<Option<InventoryItem>> {
        match self.store.get_one(Collection::Items, id).await? {
            Some(doc) => Ok(Some(decode(&doc)?)),
            None => Ok(None),
        }
    }

    /// The items with the given ids that still exist.
    pub async fn get_many<'a, I>(&self, ids: I) -> DbResult<Vec<InventoryItem>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut found = Vec::new();
        for id in ids {
            if let Some(item) = self.get(id).await? {
                found.push(item);
            }
        }
        Ok(found)
    }

    /// Stores a new item under a fresh id and returns it with the id set.
    pub async fn insert(&self, item: &InventoryItem) -> DbResult<InventoryItem> {
        let mut item = item.clone();
        item.total_pieces = item.computed_total_pieces();

        let id = self.store.add(Collection::Items, to_fields(&item)?).await?;
        debug!(id = %id, name = %item.name, "Inserted item");

        item.id = id;
        Ok(item)
    }

    /// Replaces an existing item's fields.
    ///
    /// ## Errors
    /// `NotFound` when the item was deleted.
    pub async fn update(&self, id: &str, item: &InventoryItem) -> DbResult<InventoryItem> {
        let mut item = item.clone();
        item.id = id.to_string();
        item.total_pieces = item.computed_total_pieces();

        self.store
            .update(Collection::Items, id, to_fields(&item)?)
            .await?;
        debug!(id, name = %item.name, "Updated item");

        Ok(item)
    }

    /// Deletes an item.
    ///
    /// ## Errors
    /// `NotFound` when there is nothing to delete.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        if self.get(id).await?.is_none() {
            return Err(DbError::not_found(Collection::Items.as_str(), id));
        }
        self.store.delete(Collection::Items, id).await?;
        debug!(id, "Deleted item");
        Ok(())
    }

    /// Items below their danger level.
    pub async fn low_stock(&self) -> DbResult<Vec<InventoryItem>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(InventoryItem::is_low_stock)
            .collect())
    }

    pub async fn count(&self) -> DbResult<usize> {
        Ok(self.store.get_all(Collection::Items).await?.len())
    }

    /// Adds an item's new counts to a commit batch.
    ///
    /// Staged as an `update`, so the batch fails if the item was deleted
    /// after it was read.
    pub fn stage_stock_update(batch: &mut WriteBatch, item: &InventoryItem) -> DbResult<()> {
        let fields = to_fields(&json!({
            "cartons": item.cartons,
            "pieces": item.pieces,
            "totalPieces": item.computed_total_pieces(),
        }))?;
        batch.update(Collection::Items, item.id.clone(), fields);
        Ok(())
    }
}
