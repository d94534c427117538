//! # Sale Repository
//!
//! Completed sales in the `Sales` collection. The document id is the sale's
//! human-readable id (`Sale-42`).
//!
//! Sales are immutable: there is no update. Editing a sale in the register
//! creates a new sale document.

use std::sync::Arc;

use tracing::debug;

use crate::error::DbResult;
use crate::store::{to_fields, Collection, DocumentStore, WriteBatch};
use carton_core::checkout::next_sale_id;
use carton_core::Sale;

/// Repository for sales.
#[derive(Clone)]
pub struct SaleRepository {
    store: Arc<dyn DocumentStore>,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        SaleRepository { store }
    }

    /// Every sale, newest first.
    pub async fn list(&self) -> DbResult<Vec<Sale>> {
        let docs = self.store.get_all(Collection::Sales).await?;
        let mut sales = docs
            .iter()
            .map(|doc| doc.decode::<Sale>())
            .collect::<DbResult<Vec<_>>>()?;

        sales.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        debug!(count = sales.len(), "Loaded sales");
        Ok(sales)
    }

    /// A single sale by id, or `None`.
    pub async fn get(&self, sale_id: &str) -> DbResult<Option<Sale>> {
        match self.store.get_one(Collection::Sales, sale_id).await? {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    /// The next free `Sale-{n}` id.
    pub async fn next_id(&self) -> DbResult<String> {
        let ids: Vec<String> = self
            .store
            .get_all(Collection::Sales)
            .await?
            .into_iter()
            .map(|doc| doc.id)
            .collect();

        Ok(next_sale_id(&ids))
    }

    /// Stores a sale outside of a checkout batch.
    pub async fn insert(&self, sale: &Sale) -> DbResult<()> {
        self.store
            .set(Collection::Sales, &sale.sale_id, to_fields(sale)?, false)
            .await?;
        debug!(sale_id = %sale.sale_id, "Inserted sale");
        Ok(())
    }

    pub async fn count(&self) -> DbResult<usize> {
        Ok(self.store.get_all(Collection::Sales).await?.len())
    }

    /// Adds a sale document to a commit batch.
    pub fn stage_insert(batch: &mut WriteBatch, sale: &Sale) -> DbResult<()> {
        batch.set(Collection::Sales, sale.sale_id.clone(), to_fields(sale)?, false);
        Ok(())
    }
}
