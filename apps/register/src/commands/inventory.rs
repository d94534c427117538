//! # Inventory Commands
//!
//! Item CRUD and low-stock alerts.
//!
//! Form input arrives as an [`ItemDraft`] and is validated in `carton-core`
//! before anything is written. `totalPieces` is always recomputed from the
//! counts.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use ts_rs::TS;

use crate::error::ApiError;
use crate::state::{AuthState, ConfigState, DbState};
use carton_core::reports::stock_message;
use carton_core::validation::{validate_item, ItemDraft};
use carton_core::InventoryItem;

/// One row of the low-stock panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LowStockAlert {
    pub item_id: String,
    pub name: String,
    pub total_pieces: u64,
    pub danger_level: u64,
    pub message: String,
}

impl From<&InventoryItem> for LowStockAlert {
    fn from(item: &InventoryItem) -> Self {
        LowStockAlert {
            item_id: item.id.clone(),
            name: item.name.clone(),
            total_pieces: item.total_pieces,
            danger_level: item.danger_level,
            message: stock_message(item),
        }
    }
}

pub async fn list_items(db: &DbState) -> Result<Vec<InventoryItem>, ApiError> {
    debug!("list_items command");
    Ok(db.inner().items().list().await?)
}

pub async fn get_item(db: &DbState, id: &str) -> Result<InventoryItem, ApiError> {
    debug!(id, "get_item command");
    db.inner()
        .items()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Item", id))
}

/// Validates and stores a new item.
///
/// An empty danger level falls back to `default_danger_level` from config.
pub async fn create_item(
    db: &DbState,
    auth: &AuthState,
    config: &ConfigState,
    draft: ItemDraft,
) -> Result<InventoryItem, ApiError> {
    debug!(name = %draft.name, "create_item command");
    auth.require_user()?;

    let item = validate_item(&with_default_danger_level(draft, config))?;
    let created = db.inner().items().insert(&item).await?;

    info!(id = %created.id, name = %created.name, total_pieces = created.total_pieces, "Item created");
    Ok(created)
}

/// Validates and replaces an existing item.
pub async fn update_item(
    db: &DbState,
    auth: &AuthState,
    config: &ConfigState,
    id: &str,
    draft: ItemDraft,
) -> Result<InventoryItem, ApiError> {
    debug!(id, "update_item command");
    auth.require_user()?;

    let item = validate_item(&with_default_danger_level(draft, config))?;
    let updated = db.inner().items().update(id, &item).await?;

    info!(id, name = %updated.name, total_pieces = updated.total_pieces, "Item updated");
    Ok(updated)
}

pub async fn delete_item(db: &DbState, auth: &AuthState, id: &str) -> Result<(), ApiError> {
    debug!(id, "delete_item command");
    auth.require_user()?;

    db.inner().items().delete(id).await?;
    info!(id, "Item deleted");
    Ok(())
}

/// Items below their danger level.
pub async fn low_stock_alerts(db: &DbState) -> Result<Vec<LowStockAlert>, ApiError> {
    debug!("low_stock_alerts command");
    let items = db.inner().items().low_stock().await?;
    Ok(items.iter().map(LowStockAlert::from).collect())
}

fn with_default_danger_level(mut draft: ItemDraft, config: &ConfigState) -> ItemDraft {
    if draft.danger_level.is_none() {
        draft.danger_level = config.default_danger_level.map(|level| level as i64);
    }
    draft
}
