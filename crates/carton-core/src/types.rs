//! # Domain Types
//!
//! Persisted record shapes and small value types used throughout Carton POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ InventoryItem   │   │      Sale       │   │ CreditAccount   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (doc id)    │   │  sale_id        │   │  id (doc id)    │       │
//! │  │  cartons        │   │  timestamp      │   │  name           │       │
//! │  │  pieces         │   │  items[] ───────┼─► │  credit         │       │
//! │  │  ppc            │   │  total, profit  │   │  timestamp      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  DiscountRate   │   │  SaleLineItem   │   │      User       │       │
//! │  │  bps (u32)      │   │  frozen snapshot│   │  email, name    │       │
//! │  │  1000 = 10%     │   │  of a cart line │   │                 │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Document Identity
//! Records live in a document store keyed by `(collection, id)`. The id is
//! not part of the stored fields, so every `id` field here is
//! `#[serde(skip)]` and filled in by the repository after reading.
//! Stored field names are camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::allocation::StockState;
use crate::money::Money;

// =============================================================================
// Discount Rate
// =============================================================================

/// Percentage discount on a cart line, in basis points.
///
/// 1 basis point = 0.01%, so 10000 bps = 100% (line is free).
/// Values above 10000 are clamped on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountRate(u32);

impl DiscountRate {
    /// 100%.
    pub const MAX_BPS: u32 = 10_000;

    /// Creates a discount from basis points, clamped to 100%.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        if bps > Self::MAX_BPS {
            DiscountRate(Self::MAX_BPS)
        } else {
            DiscountRate(bps)
        }
    }

    /// Creates a discount from a whole percentage (0-100).
    #[inline]
    pub const fn from_percent(percent: u32) -> Self {
        Self::from_bps(percent.saturating_mul(100))
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(0)
    }

    #[inline]
    pub const fn full() -> Self {
        DiscountRate(Self::MAX_BPS)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for DiscountRate {
    fn default() -> Self {
        DiscountRate::zero()
    }
}

// =============================================================================
// Inventory Item
// =============================================================================

/// A stocked item, as stored in the `Items` collection.
///
/// `total_pieces` is derived (`cartons * ppc + pieces`) and rewritten on
/// every save; it exists in the document so the UI and the low-stock query
/// can read it without recomputing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InventoryItem {
    /// Document id.
    #[serde(skip)]
    pub id: String,

    pub name: String,

    pub category: String,

    /// Cost per piece.
    pub actual_price: Money,

    /// Price per piece charged to customers.
    pub selling_price: Money,

    /// Sealed cartons on the shelf.
    #[serde(default)]
    pub cartons: u32,

    /// Loose pieces on the shelf.
    #[serde(default)]
    pub pieces: u32,

    /// Zero for items sold only as pieces.
    #[serde(default)]
    pub pieces_per_carton: u32,

    #[serde(default)]
    pub total_pieces: u64,

    /// Alert threshold in pieces. Zero disables the alert.
    #[serde(default)]
    pub danger_level: u64,
}

impl InventoryItem {
    /// Snapshot of this item's stock for the allocator.
    #[inline]
    pub fn stock(&self) -> StockState {
        StockState::new(self.cartons, self.pieces, self.pieces_per_carton)
    }

    /// Stock as the cart ledger allocates it.
    ///
    /// A pieces-only item (ppc 0) is allocated as if each carton held one
    /// piece; it has no cartons, so only its loose pieces are ever handed out.
    #[inline]
    pub fn sellable_stock(&self) -> StockState {
        StockState::new(self.cartons, self.pieces, self.pieces_per_carton.max(1))
    }

    /// Units on hand computed from the counts.
    ///
    /// A pieces-only item (ppc 0) contributes only its loose pieces.
    #[inline]
    pub fn computed_total_pieces(&self) -> u64 {
        self.stock().total_units()
    }

    /// Overwrites the counts and the derived total.
    pub fn set_stock(&mut self, cartons: u32, pieces: u32) {
        self.cartons = cartons;
        self.pieces = pieces;
        self.total_pieces = self.computed_total_pieces();
    }

    /// True when the item has fallen below its alert threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.danger_level > 0 && self.total_pieces < self.danger_level
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A completed sale, as stored in the `Sales` collection.
///
/// Immutable after creation. Re-opening a sale for editing produces a new
/// document with a new `sale_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Sale {
    /// Human-readable id, e.g. `Sale-42`. Also the document id.
    pub sale_id: String,

    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,

    pub items: Vec<SaleLineItem>,

    pub total: Money,

    pub profit: Money,

    /// Credit account name charged for this sale, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
}

impl Sale {
    /// Formats a sale id from its sequence number.
    #[inline]
    pub fn format_id(sequence: u64) -> String {
        format!("Sale-{}", sequence)
    }
}

/// One line of a sale.
///
/// A frozen snapshot: name, category and price are copied from the item at
/// checkout time and never follow later edits to the item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleLineItem {
    /// Document id of the inventory item.
    #[serde(default)]
    pub item_id: String,

    pub name: String,

    pub category: String,

    /// Selling price per piece at time of sale.
    pub unit_price: Money,

    /// Whole cartons sold.
    pub cartons: u32,

    pub pieces_per_carton: u32,

    /// Every unit sold, whole cartons included.
    pub total_pieces: u64,

    pub broken_cartons: u32,

    pub discount: DiscountRate,

    pub line_total: Money,
}

impl SaleLineItem {
    /// Loose pieces sold (total minus whole cartons).
    pub fn loose_pieces(&self) -> u64 {
        self.total_pieces
            .saturating_sub(self.cartons as u64 * self.pieces_per_carton as u64)
    }
}

// =============================================================================
// Credit Account
// =============================================================================

/// A customer credit balance, as stored in the `Credits` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreditAccount {
    /// Document id.
    #[serde(skip)]
    pub id: String,

    pub name: String,

    pub credit: Money,

    /// When the account was created.
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
}

impl CreditAccount {
    /// True when the balance covers `amount`.
    #[inline]
    pub fn can_cover(&self, amount: Money) -> bool {
        self.credit >= amount
    }
}

// =============================================================================
// User
// =============================================================================

/// A signed-in operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    /// Document id in the `Users` collection.
    pub uid: String,

    pub email: String,

    #[serde(default)]
    pub display_name: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================
