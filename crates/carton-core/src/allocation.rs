//! # Allocation Module
//!
//! The carton/piece allocator: given a warehouse stock of sealed cartons and
//! loose pieces, and a cumulative customer request in the same units, decide
//! what to hand out and what stays on the shelf.
//!
//! ## Allocation Priority
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How a Request Is Satisfied                           │
//! │                                                                         │
//! │  Stock: 5 ctn × 3 pcs + 4 loose (19 units)                             │
//! │  Request: 2 ctn + 5 pcs (11 units)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. Whole cartons first ─────── min(2 requested, 5 in stock) = 2       │
//! │       │                          still needed: 11 - 2×3 = 5             │
//! │       ▼                                                                 │
//! │  2. Loose pieces next ──────── min(5 needed, 4 loose) = 4              │
//! │       │                          still needed: 1                        │
//! │       ▼                                                                 │
//! │  3. Break cartons last ─────── ceil(1 / 3) = 1 carton broken           │
//! │       │                          3 pieces out, 1 used, 2 back on shelf  │
//! │       ▼                                                                 │
//! │  Allocated: 2 ctn + 5 pcs (1 broken)                                   │
//! │  Remaining: 2 ctn + 2 pcs  (8 units = 19 - 11 ✓)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//! - Units are conserved exactly: `stock = allocated + remaining`
//! - Whole cartons handed out plus cartons broken never exceed stock cartons
//! - A carton is only broken when loose stock cannot cover the shortfall,
//!   and then only as many as the shortfall needs
//! - An over-request fails outright; there is no partial allocation
//!
//! [`allocate`] is a pure function. Calling it twice with the same inputs
//! gives the same answer, which is what lets the cart ledger re-derive a
//! line from its original snapshot on every edit.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::AllocationError;

// =============================================================================
// Stock State
// =============================================================================

/// A carton/piece denominated quantity of a single item at a point in time.
///
/// `pieces_per_carton` is the item's conversion constant; the allocator
/// rejects a zero value rather than dividing by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockState {
    /// Whole sealed cartons.
    pub cartons: u32,

    /// Loose pieces not inside a sealed carton.
    pub pieces: u32,

    /// Conversion constant for this item.
    pub pieces_per_carton: u32,
}

impl StockState {
    /// Creates a stock snapshot.
    #[inline]
    pub const fn new(cartons: u32, pieces: u32, pieces_per_carton: u32) -> Self {
        StockState {
            cartons,
            pieces,
            pieces_per_carton,
        }
    }

    /// Total units represented: `cartons * ppc + pieces`.
    ///
    /// Fits in `u64` for every combination of `u32` inputs.
    #[inline]
    pub const fn total_units(&self) -> u64 {
        self.cartons as u64 * self.pieces_per_carton as u64 + self.pieces as u64
    }

    /// Same item, different counts.
    #[inline]
    pub const fn with_counts(&self, cartons: u32, pieces: u32) -> Self {
        StockState::new(cartons, pieces, self.pieces_per_carton)
    }
}

// =============================================================================
// Allocation Request
// =============================================================================

/// A cumulative desired quantity.
///
/// "The customer wants this many cartons and this many loose pieces in
/// total", re-submitted in full on every edit. Never a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AllocationRequest {
    pub request_cartons: u32,
    pub request_pieces: u32,
}

impl AllocationRequest {
    /// Creates a request for `cartons` whole cartons and `pieces` loose pieces.
    #[inline]
    pub const fn new(cartons: u32, pieces: u32) -> Self {
        AllocationRequest {
            request_cartons: cartons,
            request_pieces: pieces,
        }
    }

    /// The empty request.
    #[inline]
    pub const fn empty() -> Self {
        AllocationRequest::new(0, 0)
    }

    /// Units this request needs for a given carton size.
    #[inline]
    pub const fn units(&self, pieces_per_carton: u32) -> u64 {
        self.request_cartons as u64 * pieces_per_carton as u64 + self.request_pieces as u64
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.request_cartons == 0 && self.request_pieces == 0
    }
}

// =============================================================================
// Allocation Result
// =============================================================================

/// What the customer receives.
///
/// `pieces` counts every loose piece handed out, whether it came from loose
/// stock or from a broken carton. It is `u64` because a request for more
/// cartons than are sealed is served in pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Allocation {
    /// Sealed cartons handed out whole.
    pub cartons: u32,

    /// Loose pieces handed out.
    pub pieces: u64,

    /// Cartons opened to produce loose pieces.
    pub broken_cartons: u32,
}

impl Allocation {
    /// Total units handed out: `cartons * ppc + pieces`.
    #[inline]
    pub const fn units(&self, pieces_per_carton: u32) -> u64 {
        self.cartons as u64 * pieces_per_carton as u64 + self.pieces
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.cartons == 0 && self.pieces == 0
    }
}

/// Output of a successful [`allocate`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AllocationResult {
    pub allocated: Allocation,

    /// Stock left after the request is satisfied (same pieces per carton).
    pub remaining_stock: StockState,
}

// =============================================================================
// Allocator
// =============================================================================

/// Satisfies `request` from `stock`.
///
/// ## Errors
/// - [`AllocationError::ZeroPiecesPerCarton`] when the stock has no carton size
/// - [`AllocationError::InsufficientStock`] when the request needs more units
///   than the stock holds; nothing is allocated
///
/// ## Example
/// ```rust
/// use carton_core::allocation::{allocate, AllocationRequest, StockState};
///
/// let stock = StockState::new(2, 0, 5);
/// let result = allocate(&stock, &AllocationRequest::new(0, 7)).unwrap();
///
/// assert_eq!(result.allocated.pieces, 7);
/// assert_eq!(result.allocated.broken_cartons, 2);
/// assert_eq!(result.remaining_stock, StockState::new(0, 3, 5));
/// ```
pub fn allocate(
    stock: &StockState,
    request: &AllocationRequest,
) -> Result<AllocationResult, AllocationError> {
    if stock.pieces_per_carton == 0 {
        return Err(AllocationError::ZeroPiecesPerCarton);
    }

    let ppc = stock.pieces_per_carton as u64;
    let needed = request.units(stock.pieces_per_carton);
    let available = stock.total_units();

    if needed > available {
        return Err(AllocationError::InsufficientStock { needed, available });
    }

    let give_whole = request.request_cartons.min(stock.cartons);
    let mut still_needed = needed - give_whole as u64 * ppc;

    let give_loose = still_needed.min(stock.pieces as u64);
    still_needed -= give_loose;

    let to_break = if still_needed > 0 {
        still_needed.div_ceil(ppc)
    } else {
        0
    };

    // to_break <= cartons - give_whole because needed <= available.
    let remaining_cartons = stock.cartons as u64 - give_whole as u64 - to_break;
    // Either no carton was broken (pieces - give_loose), or every loose piece
    // was used and only the broken-carton leftover (< ppc) remains.
    let remaining_pieces = stock.pieces as u64 - give_loose + (to_break * ppc - still_needed);

    Ok(AllocationResult {
        allocated: Allocation {
            cartons: give_whole,
            pieces: give_loose + still_needed,
            broken_cartons: to_break as u32,
        },
        remaining_stock: stock.with_counts(remaining_cartons as u32, remaining_pieces as u32),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
