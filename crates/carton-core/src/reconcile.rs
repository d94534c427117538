//! # Reconcile Module
//!
//! Compares two cumulative requests against the same original stock.
//!
//! Used when a cart line is edited: the old request and the new request are
//! both allocated against the line's original snapshot, never against the
//! live stock, so repeated edits cannot drift.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::allocation::{allocate, AllocationRequest, AllocationResult, StockState};
use crate::error::AllocationError;

/// Signed component-wise change between two allocations (`new - old`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AllocationDelta {
    pub cartons: i64,
    pub pieces: i64,
    pub broken_cartons: i64,
}

/// Both allocations plus what changed between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Reconciliation {
    pub old_result: AllocationResult,
    pub new_result: AllocationResult,
    pub delta: AllocationDelta,

    /// Stock after the new request, i.e. `new_result.remaining_stock`.
    pub updated_stock: StockState,
}

/// Allocates `old` and `new` against `original` and diffs them.
///
/// ## Errors
/// Propagates the first allocator failure, old request first.
pub fn reconcile(
    original: &StockState,
    old: &AllocationRequest,
    new: &AllocationRequest,
) -> Result<Reconciliation, AllocationError> {
    let old_result = allocate(original, old)?;
    let new_result = allocate(original, new)?;

    let delta = AllocationDelta {
        cartons: new_result.allocated.cartons as i64 - old_result.allocated.cartons as i64,
        pieces: new_result.allocated.pieces as i64 - old_result.allocated.pieces as i64,
        broken_cartons: new_result.allocated.broken_cartons as i64
            - old_result.allocated.broken_cartons as i64,
    };

    Ok(Reconciliation {
        old_result,
        new_result,
        delta,
        updated_stock: new_result.remaining_stock,
    })
}
