//! # Error Types
//!
//! Domain-specific error types for carton-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  carton-core errors (this file)                                        │
//! │  ├── AllocationError  - Allocator failures (no item context)           │
//! │  ├── CoreError        - Ledger / checkout / business rule failures     │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  carton-db errors (separate crate)                                     │
//! │  └── DbError          - Document store failures                        │
//! │                                                                         │
//! │  register app errors                                                   │
//! │  └── ApiError         - What the frontend sees (serialized)            │
//! │                                                                         │
//! │  Flow: AllocationError → CoreError → ApiError → Frontend               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (item name, quantities)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Allocation Error
// =============================================================================

/// Failures of the pure allocator.
///
/// The allocator knows nothing about which item it is working on, so these
/// carry only quantities. The ledger attaches the item name when it converts
/// them into [`CoreError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    /// The cumulative request needs more units than the stock holds.
    ///
    /// ## User Workflow
    /// ```text
    /// Stock: 1 carton × 5 pcs (5 units)
    ///      │
    ///      ▼
    /// Request: 6 loose pieces
    ///      │
    ///      ▼
    /// InsufficientStock { needed: 6, available: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Not enough total stock", cart line unchanged
    /// ```
    #[error("Not enough total stock: {needed} pieces requested, {available} available")]
    InsufficientStock { needed: u64, available: u64 },

    /// A stock snapshot declared zero pieces per carton.
    #[error("Pieces per carton must be positive")]
    ZeroPiecesPerCarton,
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// They should be caught and translated to user-friendly messages.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    /// Inventory item cannot be found.
    ///
    /// ## When This Occurs
    /// - A cart line references an item that is not in the session
    /// - The item document was deleted while the cart was open
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// Insufficient stock to satisfy a cart line.
    #[error("Insufficient stock for {item}: {needed} pieces requested, {available} available")]
    InsufficientStock {
        item: String,
        needed: u64,
        available: u64,
    },

    /// Item has a zero pieces-per-carton conversion.
    #[error("Item {item} has no pieces-per-carton value")]
    InvalidPiecesPerCarton { item: String },

    /// Selected credit account cannot cover the sale.
    ///
    /// ## When This Occurs
    /// Checked before any write is issued, so the checkout has no side effects.
    #[error("Not enough credit for {customer}: {available} available, {required} required")]
    InsufficientCredit {
        customer: String,
        available: Money,
        required: Money,
    },

    /// Checkout attempted with nothing allocated.
    #[error("Cart is empty")]
    EmptyCart,

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Attaches an item name to an allocator failure.
    pub fn from_allocation(item: impl Into<String>, err: AllocationError) -> Self {
        match err {
            AllocationError::InsufficientStock { needed, available } => {
                CoreError::InsufficientStock {
                    item: item.into(),
                    needed,
                    available,
                }
            }
            AllocationError::ZeroPiecesPerCarton => {
                CoreError::InvalidPiecesPerCarton { item: item.into() }
            }
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Invalid format (e.g., unparseable time of day).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
