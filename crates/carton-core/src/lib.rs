//! # carton-core: Pure Business Logic for Carton POS
//!
//! This crate is the **heart** of Carton POS. It holds the carton/piece
//! allocator and everything built on it, as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Carton POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web UI                                       │   │
//! │  │    Inventory ──► Checkout ──► Credit ──► Sales History          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/register (commands)                     │   │
//! │  │    add_to_cart, edit_quantity, checkout, list_sales, etc.       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ carton-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │  allocation ──► reconcile                                       │   │
//! │  │       │                                                         │   │
//! │  │       └──────► ledger ──► checkout        reports  validation   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    carton-db (Document Store)                   │   │
//! │  │              Items, Sales, Credits, Users collections           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`allocation`] - Carton/piece allocator
//! - [`reconcile`] - Old vs new request comparison
//! - [`ledger`] - Checkout session and cart lines
//! - [`checkout`] - Commit planning (what gets written)
//! - [`reports`] - Low stock, sales history filter, dashboard
//! - [`types`] - Persisted record shapes
//! - [`money`] - Integer money (no floating point!)
//! - [`validation`] - Form validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use carton_core::allocation::{allocate, AllocationRequest, StockState};
//!
//! // 5 cartons of 3 plus 4 loose pieces
//! let stock = StockState::new(5, 4, 3);
//!
//! // Customer wants 2 cartons and 3 pieces
//! let result = allocate(&stock, &AllocationRequest::new(2, 3)).unwrap();
//!
//! assert_eq!(result.allocated.broken_cartons, 0);
//! assert_eq!(result.remaining_stock, StockState::new(3, 1, 3));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod allocation;
pub mod checkout;
pub mod error;
pub mod ledger;
pub mod money;
pub mod reconcile;
pub mod reports;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use allocation::{allocate, Allocation, AllocationRequest, AllocationResult, StockState};
pub use checkout::{plan_checkout, CheckoutPlan, MissingItemPolicy};
pub use error::{AllocationError, CoreError, CoreResult, ValidationError};
pub use ledger::{CartLine, CheckoutSession, QuantityUnit, StockReturn};
pub use money::Money;
pub use reconcile::{reconcile, Reconciliation};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Longest accepted item, category or customer name, in characters.
pub const MAX_NAME_LENGTH: usize = 200;
