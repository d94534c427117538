//! # Validation Module
//!
//! Input validation for the inventory and credit forms and for cart inputs.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Web UI                                                       │
//! │  └── Immediate feedback on empty fields                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Register command (Rust)                                      │
//! │  ├── Deserialization of the draft                                      │
//! │  └── THIS MODULE: business rules, draft → domain record                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Allocator                                                    │
//! │  └── Rejects zero pieces per carton and over-requests                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Drafts carry signed numbers so a negative value from the UI becomes a
//! `Negative` error instead of a deserialization failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{CreditAccount, DiscountRate, InventoryItem};
use crate::MAX_NAME_LENGTH;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a required display string and returns it trimmed.
///
/// ## Example
/// ```rust
/// use carton_core::validation::validate_name;
///
/// assert_eq!(validate_name("name", "  Tea 200g ").unwrap(), "Tea 200g");
/// assert!(validate_name("category", "").is_err());
/// ```
pub fn validate_name(field: &str, value: &str) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(value.to_string())
}

/// Validates a sign-in email address.
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    match email.split_once('@') {
        Some((user, domain)) if !user.is_empty() && domain.contains('.') => {
            Ok(email.to_lowercase())
        }
        _ => Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@example.com".to_string(),
        }),
    }
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a count from the UI and narrows it to `u32`.
pub fn validate_count(field: &str, value: i64) -> ValidationResult<u32> {
    if value < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    u32::try_from(value).map_err(|_| ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: u32::MAX as i64,
    })
}

/// Validates an amount in minor units.
///
/// Zero is allowed (free items, empty credit accounts).
pub fn validate_amount(field: &str, cents: i64) -> ValidationResult<Money> {
    if cents < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    Ok(Money::from_cents(cents))
}

/// Validates an add-to-cart quantity.
///
/// ## User Workflow
/// ```text
/// Cashier types 3 and presses "Add carton"
///      │
///      ▼
/// validate_quantity(3) ← THIS FUNCTION
///      │
///      ├── 0? → "quantity must be positive"
///      │
///      └── OK → CheckoutSession::add_to_cart
/// ```
pub fn validate_quantity(quantity: i64) -> ValidationResult<u32> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    validate_count("quantity", quantity)
}

/// Validates a whole-percent discount (0-100).
pub fn validate_discount_percent(percent: i64) -> ValidationResult<DiscountRate> {
    if !(0..=100).contains(&percent) {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: 100,
        });
    }

    Ok(DiscountRate::from_percent(percent as u32))
}

// =============================================================================
// Item Form
// =============================================================================

/// Inventory form input, as submitted by the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ItemDraft {
    pub name: String,
    pub category: String,
    pub actual_price: Option<i64>,
    pub selling_price: Option<i64>,
    #[serde(default)]
    pub cartons: i64,
    #[serde(default)]
    pub pieces: i64,
    #[serde(default)]
    pub pieces_per_carton: i64,
    pub danger_level: Option<i64>,
}

/// Validates an item form and builds the record to store.
///
/// ## Rules
/// - name, category, both prices and the danger level are required
/// - no value may be negative
/// - at least one of cartons and pieces must be positive
/// - pieces per carton must be positive when cartons are given
///
/// `total_pieces` is computed, never taken from input. The returned item has
/// an empty id; the repository assigns one on insert.
pub fn validate_item(draft: &ItemDraft) -> ValidationResult<InventoryItem> {
    let name = validate_name("name", &draft.name)?;
    let category = validate_name("category", &draft.category)?;

    let actual_price = validate_amount("actual_price", required("actual_price", draft.actual_price)?)?;
    let selling_price =
        validate_amount("selling_price", required("selling_price", draft.selling_price)?)?;
    let danger_level = validate_count("danger_level", required("danger_level", draft.danger_level)?)?;

    let cartons = validate_count("cartons", draft.cartons)?;
    let pieces = validate_count("pieces", draft.pieces)?;
    let pieces_per_carton = validate_count("pieces_per_carton", draft.pieces_per_carton)?;

    if cartons == 0 && pieces == 0 {
        return Err(ValidationError::MustBePositive {
            field: "cartons or pieces".to_string(),
        });
    }

    if cartons > 0 && pieces_per_carton == 0 {
        return Err(ValidationError::MustBePositive {
            field: "pieces_per_carton".to_string(),
        });
    }

    let mut item = InventoryItem {
        id: String::new(),
        name,
        category,
        actual_price,
        selling_price,
        cartons: 0,
        pieces: 0,
        pieces_per_carton,
        total_pieces: 0,
        danger_level: danger_level as u64,
    };
    item.set_stock(cartons, pieces);
    Ok(item)
}

fn required(field: &str, value: Option<i64>) -> ValidationResult<i64> {
    value.ok_or_else(|| ValidationError::Required {
        field: field.to_string(),
    })
}

// =============================================================================
// Credit Form
// =============================================================================

/// Credit account form input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreditDraft {
    pub name: String,
    pub credit: i64,
}

/// Validates a credit form. `timestamp` becomes the account's creation time.
pub fn validate_credit(draft: &CreditDraft, timestamp: DateTime<Utc>) -> ValidationResult<CreditAccount> {
    Ok(CreditAccount {
        id: String::new(),
        name: validate_name("name", &draft.name)?,
        credit: validate_amount("credit", draft.credit)?,
        timestamp,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
