//! # Checkout Module
//!
//! Turns a finished [`CheckoutSession`] into everything the store must write:
//! updated inventory documents, the debited credit account and the sale.
//!
//! ## Commit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Checkout Commit                                 │
//! │                                                                         │
//! │  plan_checkout()  (pure, this module)                                  │
//! │   1. cart has at least one allocated line      else EmptyCart          │
//! │   2. credit account covers the total           else InsufficientCredit │
//! │   3. every line's item still exists            else ItemNotFound       │
//! │      (or skipped, per MissingItemPolicy)                                │
//! │   4. every request fits the PERSISTED stock    else InsufficientStock  │
//! │        │                                                                │
//! │        ▼  CheckoutPlan                                                  │
//! │  register app  (I/O)                                                    │
//! │   5. one WriteBatch: credit update + item updates + sale document      │
//! │   6. session cleared                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Steps 1-4 run before anything is written, so a failed check has no side
//! effects. Step 4 re-allocates each line's cumulative request against the
//! stock read at commit time and writes the resulting remaining stock, so a
//! concurrent sale on another terminal is never overwritten by a stale
//! snapshot.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::allocation::allocate;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::ledger::{CartLine, CheckoutSession};
use crate::money::Money;
use crate::types::{CreditAccount, InventoryItem, Sale, SaleLineItem};

// =============================================================================
// Missing Item Policy
// =============================================================================

/// What to do when a cart line's item was deleted while the cart was open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum MissingItemPolicy {
    /// Reject the whole checkout.
    #[default]
    Abort,

    /// Sell and record the line but write no inventory update for it.
    Skip,
}

impl fmt::Display for MissingItemPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingItemPolicy::Abort => write!(f, "abort"),
            MissingItemPolicy::Skip => write!(f, "skip"),
        }
    }
}

impl FromStr for MissingItemPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(MissingItemPolicy::Abort),
            "skip" => Ok(MissingItemPolicy::Skip),
            other => Err(ValidationError::InvalidFormat {
                field: "missing_item_policy".to_string(),
                reason: format!("expected 'abort' or 'skip', got '{}'", other),
            }),
        }
    }
}

// =============================================================================
// Checkout Plan
// =============================================================================

/// Everything a commit writes, computed up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutPlan {
    /// Items with their post-sale stock.
    pub inventory_updates: Vec<InventoryItem>,

    /// Credit account with the total already deducted.
    pub credit_update: Option<CreditAccount>,

    pub lines: Vec<SaleLineItem>,

    pub total: Money,

    pub profit: Money,

    /// Names of lines sold without an inventory update.
    pub skipped: Vec<String>,
}

impl CheckoutPlan {
    /// Builds the sale record for this plan.
    pub fn to_sale(&self, sale_id: String, timestamp: DateTime<Utc>) -> Sale {
        Sale {
            sale_id,
            timestamp,
            items: self.lines.clone(),
            total: self.total,
            profit: self.profit,
            customer: self.credit_update.as_ref().map(|acct| acct.name.clone()),
        }
    }
}

/// Validates `session` against persisted state and computes the commit.
///
/// `persisted` holds the current documents of the session's items; an item
/// absent from the slice is treated as deleted. `credit` is the selected
/// account as currently stored.
///
/// ## Errors
/// - [`CoreError::EmptyCart`]
/// - [`CoreError::InsufficientCredit`]
/// - [`CoreError::ItemNotFound`] under [`MissingItemPolicy::Abort`]
/// - [`CoreError::InsufficientStock`] when persisted stock shrank below a
///   line's request
pub fn plan_checkout(
    session: &CheckoutSession,
    persisted: &[InventoryItem],
    credit: Option<&CreditAccount>,
    policy: MissingItemPolicy,
) -> CoreResult<CheckoutPlan> {
    if session.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let total = session.total();
    let profit = session.profit();

    let credit_update = match credit {
        Some(account) if !account.can_cover(total) => {
            return Err(CoreError::InsufficientCredit {
                customer: account.name.clone(),
                available: account.credit,
                required: total,
            });
        }
        Some(account) => {
            let mut updated = account.clone();
            updated.credit -= total;
            Some(updated)
        }
        None => None,
    };

    let mut inventory_updates = Vec::new();
    let mut lines = Vec::new();
    let mut skipped = Vec::new();

    for line in session.active_lines() {
        let Some(item) = persisted.iter().find(|item| item.id == line.item_id) else {
            match policy {
                MissingItemPolicy::Abort => {
                    return Err(CoreError::ItemNotFound(line.name.clone()));
                }
                MissingItemPolicy::Skip => {
                    skipped.push(line.name.clone());
                    lines.push(sale_line(line, line.allocated.cartons, line.allocated.broken_cartons));
                    continue;
                }
            }
        };

        let result = allocate(&item.sellable_stock(), &line.request)
            .map_err(|err| CoreError::from_allocation(item.name.clone(), err))?;

        let mut updated = item.clone();
        updated.set_stock(result.remaining_stock.cartons, result.remaining_stock.pieces);
        inventory_updates.push(updated);

        lines.push(sale_line(
            line,
            result.allocated.cartons,
            result.allocated.broken_cartons,
        ));
    }

    Ok(CheckoutPlan {
        inventory_updates,
        credit_update,
        lines,
        total,
        profit,
        skipped,
    })
}

fn sale_line(line: &CartLine, cartons: u32, broken_cartons: u32) -> SaleLineItem {
    SaleLineItem {
        item_id: line.item_id.clone(),
        name: line.name.clone(),
        category: line.category.clone(),
        unit_price: line.selling_price,
        cartons,
        pieces_per_carton: line.item_pieces_per_carton,
        total_pieces: line.units(),
        broken_cartons,
        discount: line.discount,
        line_total: line.line_total(),
    }
}

// =============================================================================
// Sale Ids
// =============================================================================

/// Next free `Sale-{n}` id.
///
/// Starts at the number of existing sales plus one and counts up past any id
/// already taken (sales deleted out of order leave gaps).
pub fn next_sale_id<S: AsRef<str>>(existing: &[S]) -> String {
    let mut sequence = existing.len() as u64 + 1;
    loop {
        let candidate = Sale::format_id(sequence);
        if !existing.iter().any(|id| id.as_ref() == candidate) {
            return candidate;
        }
        sequence += 1;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::QuantityUnit;
    use crate::types::DiscountRate;

    fn item(id: &str, cartons: u32, pieces: u32, ppc: u32) -> InventoryItem {
        let mut item = InventoryItem {
            id: id.to_string(),
            name: format!("Item {}", id),
            category: "General".to_string(),
            actual_price: Money::from_cents(70),
            selling_price: Money::from_cents(100),
            cartons: 0,
            pieces: 0,
            pieces_per_carton: ppc,
            total_pieces: 0,
            danger_level: 10,
        };
        item.set_stock(cartons, pieces);
        item
    }

    fn account(credit: i64) -> CreditAccount {
        CreditAccount {
            id: "acct-1".to_string(),
            name: "Bilal Traders".to_string(),
            credit: Money::from_cents(credit),
            timestamp: Utc::now(),
        }
    }

    fn session_with(items: &[(&InventoryItem, u32, u32)]) -> CheckoutSession {
        let mut session = CheckoutSession::new();
        for (item, cartons, pieces) in items {
            session.edit_quantity(item, *cartons, *pieces).unwrap();
        }
        session
    }

    #[test]
    fn test_plan_updates_stock_and_builds_sale() {
        let soap = item("soap", 5, 4, 3);
        let juice = item("juice", 2, 0, 5);
        let session = session_with(&[(&soap, 2, 3), (&juice, 0, 7)]);

        let plan = plan_checkout(
            &session,
            &[soap.clone(), juice.clone()],
            None,
            MissingItemPolicy::Abort,
        )
        .unwrap();

        assert_eq!(plan.inventory_updates.len(), 2);
        assert_eq!(plan.inventory_updates[0].cartons, 3);
        assert_eq!(plan.inventory_updates[0].pieces, 1);
        assert_eq!(plan.inventory_updates[0].total_pieces, 10);
        assert_eq!(plan.inventory_updates[1].pieces, 3);

        // 16 units at 1.00
        assert_eq!(plan.total, Money::from_cents(1600));
        assert_eq!(plan.profit, Money::from_cents(480));
        assert_eq!(plan.lines[1].broken_cartons, 2);
        assert!(plan.credit_update.is_none());

        let sale = plan.to_sale("Sale-1".to_string(), Utc::now());
        assert_eq!(sale.items.len(), 2);
        assert!(sale.customer.is_none());
    }

    #[test]
    fn test_empty_cart_is_rejected() {
        let session = CheckoutSession::new();
        assert!(matches!(
            plan_checkout(&session, &[], None, MissingItemPolicy::Abort),
            Err(CoreError::EmptyCart)
        ));
    }

    #[test]
    fn test_insufficient_credit() {
        let soap = item("soap", 5, 4, 3);
        let session = session_with(&[(&soap, 1, 0)]);

        let err = plan_checkout(
            &session,
            &[soap],
            Some(&account(299)),
            MissingItemPolicy::Abort,
        )
        .unwrap_err();

        assert!(matches!(
            err,
            CoreError::InsufficientCredit { required, .. } if required == Money::from_cents(300)
        ));
    }

    #[test]
    fn test_credit_exactly_covers_total() {
        let soap = item("soap", 5, 4, 3);
        let session = session_with(&[(&soap, 1, 0)]);

        let plan = plan_checkout(
            &session,
            &[soap],
            Some(&account(300)),
            MissingItemPolicy::Abort,
        )
        .unwrap();

        let updated = plan.credit_update.clone().unwrap();
        assert!(updated.credit.is_zero());
        assert_eq!(
            plan.to_sale("Sale-9".to_string(), Utc::now()).customer,
            Some("Bilal Traders".to_string())
        );
    }

    #[test]
    fn test_missing_item_aborts_by_default() {
        let soap = item("soap", 5, 4, 3);
        let session = session_with(&[(&soap, 1, 0)]);

        let err = plan_checkout(&session, &[], None, MissingItemPolicy::Abort).unwrap_err();
        assert!(matches!(err, CoreError::ItemNotFound(name) if name == "Item soap"));
    }

    #[test]
    fn test_missing_item_skip_still_sells_line() {
        let soap = item("soap", 5, 4, 3);
        let juice = item("juice", 2, 0, 5);
        let session = session_with(&[(&soap, 1, 0), (&juice, 0, 2)]);

        let plan =
            plan_checkout(&session, &[juice], None, MissingItemPolicy::Skip).unwrap();

        assert_eq!(plan.skipped, vec!["Item soap".to_string()]);
        assert_eq!(plan.inventory_updates.len(), 1);
        assert_eq!(plan.lines.len(), 2);
        assert_eq!(plan.total, Money::from_cents(500));
    }

    #[test]
    fn test_reallocates_against_persisted_stock() {
        let soap = item("soap", 5, 4, 3);
        let session = session_with(&[(&soap, 0, 4)]);

        // Another terminal sold all loose pieces since the snapshot.
        let mut persisted = soap.clone();
        persisted.set_stock(5, 0);

        let plan = plan_checkout(&session, &[persisted], None, MissingItemPolicy::Abort).unwrap();

        assert_eq!(plan.inventory_updates[0].cartons, 3);
        assert_eq!(plan.inventory_updates[0].pieces, 2);
        assert_eq!(plan.lines[0].broken_cartons, 2);
    }

    #[test]
    fn test_persisted_stock_too_small() {
        let soap = item("soap", 5, 4, 3);
        let session = session_with(&[(&soap, 5, 0)]);

        let mut persisted = soap.clone();
        persisted.set_stock(1, 0);

        let err = plan_checkout(&session, &[persisted], None, MissingItemPolicy::Abort).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { needed: 15, available: 3, .. }));
    }

    #[test]
    fn test_discount_flows_into_line_total() {
        let soap = item("soap", 5, 4, 3);
        let mut session = CheckoutSession::new();
        session.add_to_cart(&soap, 2, QuantityUnit::Carton).unwrap();
        session
            .set_discount("soap", DiscountRate::from_percent(50))
            .unwrap();

        let plan = plan_checkout(&session, &[soap], None, MissingItemPolicy::Abort).unwrap();

        assert_eq!(plan.lines[0].line_total, Money::from_cents(300));
        assert_eq!(plan.lines[0].discount, DiscountRate::from_percent(50));
    }

    #[test]
    fn test_pieces_only_line_keeps_stored_pieces_per_carton() {
        let candy = item("candy", 0, 40, 0);
        let session = session_with(&[(&candy, 0, 15)]);

        let plan = plan_checkout(&session, &[candy], None, MissingItemPolicy::Abort).unwrap();
        let line = &plan.lines[0];

        assert_eq!(line.pieces_per_carton, 0);
        assert_eq!(line.total_pieces, 15);
        assert_eq!(line.loose_pieces(), 15);
        assert_eq!(
            crate::reports::quantity_display(line),
            "0 carton(s) (0 pieces per carton) and 15 piece(s)"
        );
        assert_eq!(plan.inventory_updates[0].total_pieces, 25);
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("skip".parse::<MissingItemPolicy>(), Ok(MissingItemPolicy::Skip));
        assert_eq!(" ABORT ".parse::<MissingItemPolicy>(), Ok(MissingItemPolicy::Abort));
        assert!("ignore".parse::<MissingItemPolicy>().is_err());
        assert_eq!(MissingItemPolicy::default().to_string(), "abort");
    }

    #[test]
    fn test_next_sale_id() {
        let none: [&str; 0] = [];
        assert_eq!(next_sale_id(&none), "Sale-1");
        assert_eq!(next_sale_id(&["Sale-1", "Sale-2"]), "Sale-3");
        // Sale-2 deleted, Sale-3 still present
        assert_eq!(next_sale_id(&["Sale-1", "Sale-3"]), "Sale-4");
    }
}
