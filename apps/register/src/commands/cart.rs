//! # Cart Commands
//!
//! Commands over the open [`CheckoutSession`].
//!
//! ## Cart Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Lifecycle                                       │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Empty   │────►│ In Cart  │────►│ Checkout │────►│   Sale   │       │
//! │  │ Session  │     │          │     │ (batch)  │     │  stored  │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └──────────┘       │
//! │       ▲                │                                  │             │
//! │       │           add_to_cart                              │             │
//! │       │           edit_quantity                            │             │
//! │       │           set_discount                             │             │
//! │       │           remove_from_cart                         │             │
//! │       │                │                                   │             │
//! │       └──── clear_cart ┴───────────────────────────────────┘             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every quantity change re-runs the allocator against the line's original
//! stock snapshot. A rejected change leaves the line as it was.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::error::ApiError;
use crate::state::{AuthState, DbState, SessionState};
use carton_core::ledger::PrefillReport;
use carton_core::validation::{validate_count, validate_discount_percent, validate_quantity};
use carton_core::{CartLine, CheckoutSession, InventoryItem, Money, QuantityUnit, StockReturn};

/// Cart response including lines and totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartResponse {
    pub lines: Vec<CartLine>,
    pub credit_account: Option<String>,
    pub total: Money,
    pub profit: Money,
    pub discount_total: Money,
}

impl From<&CheckoutSession> for CartResponse {
    fn from(session: &CheckoutSession) -> Self {
        CartResponse {
            lines: session.lines().to_vec(),
            credit_account: session.credit_account().map(str::to_string),
            total: session.total(),
            profit: session.profit(),
            discount_total: session.discount_total(),
        }
    }
}

/// Result of re-opening a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PrefillResponse {
    pub cart: CartResponse,
    pub report: PrefillReport,
}

/// Gets the current cart contents.
pub fn get_cart(session: &SessionState) -> CartResponse {
    debug!("get_cart command");
    session.with_session(|s| CartResponse::from(s))
}

/// Adds `quantity` cartons or pieces to an item's line.
///
/// ## Behavior
/// - If the item is already in the cart: its request grows
/// - If not: a line is opened from the item's current stock
/// - Prices are frozen when the line is opened
pub async fn add_to_cart(
    db: &DbState,
    session: &SessionState,
    auth: &AuthState,
    item_id: &str,
    quantity: i64,
    unit: QuantityUnit,
) -> Result<CartResponse, ApiError> {
    debug!(item_id, quantity, ?unit, "add_to_cart command");
    auth.require_user()?;
    let quantity = validate_quantity(quantity)?;
    let item = load_item(db, item_id).await?;

    session.with_idle_session_mut(|s| {
        s.add_to_cart(&item, quantity, unit).map_err(|err| {
            warn!(item_id, quantity, ?unit, error = %err, "Add to cart rejected");
            err
        })?;
        Ok(CartResponse::from(&*s))
    })
}

/// Replaces an item's request with `cartons` and `pieces`.
pub async fn edit_quantity(
    db: &DbState,
    session: &SessionState,
    auth: &AuthState,
    item_id: &str,
    cartons: i64,
    pieces: i64,
) -> Result<CartResponse, ApiError> {
    debug!(item_id, cartons, pieces, "edit_quantity command");
    auth.require_user()?;
    let cartons = validate_count("cartons", cartons)?;
    let pieces = validate_count("pieces", pieces)?;
    let item = load_item(db, item_id).await?;

    session.with_idle_session_mut(|s| {
        s.edit_quantity(&item, cartons, pieces).map_err(|err| {
            warn!(item_id, cartons, pieces, error = %err, "Quantity edit rejected");
            err
        })?;
        Ok(CartResponse::from(&*s))
    })
}

/// Sets a line's discount, 0 to 100 percent.
pub fn set_discount(
    session: &SessionState,
    auth: &AuthState,
    item_id: &str,
    percent: i64,
) -> Result<CartResponse, ApiError> {
    debug!(item_id, percent, "set_discount command");
    auth.require_user()?;
    let rate = validate_discount_percent(percent)?;
    session.with_idle_session_mut(|s| {
        s.set_discount(item_id, rate)?;
        Ok(CartResponse::from(&*s))
    })
}

/// Drops a line and returns its allocation to stock.
pub fn remove_from_cart(
    session: &SessionState,
    auth: &AuthState,
    item_id: &str,
) -> Result<StockReturn, ApiError> {
    debug!(item_id, "remove_from_cart command");
    auth.require_user()?;
    let returned = session.with_idle_session_mut(|s| Ok(s.remove_line(item_id)?))?;
    debug!(item_id, cartons = returned.cartons, pieces = returned.pieces, "Line returned to stock");
    Ok(returned)
}

/// Empties the cart and deselects the credit account.
pub fn clear_cart(session: &SessionState, auth: &AuthState) -> Result<Vec<StockReturn>, ApiError> {
    debug!("clear_cart command");
    auth.require_user()?;
    session.with_idle_session_mut(|s| Ok(s.clear()))
}

/// Chooses the credit account to charge, or none.
pub async fn select_credit_account(
    db: &DbState,
    session: &SessionState,
    auth: &AuthState,
    account_id: Option<String>,
) -> Result<CartResponse, ApiError> {
    debug!(?account_id, "select_credit_account command");
    auth.require_user()?;
    if let Some(id) = account_id.as_deref() {
        if db.inner().credits().get(id).await?.is_none() {
            return Err(ApiError::not_found("Credit account", id));
        }
    }

    session.with_idle_session_mut(|s| {
        s.select_credit_account(account_id);
        Ok(CartResponse::from(&*s))
    })
}

/// Re-opens a stored sale: clears the cart and loads the sale's quantities
/// against current stock.
///
/// The stored sale is never changed. Checking out creates a new sale.
pub async fn prefill_from_sale(
    db: &DbState,
    session: &SessionState,
    auth: &AuthState,
    sale_id: &str,
) -> Result<PrefillResponse, ApiError> {
    debug!(sale_id, "prefill_from_sale command");
    auth.require_user()?;
    let sale = db
        .inner()
        .sales()
        .get(sale_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Sale", sale_id))?;
    let items = db.inner().items().list().await?;

    let (cart, report) = session.with_idle_session_mut(|s| {
        s.clear();
        let report = s.prefill_from_sale(&sale, &items);
        Ok((CartResponse::from(&*s), report))
    })?;

    if !report.unmatched.is_empty() || !report.rejected.is_empty() {
        warn!(
            sale_id,
            unmatched = ?report.unmatched,
            rejected = ?report.rejected,
            "Sale partly restored"
        );
    }
    info!(sale_id, restored = report.restored.len(), "Sale loaded into cart");

    Ok(PrefillResponse { cart, report })
}

async fn load_item(db: &DbState, item_id: &str) -> Result<InventoryItem, ApiError> {
    db.inner()
        .items()
        .get(item_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Item", item_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{anonymous_app, signed_in_app, stock};
    use crate::error::ErrorCode;
    use carton_core::{AllocationRequest, StockState};

    #[tokio::test]
    async fn test_add_accumulates_and_rederives() {
        let app = signed_in_app().await;
        let item = stock(&app, "Tea", 5, 4, 3).await;

        add_to_cart(&app.db, &app.session, &app.auth, &item.id, 2, QuantityUnit::Carton)
            .await
            .unwrap();
        let cart = add_to_cart(&app.db, &app.session, &app.auth, &item.id, 5, QuantityUnit::Piece)
            .await
            .unwrap();

        let line = &cart.lines[0];
        assert_eq!(line.request, AllocationRequest::new(2, 5));
        assert_eq!(line.allocated.cartons, 2);
        assert_eq!(line.allocated.pieces, 5);
        assert_eq!(line.allocated.broken_cartons, 1);
        assert_eq!(line.live_stock, StockState::new(2, 2, 3));
        assert_eq!(cart.total, Money::from_cents(1_100));
    }

    #[tokio::test]
    async fn test_rejected_edit_leaves_line() {
        let app = signed_in_app().await;
        let item = stock(&app, "Tea", 1, 2, 12).await;

        edit_quantity(&app.db, &app.session, &app.auth, &item.id, 1, 0)
            .await
            .unwrap();
        let err = edit_quantity(&app.db, &app.session, &app.auth, &item.id, 1, 3)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        let cart = get_cart(&app.session);
        assert_eq!(cart.lines[0].request, AllocationRequest::new(1, 0));
        assert_eq!(cart.lines[0].units(), 12);
    }

    #[tokio::test]
    async fn test_remove_returns_allocation() {
        let app = signed_in_app().await;
        let item = stock(&app, "Tea", 5, 4, 3).await;

        edit_quantity(&app.db, &app.session, &app.auth, &item.id, 2, 5)
            .await
            .unwrap();
        let returned = remove_from_cart(&app.session, &app.auth, &item.id).unwrap();
        assert_eq!(returned.cartons, 3);
        assert_eq!(returned.pieces, 2);
        assert!(get_cart(&app.session).lines.is_empty());

        let err = remove_from_cart(&app.session, &app.auth, &item.id).unwrap_err();
        assert_eq!(err.code, ErrorCode::ItemNotFound);
    }

    #[tokio::test]
    async fn test_discount_and_clear() {
        let app = signed_in_app().await;
        let item = stock(&app, "Tea", 0, 10, 12).await;

        add_to_cart(&app.db, &app.session, &app.auth, &item.id, 4, QuantityUnit::Piece)
            .await
            .unwrap();
        let cart = set_discount(&app.session, &app.auth, &item.id, 25).unwrap();
        assert_eq!(cart.total, Money::from_cents(300));
        assert_eq!(cart.discount_total, Money::from_cents(100));

        let err = set_discount(&app.session, &app.auth, &item.id, 101).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let returns = clear_cart(&app.session, &app.auth).unwrap();
        assert_eq!(returns.len(), 1);
        assert_eq!(get_cart(&app.session).total, Money::zero());
    }

    #[tokio::test]
    async fn test_unknown_item_and_credit_account() {
        let app = signed_in_app().await;

        let err = add_to_cart(&app.db, &app.session, &app.auth, "ghost", 1, QuantityUnit::Piece)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = select_credit_account(&app.db, &app.session, &app.auth, Some("ghost".into()))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(get_cart(&app.session).credit_account.is_none());
    }

    #[tokio::test]
    async fn test_cart_edits_blocked_during_checkout() {
        let app = signed_in_app().await;
        let item = stock(&app, "Tea", 1, 0, 12).await;

        let (_guard, _) = app.session.begin_checkout().unwrap();
        let err = add_to_cart(&app.db, &app.session, &app.auth, &item.id, 1, QuantityUnit::Piece)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::CheckoutInProgress);
    }

    #[tokio::test]
    async fn test_requires_sign_in() {
        let app = anonymous_app().await;
        let err = clear_cart(&app.session, &app.auth).unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
    }
}
