//! # Checkout Command
//!
//! Commits the open session as a sale.
//!
//! ## Commit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. begin_checkout()          second concurrent call → IN_PROGRESS      │
//! │  2. snapshot the session      cart edits now get IN_PROGRESS            │
//! │  3. read persisted items and the selected credit account               │
//! │  4. plan_checkout()           every check runs here, nothing written    │
//! │       EmptyCart / InsufficientCredit / ItemNotFound / InsufficientStock │
//! │  5. one WriteBatch:                                                     │
//! │       Credits  update {credit}                                          │
//! │       Items    update {cartons, pieces, totalPieces}   per line         │
//! │       Sales    set    Sale-{n}                                          │
//! │  6. commit                    all or nothing                            │
//! │  7. clear the session         only if it still equals the snapshot      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Item stock is recomputed from the persisted counts, not from the cart's
//! snapshot, so a sale made elsewhere since the line was opened is
//! accounted for.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::error::ApiError;
use crate::state::{AuthState, ConfigState, DbState, SessionState};
use carton_core::{plan_checkout, Sale};
use carton_db::{CreditRepository, DocumentStore, ItemRepository, SaleRepository, WriteBatch};

/// What a completed checkout returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CheckoutResponse {
    pub sale: Sale,

    /// Lines sold without a stock update because their item was deleted.
    pub skipped: Vec<String>,
}

/// Commits the session: deducts credit, decrements stock and stores the
/// sale in one atomic batch, then clears the session.
///
/// ## Errors
/// Any failure leaves the store and the session unchanged.
pub async fn checkout(
    db: &DbState,
    session: &SessionState,
    auth: &AuthState,
    config: &ConfigState,
) -> Result<CheckoutResponse, ApiError> {
    debug!("checkout command");
    let operator = auth.require_user()?;
    let (_guard, snapshot) = session.begin_checkout()?;
    let store = db.inner();

    let persisted = store
        .items()
        .get_many(snapshot.active_lines().map(|line| line.item_id.as_str()))
        .await?;

    let credit = match snapshot.credit_account() {
        Some(id) => Some(
            store
                .credits()
                .get(id)
                .await?
                .ok_or_else(|| ApiError::not_found("Credit account", id))?,
        ),
        None => None,
    };

    let plan = plan_checkout(
        &snapshot,
        &persisted,
        credit.as_ref(),
        config.missing_item_policy,
    )
    .map_err(|err| {
        warn!(error = %err, "Checkout rejected");
        err
    })?;

    for name in &plan.skipped {
        warn!(item = %name, "Item no longer exists, sold without a stock update");
    }

    let sale_id = store.sales().next_id().await?;
    let sale = plan.to_sale(sale_id, Utc::now());

    let mut batch = WriteBatch::new();
    if let Some(account) = &plan.credit_update {
        CreditRepository::stage_balance(&mut batch, account)?;
    }
    for item in &plan.inventory_updates {
        ItemRepository::stage_stock_update(&mut batch, item)?;
    }
    SaleRepository::stage_insert(&mut batch, &sale)?;

    store.commit(batch).await?;

    if !session.finish_checkout(&snapshot) {
        warn!("Cart changed during checkout, left as is");
    }

    info!(
        sale_id = %sale.sale_id,
        total = %sale.total,
        profit = %sale.profit,
        lines = sale.items.len(),
        customer = ?sale.customer,
        operator = %operator.uid,
        "Sale completed"
    );

    Ok(CheckoutResponse {
        sale,
        skipped: plan.skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cart::{edit_quantity, get_cart, select_credit_account};
    use crate::commands::test_support::{signed_in_app, stock};
    use crate::error::ErrorCode;
    use crate::AppState;
    use carton_core::{CreditAccount, MissingItemPolicy, Money};

    async fn account(app: &AppState, credit: i64) -> CreditAccount {
        app.db
            .inner()
            .credits()
            .insert(&CreditAccount {
                id: String::new(),
                name: "Bilal Traders".to_string(),
                credit: Money::from_cents(credit),
                timestamp: Utc::now(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_checkout_writes_everything() {
        let app = signed_in_app().await;
        let item = stock(&app, "Tea", 5, 4, 3).await;
        let acct = account(&app, 5_000).await;

        edit_quantity(&app.db, &app.session, &app.auth, &item.id, 2, 5)
            .await
            .unwrap();
        select_credit_account(&app.db, &app.session, &app.auth, Some(acct.id.clone()))
            .await
            .unwrap();

        let done = checkout(&app.db, &app.session, &app.auth, &app.config)
            .await
            .unwrap();
        assert_eq!(done.sale.sale_id, "Sale-1");
        assert_eq!(done.sale.total, Money::from_cents(1_100));
        assert_eq!(done.sale.customer.as_deref(), Some("Bilal Traders"));
        assert_eq!(done.sale.items[0].broken_cartons, 1);

        let stored = app.db.inner().items().get(&item.id).await.unwrap().unwrap();
        assert_eq!((stored.cartons, stored.pieces, stored.total_pieces), (2, 2, 8));

        let credit = app.db.inner().credits().get(&acct.id).await.unwrap().unwrap();
        assert_eq!(credit.credit, Money::from_cents(3_900));

        assert!(app.db.inner().sales().get("Sale-1").await.unwrap().is_some());
        assert!(get_cart(&app.session).lines.is_empty());
        assert!(!app.session.is_checkout_in_flight());
    }

    #[tokio::test]
    async fn test_insufficient_credit_has_no_side_effects() {
        let app = signed_in_app().await;
        let item = stock(&app, "Tea", 5, 4, 3).await;
        let acct = account(&app, 1_000).await;

        edit_quantity(&app.db, &app.session, &app.auth, &item.id, 2, 5)
            .await
            .unwrap();
        select_credit_account(&app.db, &app.session, &app.auth, Some(acct.id.clone()))
            .await
            .unwrap();

        let err = checkout(&app.db, &app.session, &app.auth, &app.config)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientCredit);

        let stored = app.db.inner().items().get(&item.id).await.unwrap().unwrap();
        assert_eq!(stored.total_pieces, 19);
        assert_eq!(app.db.inner().sales().count().await.unwrap(), 0);
        assert_eq!(get_cart(&app.session).lines.len(), 1);
        assert!(!app.session.is_checkout_in_flight());
    }

    #[tokio::test]
    async fn test_uses_persisted_stock() {
        let app = signed_in_app().await;
        let item = stock(&app, "Tea", 2, 0, 12).await;

        edit_quantity(&app.db, &app.session, &app.auth, &item.id, 1, 0)
            .await
            .unwrap();

        // Another register sold a carton in the meantime.
        let mut sold_elsewhere = item.clone();
        sold_elsewhere.set_stock(1, 0);
        app.db.inner().items().update(&item.id, &sold_elsewhere).await.unwrap();

        checkout(&app.db, &app.session, &app.auth, &app.config)
            .await
            .unwrap();
        let stored = app.db.inner().items().get(&item.id).await.unwrap().unwrap();
        assert_eq!(stored.total_pieces, 0);
    }

    #[tokio::test]
    async fn test_stock_gone_elsewhere_rejects() {
        let app = signed_in_app().await;
        let item = stock(&app, "Tea", 1, 0, 12).await;

        edit_quantity(&app.db, &app.session, &app.auth, &item.id, 1, 0)
            .await
            .unwrap();

        let mut sold_elsewhere = item.clone();
        sold_elsewhere.set_stock(0, 6);
        app.db.inner().items().update(&item.id, &sold_elsewhere).await.unwrap();

        let err = checkout(&app.db, &app.session, &app.auth, &app.config)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(app.db.inner().sales().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_deleted_item_policy() {
        let app = signed_in_app().await;
        let kept = stock(&app, "Tea", 1, 0, 12).await;
        let gone = stock(&app, "Juice", 0, 6, 6).await;

        edit_quantity(&app.db, &app.session, &app.auth, &kept.id, 0, 2)
            .await
            .unwrap();
        edit_quantity(&app.db, &app.session, &app.auth, &gone.id, 0, 1)
            .await
            .unwrap();
        app.db.inner().items().delete(&gone.id).await.unwrap();

        let err = checkout(&app.db, &app.session, &app.auth, &app.config)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ItemNotFound);

        let skip = ConfigState {
            missing_item_policy: MissingItemPolicy::Skip,
            ..ConfigState::default()
        };
        let done = checkout(&app.db, &app.session, &app.auth, &skip)
            .await
            .unwrap();
        assert_eq!(done.skipped, vec!["Juice".to_string()]);
        assert_eq!(done.sale.items.len(), 2);

        let stored = app.db.inner().items().get(&kept.id).await.unwrap().unwrap();
        assert_eq!(stored.total_pieces, 10);
    }

    #[tokio::test]
    async fn test_edit_racing_checkout_is_sold_or_rejected() {
        let app = signed_in_app().await;
        let tea = stock(&app, "Tea", 1, 0, 12).await;
        let juice = stock(&app, "Juice", 1, 4, 6).await;

        edit_quantity(&app.db, &app.session, &app.auth, &tea.id, 0, 2)
            .await
            .unwrap();

        let (edit, done) = tokio::join!(
            edit_quantity(&app.db, &app.session, &app.auth, &juice.id, 0, 7),
            checkout(&app.db, &app.session, &app.auth, &app.config),
        );
        let done = done.unwrap();
        let sold_juice = done.sale.items.iter().any(|line| line.item_id == juice.id);
        let stored = app.db.inner().items().get(&juice.id).await.unwrap().unwrap();

        let cart = get_cart(&app.session);

        // An accepted edit is either in the sale or still in the cart.
        match edit {
            Ok(_) if sold_juice => {
                assert_eq!(stored.total_pieces, 3);
                assert!(cart.lines.is_empty());
            }
            Ok(_) => {
                assert_eq!(stored.total_pieces, 10);
                assert_eq!(cart.lines.len(), 1);
                assert_eq!(cart.lines[0].item_id, juice.id);
            }
            Err(err) => {
                assert_eq!(err.code, ErrorCode::CheckoutInProgress);
                assert!(!sold_juice);
                assert_eq!(stored.total_pieces, 10);
                assert!(cart.lines.is_empty());
            }
        }
        assert!(!app.session.is_checkout_in_flight());
    }

    #[tokio::test]
    async fn test_empty_cart() {
        let app = signed_in_app().await;
        let err = checkout(&app.db, &app.session, &app.auth, &app.config)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::EmptyCart);
    }

    #[tokio::test]
    async fn test_sale_ids_increase() {
        let app = signed_in_app().await;
        let item = stock(&app, "Tea", 0, 10, 12).await;

        for expected in ["Sale-1", "Sale-2"] {
            edit_quantity(&app.db, &app.session, &app.auth, &item.id, 0, 1)
                .await
                .unwrap();
            let done = checkout(&app.db, &app.session, &app.auth, &app.config)
                .await
                .unwrap();
            assert_eq!(done.sale.sale_id, expected);
        }
    }
}
