//! # Credit Account Commands
//!
//! Customer credit accounts: prepaid balances a sale can be charged to.

use chrono::Utc;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::{AuthState, DbState, SessionState};
use carton_core::validation::{validate_credit, CreditDraft};
use carton_core::CreditAccount;

/// Every account, newest first.
pub async fn list_credit_accounts(db: &DbState) -> Result<Vec<CreditAccount>, ApiError> {
    debug!("list_credit_accounts command");
    Ok(db.inner().credits().list().await?)
}

/// Opens an account, timestamped now.
pub async fn create_credit_account(
    db: &DbState,
    auth: &AuthState,
    draft: CreditDraft,
) -> Result<CreditAccount, ApiError> {
    debug!(name = %draft.name, "create_credit_account command");
    auth.require_user()?;

    let account = validate_credit(&draft, Utc::now())?;
    Ok(db.inner().credits().insert(&account).await?)
}

/// Changes an account's name and balance.
pub async fn update_credit_account(
    db: &DbState,
    auth: &AuthState,
    id: &str,
    draft: CreditDraft,
) -> Result<CreditAccount, ApiError> {
    debug!(id, "update_credit_account command");
    auth.require_user()?;

    let account = validate_credit(&draft, Utc::now())?;
    Ok(db
        .inner()
        .credits()
        .update(id, &account.name, account.credit)
        .await?)
}

/// Deletes an account. If the open cart had it selected, the cart goes
/// back to a walk-in sale.
pub async fn delete_credit_account(
    db: &DbState,
    session: &SessionState,
    auth: &AuthState,
    id: &str,
) -> Result<(), ApiError> {
    debug!(id, "delete_credit_account command");
    auth.require_user()?;

    db.inner().credits().delete(id).await?;

    // A checkout holding the flag keeps its selection; its batch update on
    // the deleted account fails the commit.
    session.with_session_mut(|s| {
        if s.credit_account() == Some(id) && !session.is_checkout_in_flight() {
            s.select_credit_account(None);
            info!(id, "Deleted account deselected from cart");
        }
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cart::{get_cart, select_credit_account};
    use crate::commands::test_support::{anonymous_app, signed_in_app};
    use crate::error::ErrorCode;
    use carton_core::Money;

    fn draft(name: &str, credit: i64) -> CreditDraft {
        CreditDraft {
            name: name.to_string(),
            credit,
        }
    }

    #[tokio::test]
    async fn test_credit_crud() {
        let app = signed_in_app().await;

        let created = create_credit_account(&app.db, &app.auth, draft("Ali", 5_000))
            .await
            .unwrap();
        let updated = update_credit_account(&app.db, &app.auth, &created.id, draft("Ali Raza", 7_500))
            .await
            .unwrap();
        assert_eq!(updated.credit, Money::from_cents(7_500));
        assert_eq!(updated.timestamp, created.timestamp);

        let listed = list_credit_accounts(&app.db).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Ali Raza");
    }

    #[tokio::test]
    async fn test_validation() {
        let app = signed_in_app().await;

        let err = create_credit_account(&app.db, &app.auth, draft("", 100))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = create_credit_account(&app.db, &app.auth, draft("Ali", -1))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_delete_deselects_from_cart() {
        let app = signed_in_app().await;
        let created = create_credit_account(&app.db, &app.auth, draft("Ali", 5_000))
            .await
            .unwrap();

        select_credit_account(&app.db, &app.session, &app.auth, Some(created.id.clone()))
            .await
            .unwrap();
        delete_credit_account(&app.db, &app.session, &app.auth, &created.id)
            .await
            .unwrap();

        assert!(get_cart(&app.session).credit_account.is_none());
        let err = delete_credit_account(&app.db, &app.session, &app.auth, &created.id)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_requires_sign_in() {
        let app = anonymous_app().await;
        let err = create_credit_account(&app.db, &app.auth, draft("Ali", 100))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthorized);
    }
}
