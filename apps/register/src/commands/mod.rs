//! # Commands Module
//!
//! All commands exposed to the register UI.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (exports)
//! ├── inventory.rs ◄─── Item CRUD, low-stock alerts
//! ├── cart.rs      ◄─── Cart ledger (add, edit, remove, discount, prefill)
//! ├── checkout.rs  ◄─── Commit the session as one write batch
//! ├── credit.rs    ◄─── Customer credit accounts
//! ├── sales.rs     ◄─── Sales history and the dashboard
//! └── auth.rs      ◄─── Sign in / out, operator accounts
//! ```
//!
//! ## State Injection
//! Each command declares only the state it needs:
//! ```rust,ignore
//! // Only needs database
//! async fn list_items(db: &DbState)
//!
//! // Only needs the session
//! fn get_cart(session: &SessionState)
//!
//! // Mutations also take AuthState and fail with UNAUTHORIZED when
//! // nobody is signed in
//! async fn add_to_cart(db: &DbState, session: &SessionState, auth: &AuthState, ...)
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod credit;
pub mod inventory;
pub mod sales;

#[cfg(test)]
pub(crate) mod test_support {
    use carton_core::validation::ItemDraft;
    use carton_core::InventoryItem;
    use carton_db::{Database, DbConfig};

    use crate::auth::IdentityService;
    use crate::state::ConfigState;
    use crate::AppState;

    /// In-memory app state with a signed-in operator.
    pub async fn signed_in_app() -> AppState {
        let app = anonymous_app().await;
        app.auth
            .identity()
            .register("owner@shop.pk", "s3cret-pass", Some("Owner"))
            .await
            .unwrap();
        app.auth
            .identity()
            .sign_in("owner@shop.pk", "s3cret-pass")
            .await
            .unwrap();
        app
    }

    /// In-memory app state with nobody signed in.
    pub async fn anonymous_app() -> AppState {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        AppState::new(db, ConfigState::default())
    }

    pub fn draft(name: &str, cartons: i64, pieces: i64, ppc: i64) -> ItemDraft {
        ItemDraft {
            name: name.to_string(),
            category: "Drinks".to_string(),
            actual_price: Some(80),
            selling_price: Some(100),
            cartons,
            pieces,
            pieces_per_carton: ppc,
            danger_level: Some(0),
        }
    }

    /// Stores an item straight through the repository.
    pub async fn stock(app: &AppState, name: &str, cartons: i64, pieces: i64, ppc: i64) -> InventoryItem {
        let item = carton_core::validation::validate_item(&draft(name, cartons, pieces, ppc)).unwrap();
        app.db.inner().items().insert(&item).await.unwrap()
    }
}
