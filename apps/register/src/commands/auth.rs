//! # Auth Commands
//!
//! Sign in, sign out and operator accounts.
//!
//! The first account on a fresh database can be created without signing in;
//! after that only a signed-in operator can add accounts.

use tracing::debug;

use crate::auth::IdentityService;
use crate::error::ApiError;
use crate::state::{AuthState, SessionState};
use carton_core::User;

pub async fn sign_in(auth: &AuthState, email: &str, password: &str) -> Result<User, ApiError> {
    debug!(email, "sign_in command");
    Ok(auth.identity().sign_in(email, password).await?)
}

/// Signs out and discards the open cart.
pub async fn sign_out(auth: &AuthState, session: &SessionState) -> Result<(), ApiError> {
    debug!("sign_out command");
    session.with_idle_session_mut(|s| {
        s.clear();
        Ok(())
    })?;
    auth.identity().sign_out().await;
    Ok(())
}

pub fn current_user(auth: &AuthState) -> Option<User> {
    auth.identity().current_user()
}

/// Creates an operator account.
pub async fn create_account(
    auth: &AuthState,
    email: &str,
    password: &str,
    display_name: Option<&str>,
) -> Result<User, ApiError> {
    debug!(email, "create_account command");

    if auth.identity().has_accounts().await? {
        auth.require_user()?;
    }

    Ok(auth
        .identity()
        .register(email, password, display_name)
        .await?)
}
