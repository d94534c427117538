//! # Auth State
//!
//! The identity service shared by all commands, plus the sign-in gate.

use std::sync::Arc;

use crate::auth::{AuthError, IdentityService, LocalIdentity};
use crate::error::ApiError;
use carton_core::User;
use carton_db::Database;

#[derive(Clone)]
pub struct AuthState {
    identity: Arc<LocalIdentity>,
}

impl AuthState {
    pub fn new(identity: LocalIdentity) -> Self {
        AuthState {
            identity: Arc::new(identity),
        }
    }

    /// Local identity over the database's `Users` collection.
    pub fn local(db: &Database) -> Self {
        AuthState::new(LocalIdentity::new(db.users()))
    }

    pub fn identity(&self) -> &LocalIdentity {
        &self.identity
    }

    /// The signed-in user.
    ///
    /// ## Errors
    /// `UNAUTHORIZED` when nobody is signed in.
    pub fn require_user(&self) -> Result<User, ApiError> {
        self.identity
            .current_user()
            .ok_or_else(|| ApiError::from(AuthError::NotSignedIn))
    }
}
