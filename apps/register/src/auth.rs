//! # Identity
//!
//! Sign-in for register operators.
//!
//! [`IdentityService`] is the seam the commands depend on. [`LocalIdentity`]
//! implements it over the `Users` collection with argon2 password hashes.
//! Auth state changes are broadcast on a `tokio::sync::watch` channel so the
//! UI can follow sign-in and sign-out.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{info, warn};

use carton_core::validation::{validate_email, validate_name};
use carton_core::{User, ValidationError};
use carton_db::{DbError, UserRecord, UserRepository};

/// Minimum password length for new accounts.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Identity errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown email or wrong password. The two are not distinguished.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Sign in required")]
    NotSignedIn,

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error(transparent)]
    Store(#[from] DbError),
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Operator sign-in.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Verifies credentials and makes the user current.
    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<User>;

    /// Clears the current user.
    async fn sign_out(&self);

    fn current_user(&self) -> Option<User>;

    /// Receiver that sees every change of the current user.
    fn observe_auth_state(&self) -> watch::Receiver<Option<User>>;
}

/// [`IdentityService`] backed by the local document store.
pub struct LocalIdentity {
    users: UserRepository,
    state: watch::Sender<Option<User>>,
}

impl LocalIdentity {
    pub fn new(users: UserRepository) -> Self {
        let (state, _) = watch::channel(None);
        LocalIdentity { users, state }
    }

    /// Creates an operator account.
    ///
    /// ## Errors
    /// - `Validation` for a bad email, display name or short password
    /// - `Store(AlreadyExists)` when the email is taken
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> AuthResult<User> {
        let email = validate_email(email)?;
        let display_name = display_name
            .map(|name| validate_name("display_name", name))
            .transpose()?;

        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ValidationError::OutOfRange {
                field: "password length".to_string(),
                min: MIN_PASSWORD_LENGTH as i64,
                max: i64::from(u16::MAX),
            }
            .into());
        }

        let record = UserRecord {
            id: String::new(),
            email,
            display_name,
            password_hash: hash_password(password)?,
        };
        let created = self.users.insert(&record).await?;

        info!(uid = %created.id, email = %created.email, "Operator account created");
        Ok(created.to_user())
    }

    /// Whether any operator account exists yet.
    pub async fn has_accounts(&self) -> AuthResult<bool> {
        Ok(self.users.count().await? > 0)
    }
}

#[async_trait]
impl IdentityService for LocalIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<User> {
        let Some(record) = self.users.find_by_email(email).await? else {
            warn!(email, "Sign-in with unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &record.password_hash) {
            warn!(email, "Sign-in with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let user = record.to_user();
        self.state.send_replace(Some(user.clone()));
        info!(uid = %user.uid, "Signed in");
        Ok(user)
    }

    async fn sign_out(&self) {
        if let Some(user) = self.state.send_replace(None) {
            info!(uid = %user.uid, "Signed out");
        }
    }

    fn current_user(&self) -> Option<User> {
        self.state.borrow().clone()
    }

    fn observe_auth_state(&self) -> watch::Receiver<Option<User>> {
        self.state.subscribe()
    }
}

/// Hashes a password for storage.
pub fn hash_password(password: &str) -> AuthResult<String> {
    use argon2::{
        password_hash::{rand_core::OsRng, SaltString},
        Argon2, PasswordHasher,
    };

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hashing(e.to_string()))?;

    Ok(hash.to_string())
}

/// Checks a password against a stored hash. An unparseable hash never matches.
fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};

    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}
