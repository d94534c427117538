//! # Session State
//!
//! Holds the open checkout session and the checkout-in-flight flag.
//!
//! ## Thread Safety
//! The session is wrapped in `Arc<Mutex<T>>` because:
//! 1. Multiple commands may access/modify the session
//! 2. Only one command should modify it at a time
//! 3. Commands can run concurrently
//!
//! The lock is never held across an `.await`. Checkout raises the in-flight
//! flag and copies the session under the lock, releases it, talks to the
//! store, then clears the session. Cart edits read the flag under the same
//! lock, so an edit either lands before the copy (and is sold) or is
//! rejected.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add_to_cart ──────► with_idle_session_mut(|s| s.add_to_cart(..))      │
//! │                      flag set? ─► CHECKOUT_IN_PROGRESS                 │
//! │                                                                         │
//! │  checkout ─────────► begin_checkout() ─► (guard, snapshot)             │
//! │                      plan + commit batch                               │
//! │                      finish_checkout(&snapshot)                        │
//! │                      drop(guard) (flag = false)                        │
//! │                                                                         │
//! │  checkout (again) ─► begin_checkout() ─► CHECKOUT_IN_PROGRESS          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{ApiError, ErrorCode};
use carton_core::CheckoutSession;

/// Thread-safe wrapper around the open [`CheckoutSession`].
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    session: Arc<Mutex<CheckoutSession>>,
    in_flight: Arc<AtomicBool>,
}

impl SessionState {
    /// Creates a new SessionState with an empty session.
    pub fn new() -> Self {
        SessionState::default()
    }

    /// Executes a function with read access to the session.
    pub fn with_session<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&CheckoutSession) -> R,
    {
        let session = self.lock();
        f(&session)
    }

    /// Executes a function with write access to the session.
    ///
    /// Does not look at the in-flight flag; cart edits go through
    /// [`SessionState::with_idle_session_mut`].
    pub fn with_session_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut CheckoutSession) -> R,
    {
        let mut session = self.lock();
        f(&mut session)
    }

    /// Executes a cart edit unless a checkout is committing the session.
    ///
    /// The flag is read under the session lock, after any `.await` the caller
    /// made to load data.
    ///
    /// ## Errors
    /// `CHECKOUT_IN_PROGRESS`, or whatever `f` returns.
    pub fn with_idle_session_mut<F, R>(&self, f: F) -> Result<R, ApiError>
    where
        F: FnOnce(&mut CheckoutSession) -> Result<R, ApiError>,
    {
        let mut session = self.lock();
        if self.is_checkout_in_flight() {
            return Err(in_progress());
        }
        f(&mut session)
    }

    /// A copy of the session as it is now.
    pub fn snapshot(&self) -> CheckoutSession {
        self.with_session(CheckoutSession::clone)
    }

    pub fn is_checkout_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Marks a checkout as running until the returned guard is dropped, and
    /// returns the session it commits.
    ///
    /// ## Errors
    /// `CHECKOUT_IN_PROGRESS` when another checkout holds the flag.
    pub fn begin_checkout(&self) -> Result<(CheckoutGuard, CheckoutSession), ApiError> {
        let session = self.lock();
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| in_progress())?;

        let guard = CheckoutGuard {
            flag: Arc::clone(&self.in_flight),
        };
        Ok((guard, session.clone()))
    }

    /// Clears the session after a commit, if it still equals `committed`.
    ///
    /// Returns false and leaves the session alone when it changed since
    /// [`SessionState::begin_checkout`].
    pub fn finish_checkout(&self, committed: &CheckoutSession) -> bool {
        let mut session = self.lock();
        if *session != *committed {
            return false;
        }
        session.clear();
        true
    }

    fn lock(&self) -> MutexGuard<'_, CheckoutSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn in_progress() -> ApiError {
    ApiError::new(
        ErrorCode::CheckoutInProgress,
        "A checkout for this session is already running",
    )
}

/// Clears the checkout-in-flight flag on drop.
#[derive(Debug)]
pub struct CheckoutGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for CheckoutGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
