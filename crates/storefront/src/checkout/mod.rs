//! Checkout session tracking.
//!
//! Each visitor has at most one live checkout at a time. A checkout
//! session pairs the payment state machine with the cancellation token
//! of its background status poller, keyed by the visitor's session ID.

pub mod poller;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;
use tracing::warn;

use duka_core::{CheckoutState, PaymentMethod, Price};

/// A live checkout: the payment state machine, the order total it was
/// started with, and whether the visitor's cart has already been
/// cleared for a successful payment.
///
/// Clearing happens in the request handler (the poller has no access to
/// the visitor's session), so the flag records that the one-time clear
/// has been observed.
#[derive(Debug)]
pub struct CheckoutSession {
    pub state: CheckoutState,
    pub total: Price,
    pub cart_cleared: bool,
}

impl CheckoutSession {
    #[must_use]
    pub fn new(method: PaymentMethod, total: Price) -> Self {
        Self {
            state: CheckoutState::new(method),
            total,
            cart_cleared: false,
        }
    }
}

/// Shared handle to one visitor's checkout.
#[derive(Debug, Clone)]
pub struct CheckoutHandle {
    pub state: Arc<Mutex<CheckoutSession>>,
    pub cancel: CancellationToken,
}

/// Registry of live checkouts, one per visitor.
#[derive(Debug, Clone, Default)]
pub struct CheckoutSessions {
    sessions: Arc<Mutex<HashMap<String, CheckoutHandle>>>,
}

impl CheckoutSessions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh checkout for a visitor, cancelling any previous one.
    pub fn begin(&self, visitor: &str, method: PaymentMethod, total: Price) -> CheckoutHandle {
        let handle = CheckoutHandle {
            state: Arc::new(Mutex::new(CheckoutSession::new(method, total))),
            cancel: CancellationToken::new(),
        };

        let Ok(mut sessions) = self.sessions.lock() else {
            warn!("checkout registry lock poisoned");
            return handle;
        };
        if let Some(previous) = sessions.insert(visitor.to_string(), handle.clone()) {
            previous.cancel.cancel();
        }
        handle
    }

    /// Look up a visitor's live checkout, if any.
    #[must_use]
    pub fn get(&self, visitor: &str) -> Option<CheckoutHandle> {
        let Ok(sessions) = self.sessions.lock() else {
            warn!("checkout registry lock poisoned");
            return None;
        };
        sessions.get(visitor).cloned()
    }

    /// Tear down a visitor's checkout, stopping its poller.
    pub fn close(&self, visitor: &str) {
        let Ok(mut sessions) = self.sessions.lock() else {
            warn!("checkout registry lock poisoned");
            return;
        };
        if let Some(handle) = sessions.remove(visitor) {
            handle.cancel.cancel();
        }
    }

    /// Tear down a visitor's checkout only if it is still the given one.
    ///
    /// Used where the entry to drop may already have been replaced by a
    /// newer checkout (the poller's give-up path races a fresh `begin`):
    /// a stale caller must not take down the live session.
    pub fn evict(&self, visitor: &str, state: &Arc<Mutex<CheckoutSession>>) {
        let Ok(mut sessions) = self.sessions.lock() else {
            warn!("checkout registry lock poisoned");
            return;
        };
        let is_current = sessions
            .get(visitor)
            .is_some_and(|handle| Arc::ptr_eq(&handle.state, state));
        if is_current {
            if let Some(handle) = sessions.remove(visitor) {
                handle.cancel.cancel();
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use duka_core::{CheckoutStatus, Price};

    #[test]
    fn test_begin_replaces_and_cancels_previous() {
        let sessions = CheckoutSessions::new();
        let first = sessions.begin("v1", PaymentMethod::Stk, Price::from_whole(100));
        assert!(!first.cancel.is_cancelled());

        let second = sessions.begin("v1", PaymentMethod::Paybill, Price::from_whole(100));
        assert!(first.cancel.is_cancelled());
        assert!(!second.cancel.is_cancelled());

        let current = sessions.get("v1").unwrap();
        assert_eq!(
            current.state.lock().unwrap().state.method(),
            PaymentMethod::Paybill
        );
    }

    #[test]
    fn test_close_cancels_and_removes() {
        let sessions = CheckoutSessions::new();
        let handle = sessions.begin("v1", PaymentMethod::Stk, Price::from_whole(100));
        sessions.close("v1");
        assert!(handle.cancel.is_cancelled());
        assert!(sessions.get("v1").is_none());
    }

    #[test]
    fn test_evict_removes_only_the_matching_checkout() {
        let sessions = CheckoutSessions::new();
        let stale = sessions.begin("v1", PaymentMethod::Stk, Price::from_whole(100));
        let current = sessions.begin("v1", PaymentMethod::Stk, Price::from_whole(100));

        // A stale handle must not take down the live checkout.
        sessions.evict("v1", &stale.state);
        assert!(sessions.get("v1").is_some());

        sessions.evict("v1", &current.state);
        assert!(sessions.get("v1").is_none());
        assert!(current.cancel.is_cancelled());
    }

    #[test]
    fn test_visitors_are_independent() {
        let sessions = CheckoutSessions::new();
        let a = sessions.begin("a", PaymentMethod::Stk, Price::from_whole(100));
        let _b = sessions.begin("b", PaymentMethod::Stk, Price::from_whole(100));
        sessions.close("b");
        assert!(!a.cancel.is_cancelled());
        assert_eq!(
            sessions.get("a").unwrap().state.lock().unwrap().state.status(),
            CheckoutStatus::Initial
        );
    }
}
