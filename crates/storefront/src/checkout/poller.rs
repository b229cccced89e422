//! Background payment status polling.
//!
//! Once a payment is pending, a background task asks the backend for
//! the order's payment status on a fixed interval until it reports a
//! terminal outcome or the checkout is torn down. Transient API errors
//! are logged and swallowed; the next tick simply asks again.
//!
//! A visitor who abandons the dialog without closing it never cancels
//! the task, so the poller also carries a hard deadline: once the
//! checkout TTL lapses it gives up and evicts its own registry entry.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, warn};

use duka_core::OrderRef;

use crate::api::ApiClient;
use crate::api::types::PaymentStatus;
use crate::checkout::{CheckoutHandle, CheckoutSession, CheckoutSessions};

/// Spawn the status poller for a pending payment.
///
/// The task stops when the status becomes terminal, the token is
/// cancelled, or `max_duration` elapses without a resolution. In the
/// last case the checkout is dropped from the registry (unless a newer
/// one has replaced it).
pub fn spawn_status_poller(
    api: ApiClient,
    order_ref: OrderRef,
    registry: CheckoutSessions,
    visitor: String,
    handle: CheckoutHandle,
    interval: Duration,
    max_duration: Duration,
) {
    tokio::spawn(async move {
        let deadline = tokio::time::Instant::now() + max_duration;
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; wait a full interval before
        // the first status check.
        ticker.tick().await;

        loop {
            tokio::select! {
                () = handle.cancel.cancelled() => {
                    debug!(order_ref = %order_ref, "payment polling cancelled");
                    return;
                }
                () = tokio::time::sleep_until(deadline) => {
                    warn!(order_ref = %order_ref, "payment unresolved at checkout TTL, giving up");
                    registry.evict(&visitor, &handle.state);
                    return;
                }
                _ = ticker.tick() => {}
            }

            let status = match api.check_payment_status(&order_ref).await {
                Ok(status) => status,
                Err(e) => {
                    warn!(order_ref = %order_ref, error = %e, "payment status check failed, will retry");
                    continue;
                }
            };

            match status {
                PaymentStatus::Paid => {
                    resolve(&handle.state, &order_ref, true);
                    return;
                }
                PaymentStatus::Failed => {
                    resolve(&handle.state, &order_ref, false);
                    return;
                }
                PaymentStatus::Other => {
                    debug!(order_ref = %order_ref, "payment still pending");
                }
            }
        }
    });
}

fn resolve(session: &Arc<Mutex<CheckoutSession>>, order_ref: &OrderRef, paid: bool) {
    let Ok(mut session) = session.lock() else {
        warn!(order_ref = %order_ref, "checkout session lock poisoned");
        return;
    };
    let result = if paid {
        session.state.succeed()
    } else {
        session.state.fail()
    };
    if let Err(e) = result {
        warn!(order_ref = %order_ref, error = %e, "ignoring late payment resolution");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use duka_core::{CheckoutStatus, PaymentMethod, PaymentOutcome, Price};

    fn pending_session(order_ref: &OrderRef) -> Arc<Mutex<CheckoutSession>> {
        let mut session = CheckoutSession::new(PaymentMethod::Stk, Price::from_whole(500));
        session.state.order_created(order_ref.clone()).unwrap();
        session.state.begin_pending().unwrap();
        Arc::new(Mutex::new(session))
    }

    #[test]
    fn test_resolve_marks_success() {
        let order_ref = OrderRef::new("ORD-1");
        let session = pending_session(&order_ref);
        resolve(&session, &order_ref, true);

        let session = session.lock().unwrap();
        assert_eq!(session.state.status(), CheckoutStatus::Final);
        assert_eq!(session.state.outcome(), PaymentOutcome::Success);
    }

    #[test]
    fn test_resolve_marks_failure() {
        let order_ref = OrderRef::new("ORD-2");
        let session = pending_session(&order_ref);
        resolve(&session, &order_ref, false);

        let session = session.lock().unwrap();
        assert_eq!(session.state.status(), CheckoutStatus::Final);
        assert_eq!(session.state.outcome(), PaymentOutcome::Failure);
    }

    #[test]
    fn test_resolve_after_final_is_ignored() {
        let order_ref = OrderRef::new("ORD-3");
        let session = pending_session(&order_ref);
        resolve(&session, &order_ref, false);
        // A late "paid" after the failure must not flip the outcome.
        resolve(&session, &order_ref, true);

        let session = session.lock().unwrap();
        assert_eq!(session.state.outcome(), PaymentOutcome::Failure);
    }
}
