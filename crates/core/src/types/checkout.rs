//! Checkout session state machine.
//!
//! A checkout session moves `initial -> pending -> final` and never
//! leaves `final`; a fresh session starts back at `initial`. The
//! transitions are pure so the whole machine is testable without any
//! I/O - the storefront wires it to the remote API and the payment
//! poller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::id::OrderRef;

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Push payment: the backend triggers an authorization prompt on the
    /// customer's phone (M-Pesa STK push).
    #[default]
    Stk,
    /// Manual reference payment: the customer pays a fixed paybill
    /// number/account shown in the UI, and the backend observes the
    /// confirmation asynchronously.
    Paybill,
}

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStatus {
    #[default]
    Initial,
    Pending,
    Final,
}

/// Terminal payment outcome; `Unknown` until the session reaches `final`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentOutcome {
    #[default]
    Unknown,
    Success,
    Failure,
}

/// Invalid transition attempted on a [`CheckoutState`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    /// The session already reached `final`; nothing may change it.
    #[error("checkout session is already final")]
    AlreadyFinal,
    /// `pending` requires a non-empty order reference.
    #[error("cannot enter pending without an order reference")]
    MissingOrderRef,
    /// Success is only reachable from `pending`.
    #[error("payment success is only valid while pending")]
    NotPending,
}

/// The client-side checkout state machine.
///
/// Ephemeral: created fresh each time the checkout dialog opens and
/// discarded when it closes. Holds no identity beyond the dialog
/// instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutState {
    status: CheckoutStatus,
    outcome: PaymentOutcome,
    order_ref: Option<OrderRef>,
    method: PaymentMethod,
}

impl CheckoutState {
    /// A fresh session at `initial` for the given payment method.
    #[must_use]
    pub const fn new(method: PaymentMethod) -> Self {
        Self {
            status: CheckoutStatus::Initial,
            outcome: PaymentOutcome::Unknown,
            order_ref: None,
            method,
        }
    }

    /// Record the order reference returned by the backend.
    ///
    /// # Errors
    ///
    /// Rejects an empty reference, and any attempt after `final`.
    pub fn order_created(&mut self, order_ref: OrderRef) -> Result<(), TransitionError> {
        if self.status == CheckoutStatus::Final {
            return Err(TransitionError::AlreadyFinal);
        }
        if order_ref.is_empty() {
            return Err(TransitionError::MissingOrderRef);
        }
        self.order_ref = Some(order_ref);
        Ok(())
    }

    /// Enter `pending` and start awaiting payment confirmation.
    ///
    /// # Errors
    ///
    /// Fails if no order reference has been recorded, or the session is
    /// already `final`.
    pub fn begin_pending(&mut self) -> Result<(), TransitionError> {
        if self.status == CheckoutStatus::Final {
            return Err(TransitionError::AlreadyFinal);
        }
        match &self.order_ref {
            Some(order_ref) if !order_ref.is_empty() => {
                self.status = CheckoutStatus::Pending;
                Ok(())
            }
            _ => Err(TransitionError::MissingOrderRef),
        }
    }

    /// Terminate with outcome `success`.
    ///
    /// # Errors
    ///
    /// Only valid from `pending`; fails once `final`.
    pub fn succeed(&mut self) -> Result<(), TransitionError> {
        match self.status {
            CheckoutStatus::Final => Err(TransitionError::AlreadyFinal),
            CheckoutStatus::Initial => Err(TransitionError::NotPending),
            CheckoutStatus::Pending => {
                self.status = CheckoutStatus::Final;
                self.outcome = PaymentOutcome::Success;
                Ok(())
            }
        }
    }

    /// Terminate with outcome `failure`.
    ///
    /// Valid from both `initial` (order creation or initiation failed)
    /// and `pending` (payment reported failed).
    ///
    /// # Errors
    ///
    /// Fails once `final`.
    pub fn fail(&mut self) -> Result<(), TransitionError> {
        if self.status == CheckoutStatus::Final {
            return Err(TransitionError::AlreadyFinal);
        }
        self.status = CheckoutStatus::Final;
        self.outcome = PaymentOutcome::Failure;
        Ok(())
    }

    /// Current lifecycle status.
    #[must_use]
    pub const fn status(&self) -> CheckoutStatus {
        self.status
    }

    /// Terminal outcome (`Unknown` until `final`).
    #[must_use]
    pub const fn outcome(&self) -> PaymentOutcome {
        self.outcome
    }

    /// The order reference, once the backend has issued one.
    #[must_use]
    pub const fn order_ref(&self) -> Option<&OrderRef> {
        self.order_ref.as_ref()
    }

    /// The payment method this session was opened with.
    #[must_use]
    pub const fn method(&self) -> PaymentMethod {
        self.method
    }

    /// Whether the session has terminated.
    #[must_use]
    pub fn is_final(&self) -> bool {
        self.status == CheckoutStatus::Final
    }
}

impl Default for CheckoutState {
    fn default() -> Self {
        Self::new(PaymentMethod::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_session_is_initial() {
        let state = CheckoutState::new(PaymentMethod::Stk);
        assert_eq!(state.status(), CheckoutStatus::Initial);
        assert_eq!(state.outcome(), PaymentOutcome::Unknown);
        assert!(state.order_ref().is_none());
    }

    #[test]
    fn test_pending_requires_order_ref() {
        let mut state = CheckoutState::new(PaymentMethod::Stk);
        assert_eq!(state.begin_pending(), Err(TransitionError::MissingOrderRef));

        state.order_created(OrderRef::new("ORD-1")).unwrap();
        assert!(state.begin_pending().is_ok());
        assert_eq!(state.status(), CheckoutStatus::Pending);
    }

    #[test]
    fn test_empty_order_ref_rejected() {
        let mut state = CheckoutState::new(PaymentMethod::Paybill);
        assert_eq!(
            state.order_created(OrderRef::new("")),
            Err(TransitionError::MissingOrderRef)
        );
    }

    #[test]
    fn test_success_path() {
        let mut state = CheckoutState::new(PaymentMethod::Stk);
        state.order_created(OrderRef::new("ORD-1")).unwrap();
        state.begin_pending().unwrap();
        state.succeed().unwrap();

        assert_eq!(state.status(), CheckoutStatus::Final);
        assert_eq!(state.outcome(), PaymentOutcome::Success);
    }

    #[test]
    fn test_success_invalid_from_initial() {
        let mut state = CheckoutState::new(PaymentMethod::Stk);
        assert_eq!(state.succeed(), Err(TransitionError::NotPending));
    }

    #[test]
    fn test_failure_valid_from_initial() {
        // Order creation failed before any order ref existed.
        let mut state = CheckoutState::new(PaymentMethod::Stk);
        state.fail().unwrap();
        assert_eq!(state.status(), CheckoutStatus::Final);
        assert_eq!(state.outcome(), PaymentOutcome::Failure);
    }

    #[test]
    fn test_final_is_terminal() {
        let mut state = CheckoutState::new(PaymentMethod::Paybill);
        state.order_created(OrderRef::new("ORD-9")).unwrap();
        state.begin_pending().unwrap();
        state.fail().unwrap();

        assert_eq!(state.succeed(), Err(TransitionError::AlreadyFinal));
        assert_eq!(state.fail(), Err(TransitionError::AlreadyFinal));
        assert_eq!(state.begin_pending(), Err(TransitionError::AlreadyFinal));
        assert_eq!(
            state.order_created(OrderRef::new("ORD-10")),
            Err(TransitionError::AlreadyFinal)
        );
        // Outcome unchanged by the rejected transitions.
        assert_eq!(state.outcome(), PaymentOutcome::Failure);
    }
}
