//! Checkout route handlers.
//!
//! The checkout is a dialog driven by HTMX fragments:
//!
//! 1. `GET /checkout` renders the dialog with the order summary and the
//!    customer details form (any previous checkout is torn down first).
//! 2. `POST /checkout` creates the order and starts the payment. For an
//!    accepted STK push (and always for paybill) it returns the pending
//!    fragment, which polls `GET /checkout/status` every 3 seconds.
//! 3. `GET /checkout/status` re-renders pending until the background
//!    poller records a terminal outcome, then renders the final
//!    fragment. The cart is cleared exactly once on success, and serving
//!    the terminal fragment releases the checkout session.
//! 4. `POST /checkout/close` cancels the poller and drops the session.
//!
//! A checkout whose payment never resolves is torn down by the poller
//! itself once the configured checkout TTL lapses.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{AppendHeaders, Html, IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use duka_core::{
    Cart, CheckoutStatus, OrderRef, PaymentMethod, PaymentOutcome, Price,
};

use crate::api::types::{CreateOrderRequest, CustomerDetails, OrderItem};
use crate::cart::CartView;
use crate::checkout::{CheckoutHandle, poller::spawn_status_poller};
use crate::error::{AppError, Result};
use crate::routes::contact::is_valid_email;
use crate::routes::visitor_id;
use crate::state::AppState;

// =============================================================================
// Forms & views
// =============================================================================

/// Checkout form data.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutForm {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub shipping_address: String,
    pub payment_method: PaymentMethod,
}

/// Form values echoed back into the dialog on validation errors.
#[derive(Clone, Default)]
pub struct CheckoutFormView {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub shipping_address: String,
    pub paybill_selected: bool,
}

impl From<&CheckoutForm> for CheckoutFormView {
    fn from(form: &CheckoutForm) -> Self {
        Self {
            customer_name: form.customer_name.clone(),
            customer_email: form.customer_email.clone(),
            customer_phone: form.customer_phone.clone(),
            shipping_address: form.shipping_address.clone(),
            paybill_selected: form.payment_method == PaymentMethod::Paybill,
        }
    }
}

/// Manual payment details shown for the paybill option.
#[derive(Clone)]
pub struct PaybillView {
    pub number: String,
    pub account: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Checkout dialog fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/checkout_dialog.html")]
pub struct CheckoutDialogTemplate {
    pub cart: CartView,
    pub form: CheckoutFormView,
    pub error: Option<String>,
}

/// Pending payment fragment template; polls the status endpoint.
#[derive(Template, WebTemplate)]
#[template(path = "partials/checkout_pending.html")]
pub struct CheckoutPendingTemplate {
    pub paybill: Option<PaybillView>,
    pub amount_display: String,
    pub order_ref: String,
}

/// Terminal payment fragment template.
#[derive(Template, WebTemplate)]
#[template(path = "partials/checkout_final.html")]
pub struct CheckoutFinalTemplate {
    pub success: bool,
    pub celebrate: bool,
    pub order_ref: Option<String>,
}

// =============================================================================
// Validation
// =============================================================================

/// M-Pesa phone numbers: `2547` followed by eight digits.
fn is_valid_mpesa_phone(phone: &str) -> bool {
    phone.len() == 12 && phone.starts_with("2547") && phone.bytes().all(|b| b.is_ascii_digit())
}

fn validate(form: &CheckoutForm) -> Option<String> {
    if form.customer_name.trim().is_empty() || form.shipping_address.trim().is_empty() {
        return Some("Please fill in your name and delivery address.".to_string());
    }
    if !is_valid_email(form.customer_email.trim()) {
        return Some("Please enter a valid email address.".to_string());
    }
    if form.payment_method == PaymentMethod::Stk
        && !is_valid_mpesa_phone(form.customer_phone.trim())
    {
        return Some("Enter your M-Pesa number in the format 2547XXXXXXXX.".to_string());
    }
    None
}

// =============================================================================
// State helpers
// =============================================================================

/// Run a closure against the locked checkout session.
fn with_session<T>(
    handle: &CheckoutHandle,
    f: impl FnOnce(&mut crate::checkout::CheckoutSession) -> Result<T>,
) -> Result<T> {
    let mut session = handle
        .state
        .lock()
        .map_err(|_| AppError::Internal("checkout session lock poisoned".to_string()))?;
    f(&mut session)
}

fn failure_fragment(order_ref: Option<&OrderRef>) -> Response {
    CheckoutFinalTemplate {
        success: false,
        celebrate: false,
        order_ref: order_ref.map(ToString::to_string),
    }
    .into_response()
}

// =============================================================================
// Handlers
// =============================================================================

/// Open the checkout dialog (HTMX).
///
/// Re-opening abandons any previous checkout and stops its poller.
#[instrument(skip(state, session))]
pub async fn dialog(State(state): State<AppState>, session: Session) -> Result<Response> {
    let visitor = visitor_id(&session).await?;
    state.checkouts().close(&visitor);

    let cart = state.carts().load(&session).await;
    Ok(CheckoutDialogTemplate {
        cart: CartView::from(&cart),
        form: CheckoutFormView::default(),
        error: None,
    }
    .into_response())
}

/// Submit the checkout form: create the order and start the payment.
#[instrument(skip(state, session, form))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CheckoutForm>,
) -> Result<Response> {
    let visitor = visitor_id(&session).await?;
    let cart = state.carts().load(&session).await;

    if cart.is_empty() {
        return Ok(CheckoutDialogTemplate {
            cart: CartView::from(&cart),
            form: CheckoutFormView::from(&form),
            error: Some("Your cart is empty.".to_string()),
        }
        .into_response());
    }
    if let Some(error) = validate(&form) {
        return Ok(CheckoutDialogTemplate {
            cart: CartView::from(&cart),
            form: CheckoutFormView::from(&form),
            error: Some(error),
        }
        .into_response());
    }

    let total = cart.total();
    let handle = state.checkouts().begin(&visitor, form.payment_method, total);

    let order_ref = match create_order(&state, &form, &cart).await {
        Ok(order_ref) => order_ref,
        Err(e) => {
            tracing::error!("order creation failed: {e}");
            with_session(&handle, |s| Ok(s.state.fail()?))?;
            state.checkouts().evict(&visitor, &handle.state);
            return Ok(failure_fragment(None));
        }
    };
    with_session(&handle, |s| Ok(s.state.order_created(order_ref.clone())?))?;

    match form.payment_method {
        PaymentMethod::Stk => {
            let phone = form.customer_phone.trim();
            match state.api().initiate_stk_push(phone, total, &order_ref).await {
                Ok(push) if push.accepted() => {
                    start_polling(&state, &handle, order_ref.clone(), &visitor);
                    Ok(pending_fragment(total, &order_ref, None))
                }
                Ok(push) => {
                    tracing::warn!(
                        order_ref = %order_ref,
                        response_code = %push.response_code,
                        "STK push rejected by gateway"
                    );
                    with_session(&handle, |s| Ok(s.state.fail()?))?;
                    state.checkouts().evict(&visitor, &handle.state);
                    Ok(failure_fragment(Some(&order_ref)))
                }
                Err(e) => {
                    tracing::error!(order_ref = %order_ref, "STK push failed: {e}");
                    with_session(&handle, |s| Ok(s.state.fail()?))?;
                    state.checkouts().evict(&visitor, &handle.state);
                    Ok(failure_fragment(Some(&order_ref)))
                }
            }
        }
        PaymentMethod::Paybill => {
            start_polling(&state, &handle, order_ref.clone(), &visitor);
            let paybill = PaybillView {
                number: state.config().paybill.number.clone(),
                account: state.config().paybill.account.clone(),
            };
            Ok(pending_fragment(total, &order_ref, Some(paybill)))
        }
    }
}

async fn create_order(state: &AppState, form: &CheckoutForm, cart: &Cart) -> Result<OrderRef> {
    let request = CreateOrderRequest {
        customer: CustomerDetails {
            customer_name: form.customer_name.trim().to_string(),
            customer_email: form.customer_email.trim().to_string(),
            customer_phone: form.customer_phone.trim().to_string(),
            shipping_address: form.shipping_address.trim().to_string(),
        },
        items: cart.iter().map(OrderItem::from).collect(),
    };
    Ok(state.api().create_order(&request).await?)
}

/// Mark the payment pending and hand the order to the background poller.
fn start_polling(state: &AppState, handle: &CheckoutHandle, order_ref: OrderRef, visitor: &str) {
    if let Err(e) = with_session(handle, |s| Ok(s.state.begin_pending()?)) {
        tracing::warn!(order_ref = %order_ref, "could not begin polling: {e}");
        return;
    }
    spawn_status_poller(
        state.api().clone(),
        order_ref,
        state.checkouts().clone(),
        visitor.to_string(),
        handle.clone(),
        state.config().poll_interval,
        state.config().checkout_ttl,
    );
}

fn pending_fragment(total: Price, order_ref: &OrderRef, paybill: Option<PaybillView>) -> Response {
    CheckoutPendingTemplate {
        paybill,
        amount_display: total.to_string(),
        order_ref: order_ref.to_string(),
    }
    .into_response()
}

/// Payment status fragment, polled by the pending fragment (HTMX).
///
/// On the first observation of a successful payment the visitor's cart
/// is cleared and the final fragment celebrates. Serving a terminal
/// fragment also releases the checkout session, so any further poll
/// gets an empty swap.
#[instrument(skip(state, session))]
pub async fn status(State(state): State<AppState>, session: Session) -> Result<Response> {
    let visitor = visitor_id(&session).await?;
    let Some(handle) = state.checkouts().get(&visitor) else {
        // No live checkout; an empty swap stops the polling element.
        return Ok(Html(String::new()).into_response());
    };

    struct Snapshot {
        status: CheckoutStatus,
        outcome: PaymentOutcome,
        order_ref: Option<String>,
        total: Price,
        paybill: bool,
        celebrate: bool,
    }

    let snapshot = with_session(&handle, |s| {
        let celebrate = s.state.status() == CheckoutStatus::Final
            && s.state.outcome() == PaymentOutcome::Success
            && !s.cart_cleared;
        if celebrate {
            s.cart_cleared = true;
        }
        Ok(Snapshot {
            status: s.state.status(),
            outcome: s.state.outcome(),
            order_ref: s.state.order_ref().map(ToString::to_string),
            total: s.total,
            paybill: s.state.method() == PaymentMethod::Paybill,
            celebrate,
        })
    })?;

    match snapshot.status {
        CheckoutStatus::Initial | CheckoutStatus::Pending => {
            let paybill = snapshot.paybill.then(|| PaybillView {
                number: state.config().paybill.number.clone(),
                account: state.config().paybill.account.clone(),
            });
            Ok(CheckoutPendingTemplate {
                paybill,
                amount_display: snapshot.total.to_string(),
                order_ref: snapshot.order_ref.unwrap_or_default(),
            }
            .into_response())
        }
        CheckoutStatus::Final => {
            // The dialog stops polling once it has the terminal fragment;
            // the registry entry has no further use.
            state.checkouts().evict(&visitor, &handle.state);

            let success = snapshot.outcome == PaymentOutcome::Success;
            let fragment = CheckoutFinalTemplate {
                success,
                celebrate: snapshot.celebrate,
                order_ref: snapshot.order_ref,
            };
            if snapshot.celebrate {
                state.carts().clear(&session).await?;
                Ok((AppendHeaders([("HX-Trigger", "cart-updated")]), fragment).into_response())
            } else {
                Ok(fragment.into_response())
            }
        }
    }
}

/// Dismiss the checkout dialog (HTMX). Stops any background polling.
#[instrument(skip(state, session))]
pub async fn close(State(state): State<AppState>, session: Session) -> Result<Response> {
    let visitor = visitor_id(&session).await?;
    state.checkouts().close(&visitor);
    Ok(Html(String::new()).into_response())
}
