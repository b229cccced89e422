//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (featured products, services, contact)
//! GET  /health                 - Health check
//!
//! # Products
//! GET  /products               - Shop page (search box, category tabs)
//! GET  /products/grid          - Product grid fragment (HTMX, debounced search)
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart drawer fragment
//! POST /cart/add               - Add item (returns drawer, triggers cart-updated)
//! POST /cart/decrease          - Decrease quantity (returns drawer fragment)
//! POST /cart/remove            - Remove line (returns drawer fragment)
//! GET  /cart/count             - Cart count badge fragment
//!
//! # Checkout (HTMX fragments)
//! GET  /checkout               - Checkout dialog fragment
//! POST /checkout               - Submit details, create order, start payment
//! GET  /checkout/status        - Payment status fragment (polled every 3s)
//! POST /checkout/close         - Dismiss dialog, stop polling
//!
//! # Contact
//! POST /contact                - Submit contact form (returns form fragment)
//! ```

pub mod cart;
pub mod checkout;
pub mod contact;
pub mod home;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};
use tower_sessions::Session;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::middleware::session_keys;
use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/grid", get(products::grid))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/decrease", post(cart::decrease))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::dialog).post(checkout::submit))
        .route("/status", get(checkout::status))
        .route("/close", post(checkout::close))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .route("/contact", post(contact::submit))
}

/// Get (or mint) the stable visitor ID that keys checkout sessions.
///
/// # Errors
///
/// Returns an error if the session store rejects the write.
pub async fn visitor_id(session: &Session) -> Result<String> {
    if let Ok(Some(id)) = session.get::<String>(session_keys::VISITOR_ID).await {
        return Ok(id);
    }
    let id = Uuid::new_v4().to_string();
    session
        .insert(session_keys::VISITOR_ID, &id)
        .await
        .map_err(|e| AppError::Internal(format!("failed to persist visitor ID: {e}")))?;
    Ok(id)
}
