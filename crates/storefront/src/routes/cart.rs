//! Cart route handlers.
//!
//! Cart operations are HTMX fragments. The product card carries the
//! line data (id, name, price) as hidden fields, so adding to the cart
//! never needs a second catalog round-trip. Mutations return the drawer
//! fragment and fire a `cart-updated` trigger for the count badge.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{AppendHeaders, IntoResponse, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use duka_core::{CartItem, Price, ProductId};

use crate::cart::CartView;
use crate::error::Result;
use crate::state::AppState;

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub name: String,
    pub price: Decimal,
}

/// Form data for decrease/remove.
#[derive(Debug, Deserialize)]
pub struct CartLineForm {
    pub product_id: String,
}

/// Cart drawer fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_drawer.html")]
pub struct CartDrawerTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

fn drawer_with_trigger(cart: &duka_core::Cart) -> Response {
    (
        AppendHeaders([("HX-Trigger", "cart-updated")]),
        CartDrawerTemplate {
            cart: CartView::from(cart),
        },
    )
        .into_response()
}

/// Cart drawer fragment.
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let cart = state.carts().load(&session).await;
    CartDrawerTemplate {
        cart: CartView::from(&cart),
    }
}

/// Add an item to the cart (HTMX).
///
/// A product already in the cart gets its quantity bumped by one.
#[instrument(skip(state, session, form))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let item = CartItem {
        id: ProductId::new(form.product_id),
        name: form.name,
        price: Price::new(form.price),
        quantity: 1,
    };
    let cart = state.carts().add(&session, item).await?;
    Ok(drawer_with_trigger(&cart))
}

/// Decrease a line's quantity by one (HTMX). Drops the line at zero.
#[instrument(skip(state, session))]
pub async fn decrease(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CartLineForm>,
) -> Result<Response> {
    let id = ProductId::new(form.product_id);
    let cart = state.carts().decrease(&session, &id).await?;
    Ok(drawer_with_trigger(&cart))
}

/// Remove a line from the cart (HTMX).
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CartLineForm>,
) -> Result<Response> {
    let id = ProductId::new(form.product_id);
    let cart = state.carts().remove(&session, &id).await?;
    Ok(drawer_with_trigger(&cart))
}

/// Cart count badge (HTMX).
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let cart = state.carts().load(&session).await;
    CartCountTemplate {
        count: cart.item_count(),
    }
}
