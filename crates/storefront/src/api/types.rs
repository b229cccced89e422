//! Wire types for the remote shop API.
//!
//! The backend serves plain JSON. Monetary amounts travel as JSON
//! numbers on outbound requests (the backend expects numbers), so the
//! request DTOs carry `f64` converted from [`Price`] at this boundary.

use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use duka_core::{CartItem, CategoryId, OrderRef, Price, ProductId};

/// A product as returned by the catalog endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A product category.
#[derive(Debug, Clone, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// Envelope for the search endpoint; a missing `data` field means no
/// results.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Vec<Product>,
}

/// Customer contact fields collected by the checkout form.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerDetails {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub shipping_address: String,
}

/// One line of the order snapshot sent at order creation.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub price_at_purchase: f64,
    pub quantity: u32,
}

impl From<&CartItem> for OrderItem {
    fn from(line: &CartItem) -> Self {
        Self {
            product_id: line.id.clone(),
            name: line.name.clone(),
            price_at_purchase: price_as_f64(line.price),
            quantity: line.quantity,
        }
    }
}

/// Body of `POST /orders/create_order.php`.
#[derive(Debug, Serialize)]
pub struct CreateOrderRequest {
    #[serde(flatten)]
    pub customer: CustomerDetails,
    pub items: Vec<OrderItem>,
}

/// Response of `POST /orders/create_order.php`.
#[derive(Debug, Deserialize)]
pub struct CreateOrderResponse {
    pub order_ref: OrderRef,
}

/// Body of `POST /mpesa/stkpush.php`.
#[derive(Debug, Serialize)]
pub struct StkPushRequest {
    pub customer_phone: String,
    pub amount: f64,
    pub order_ref: OrderRef,
}

/// Response of `POST /mpesa/stkpush.php`.
#[derive(Debug, Deserialize)]
pub struct StkPushResponse {
    #[serde(rename = "responseCode")]
    pub response_code: String,
}

impl StkPushResponse {
    /// Whether the gateway accepted the push request ("0" = accepted).
    #[must_use]
    pub fn accepted(&self) -> bool {
        self.response_code == "0"
    }
}

/// Payment status as reported by the backend.
///
/// Anything other than `paid` or `failed` (including transient states
/// the backend may invent) is `Other` and keeps the poller waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Failed,
    #[serde(other)]
    Other,
}

/// Response of `GET /mpesa/check_payment_status.php`.
#[derive(Debug, Deserialize)]
pub struct PaymentStatusResponse {
    pub payment_status: PaymentStatus,
}

/// Body of `POST /contact/contact.php`.
#[derive(Debug, Clone, Serialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Error envelope the contact endpoint returns on failure.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
}

/// Convert a [`Price`] to the JSON number the backend expects.
#[must_use]
pub fn price_as_f64(price: Price) -> f64 {
    price.amount().to_f64().unwrap_or_default()
}
