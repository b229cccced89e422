//! HTTP client for the remote shop API.
//!
//! Uses `reqwest` 0.13 against the PHP backend's JSON endpoints and
//! caches the slow-moving catalog responses with `moka` (5-minute TTL).
//! Search results are never cached so typed queries stay fresh.

pub mod types;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use duka_core::{CategoryId, OrderRef, Price};

use types::{
    ApiErrorResponse, Category, ContactMessage, CreateOrderRequest, CreateOrderResponse,
    PaymentStatus, PaymentStatusResponse, Product, SearchResponse, StkPushRequest,
    StkPushResponse, price_as_f64,
};

// =============================================================================
// Errors
// =============================================================================

/// Errors from the shop API client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Transport-level failure (connection, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("API returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The backend answered 200 but the body did not parse.
    #[error("failed to parse {context} response: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The configured base URL is not a valid URL.
    #[error("invalid API base URL: {0}")]
    InvalidBaseUrl(String),
}

// =============================================================================
// Cache
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CacheKey {
    Featured,
    Categories,
}

#[derive(Clone)]
enum CacheValue {
    Products(Vec<Product>),
    Categories(Vec<Category>),
}

/// Catalog cache TTL (5 minutes).
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Request timeout for all API calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the remote shop API.
///
/// Cheap to clone; all state lives behind an `Arc`.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl ApiClient {
    /// Create a new client against the given base URL.
    ///
    /// The base URL should point at the API root (e.g.
    /// `https://shop.example.com/api`). A trailing slash is added if
    /// missing so endpoint paths join correctly.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidBaseUrl`] if the URL does not parse
    /// or cannot be a base.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url =
            Url::parse(&normalized).map_err(|e| ApiError::InvalidBaseUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(normalized));
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let cache = Cache::builder()
            .max_capacity(100)
            .time_to_live(CACHE_TTL)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url,
                cache,
            }),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.inner
            .base_url
            .join(path)
            .map_err(|e| ApiError::InvalidBaseUrl(e.to_string()))
    }

    /// Read the response body as text first so parse failures can log
    /// what the backend actually sent.
    async fn read_json<T: DeserializeOwned>(
        response: reqwest::Response,
        context: &str,
    ) -> Result<T, ApiError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                %status,
                context,
                body = %body.chars().take(500).collect::<String>(),
                "shop API returned non-success status"
            );
            return Err(ApiError::Status { status, body });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                context,
                body = %body.chars().take(500).collect::<String>(),
                "failed to parse shop API response"
            );
            ApiError::Deserialize {
                context: context.to_string(),
                source: e,
            }
        })
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Fetch the featured products shown on the home page.
    ///
    /// Cached for 5 minutes.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is invalid.
    #[instrument(skip(self))]
    pub async fn featured_products(&self) -> Result<Vec<Product>, ApiError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::Featured).await
        {
            debug!("featured products cache hit");
            return Ok(products);
        }

        let url = self.endpoint("products/featured.php")?;
        let response = self.inner.client.get(url).send().await?;
        let products: Vec<Product> = Self::read_json(response, "featured products").await?;

        self.inner
            .cache
            .insert(CacheKey::Featured, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Search the catalog by keyword, optionally scoped to a category.
    ///
    /// An empty keyword with no category returns the full catalog.
    /// Never cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is invalid.
    #[instrument(skip(self))]
    pub async fn search_products(
        &self,
        keyword: &str,
        category_id: Option<&CategoryId>,
    ) -> Result<Vec<Product>, ApiError> {
        let mut url = self.endpoint("products/search.php")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("keyword", keyword);
            if let Some(category_id) = category_id {
                pairs.append_pair("category_id", category_id.as_str());
            }
        }

        let response = self.inner.client.get(url).send().await?;
        let envelope: SearchResponse = Self::read_json(response, "product search").await?;
        Ok(envelope.data)
    }

    /// Fetch all product categories.
    ///
    /// Cached for 5 minutes.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is invalid.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        if let Some(CacheValue::Categories(categories)) =
            self.inner.cache.get(&CacheKey::Categories).await
        {
            debug!("categories cache hit");
            return Ok(categories);
        }

        let url = self.endpoint("categories/list.php")?;
        let response = self.inner.client.get(url).send().await?;
        let categories: Vec<Category> = Self::read_json(response, "categories").await?;

        self.inner
            .cache
            .insert(
                CacheKey::Categories,
                CacheValue::Categories(categories.clone()),
            )
            .await;

        Ok(categories)
    }

    // =========================================================================
    // Orders & payments
    // =========================================================================

    /// Create an order from the checkout form and cart snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is invalid.
    #[instrument(skip(self, request), fields(items = request.items.len()))]
    pub async fn create_order(&self, request: &CreateOrderRequest) -> Result<OrderRef, ApiError> {
        let url = self.endpoint("orders/create_order.php")?;
        let response = self.inner.client.post(url).json(request).send().await?;
        let created: CreateOrderResponse = Self::read_json(response, "create order").await?;
        Ok(created.order_ref)
    }

    /// Ask the payment gateway to push an STK prompt to the customer's
    /// phone for the given order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is invalid.
    #[instrument(skip(self, phone))]
    pub async fn initiate_stk_push(
        &self,
        phone: &str,
        amount: Price,
        order_ref: &OrderRef,
    ) -> Result<StkPushResponse, ApiError> {
        let url = self.endpoint("mpesa/stkpush.php")?;
        let request = StkPushRequest {
            customer_phone: phone.to_string(),
            amount: price_as_f64(amount),
            order_ref: order_ref.clone(),
        };
        let response = self.inner.client.post(url).json(&request).send().await?;
        Self::read_json(response, "STK push").await
    }

    /// Check the payment status of an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is invalid.
    #[instrument(skip(self))]
    pub async fn check_payment_status(
        &self,
        order_ref: &OrderRef,
    ) -> Result<PaymentStatus, ApiError> {
        let mut url = self.endpoint("mpesa/check_payment_status.php")?;
        url.query_pairs_mut()
            .append_pair("order_ref", order_ref.as_str());

        let response = self.inner.client.get(url).send().await?;
        let status: PaymentStatusResponse = Self::read_json(response, "payment status").await?;
        Ok(status.payment_status)
    }

    // =========================================================================
    // Contact
    // =========================================================================

    /// Submit a contact form message.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects the
    /// message.
    #[instrument(skip(self, message), fields(from = %message.email))]
    pub async fn send_contact_message(&self, message: &ContactMessage) -> Result<(), ApiError> {
        let url = self.endpoint("contact/contact.php")?;
        let response = self.inner.client.post(url).json(message).send().await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            // The backend wraps the reason in {"error": "..."} when it can
            let detail = serde_json::from_str::<ApiErrorResponse>(&body)
                .ok()
                .and_then(|e| e.error)
                .unwrap_or(body);
            tracing::error!(%status, detail = %detail, "contact message rejected");
            return Err(ApiError::Status {
                status,
                body: detail,
            });
        }

        Ok(())
    }
}
