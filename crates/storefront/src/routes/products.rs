//! Shop page and product grid route handlers.
//!
//! The grid is an HTMX fragment: the search box re-requests it with a
//! debounce (`delay:500ms`) as the visitor types, and the category tabs
//! request it with a `category_id`. Products already in the cart render
//! with an "Added" marker instead of an add button.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use duka_core::{Cart, CategoryId};

use crate::api::types::{Category, Product};
use crate::filters;
use crate::state::AppState;

// =============================================================================
// Views
// =============================================================================

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    /// Raw decimal amount, carried in the add-to-cart form.
    pub price_amount: String,
    pub price_display: String,
    pub image: Option<String>,
    pub description: Option<String>,
    pub category_name: Option<String>,
    pub in_cart: bool,
}

impl ProductView {
    /// Build the view, marking products already in the visitor's cart.
    #[must_use]
    pub fn from_product(product: &Product, cart: &Cart) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price_amount: product.price.amount().normalize().to_string(),
            price_display: product.price.to_string(),
            image: product.images.first().cloned(),
            description: product.description.clone(),
            category_name: product.category_name.clone(),
            in_cart: cart.get(&product.id).is_some(),
        }
    }
}

/// Category tab display data.
#[derive(Clone)]
pub struct CategoryView {
    pub id: String,
    pub name: String,
    pub active: bool,
}

/// The synthetic "All" tab shown before the backend categories.
pub const ALL_CATEGORIES_ID: &str = "";
pub const ALL_CATEGORIES_NAME: &str = "All";

/// Build the tab list with "All" prepended.
fn category_views(categories: &[Category], selected: &str) -> Vec<CategoryView> {
    let mut tabs = vec![CategoryView {
        id: ALL_CATEGORIES_ID.to_string(),
        name: ALL_CATEGORIES_NAME.to_string(),
        active: selected.is_empty(),
    }];
    tabs.extend(categories.iter().map(|category| CategoryView {
        id: category.id.to_string(),
        name: category.name.clone(),
        active: category.id.as_str() == selected,
    }));
    tabs
}

// =============================================================================
// Templates
// =============================================================================

/// Shop page template.
#[derive(Template, WebTemplate)]
#[template(path = "products.html")]
pub struct ProductsPageTemplate {
    pub categories: Vec<CategoryView>,
    pub keyword: String,
    pub selected_category: String,
    pub products: Vec<ProductView>,
    pub load_error: bool,
}

/// Product grid fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/product_grid.html")]
pub struct ProductGridTemplate {
    pub products: Vec<ProductView>,
    pub load_error: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// Search parameters for the grid.
#[derive(Debug, Deserialize)]
pub struct GridQuery {
    #[serde(default)]
    pub keyword: String,
    #[serde(default)]
    pub category_id: String,
}

impl GridQuery {
    fn category(&self) -> Option<CategoryId> {
        if self.category_id.is_empty() {
            None
        } else {
            Some(CategoryId::new(self.category_id.clone()))
        }
    }
}

async fn fetch_grid(state: &AppState, session: &Session, query: &GridQuery) -> (Vec<ProductView>, bool) {
    let cart = state.carts().load(session).await;
    match state
        .api()
        .search_products(&query.keyword, query.category().as_ref())
        .await
    {
        Ok(products) => (
            products
                .iter()
                .map(|p| ProductView::from_product(p, &cart))
                .collect(),
            false,
        ),
        Err(e) => {
            tracing::error!("failed to search products: {e}");
            (Vec::new(), true)
        }
    }
}

/// Display the shop page.
#[instrument(skip(state, session))]
pub async fn index(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<GridQuery>,
) -> impl IntoResponse {
    let categories = state.api().list_categories().await.map_or_else(
        |e| {
            tracing::error!("failed to fetch categories: {e}");
            Vec::new()
        },
        |categories| category_views(&categories, &query.category_id),
    );

    let (products, load_error) = fetch_grid(&state, &session, &query).await;

    ProductsPageTemplate {
        categories,
        keyword: query.keyword,
        selected_category: query.category_id,
        products,
        load_error,
    }
}

/// Product grid fragment (HTMX, debounced search and category tabs).
#[instrument(skip(state, session))]
pub async fn grid(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<GridQuery>,
) -> impl IntoResponse {
    let (products, load_error) = fetch_grid(&state, &session, &query).await;
    ProductGridTemplate {
        products,
        load_error,
    }
}
