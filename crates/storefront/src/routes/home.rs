//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use crate::filters;
use crate::routes::contact::ContactFormView;
use crate::routes::products::ProductView;
use crate::state::AppState;

// =============================================================================
// Services (static content)
// =============================================================================

/// A service card shown on the home page.
#[derive(Clone)]
pub struct ServiceView {
    pub title: String,
    pub description: String,
}

/// Static service cards for the home page.
fn get_services() -> Vec<ServiceView> {
    vec![
        ServiceView {
            title: "Network Installation".to_string(),
            description: "Structured cabling, routers and switches set up for homes and offices."
                .to_string(),
        },
        ServiceView {
            title: "CCTV & Security".to_string(),
            description: "Camera installation with remote viewing on your phone.".to_string(),
        },
        ServiceView {
            title: "Repairs & Support".to_string(),
            description: "Diagnostics and repair for laptops, desktops and network gear."
                .to_string(),
        },
    ]
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub featured: Vec<ProductView>,
    pub load_error: bool,
    pub services: Vec<ServiceView>,
    pub form: ContactFormView,
    pub whatsapp_number: Option<String>,
}

/// Display the home page.
#[instrument(skip(state, session))]
pub async fn home(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let cart = state.carts().load(&session).await;

    let (featured, load_error) = match state.api().featured_products().await {
        Ok(products) => (
            products
                .iter()
                .map(|p| ProductView::from_product(p, &cart))
                .collect(),
            false,
        ),
        Err(e) => {
            tracing::error!("failed to fetch featured products: {e}");
            (Vec::new(), true)
        }
    };

    HomeTemplate {
        featured,
        load_error,
        services: get_services(),
        form: ContactFormView::default(),
        whatsapp_number: state.config().whatsapp_number.clone(),
    }
}
