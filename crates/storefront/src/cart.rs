//! Session-backed cart storage and view models.
//!
//! The cart lives in the visitor's session as a JSON array of lines.
//! A snapshot that fails to deserialize (corrupt or from an older
//! schema) is treated as an empty cart rather than an error, so a bad
//! session never locks a visitor out of shopping.

use tower_sessions::Session;
use tracing::warn;

use duka_core::{Cart, CartItem, ProductId};

use crate::error::{AppError, Result};
use crate::middleware::session_keys;

/// Loads and persists cart snapshots in the visitor session.
///
/// Stateless; all data lives in the session store.
#[derive(Debug, Clone, Default)]
pub struct CartStore;

impl CartStore {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Load the visitor's cart, falling back to empty on any failure.
    pub async fn load(&self, session: &Session) -> Cart {
        match session.get::<Cart>(session_keys::CART).await {
            Ok(Some(cart)) => cart,
            Ok(None) => Cart::default(),
            Err(e) => {
                warn!(error = %e, "discarding unreadable cart snapshot");
                Cart::default()
            }
        }
    }

    /// Persist the cart back into the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store rejects the write.
    pub async fn save(&self, session: &Session, cart: &Cart) -> Result<()> {
        session
            .insert(session_keys::CART, cart)
            .await
            .map_err(|e| AppError::Internal(format!("failed to persist cart: {e}")))
    }

    /// Add a product to the cart (or bump its quantity) and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store rejects the write.
    pub async fn add(&self, session: &Session, item: CartItem) -> Result<Cart> {
        let mut cart = self.load(session).await;
        cart.add(item);
        self.save(session, &cart).await?;
        Ok(cart)
    }

    /// Decrease a line's quantity by one, dropping it at zero, and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store rejects the write.
    pub async fn decrease(&self, session: &Session, id: &ProductId) -> Result<Cart> {
        let mut cart = self.load(session).await;
        cart.decrease(id);
        self.save(session, &cart).await?;
        Ok(cart)
    }

    /// Remove a line entirely and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store rejects the write.
    pub async fn remove(&self, session: &Session, id: &ProductId) -> Result<Cart> {
        let mut cart = self.load(session).await;
        cart.remove(id);
        self.save(session, &cart).await?;
        Ok(cart)
    }

    /// Empty the cart and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store rejects the write.
    pub async fn clear(&self, session: &Session) -> Result<Cart> {
        let cart = Cart::default();
        self.save(session, &cart).await?;
        Ok(cart)
    }
}

// =============================================================================
// View models
// =============================================================================

/// A cart line prepared for rendering.
#[derive(Debug, Clone)]
pub struct CartItemView {
    pub id: String,
    pub name: String,
    pub quantity: u32,
    /// Raw decimal amount, carried in the drawer's increase form.
    pub price_amount: String,
    pub price_display: String,
    pub line_total_display: String,
}

/// The whole cart prepared for rendering.
#[derive(Debug, Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub item_count: u32,
    pub total_display: String,
    pub is_empty: bool,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        let items = cart
            .iter()
            .map(|line| CartItemView {
                id: line.id.to_string(),
                name: line.name.clone(),
                quantity: line.quantity,
                price_amount: line.price.amount().normalize().to_string(),
                price_display: line.price.to_string(),
                line_total_display: line.price.times(line.quantity).to_string(),
            })
            .collect();

        Self {
            items,
            item_count: cart.item_count(),
            total_display: cart.total().to_string(),
            is_empty: cart.is_empty(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use duka_core::Price;

    fn line(id: &str, price: i64, quantity: u32) -> CartItem {
        CartItem {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Price::from_whole(price),
            quantity,
        }
    }

    #[test]
    fn test_cart_view_formats_prices() {
        let mut cart = Cart::default();
        cart.add(line("p1", 4500, 1));
        cart.add(line("p1", 4500, 1));
        cart.add(line("p2", 1200, 1));

        let view = CartView::from(&cart);
        assert_eq!(view.items.len(), 2);
        assert_eq!(view.item_count, 3);
        assert_eq!(view.items[0].price_display, "Ksh 4,500");
        assert_eq!(view.items[0].line_total_display, "Ksh 9,000");
        assert_eq!(view.total_display, "Ksh 10,200");
        assert!(!view.is_empty);
    }

    #[test]
    fn test_cart_view_empty() {
        let view = CartView::from(&Cart::default());
        assert!(view.is_empty);
        assert_eq!(view.item_count, 0);
        assert_eq!(view.total_display, "Ksh 0");
    }
}
