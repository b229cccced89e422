//! The shopping cart and its operations.
//!
//! A [`Cart`] is an ordered collection of [`CartItem`]s keyed by product
//! id, with at most one line per product. All operations are total
//! functions over the current cart: nothing here can fail, and the
//! quantity invariant (every retained line has quantity >= 1) is
//! maintained by construction and revalidated when a snapshot is
//! deserialized.
//!
//! The cart serializes as a plain JSON array of lines, which is the
//! shape persisted in the visitor session.

use serde::de;
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::id::ProductId;
use crate::types::price::Price;

/// A single cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product identifier; the identity key of the line.
    pub id: ProductId,
    /// Product name, captured at the time the item was added.
    pub name: String,
    /// Unit price at the time the item was added.
    pub price: Price,
    /// Number of units; always >= 1 for a retained line.
    pub quantity: u32,
}

/// An ordered shopping cart, at most one line per product id.
///
/// Insertion order is preserved for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl<'de> Deserialize<'de> for Cart {
    /// Rejects snapshots with a zero-quantity line, so a tampered or
    /// stale session value is discarded as a whole instead of loading a
    /// cart that violates the quantity invariant.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<CartItem>::deserialize(deserializer)?;
        if items.iter().any(|line| line.quantity == 0) {
            return Err(de::Error::custom("cart line with zero quantity"));
        }
        Ok(Self { items })
    }
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Add a product to the cart.
    ///
    /// If a line with the same product id already exists its quantity is
    /// incremented by 1; otherwise a new line is appended with quantity 1.
    /// The `quantity` field of the incoming item is ignored either way -
    /// every add is a single unit.
    pub fn add(&mut self, item: CartItem) {
        if let Some(existing) = self.items.iter_mut().find(|line| line.id == item.id) {
            existing.quantity += 1;
        } else {
            self.items.push(CartItem {
                quantity: 1,
                ..item
            });
        }
    }

    /// Decrease the quantity of a line by 1, removing the line entirely
    /// if the quantity would drop below 1.
    pub fn decrease(&mut self, id: &ProductId) {
        if let Some(line) = self.items.iter_mut().find(|line| &line.id == id) {
            line.quantity -= 1;
        }
        self.items.retain(|line| line.quantity > 0);
    }

    /// Remove a line unconditionally.
    pub fn remove(&mut self, id: &ProductId) {
        self.items.retain(|line| &line.id != id);
    }

    /// Empty the cart. Invoked on confirmed payment.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of unit price times quantity over all lines.
    ///
    /// Computed on demand, never cached.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items
            .iter()
            .map(|line| line.price.times(line.quantity))
            .sum()
    }

    /// Total number of units across all lines (for the cart badge).
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|line| line.quantity).sum()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over the lines in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, CartItem> {
        self.items.iter()
    }

    /// Look up a line by product id.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|line| &line.id == id)
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a CartItem;
    type IntoIter = std::slice::Iter<'a, CartItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
