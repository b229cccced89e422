//! Shared type definitions.

pub mod cart;
pub mod checkout;
pub mod id;
pub mod price;

pub use cart::{Cart, CartItem};
pub use checkout::{CheckoutState, CheckoutStatus, PaymentMethod, PaymentOutcome, TransitionError};
pub use id::{CategoryId, OrderRef, ProductId};
pub use price::Price;
