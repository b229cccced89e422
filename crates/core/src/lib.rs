//! Duka Core - Shared types library.
//!
//! This crate provides the common types used by the Duka storefront:
//! the cart and its operations, prices, type-safe IDs, and the checkout
//! state machine.
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients, no sessions. Everything here is deterministic and unit
//! testable without a running server.
//!
//! # Modules
//!
//! - [`types`] - IDs, prices, the cart, and checkout state

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
