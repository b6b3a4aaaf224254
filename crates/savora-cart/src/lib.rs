//! Cart engine
//!
//! Command-based state machine for the current order draft. Holds the
//! single-restaurant line items, the selected delivery option, and the
//! derived totals, and recomputes the totals through one shared function
//! after every mutation so the pricing invariants hold for every reachable
//! state.
//!
//! # Architecture
//!
//! The cart is a pure state container: it consumes [`CartCommand`] inputs
//! and mutates its own state with no side effects and no I/O. Invalid input
//! (unknown ids, cross-restaurant adds, zero quantities) degrades to a
//! no-op; the engine never fails across its public boundary.
//!
//! # Components
//!
//! - [`Cart`]: the state container and command processor
//! - [`CartCommand`]: mutations accepted by the cart
//! - [`Totals`]: derived pricing (subtotal, fees, total)
//! - [`delivery_fee`]: distance-based delivery pricing, exposed separately

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod cart;
mod item;
mod pricing;

pub use cart::{Cart, CartCommand, Totals};
pub use item::{DeliveryOption, LineItem, MenuItem, Restaurant};
pub use pricing::delivery_fee;
