//! Cart item types.
//!
//! These structures are the "View Model" side of the order draft: the subset
//! of menu and restaurant data the cart needs for pricing and display,
//! without any knowledge of where the data was fetched from.

use serde::{Deserialize, Serialize};

/// The restaurant a cart belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restaurant {
    /// Restaurant identifier.
    pub id: u64,
    /// Display name.
    pub name: String,
}

/// A food item as listed on a restaurant menu.
///
/// This is the payload of an add-to-cart command; the cart copies what it
/// needs into a [`LineItem`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Food item identifier, unique within a restaurant menu.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Price per unit in currency units. Must be non-negative.
    pub unit_price: f64,
    /// Restaurant this item belongs to.
    pub restaurant: Restaurant,
}

/// One line of the order draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Food item identifier, unique within the cart.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Price per unit in currency units.
    pub unit_price: f64,
    /// Number of units. Always at least 1 while the line exists.
    pub quantity: u32,
    /// Free-text preparation notes. `None` if the customer left none.
    pub notes: Option<String>,
    /// Restaurant the item belongs to. All lines in a cart share this id.
    pub restaurant_id: u64,
}

impl LineItem {
    /// Price contribution of this line (`unit_price * quantity`).
    pub fn line_total(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

/// A delivery option offered for the current order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryOption {
    /// Option identifier.
    pub id: u64,
    /// Display name (e.g. "Standard", "Express").
    pub name: String,
    /// Delivery fee in currency units.
    pub price: f64,
    /// Human-readable delivery estimate (e.g. "25-35 min").
    pub estimated_time: String,
}
