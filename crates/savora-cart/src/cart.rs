//! Cart state machine.
//!
//! The [`Cart`] is a pure state container for the current order draft. It
//! processes [`CartCommand`] inputs strictly in dispatch order and keeps the
//! derived totals consistent by recomputing them through [`Totals::compute`]
//! after every mutation.
//!
//! # Invariants
//!
//! - All line items share the cart's restaurant id.
//! - `subtotal` equals the sum of line totals, `service_fee` equals the
//!   subtotal's 5% rounded to the nearest currency unit, and `total` equals
//!   `subtotal + delivery_fee + service_fee`.
//! - An empty item list implies the initial state: no restaurant, no
//!   delivery option, all totals zero.
//!
//! Invalid input never fails: cross-restaurant adds, unknown ids, and zero
//! quantities are silent no-ops. Callers that want to warn the user (e.g.
//! before discarding a cart for another restaurant) do so before
//! dispatching.

use serde::{Deserialize, Serialize};

use crate::item::{DeliveryOption, LineItem, MenuItem, Restaurant};

/// Service fee rate applied to the subtotal.
const SERVICE_FEE_RATE: f64 = 0.05;

/// Commands accepted by the cart.
///
/// Applied via [`Cart::apply`]; each maps to one public operation.
#[derive(Debug, Clone, PartialEq)]
pub enum CartCommand {
    /// Add `quantity` units of a menu item, merging with an existing line
    /// for the same item.
    AddItem {
        /// Menu item to add.
        item: MenuItem,
        /// Units to add. Zero is a no-op.
        quantity: u32,
        /// Preparation notes. On a merge, empty or absent notes keep the
        /// existing ones.
        notes: Option<String>,
    },

    /// Remove the line with this item id.
    RemoveItem {
        /// Item id to remove.
        id: u64,
    },

    /// Set the quantity of the line with this item id. Zero removes the
    /// line.
    UpdateQuantity {
        /// Item id to update.
        id: u64,
        /// New unit count.
        quantity: u32,
    },

    /// Replace the notes of the line with this item id.
    UpdateNotes {
        /// Item id to update.
        id: u64,
        /// New notes, replacing the old ones unconditionally.
        notes: Option<String>,
    },

    /// Select a delivery option for the order.
    SetDeliveryOption {
        /// The chosen option.
        option: DeliveryOption,
    },

    /// Reset the cart to its initial empty state.
    Clear,
}

/// Derived pricing for the order draft. Never set directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    /// Sum of `unit_price * quantity` over all lines.
    pub subtotal: f64,
    /// Fee of the selected delivery option, `0` if none selected.
    pub delivery_fee: f64,
    /// 5% of the subtotal, rounded to the nearest currency unit.
    pub service_fee: f64,
    /// `subtotal + delivery_fee + service_fee`.
    pub total: f64,
}

impl Totals {
    /// Recompute all derived amounts from the current lines and delivery
    /// option. The single source of truth for the pricing invariants.
    fn compute(items: &[LineItem], delivery_option: Option<&DeliveryOption>) -> Self {
        let subtotal: f64 = items.iter().map(LineItem::line_total).sum();
        let delivery_fee = delivery_option.map_or(0.0, |option| option.price);
        let service_fee = (subtotal * SERVICE_FEE_RATE).round();

        Self { subtotal, delivery_fee, service_fee, total: subtotal + delivery_fee + service_fee }
    }
}

/// The current order draft.
///
/// Owned by the session container; all mutation goes through
/// [`Cart::apply`], which keeps the totals consistent by construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    /// Lines in insertion order.
    items: Vec<LineItem>,
    /// Restaurant the draft belongs to. `None` iff the cart is empty.
    restaurant: Option<Restaurant>,
    /// Selected delivery option. `None` until the customer picks one.
    delivery_option: Option<DeliveryOption>,
    /// Derived pricing.
    totals: Totals,
}

impl Cart {
    /// Create an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a command. Invalid input leaves the cart unchanged.
    pub fn apply(&mut self, command: CartCommand) {
        match command {
            CartCommand::AddItem { item, quantity, notes } => self.add_item(item, quantity, notes),
            CartCommand::RemoveItem { id } => self.remove_item(id),
            CartCommand::UpdateQuantity { id, quantity } => self.update_quantity(id, quantity),
            CartCommand::UpdateNotes { id, notes } => self.update_notes(id, notes),
            CartCommand::SetDeliveryOption { option } => self.set_delivery_option(option),
            CartCommand::Clear => self.clear(),
        }
    }

    /// Add `quantity` units of a menu item.
    ///
    /// A cross-restaurant add on a non-empty cart is a no-op: a cart only
    /// ever holds items from a single restaurant. Adding an item already in
    /// the cart increments its quantity; its notes are replaced only when
    /// the new notes are non-empty.
    pub fn add_item(&mut self, item: MenuItem, quantity: u32, notes: Option<String>) {
        if quantity == 0 {
            return;
        }
        if let Some(restaurant) = &self.restaurant
            && restaurant.id != item.restaurant.id
        {
            return;
        }

        if let Some(index) = self.items.iter().position(|line| line.id == item.id) {
            let line = &mut self.items[index];
            line.quantity = line.quantity.saturating_add(quantity);
            if notes.as_deref().is_some_and(|n| !n.is_empty()) {
                line.notes = notes;
            }
        } else {
            self.items.push(LineItem {
                id: item.id,
                name: item.name,
                unit_price: item.unit_price,
                quantity,
                notes,
                restaurant_id: item.restaurant.id,
            });
        }

        self.restaurant = Some(item.restaurant);
        self.recompute();
    }

    /// Remove the line with this item id. Unknown ids are a no-op.
    ///
    /// Removing the last line resets the whole cart to its initial state,
    /// selected delivery option included.
    pub fn remove_item(&mut self, id: u64) {
        self.items.retain(|line| line.id != id);

        if self.items.is_empty() {
            *self = Self::default();
        } else {
            self.recompute();
        }
    }

    /// Set the quantity of a line. Zero behaves exactly as
    /// [`Cart::remove_item`]; unknown ids are a no-op.
    pub fn update_quantity(&mut self, id: u64, quantity: u32) {
        if quantity == 0 {
            self.remove_item(id);
            return;
        }

        if let Some(line) = self.items.iter_mut().find(|line| line.id == id) {
            line.quantity = quantity;
            self.recompute();
        }
    }

    /// Replace the notes of a line. Totals are unaffected; unknown ids are
    /// a no-op.
    pub fn update_notes(&mut self, id: u64, notes: Option<String>) {
        if let Some(line) = self.items.iter_mut().find(|line| line.id == id) {
            line.notes = notes;
        }
    }

    /// Select a delivery option and fold its fee into the totals.
    pub fn set_delivery_option(&mut self, option: DeliveryOption) {
        self.delivery_option = Some(option);
        self.recompute();
    }

    /// Reset to the initial empty state unconditionally.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    fn recompute(&mut self) {
        self.totals = Totals::compute(&self.items, self.delivery_option.as_ref());
    }

    /// Lines in insertion order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Restaurant the draft belongs to. `None` iff the cart is empty.
    pub fn restaurant(&self) -> Option<&Restaurant> {
        self.restaurant.as_ref()
    }

    /// Selected delivery option. `None` until the customer picks one.
    pub fn delivery_option(&self) -> Option<&DeliveryOption> {
        self.delivery_option.as_ref()
    }

    /// Derived pricing for the draft.
    pub fn totals(&self) -> Totals {
        self.totals
    }

    /// Total units across all lines (not the number of lines).
    pub fn item_count(&self) -> u32 {
        self.items.iter().fold(0, |count, line| count.saturating_add(line.quantity))
    }

    /// Whether the cart holds no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu_item(id: u64, price: f64, restaurant_id: u64) -> MenuItem {
        MenuItem {
            id,
            name: format!("item-{id}"),
            unit_price: price,
            restaurant: Restaurant { id: restaurant_id, name: format!("restaurant-{restaurant_id}") },
        }
    }

    fn express() -> DeliveryOption {
        DeliveryOption {
            id: 2,
            name: "Express".to_string(),
            price: 345.0,
            estimated_time: "15-20 min".to_string(),
        }
    }

    #[test]
    fn add_and_merge_scenario() {
        let mut cart = Cart::new();

        cart.add_item(menu_item(1, 100.0, 9), 1, None);
        assert_eq!(cart.totals().subtotal, 100.0);
        assert_eq!(cart.totals().service_fee, 5.0);
        assert_eq!(cart.totals().total, 105.0);

        // Same item again merges into one line
        cart.add_item(menu_item(1, 100.0, 9), 2, None);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 3);
        assert_eq!(cart.totals().subtotal, 300.0);
        assert_eq!(cart.totals().service_fee, 15.0);
        assert_eq!(cart.totals().total, 315.0);

        // Different restaurant is silently rejected
        let before = cart.clone();
        cart.add_item(menu_item(2, 50.0, 10), 1, None);
        assert_eq!(cart, before);

        cart.set_delivery_option(express());
        assert_eq!(cart.totals().delivery_fee, 345.0);
        assert_eq!(cart.totals().total, 660.0);

        // Removing the last line is a full reset
        cart.remove_item(1);
        assert_eq!(cart, Cart::new());
        assert!(cart.delivery_option().is_none());
    }

    #[test]
    fn add_refreshes_restaurant() {
        let mut cart = Cart::new();
        cart.add_item(menu_item(1, 100.0, 9), 1, None);

        assert_eq!(cart.restaurant().map(|r| r.id), Some(9));
        assert_eq!(cart.restaurant().map(|r| r.name.as_str()), Some("restaurant-9"));
    }

    #[test]
    fn merge_keeps_notes_unless_new_ones_are_non_empty() {
        let mut cart = Cart::new();
        cart.add_item(menu_item(1, 100.0, 9), 1, Some("no onions".to_string()));

        cart.add_item(menu_item(1, 100.0, 9), 1, None);
        assert_eq!(cart.items()[0].notes.as_deref(), Some("no onions"));

        cart.add_item(menu_item(1, 100.0, 9), 1, Some(String::new()));
        assert_eq!(cart.items()[0].notes.as_deref(), Some("no onions"));

        cart.add_item(menu_item(1, 100.0, 9), 1, Some("extra sauce".to_string()));
        assert_eq!(cart.items()[0].notes.as_deref(), Some("extra sauce"));
    }

    #[test]
    fn update_notes_replaces_unconditionally() {
        let mut cart = Cart::new();
        cart.add_item(menu_item(1, 100.0, 9), 1, Some("no onions".to_string()));

        let totals = cart.totals();
        cart.update_notes(1, None);
        assert_eq!(cart.items()[0].notes, None);
        assert_eq!(cart.totals(), totals);
    }

    #[test]
    fn zero_quantity_update_removes_the_line() {
        let mut cart = Cart::new();
        cart.add_item(menu_item(1, 100.0, 9), 1, None);
        cart.add_item(menu_item(2, 50.0, 9), 1, None);

        let mut removed = cart.clone();
        removed.remove_item(2);

        cart.update_quantity(2, 0);
        assert_eq!(cart, removed);
    }

    #[test]
    fn zero_quantity_update_on_last_line_resets() {
        let mut cart = Cart::new();
        cart.add_item(menu_item(1, 100.0, 9), 2, None);
        cart.set_delivery_option(express());

        cart.update_quantity(1, 0);
        assert_eq!(cart, Cart::new());
    }

    #[test]
    fn update_quantity_recomputes_totals() {
        let mut cart = Cart::new();
        cart.add_item(menu_item(1, 120.0, 9), 1, None);

        cart.update_quantity(1, 4);
        assert_eq!(cart.totals().subtotal, 480.0);
        assert_eq!(cart.totals().service_fee, 24.0);
        assert_eq!(cart.totals().total, 504.0);
    }

    #[test]
    fn unknown_ids_are_no_ops() {
        let mut cart = Cart::new();
        cart.add_item(menu_item(1, 100.0, 9), 1, None);
        let before = cart.clone();

        cart.remove_item(99);
        cart.update_quantity(99, 5);
        cart.update_notes(99, Some("lost".to_string()));
        assert_eq!(cart, before);
    }

    #[test]
    fn zero_quantity_add_is_a_no_op() {
        let mut cart = Cart::new();
        cart.add_item(menu_item(1, 100.0, 9), 0, None);
        assert_eq!(cart, Cart::new());
    }

    #[test]
    fn item_count_sums_quantities() {
        let mut cart = Cart::new();
        cart.add_item(menu_item(1, 100.0, 9), 2, None);
        cart.add_item(menu_item(2, 50.0, 9), 3, None);

        assert_eq!(cart.item_count(), 5);
        assert_eq!(cart.items().len(), 2);
    }

    #[test]
    fn clear_resets_everything() {
        let mut cart = Cart::new();
        cart.add_item(menu_item(1, 100.0, 9), 1, None);
        cart.set_delivery_option(express());

        cart.apply(CartCommand::Clear);
        assert_eq!(cart, Cart::new());
    }

    #[test]
    fn service_fee_rounds_to_nearest_unit() {
        let mut cart = Cart::new();
        // 3 * 10.3 = 30.9 -> fee 1.545 -> rounds to 2
        cart.add_item(menu_item(1, 10.3, 9), 3, None);
        assert_eq!(cart.totals().service_fee, 2.0);
    }

    #[test]
    fn commands_match_direct_calls() {
        let mut by_command = Cart::new();
        let mut direct = Cart::new();

        by_command.apply(CartCommand::AddItem { item: menu_item(1, 100.0, 9), quantity: 2, notes: None });
        direct.add_item(menu_item(1, 100.0, 9), 2, None);
        assert_eq!(by_command, direct);

        by_command.apply(CartCommand::SetDeliveryOption { option: express() });
        direct.set_delivery_option(express());
        assert_eq!(by_command, direct);

        by_command.apply(CartCommand::UpdateQuantity { id: 1, quantity: 5 });
        direct.update_quantity(1, 5);
        assert_eq!(by_command, direct);

        by_command.apply(CartCommand::RemoveItem { id: 1 });
        direct.remove_item(1);
        assert_eq!(by_command, direct);
    }
}
