//! Session state container.
//!
//! [`Session`] is constructed once at session start and handed to the UI
//! tree root; everything the pages mutate goes through it. It is an
//! explicitly owned, dependency-injected value whose lifetime is the
//! session's - never an ambient module-level global.
//!
//! The cart and the channel stay independent: cart commands never touch the
//! channel and channel events never touch the cart. The session only
//! provides single ownership and dispatch ordering for both.

use std::{ops::Add, time::Duration};

use savora_cart::{Cart, CartCommand};
use savora_channel::{
    Channel, ChannelAction, ChannelConfig, ChannelEvent, ConnectionState, Identity,
    NotificationMessage,
};
use serde_json::Value;

/// Per-session state container.
///
/// Generic over the channel's `Instant` type so the reconnect schedule is
/// testable with virtual time.
#[derive(Debug)]
pub struct Session<I = std::time::Instant>
where
    I: Copy + Ord + Add<Duration, Output = I>,
{
    /// Current order draft.
    cart: Cart,
    /// Notification channel state machine.
    channel: Channel<I>,
}

impl<I> Session<I>
where
    I: Copy + Ord + Add<Duration, Output = I>,
{
    /// Create a session for the given identity with default channel
    /// configuration.
    pub fn new(identity: Identity) -> Self {
        Self::with_config(identity, ChannelConfig::default())
    }

    /// Create a session with an explicit channel configuration.
    pub fn with_config(identity: Identity, config: ChannelConfig) -> Self {
        Self { cart: Cart::new(), channel: Channel::new(identity, config) }
    }

    /// Current order draft.
    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Apply a cart command. Commands are applied strictly in dispatch
    /// order; there is no other mutation path.
    pub fn dispatch(&mut self, command: CartCommand) {
        self.cart.apply(command);
    }

    /// Clear the draft after the order was successfully placed.
    pub fn order_placed(&mut self) {
        tracing::debug!(items = self.cart.item_count(), "order placed, clearing cart");
        self.cart.clear();
    }

    /// Initiate the channel's first connection attempt.
    pub fn connect(&mut self) -> Vec<ChannelAction> {
        self.channel.connect()
    }

    /// Feed a channel event through the state machine.
    pub fn handle_channel(&mut self, event: ChannelEvent<I>) -> Vec<ChannelAction> {
        self.channel.handle(event)
    }

    /// Send a JSON payload over the channel.
    ///
    /// `Some` carries the transmit action and means the send was accepted;
    /// `None` means the channel is not connected and the payload was
    /// dropped.
    pub fn send(&self, payload: &Value) -> Option<ChannelAction> {
        self.channel.send_value(payload)
    }

    /// Current channel connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.channel.state()
    }

    /// Notification feed, newest first.
    pub fn notifications(&self) -> &[NotificationMessage] {
        self.channel.notifications()
    }

    /// Most recent surfaced channel message.
    pub fn last_message(&self) -> Option<&Value> {
        self.channel.last_message()
    }

    /// Dismiss one notification by id.
    pub fn dismiss(&mut self, id: &str) {
        self.channel.dismiss(id);
    }

    /// Dismiss all notifications.
    pub fn dismiss_all(&mut self) {
        self.channel.dismiss_all();
    }

    /// Tear the session down on unmount: cancels the reconnect schedule and
    /// closes the transport. The cart is left intact - an unmount is not an
    /// order.
    pub fn teardown(&mut self) -> Vec<ChannelAction> {
        self.channel.close()
    }
}
