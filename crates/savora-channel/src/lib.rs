//! Notification channel
//!
//! Reconnecting, client-initiated real-time channel for push-style
//! notifications. Authenticates after the transport opens, classifies
//! inbound JSON frames, and exposes an append-only, dismissible notification
//! feed together with the current connection state.
//!
//! # Architecture
//!
//! The channel follows the same Sans-IO and action-based patterns as the
//! cart engine: [`Channel`] is a pure state machine that consumes
//! [`ChannelEvent`] inputs (transport opens/closes, inbound frames, time
//! ticks, page visibility) and returns [`ChannelAction`] instructions for
//! the driver to execute. Time is passed in as a parameter and the machine
//! is generic over the `Instant` type, so the reconnect schedule is testable
//! with virtual time.
//!
//! # Components
//!
//! - [`Channel`]: connection/notification state machine
//! - [`ChannelEvent`] / [`ChannelAction`]: the machine's I/O vocabulary
//! - [`Identity`]: fields announced in the authenticate frame
//! - [`NotificationMessage`]: one entry of the notification feed
//!
//! # Transport (optional)
//!
//! With the `transport` feature enabled, this crate also provides:
//! - [`transport::ConnectedChannel`]: WebSocket transport handle
//! - [`transport::connect`]: open a WebSocket to the server
//! - [`driver::run`]: owning task that drives a [`Channel`] end to end

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod channel;
mod error;
mod message;

#[cfg(feature = "transport")]
pub mod driver;
#[cfg(feature = "transport")]
pub mod transport;

pub use channel::{
    Channel, ChannelAction, ChannelConfig, ChannelEvent, ConnectionState, DEFAULT_RETRY_DELAY,
};
pub use error::ChannelError;
pub use message::{Identity, Inbound, NotificationMessage};
