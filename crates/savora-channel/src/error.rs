//! Error types for the notification channel.
//!
//! The state machine itself never fails: bad frames are logged and dropped,
//! and connection loss is expressed as state. These errors exist for the
//! transport boundary only, where the driver converts them into
//! [`crate::ChannelEvent::Closed`] events.

use thiserror::Error;

/// Errors that can occur at the transport boundary.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// WebSocket connection could not be established.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The transport rejected an outbound frame.
    #[error("send failed: {0}")]
    Send(String),
}
