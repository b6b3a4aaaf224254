//! Connection and notification state machine.
//!
//! Manages the connect/retry lifecycle, authentication, inbound frame
//! classification, and the notification feed. Uses the action pattern:
//! methods take time as input and return actions for the driver to execute.
//! This keeps the state machine pure (no I/O) and makes testing
//! straightforward.
//!
//! # State Machine
//!
//! ```text
//!              connect/retry due        transport open
//! ┌──────────────┐ ─────────────> ┌────────────┐ ──────> ┌───────────┐
//! │ Disconnected │                │ Connecting │         │ Connected │
//! └──────────────┘ <───────────── └────────────┘ <────── └───────────┘
//!                    transport closed / error
//! ```
//!
//! Reconnects run on a fixed delay with unbounded attempts and no backoff.
//! Retries are suppressed while the host page is hidden and fire
//! immediately when it becomes visible again.

use std::{
    ops::Add,
    time::{Duration, Instant},
};

use serde_json::Value;

use crate::message::{Identity, Inbound, NotificationMessage};

/// Fixed delay between reconnect attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(5000);

/// Connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Connection attempt in flight.
    Connecting,
    /// Transport open; authenticate frame sent if an identity is present.
    Connected,
    /// Transport closed, errored, or not yet attempted.
    Disconnected,
}

/// Events the driver feeds into the channel.
#[derive(Debug, Clone)]
pub enum ChannelEvent<I = Instant> {
    /// Transport handshake succeeded.
    Opened,
    /// Transport closed (error or normal close).
    Closed {
        /// Current time, for scheduling the retry.
        now: I,
    },
    /// Text frame received from the server.
    Frame(String),
    /// Periodic tick for retry processing.
    Tick {
        /// Current time from the driver.
        now: I,
    },
    /// Host page visibility changed.
    Visibility {
        /// Whether the page is now visible to the user.
        visible: bool,
    },
}

/// Actions the channel produces for the driver to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelAction {
    /// Open a fresh transport to the server.
    Dial,
    /// Tear down the current transport, if any.
    ///
    /// Emitted before every [`ChannelAction::Dial`] on reconnect so a
    /// superseded transport is never left open.
    CloseTransport,
    /// Send a text frame to the server.
    Transmit(String),
    /// Forward a surfaced notification to the caller's handler.
    Notify(NotificationMessage),
}

/// Channel configuration.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Delay between a close and the next connection attempt.
    pub retry_delay: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self { retry_delay: DEFAULT_RETRY_DELAY }
    }
}

/// Connection and notification state machine.
///
/// This is a pure state machine - no I/O, no clock. Time is passed as a
/// parameter to the events that need it.
///
/// Generic over `Instant` to support both real time and virtual time for
/// deterministic testing.
#[derive(Debug, Clone)]
pub struct Channel<I = Instant>
where
    I: Copy + Ord + Add<Duration, Output = I>,
{
    /// Current state.
    state: ConnectionState,
    /// Identity announced after the transport opens.
    identity: Identity,
    /// Configuration.
    config: ChannelConfig,
    /// Whether the host page is visible. Retries are gated on this.
    visible: bool,
    /// Deadline of the pending reconnect. `None` if none is scheduled.
    retry_at: Option<I>,
    /// Notification feed, newest first.
    notifications: Vec<NotificationMessage>,
    /// Most recent surfaced message, raw.
    last_message: Option<Value>,
    /// Counter for ids synthesized for id-less notifications.
    next_local_id: u64,
}

impl<I> Channel<I>
where
    I: Copy + Ord + Add<Duration, Output = I>,
{
    /// Create a new channel in [`ConnectionState::Disconnected`] state.
    /// The page is assumed visible until told otherwise.
    pub fn new(identity: Identity, config: ChannelConfig) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            identity,
            config,
            visible: true,
            retry_at: None,
            notifications: Vec::new(),
            last_message: None,
            next_local_id: 0,
        }
    }

    /// Current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Notification feed, newest first.
    #[must_use]
    pub fn notifications(&self) -> &[NotificationMessage] {
        &self.notifications
    }

    /// Most recent surfaced message. `None` before the first one.
    #[must_use]
    pub fn last_message(&self) -> Option<&Value> {
        self.last_message.as_ref()
    }

    /// Whether the host page is currently visible.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Deadline of the pending reconnect. `None` if none is scheduled.
    #[must_use]
    pub fn retry_deadline(&self) -> Option<I> {
        self.retry_at
    }

    /// Initiate the first connection attempt.
    ///
    /// Idempotent: a channel that is already connecting or connected
    /// returns no actions.
    pub fn connect(&mut self) -> Vec<ChannelAction> {
        if self.state != ConnectionState::Disconnected {
            return Vec::new();
        }
        self.begin_attempt()
    }

    /// Process an event and return actions for the driver.
    pub fn handle(&mut self, event: ChannelEvent<I>) -> Vec<ChannelAction> {
        match event {
            ChannelEvent::Opened => self.handle_opened(),
            ChannelEvent::Closed { now } => self.handle_closed(now),
            ChannelEvent::Frame(text) => self.handle_frame(&text),
            ChannelEvent::Tick { now } => self.handle_tick(now),
            ChannelEvent::Visibility { visible } => self.handle_visibility(visible),
        }
    }

    /// Serialize a payload and transmit it, only while connected.
    ///
    /// Returns the transmit action, or `None` when disconnected; the
    /// channel never queues or buffers outbound messages. Callers wanting
    /// a boolean success indicator map `Some` to `true`.
    pub fn send_value(&self, payload: &Value) -> Option<ChannelAction> {
        match serde_json::to_string(payload) {
            Ok(text) => self.send_text(text),
            Err(error) => {
                tracing::warn!(%error, "dropping unserializable outbound payload");
                None
            },
        }
    }

    /// Transmit a pre-serialized frame, only while connected.
    pub fn send_text(&self, text: String) -> Option<ChannelAction> {
        if self.state == ConnectionState::Connected {
            Some(ChannelAction::Transmit(text))
        } else {
            None
        }
    }

    /// Remove one feed entry by id. Unknown ids are a no-op.
    pub fn dismiss(&mut self, id: &str) {
        self.notifications.retain(|n| n.id != id);
    }

    /// Empty the notification feed.
    pub fn dismiss_all(&mut self) {
        self.notifications.clear();
    }

    /// Tear down the channel on component unmount.
    ///
    /// Cancels the pending retry and closes the transport; the channel can
    /// be revived with [`Channel::connect`].
    pub fn close(&mut self) -> Vec<ChannelAction> {
        self.state = ConnectionState::Disconnected;
        self.retry_at = None;
        vec![ChannelAction::CloseTransport]
    }

    fn handle_opened(&mut self) -> Vec<ChannelAction> {
        self.state = ConnectionState::Connected;
        self.retry_at = None;

        match self.identity.authenticate_frame() {
            Some(frame) => vec![ChannelAction::Transmit(frame)],
            None => Vec::new(),
        }
    }

    fn handle_closed(&mut self, now: I) -> Vec<ChannelAction> {
        self.state = ConnectionState::Disconnected;
        self.retry_at = self.visible.then(|| now + self.config.retry_delay);
        Vec::new()
    }

    fn handle_frame(&mut self, text: &str) -> Vec<ChannelAction> {
        match Inbound::parse(text) {
            Some(Inbound::AuthAck) => {
                tracing::debug!("notification channel authenticated");
                Vec::new()
            },
            Some(Inbound::Notification { mut message, raw }) => {
                if message.id.is_empty() {
                    self.next_local_id += 1;
                    message.id = format!("local-{}", self.next_local_id);
                }
                self.last_message = Some(raw);
                self.notifications.insert(0, message.clone());
                vec![ChannelAction::Notify(message)]
            },
            Some(Inbound::Other(value)) => {
                self.last_message = Some(value);
                Vec::new()
            },
            None => {
                tracing::warn!("ignoring malformed frame from server");
                Vec::new()
            },
        }
    }

    fn handle_tick(&mut self, now: I) -> Vec<ChannelAction> {
        if self.state != ConnectionState::Disconnected || !self.visible {
            return Vec::new();
        }

        match self.retry_at {
            Some(deadline) if now >= deadline => self.begin_attempt(),
            _ => Vec::new(),
        }
    }

    fn handle_visibility(&mut self, visible: bool) -> Vec<ChannelAction> {
        self.visible = visible;

        if !visible {
            // Reconnects are suppressed while the page is hidden
            self.retry_at = None;
            return Vec::new();
        }

        if self.state == ConnectionState::Disconnected {
            return self.begin_attempt();
        }
        Vec::new()
    }

    /// Transition to Connecting. The prior transport is closed before a new
    /// one is dialed, so a superseded connection is never leaked.
    fn begin_attempt(&mut self) -> Vec<ChannelAction> {
        self.state = ConnectionState::Connecting;
        self.retry_at = None;
        vec![ChannelAction::CloseTransport, ChannelAction::Dial]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anonymous_channel() -> Channel {
        Channel::new(Identity::default(), ChannelConfig::default())
    }

    fn identified() -> Identity {
        Identity { user_id: Some("u-1".to_string()), ..Identity::default() }
    }

    #[test]
    fn connect_dials_once() {
        let mut channel = anonymous_channel();

        assert_eq!(channel.state(), ConnectionState::Disconnected);
        let actions = channel.connect();
        assert_eq!(actions, vec![ChannelAction::CloseTransport, ChannelAction::Dial]);
        assert_eq!(channel.state(), ConnectionState::Connecting);

        // Connecting channel does not dial again
        assert!(channel.connect().is_empty());
    }

    #[test]
    fn open_authenticates_when_identity_present() {
        let mut channel: Channel = Channel::new(identified(), ChannelConfig::default());
        let _ = channel.connect();

        let actions = channel.handle(ChannelEvent::Opened);
        assert_eq!(channel.state(), ConnectionState::Connected);
        assert_eq!(actions.len(), 1);
        match &actions[0] {
            ChannelAction::Transmit(frame) => assert!(frame.contains("authenticate")),
            other => panic!("expected transmit, got {other:?}"),
        }
    }

    #[test]
    fn open_without_identity_sends_nothing() {
        let mut channel = anonymous_channel();
        let _ = channel.connect();

        assert!(channel.handle(ChannelEvent::Opened).is_empty());
        assert_eq!(channel.state(), ConnectionState::Connected);
    }

    #[test]
    fn drop_then_retry_after_fixed_delay() {
        let t0 = Instant::now();
        let mut channel = anonymous_channel();
        let _ = channel.connect();
        let _ = channel.handle(ChannelEvent::Opened);

        // Transport drops
        assert!(channel.handle(ChannelEvent::Closed { now: t0 }).is_empty());
        assert_eq!(channel.state(), ConnectionState::Disconnected);

        // Not due yet
        let early = t0 + Duration::from_millis(4999);
        assert!(channel.handle(ChannelEvent::Tick { now: early }).is_empty());
        assert_eq!(channel.state(), ConnectionState::Disconnected);

        // Due: close the superseded transport, then dial
        let due = t0 + Duration::from_millis(5000);
        let actions = channel.handle(ChannelEvent::Tick { now: due });
        assert_eq!(actions, vec![ChannelAction::CloseTransport, ChannelAction::Dial]);
        assert_eq!(channel.state(), ConnectionState::Connecting);
    }

    #[test]
    fn hidden_page_suppresses_retry() {
        let t0 = Instant::now();
        let mut channel = anonymous_channel();
        let _ = channel.connect();
        let _ = channel.handle(ChannelEvent::Opened);
        let _ = channel.handle(ChannelEvent::Visibility { visible: false });
        let _ = channel.handle(ChannelEvent::Closed { now: t0 });

        assert_eq!(channel.retry_deadline(), None);
        let late = t0 + Duration::from_secs(60);
        assert!(channel.handle(ChannelEvent::Tick { now: late }).is_empty());
        assert_eq!(channel.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn becoming_visible_reconnects_immediately() {
        let t0 = Instant::now();
        let mut channel = anonymous_channel();
        let _ = channel.connect();
        let _ = channel.handle(ChannelEvent::Opened);
        let _ = channel.handle(ChannelEvent::Visibility { visible: false });
        let _ = channel.handle(ChannelEvent::Closed { now: t0 });

        let actions = channel.handle(ChannelEvent::Visibility { visible: true });
        assert_eq!(actions, vec![ChannelAction::CloseTransport, ChannelAction::Dial]);
        assert_eq!(channel.state(), ConnectionState::Connecting);
    }

    #[test]
    fn becoming_visible_while_connected_does_nothing() {
        let mut channel = anonymous_channel();
        let _ = channel.connect();
        let _ = channel.handle(ChannelEvent::Opened);

        let _ = channel.handle(ChannelEvent::Visibility { visible: false });
        assert!(channel.handle(ChannelEvent::Visibility { visible: true }).is_empty());
        assert_eq!(channel.state(), ConnectionState::Connected);
    }

    #[test]
    fn hiding_cancels_scheduled_retry() {
        let t0 = Instant::now();
        let mut channel = anonymous_channel();
        let _ = channel.connect();
        let _ = channel.handle(ChannelEvent::Opened);
        let _ = channel.handle(ChannelEvent::Closed { now: t0 });
        assert!(channel.retry_deadline().is_some());

        let _ = channel.handle(ChannelEvent::Visibility { visible: false });
        assert_eq!(channel.retry_deadline(), None);
    }

    #[test]
    fn send_is_gated_on_connected() {
        let mut channel = anonymous_channel();

        assert_eq!(channel.send_text("ping".to_string()), None);

        let _ = channel.connect();
        assert_eq!(channel.send_text("ping".to_string()), None);

        let _ = channel.handle(ChannelEvent::Opened);
        assert_eq!(
            channel.send_text("ping".to_string()),
            Some(ChannelAction::Transmit("ping".to_string()))
        );

        let payload = serde_json::json!({"type": "ack", "orderId": 12});
        match channel.send_value(&payload) {
            Some(ChannelAction::Transmit(text)) => {
                assert_eq!(serde_json::from_str::<serde_json::Value>(&text).ok(), Some(payload));
            },
            other => panic!("expected transmit, got {other:?}"),
        }
    }

    #[test]
    fn auth_ack_is_consumed_silently() {
        let mut channel = anonymous_channel();
        let _ = channel.connect();
        let _ = channel.handle(ChannelEvent::Opened);

        let actions =
            channel.handle(ChannelEvent::Frame(r#"{"type":"authentication_success"}"#.to_string()));
        assert!(actions.is_empty());
        assert_eq!(channel.last_message(), None);
        assert!(channel.notifications().is_empty());
    }

    #[test]
    fn notification_prepends_and_notifies() {
        let mut channel = anonymous_channel();
        let _ = channel.connect();
        let _ = channel.handle(ChannelEvent::Opened);

        let first = r#"{"id":"n-1","type":"order_update","title":"Order Update","message":"Preparing"}"#;
        let second = r#"{"id":"n-2","type":"order_update","title":"Order Update","message":"On the way"}"#;
        let actions = channel.handle(ChannelEvent::Frame(first.to_string()));
        assert!(matches!(actions.as_slice(), [ChannelAction::Notify(n)] if n.id == "n-1"));

        let _ = channel.handle(ChannelEvent::Frame(second.to_string()));
        assert_eq!(channel.notifications().len(), 2);
        assert_eq!(channel.notifications()[0].id, "n-2");
        assert_eq!(channel.notifications()[1].id, "n-1");
        assert!(channel.last_message().is_some());
    }

    #[test]
    fn plain_message_updates_last_message_only() {
        let mut channel = anonymous_channel();
        let _ = channel.connect();
        let _ = channel.handle(ChannelEvent::Opened);

        let actions =
            channel.handle(ChannelEvent::Frame(r#"{"type":"rider_location","lat":6.5}"#.to_string()));
        assert!(actions.is_empty());
        assert!(channel.notifications().is_empty());
        assert_eq!(
            channel.last_message().and_then(|m| m.get("type")).and_then(|t| t.as_str()),
            Some("rider_location")
        );
    }

    #[test]
    fn malformed_frame_changes_nothing() {
        let mut channel = anonymous_channel();
        let _ = channel.connect();
        let _ = channel.handle(ChannelEvent::Opened);

        let actions = channel.handle(ChannelEvent::Frame("{not json".to_string()));
        assert!(actions.is_empty());
        assert_eq!(channel.state(), ConnectionState::Connected);
        assert_eq!(channel.last_message(), None);
    }

    #[test]
    fn idless_notification_gets_local_id() {
        let mut channel = anonymous_channel();
        let _ = channel.connect();
        let _ = channel.handle(ChannelEvent::Opened);

        let frame = r#"{"type":"promo","title":"Deal","message":"Half price"}"#;
        let _ = channel.handle(ChannelEvent::Frame(frame.to_string()));
        let _ = channel.handle(ChannelEvent::Frame(frame.to_string()));

        assert_eq!(channel.notifications()[0].id, "local-2");
        assert_eq!(channel.notifications()[1].id, "local-1");
    }

    #[test]
    fn dismiss_removes_only_the_matching_id() {
        let mut channel = anonymous_channel();
        let _ = channel.connect();
        let _ = channel.handle(ChannelEvent::Opened);

        for id in ["a", "b", "c"] {
            let frame = format!(r#"{{"id":"{id}","title":"T","message":"M"}}"#);
            let _ = channel.handle(ChannelEvent::Frame(frame));
        }

        channel.dismiss("b");
        let ids: Vec<&str> = channel.notifications().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a"]);

        channel.dismiss("missing");
        assert_eq!(channel.notifications().len(), 2);

        channel.dismiss_all();
        assert!(channel.notifications().is_empty());
    }

    #[test]
    fn close_cancels_retry_and_tears_down() {
        let t0 = Instant::now();
        let mut channel = anonymous_channel();
        let _ = channel.connect();
        let _ = channel.handle(ChannelEvent::Opened);
        let _ = channel.handle(ChannelEvent::Closed { now: t0 });
        assert!(channel.retry_deadline().is_some());

        let actions = channel.close();
        assert_eq!(actions, vec![ChannelAction::CloseTransport]);
        assert_eq!(channel.state(), ConnectionState::Disconnected);
        assert_eq!(channel.retry_deadline(), None);

        let late = t0 + Duration::from_secs(60);
        assert!(channel.handle(ChannelEvent::Tick { now: late }).is_empty());
    }
}
