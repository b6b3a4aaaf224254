//! Owning driver for the notification channel.
//!
//! One task owns the [`Channel`] state machine and the WebSocket transport,
//! executes the machine's actions, and publishes every state change as an
//! observable snapshot. All reconnect scheduling lives in the state machine;
//! the driver only supplies time and I/O.
//!
//! Teardown is scoped: shutting the driver down (or dropping the command
//! sender) closes the transport and cancels the retry schedule before the
//! task exits.

use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use serde_json::Value;
use tokio::sync::{mpsc, watch};

use crate::{
    channel::{Channel, ChannelAction, ChannelConfig, ChannelEvent, ConnectionState},
    message::{Identity, NotificationMessage},
    transport::{self, ConnectedChannel, TransportEvent},
};

/// Interval at which the driver feeds ticks into the state machine.
const TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Commands the UI sends to the running driver.
#[derive(Debug, Clone)]
pub enum DriverCommand {
    /// Send a JSON payload to the server. Dropped (and logged) unless the
    /// channel is connected; outbound messages are never queued.
    Send(Value),
    /// Report a host page visibility change.
    Visibility(bool),
    /// Dismiss one notification by id.
    Dismiss(String),
    /// Dismiss all notifications.
    DismissAll,
    /// Tear down the channel and stop the driver.
    Shutdown,
}

/// Observable channel state, published after every change.
#[derive(Debug, Clone)]
pub struct ChannelSnapshot {
    /// Connection state.
    pub state: ConnectionState,
    /// Notification feed, newest first.
    pub notifications: Vec<NotificationMessage>,
    /// Most recent surfaced message, raw.
    pub last_message: Option<Value>,
}

impl ChannelSnapshot {
    fn of(channel: &Channel) -> Self {
        Self {
            state: channel.state(),
            notifications: channel.notifications().to_vec(),
            last_message: channel.last_message().cloned(),
        }
    }
}

/// Handle to a running channel driver.
pub struct ChannelHandle {
    /// Command sender. Dropping it shuts the driver down.
    pub commands: mpsc::Sender<DriverCommand>,
    /// State snapshots, updated after every change.
    pub snapshots: watch::Receiver<ChannelSnapshot>,
    /// Surfaced notifications, in arrival order.
    pub notifications: mpsc::Receiver<NotificationMessage>,
}

/// Spawn the channel driver for `url` and return its handle.
///
/// Must be called from within a tokio runtime.
pub fn spawn(url: String, identity: Identity, config: ChannelConfig) -> ChannelHandle {
    let (command_tx, command_rx) = mpsc::channel(32);
    let (notify_tx, notify_rx) = mpsc::channel(32);

    let channel = Channel::new(identity, config);
    let (snapshot_tx, snapshot_rx) = watch::channel(ChannelSnapshot::of(&channel));

    tokio::spawn(run(url, channel, command_rx, snapshot_tx, notify_tx));

    ChannelHandle { commands: command_tx, snapshots: snapshot_rx, notifications: notify_rx }
}

/// One iteration's wake-up source.
enum Step {
    Tick,
    Command(Option<DriverCommand>),
    Transport(Option<TransportEvent>),
}

/// Drive the channel until shutdown.
pub async fn run(
    url: String,
    mut channel: Channel,
    mut commands: mpsc::Receiver<DriverCommand>,
    snapshots: watch::Sender<ChannelSnapshot>,
    notify: mpsc::Sender<NotificationMessage>,
) {
    let mut transport: Option<ConnectedChannel> = None;
    let mut ticker = tokio::time::interval(TICK_INTERVAL);

    let actions = channel.connect();
    execute(&url, &mut channel, &mut transport, &notify, actions).await;
    let _ = snapshots.send(ChannelSnapshot::of(&channel));

    loop {
        let step = {
            let inbound = async {
                match transport.as_mut() {
                    Some(t) => t.from_server.recv().await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                _ = ticker.tick() => Step::Tick,
                command = commands.recv() => Step::Command(command),
                event = inbound => Step::Transport(event),
            }
        };

        let done = match step {
            Step::Tick => {
                let actions = channel.handle(ChannelEvent::Tick { now: Instant::now() });
                execute(&url, &mut channel, &mut transport, &notify, actions).await;
                false
            },
            Step::Command(None) | Step::Command(Some(DriverCommand::Shutdown)) => {
                let actions = channel.close();
                execute(&url, &mut channel, &mut transport, &notify, actions).await;
                true
            },
            Step::Command(Some(DriverCommand::Send(payload))) => {
                match channel.send_value(&payload) {
                    Some(action) => {
                        execute(&url, &mut channel, &mut transport, &notify, vec![action]).await;
                    },
                    None => tracing::debug!("dropping outbound message while disconnected"),
                }
                false
            },
            Step::Command(Some(DriverCommand::Visibility(visible))) => {
                let actions = channel.handle(ChannelEvent::Visibility { visible });
                execute(&url, &mut channel, &mut transport, &notify, actions).await;
                false
            },
            Step::Command(Some(DriverCommand::Dismiss(id))) => {
                channel.dismiss(&id);
                false
            },
            Step::Command(Some(DriverCommand::DismissAll)) => {
                channel.dismiss_all();
                false
            },
            Step::Transport(Some(TransportEvent::Text(text))) => {
                let actions = channel.handle(ChannelEvent::Frame(text));
                execute(&url, &mut channel, &mut transport, &notify, actions).await;
                false
            },
            Step::Transport(Some(TransportEvent::Closed)) | Step::Transport(None) => {
                // Stop polling the dead transport before scheduling the retry
                if let Some(t) = transport.take() {
                    t.stop();
                }
                let actions = channel.handle(ChannelEvent::Closed { now: Instant::now() });
                execute(&url, &mut channel, &mut transport, &notify, actions).await;
                false
            },
        };

        let _ = snapshots.send(ChannelSnapshot::of(&channel));
        if done {
            break;
        }
    }
}

/// Execute the machine's actions, feeding follow-up events (dial results)
/// back through the machine until the queue drains.
async fn execute(
    url: &str,
    channel: &mut Channel,
    transport: &mut Option<ConnectedChannel>,
    notify: &mpsc::Sender<NotificationMessage>,
    actions: Vec<ChannelAction>,
) {
    let mut queue: VecDeque<ChannelAction> = actions.into();

    while let Some(action) = queue.pop_front() {
        match action {
            ChannelAction::CloseTransport => {
                if let Some(t) = transport.take() {
                    t.stop();
                }
            },
            ChannelAction::Dial => match transport::connect(url).await {
                Ok(t) => {
                    *transport = Some(t);
                    queue.extend(channel.handle(ChannelEvent::Opened));
                },
                Err(error) => {
                    tracing::warn!(%error, "websocket dial failed");
                    queue.extend(channel.handle(ChannelEvent::Closed { now: Instant::now() }));
                },
            },
            ChannelAction::Transmit(text) => match transport.as_ref() {
                Some(t) => {
                    if t.to_server.send(text).await.is_err() {
                        tracing::warn!("transport task hung up before transmit");
                    }
                },
                None => tracing::warn!("dropping frame transmitted while disconnected"),
            },
            ChannelAction::Notify(message) => {
                let _ = notify.try_send(message);
            },
        }
    }
}
