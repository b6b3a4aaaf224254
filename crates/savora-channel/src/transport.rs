//! WebSocket transport for the channel.
//!
//! Provides [`ConnectedChannel`] which handles WebSocket I/O for text
//! frames. This is a thin layer that just sends/receives frames - retry,
//! authentication, and notification logic remain in the Sans-IO
//! [`crate::Channel`].

use futures::{SinkExt, StreamExt};
use tokio::{net::TcpStream, sync::mpsc};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite::Message};

use crate::error::ChannelError;

/// Raw events the transport delivers to the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Text frame received from the server.
    Text(String),
    /// The socket closed or failed; no further events will arrive.
    Closed,
}

/// Handle to a connected WebSocket transport.
///
/// Frames are sent/received via the channels; an internal task handles the
/// socket I/O.
pub struct ConnectedChannel {
    /// Send text frames to the server.
    pub to_server: mpsc::Sender<String>,
    /// Receive events from the server.
    pub from_server: mpsc::Receiver<TransportEvent>,
    /// Abort handle to stop the connection task.
    abort_handle: tokio::task::AbortHandle,
}

impl ConnectedChannel {
    /// Stop the connection task.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

/// Open a WebSocket to the notification endpoint (`ws://` or `wss://`).
///
/// Returns a [`ConnectedChannel`] with channels for frame transport; a
/// successful return means the handshake completed.
pub async fn connect(url: &str) -> Result<ConnectedChannel, ChannelError> {
    let (socket, _response) = tokio_tungstenite::connect_async(url)
        .await
        .map_err(|e| ChannelError::Connection(e.to_string()))?;

    let (to_server_tx, to_server_rx) = mpsc::channel::<String>(32);
    let (from_server_tx, from_server_rx) = mpsc::channel::<TransportEvent>(32);

    let handle = tokio::spawn(run_connection(socket, to_server_rx, from_server_tx));

    Ok(ConnectedChannel {
        to_server: to_server_tx,
        from_server: from_server_rx,
        abort_handle: handle.abort_handle(),
    })
}

/// Run the connection, bridging between channels and the socket.
async fn run_connection(
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
    mut to_server: mpsc::Receiver<String>,
    from_server: mpsc::Sender<TransportEvent>,
) {
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    if from_server.send(TransportEvent::Text(text.to_string())).await.is_err() {
                        break;
                    }
                },
                Some(Ok(Message::Close(_))) | None => {
                    let _ = from_server.send(TransportEvent::Closed).await;
                    break;
                },
                // Ping/pong are answered by the protocol layer; binary
                // frames are not part of this wire format
                Some(Ok(_)) => {},
                Some(Err(error)) => {
                    tracing::warn!(%error, "websocket read failed");
                    let _ = from_server.send(TransportEvent::Closed).await;
                    break;
                },
            },
            outbound = to_server.recv() => match outbound {
                Some(text) => {
                    if let Err(error) = sink.send(Message::Text(text.into())).await {
                        tracing::warn!(%error, "websocket write failed");
                        let _ = from_server.send(TransportEvent::Closed).await;
                        break;
                    }
                },
                // Caller hung up: close the socket on the way out
                None => {
                    let _ = sink.close().await;
                    break;
                },
            },
        }
    }
}
