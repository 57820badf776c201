//! ConnectionManager — owns the single live feed socket.
//!
//! Lifecycle is explicit: `connect` closes any previous socket before opening
//! a new one, `send` refuses (with an error, never silently) when no socket
//! is open, `close` tears the task down.  There is no reconnection logic —
//! a closed socket stays closed until `connect` is called again.
//!
//! Inbound frames are decoded, classified by shape, and forwarded to the app
//! event loop as `FeedEvent`s.  The manager never touches UI state itself.

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use dock_proto::model::{Comment, Reply};
use dock_proto::protocol::{
    decode_frame, encode_frame, ClientFrame, Command, Inbound, StatusFrame,
};

/// Connection lifecycle, surfaced to the UI as status text only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Open,
    ClosedWithError,
}

impl ConnectionState {
    pub fn label(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "connected",
            ConnectionState::ClosedWithError => "error",
        }
    }
}

/// What the socket task reports back to the app event loop.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// Lifecycle transition plus a human-readable status line.
    Connection(ConnectionState, String),
    /// Comment-list broadcast (array sniffed on `commentor`).
    Comments(Vec<Comment>),
    /// Reply-list broadcast (array sniffed on `replier`).
    Replies(Vec<Reply>),
    /// Singleton status/error object.
    Status(StatusFrame),
}

#[derive(Debug, Error)]
pub enum SendError {
    #[error("feed socket is not open")]
    NotConnected,
}

pub struct ConnectionManager {
    state: ConnectionState,
    username: String,
    event_tx: mpsc::Sender<FeedEvent>,
    outbound_tx: Option<mpsc::UnboundedSender<Command>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl ConnectionManager {
    pub fn new(username: String, event_tx: mpsc::Sender<FeedEvent>) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            username,
            event_tx,
            outbound_tx: None,
            task: None,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Record a transition reported by the socket task.  The app calls this
    /// when it sees `FeedEvent::Connection`; the manager stays the single
    /// owner of the state value.
    pub fn note_state(&mut self, state: ConnectionState) {
        self.state = state;
        if state != ConnectionState::Open {
            self.outbound_tx = None;
        }
    }

    /// Open the feed socket.  Any previous socket is closed first so there is
    /// never more than one live connection.
    pub fn connect(&mut self, endpoint: &str) {
        self.close();
        self.state = ConnectionState::Connecting;

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        self.outbound_tx = Some(outbound_tx);

        let endpoint = endpoint.to_string();
        let username = self.username.clone();
        let event_tx = self.event_tx.clone();
        self.task = Some(tokio::spawn(async move {
            socket_task(endpoint, username, outbound_rx, event_tx).await;
        }));
    }

    /// Serialize a command envelope onto the open socket.  No queuing, no
    /// retry: when the socket is not open the command is refused and the
    /// caller decides what to tell the user.
    pub fn send(&mut self, cmd: Command) -> Result<(), SendError> {
        if self.state != ConnectionState::Open {
            return Err(SendError::NotConnected);
        }
        match &self.outbound_tx {
            Some(tx) => tx.send(cmd).map_err(|_| SendError::NotConnected),
            None => Err(SendError::NotConnected),
        }
    }

    pub fn close(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.outbound_tx = None;
        self.state = ConnectionState::Disconnected;
    }
}

async fn socket_task(
    endpoint: String,
    username: String,
    mut outbound_rx: mpsc::UnboundedReceiver<Command>,
    event_tx: mpsc::Sender<FeedEvent>,
) {
    let _ = event_tx
        .send(FeedEvent::Connection(
            ConnectionState::Connecting,
            format!("Connecting to {endpoint}…"),
        ))
        .await;

    let stream = match TcpStream::connect(&endpoint).await {
        Ok(s) => s,
        Err(e) => {
            warn!("Feed connect failed: {}", e);
            let _ = event_tx
                .send(FeedEvent::Connection(
                    ConnectionState::ClosedWithError,
                    format!("Feed error: {e}"),
                ))
                .await;
            return;
        }
    };

    let (mut read_half, mut write_half) = stream.into_split();

    // Identify before anything else; the daemon refuses anonymous commands.
    let hello = ClientFrame::Hello {
        user: username.clone(),
    };
    match encode_frame(&hello) {
        Ok(encoded) => {
            if let Err(e) = write_half.write_all(&encoded).await {
                let _ = event_tx
                    .send(FeedEvent::Connection(
                        ConnectionState::ClosedWithError,
                        format!("Feed error: {e}"),
                    ))
                    .await;
                return;
            }
        }
        Err(e) => {
            warn!("Failed to encode hello: {}", e);
            return;
        }
    }

    info!("Feed connected to {} as {}", endpoint, username);
    let _ = event_tx
        .send(FeedEvent::Connection(
            ConnectionState::Open,
            "Feed connected".to_string(),
        ))
        .await;

    let mut tmp = [0u8; 4096];
    let mut read_buf: Vec<u8> = Vec::new();

    loop {
        tokio::select! {
            result = read_half.read(&mut tmp) => {
                match result {
                    Ok(0) => {
                        let _ = event_tx
                            .send(FeedEvent::Connection(
                                ConnectionState::Disconnected,
                                "Feed disconnected".to_string(),
                            ))
                            .await;
                        return;
                    }
                    Ok(n) => {
                        read_buf.extend_from_slice(&tmp[..n]);
                        loop {
                            if read_buf.len() < 4 { break; }
                            match decode_frame(&read_buf) {
                                Ok((value, consumed)) => {
                                    read_buf.drain(..consumed);
                                    let event = match Inbound::classify(&value) {
                                        Inbound::Comments(list) => FeedEvent::Comments(list),
                                        Inbound::Replies(list) => FeedEvent::Replies(list),
                                        Inbound::Status(status) => FeedEvent::Status(status),
                                    };
                                    if event_tx.send(event).await.is_err() {
                                        return;
                                    }
                                }
                                Err(_) => break, // incomplete frame, read more
                            }
                        }
                    }
                    Err(e) => {
                        warn!("Feed read error: {}", e);
                        let _ = event_tx
                            .send(FeedEvent::Connection(
                                ConnectionState::ClosedWithError,
                                format!("Feed error: {e}"),
                            ))
                            .await;
                        return;
                    }
                }
            }

            cmd = outbound_rx.recv() => {
                match cmd {
                    Some(cmd) => {
                        debug!("Feed send: {:?}", cmd);
                        let frame = ClientFrame::Command(cmd);
                        match encode_frame(&frame) {
                            Ok(encoded) => {
                                if let Err(e) = write_half.write_all(&encoded).await {
                                    warn!("Feed write error: {}", e);
                                    let _ = event_tx
                                        .send(FeedEvent::Connection(
                                            ConnectionState::ClosedWithError,
                                            format!("Feed error: {e}"),
                                        ))
                                        .await;
                                    return;
                                }
                            }
                            Err(e) => warn!("Failed to encode command: {}", e),
                        }
                    }
                    // Manager dropped the sender: explicit close.
                    None => return,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dock_proto::protocol::TargetId;

    #[tokio::test]
    async fn test_send_refused_when_not_open() {
        let (event_tx, _event_rx) = mpsc::channel(8);
        let mut manager = ConnectionManager::new("alice".into(), event_tx);
        let result = manager.send(Command::Delete {
            id: TargetId::Num(1),
        });
        assert!(matches!(result, Err(SendError::NotConnected)));
    }

    #[tokio::test]
    async fn test_close_resets_state() {
        let (event_tx, _event_rx) = mpsc::channel(8);
        let mut manager = ConnectionManager::new("alice".into(), event_tx);
        manager.connect("127.0.0.1:1"); // will fail asynchronously; irrelevant here
        assert_eq!(manager.state(), ConnectionState::Connecting);
        manager.close();
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(matches!(
            manager.send(Command::Delete { id: TargetId::Num(1) }),
            Err(SendError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_error_transition_drops_outbound_channel() {
        let (event_tx, _event_rx) = mpsc::channel(8);
        let mut manager = ConnectionManager::new("alice".into(), event_tx);
        manager.connect("127.0.0.1:1");
        manager.note_state(ConnectionState::Open);
        manager.note_state(ConnectionState::ClosedWithError);
        assert!(matches!(
            manager.send(Command::Delete { id: TargetId::Num(1) }),
            Err(SendError::NotConnected)
        ));
    }
}
