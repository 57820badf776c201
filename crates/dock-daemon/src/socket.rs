//! Feed socket server — length-prefixed JSON frames over TCP.
//!
//! Each client must identify with a `hello {user}` frame before sending
//! commands; that identity is attached to every command it sends.  After the
//! hello the client immediately receives the full comment and reply lists,
//! then lives in a select loop of inbound commands and broadcast fan-out.

use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{
    tcp::OwnedWriteHalf,
    TcpListener, TcpStream,
};
use tokio::sync::{broadcast, mpsc, RwLock};
use tracing::{error, info, warn};

use dock_proto::model::{Comment, Reply};
use dock_proto::protocol::{decode_frame, encode_frame, ClientFrame, StatusFrame};

use crate::core::DaemonEvent;
use crate::store::FeedStore;
use crate::BroadcastMessage;

pub struct ClientHandle {
    pub id: usize,
}

/// Add a client to the registry; returns how many are now online.
async fn register_client(clients: &Arc<RwLock<Vec<ClientHandle>>>, id: usize) -> usize {
    let mut guard = clients.write().await;
    guard.push(ClientHandle { id });
    guard.len()
}

/// Remove a client from the registry; returns how many remain online.
async fn unregister_client(clients: &Arc<RwLock<Vec<ClientHandle>>>, id: usize) -> usize {
    let mut guard = clients.write().await;
    guard.retain(|c| c.id != id);
    guard.len()
}

pub fn start_server(
    bind_address: String,
    port: u16,
    store: FeedStore,
    clients: Arc<RwLock<Vec<ClientHandle>>>,
    event_tx: mpsc::Sender<DaemonEvent>,
    broadcast_tx: broadcast::Sender<BroadcastMessage>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let addr = format!("{}:{}", bind_address, port);

        let listener = match TcpListener::bind(&addr).await {
            Ok(l) => l,
            Err(e) => {
                error!("Failed to bind feed socket {}: {}", addr, e);
                return;
            }
        };

        info!("Feed socket listening at {}", addr);

        let mut client_id = 0usize;

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    client_id += 1;
                    let id = client_id;

                    let online = register_client(&clients, id).await;
                    info!("Feed client {} connected from {} ({} online)", id, peer, online);

                    let store = store.clone();
                    let evt_tx = event_tx.clone();
                    let bcast_rx = broadcast_tx.subscribe();
                    let clients_ref = clients.clone();

                    tokio::spawn(async move {
                        handle_client(stream, store, id, evt_tx, bcast_rx).await;

                        let online = unregister_client(&clients_ref, id).await;
                        info!("Feed client {} disconnected ({} online)", id, online);
                    });
                }
                Err(e) => {
                    error!("Failed to accept feed connection: {}", e);
                }
            }
        }
    })
}

async fn handle_client(
    stream: TcpStream,
    store: FeedStore,
    client_id: usize,
    event_tx: mpsc::Sender<DaemonEvent>,
    mut broadcast_rx: broadcast::Receiver<BroadcastMessage>,
) {
    let (mut read_half, mut write_half) = stream.into_split();
    let mut tmp = [0u8; 4096];
    let mut read_buf: Vec<u8> = Vec::new();
    // Set by the hello frame; commands before it are rejected.
    let mut user: Option<String> = None;

    loop {
        tokio::select! {
            result = read_half.read(&mut tmp) => {
                match result {
                    Ok(0) => {
                        info!("Feed client {} closed connection", client_id);
                        break;
                    }
                    Ok(n) => {
                        read_buf.extend_from_slice(&tmp[..n]);

                        loop {
                            if read_buf.len() < 4 { break; }
                            match decode_frame(&read_buf) {
                                Ok((value, consumed)) => {
                                    read_buf.drain(..consumed);
                                    if !process_frame(
                                        &value,
                                        &mut user,
                                        client_id,
                                        &store,
                                        &event_tx,
                                        &mut write_half,
                                    )
                                    .await
                                    {
                                        return;
                                    }
                                }
                                Err(_) => break,
                            }
                        }
                    }
                    Err(e) => {
                        error!("Read error from feed client {}: {}", client_id, e);
                        break;
                    }
                }
            }

            msg = broadcast_rx.recv() => {
                match msg {
                    Ok(BroadcastMessage::CommentsChanged) => {
                        let list = store.comment_list().await;
                        if send_comment_list(&mut write_half, &list).await.is_err() {
                            break;
                        }
                    }
                    Ok(BroadcastMessage::RepliesChanged) => {
                        let list = store.reply_list().await;
                        if send_reply_list(&mut write_half, &list).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Feed client {} missed {} broadcasts, resyncing", client_id, n);
                        let comments = store.comment_list().await;
                        let replies = store.reply_list().await;
                        if send_comment_list(&mut write_half, &comments).await.is_err()
                            || send_reply_list(&mut write_half, &replies).await.is_err()
                        {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        }
    }
}

/// Handle one decoded client frame.  Returns false when the connection
/// should be dropped.
async fn process_frame(
    value: &Value,
    user: &mut Option<String>,
    client_id: usize,
    store: &FeedStore,
    event_tx: &mpsc::Sender<DaemonEvent>,
    write_half: &mut OwnedWriteHalf,
) -> bool {
    let frame: ClientFrame = match serde_json::from_value(value.clone()) {
        Ok(f) => f,
        Err(_) => {
            let reason = describe_bad_frame(value);
            warn!("Feed client {}: bad frame: {}", client_id, reason);
            let _ = send_status(write_half, &StatusFrame::error(reason)).await;
            return true;
        }
    };

    match frame {
        ClientFrame::Hello { user: name } => {
            info!("Feed client {} identified as {}", client_id, name);
            *user = Some(name);
            // Initial sync: full comment list, then full reply list, so the
            // client can hang replies under already-rendered comments.
            let comments = store.comment_list().await;
            let replies = store.reply_list().await;
            if send_comment_list(write_half, &comments).await.is_err()
                || send_reply_list(write_half, &replies).await.is_err()
            {
                return false;
            }
            true
        }
        ClientFrame::Command(cmd) => {
            let Some(user) = user.clone() else {
                warn!("Feed client {} sent a command before hello", client_id);
                let _ = send_status(
                    write_half,
                    &StatusFrame::error("you must identify first"),
                )
                .await;
                return false;
            };
            if event_tx
                .send(DaemonEvent::ClientCommand { user, cmd })
                .await
                .is_err()
            {
                warn!("DaemonEvent channel closed");
                return false;
            }
            true
        }
    }
}

/// Name which part of a malformed envelope is missing or wrong.
fn describe_bad_frame(value: &Value) -> String {
    let Some(obj) = value.as_object() else {
        return "invalid JSON sent to server".to_string();
    };
    let Some(action) = obj.get("action").and_then(|a| a.as_str()) else {
        return "action property not sent in JSON".to_string();
    };
    if matches!(action, "add_comment" | "add_reply") && !obj.contains_key("text") {
        return "\"text\" property not sent in JSON".to_string();
    }
    if !obj.contains_key("id") {
        return "\"id\" property not sent in JSON".to_string();
    }
    format!("unknown action \"{action}\"")
}

async fn send_comment_list(
    write_half: &mut OwnedWriteHalf,
    list: &[Comment],
) -> anyhow::Result<()> {
    let encoded = encode_frame(&list)?;
    write_half.write_all(&encoded).await?;
    Ok(())
}

async fn send_reply_list(write_half: &mut OwnedWriteHalf, list: &[Reply]) -> anyhow::Result<()> {
    let encoded = encode_frame(&list)?;
    write_half.write_all(&encoded).await?;
    Ok(())
}

async fn send_status(write_half: &mut OwnedWriteHalf, status: &StatusFrame) -> anyhow::Result<()> {
    let encoded = encode_frame(status)?;
    write_half.write_all(&encoded).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_client_registry_counts() {
        let clients = Arc::new(RwLock::new(Vec::<ClientHandle>::new()));
        assert_eq!(register_client(&clients, 1).await, 1);
        assert_eq!(register_client(&clients, 2).await, 2);
        assert_eq!(unregister_client(&clients, 1).await, 1);
        // Unknown ids are a no-op.
        assert_eq!(unregister_client(&clients, 9).await, 1);
    }

    #[test]
    fn test_describe_bad_frame() {
        assert_eq!(
            describe_bad_frame(&json!("not an object")),
            "invalid JSON sent to server"
        );
        assert_eq!(
            describe_bad_frame(&json!({"text": "hi"})),
            "action property not sent in JSON"
        );
        assert_eq!(
            describe_bad_frame(&json!({"action": "add_comment", "id": 5})),
            "\"text\" property not sent in JSON"
        );
        assert_eq!(
            describe_bad_frame(&json!({"action": "archive", "id": 5})),
            "unknown action \"archive\""
        );
    }
}
