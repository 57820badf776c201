//! FeedCore — single-owner event loop for all feed mutations.
//!
//! Socket clients never touch the store directly; they send `DaemonEvent`
//! messages here.  After each mutation the core broadcasts which list
//! changed; per-client socket tasks re-read the store and push the full list
//! to their peer.

use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};

use dock_proto::protocol::Command;

use crate::store::{DeleteOutcome, FeedStore};
use crate::BroadcastMessage;

/// All inputs into the FeedCore loop.
#[derive(Debug)]
pub enum DaemonEvent {
    /// A command from a feed client, attributed to its hello identity.
    ClientCommand { user: String, cmd: Command },
    /// Shutdown requested.
    #[allow(dead_code)]
    Shutdown,
}

pub struct FeedCore {
    store: FeedStore,
    broadcast_tx: broadcast::Sender<BroadcastMessage>,
}

impl FeedCore {
    pub fn new(store: FeedStore, broadcast_tx: broadcast::Sender<BroadcastMessage>) -> Self {
        Self {
            store,
            broadcast_tx,
        }
    }

    /// Run the core event loop.  Returns when a `Shutdown` event is received
    /// or the event channel is closed.
    pub async fn run(self, mut event_rx: mpsc::Receiver<DaemonEvent>) -> anyhow::Result<()> {
        info!("FeedCore: starting event loop");

        loop {
            match event_rx.recv().await {
                None => {
                    info!("FeedCore: event channel closed, shutting down");
                    break;
                }
                Some(DaemonEvent::Shutdown) => {
                    info!("FeedCore: shutdown requested");
                    break;
                }
                Some(DaemonEvent::ClientCommand { user, cmd }) => {
                    info!("FeedCore: {} sent {:?}", user, cmd);
                    if let Err(e) = self.handle_command(&user, cmd).await {
                        error!("FeedCore: command error: {}", e);
                    }
                }
            }
        }

        Ok(())
    }

    async fn handle_command(&self, user: &str, cmd: Command) -> anyhow::Result<()> {
        match cmd {
            Command::AddComment { text, id } => {
                let Some(station_id) = id.as_i64() else {
                    warn!("FeedCore: add_comment with non-numeric id {:?}", id);
                    return Ok(());
                };
                self.store.add_comment(station_id, user, &text).await;
                let _ = self.broadcast_tx.send(BroadcastMessage::CommentsChanged);
            }
            Command::AddReply { text, id } => {
                let Some(comment_id) = id.as_i64() else {
                    warn!("FeedCore: add_reply with non-numeric id {:?}", id);
                    return Ok(());
                };
                match self.store.add_reply(comment_id, user, &text).await {
                    Some(_) => {
                        let _ = self.broadcast_tx.send(BroadcastMessage::RepliesChanged);
                    }
                    None => warn!("FeedCore: add_reply to missing comment {}", comment_id),
                }
            }
            Command::Delete { id } => {
                let Some(item_id) = id.as_i64() else {
                    warn!("FeedCore: delete with non-numeric id {:?}", id);
                    return Ok(());
                };
                // No ownership check: any identified client may delete any
                // item.  Clients only hide the control.
                match self.store.delete(item_id).await {
                    DeleteOutcome::Comment => {
                        let _ = self.broadcast_tx.send(BroadcastMessage::CommentsChanged);
                        let _ = self.broadcast_tx.send(BroadcastMessage::RepliesChanged);
                    }
                    DeleteOutcome::Reply => {
                        let _ = self.broadcast_tx.send(BroadcastMessage::RepliesChanged);
                    }
                    DeleteOutcome::NotFound => {
                        warn!("FeedCore: delete of unknown id {}", item_id);
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dock_proto::protocol::TargetId;

    fn test_store() -> FeedStore {
        use std::sync::atomic::{AtomicU64, Ordering};
        static SEQ: AtomicU64 = AtomicU64::new(0);
        let state_file = std::env::temp_dir().join(format!(
            "velodock-test-core-{}-{}.json",
            std::process::id(),
            SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        let _ = std::fs::remove_file(&state_file);
        FeedStore::new(state_file)
    }

    #[tokio::test]
    async fn test_add_comment_broadcasts_comments_changed() {
        let store = test_store();
        let (tx, mut rx) = broadcast::channel(8);
        let core = FeedCore::new(store.clone(), tx);

        core.handle_command(
            "alice",
            Command::AddComment {
                text: "hi".into(),
                id: TargetId::Num(42),
            },
        )
        .await
        .unwrap();

        assert!(matches!(
            rx.try_recv().unwrap(),
            BroadcastMessage::CommentsChanged
        ));
        assert_eq!(store.comment_list().await.len(), 1);
    }

    #[tokio::test]
    async fn test_reply_to_missing_parent_is_silent() {
        let store = test_store();
        let (tx, mut rx) = broadcast::channel(8);
        let core = FeedCore::new(store, tx);

        core.handle_command(
            "bob",
            Command::AddReply {
                text: "orphan".into(),
                id: TargetId::Str("999".into()),
            },
        )
        .await
        .unwrap();

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_delete_comment_refreshes_both_lists() {
        let store = test_store();
        let comment_id = store.add_comment(1, "alice", "x").await;
        let (tx, mut rx) = broadcast::channel(8);
        let core = FeedCore::new(store, tx);

        core.handle_command(
            "bob", // not the author — deletion is still honored
            Command::Delete {
                id: TargetId::Num(comment_id),
            },
        )
        .await
        .unwrap();

        assert!(matches!(
            rx.try_recv().unwrap(),
            BroadcastMessage::CommentsChanged
        ));
        assert!(matches!(
            rx.try_recv().unwrap(),
            BroadcastMessage::RepliesChanged
        ));
    }
}
