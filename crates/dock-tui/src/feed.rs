//! FeedView — the rendered comment/reply lists for one station's page.
//!
//! This is where broadcasts are reconciled against what is already on
//! screen.  Reconciliation is append-only and keyed by id: a frame may be
//! echoed or repeated any number of times without producing duplicate
//! entries, and a reply whose parent has never been rendered is dropped on
//! the floor (no orphan bookkeeping, no retry).  Presence checks go through
//! id sets rather than scanning the rendered lists.

use std::collections::HashSet;

use dock_proto::model::{Comment, Reply};
use dock_proto::protocol::{Command, TargetId};
use dock_proto::sanitize::sanitize;

/// One rendered comment, with its nested reply list.
#[derive(Debug, Clone)]
pub struct CommentNode {
    pub id: i64,
    pub author: String,
    /// Sanitized — safe to render as markup.
    pub content: String,
    pub created: String,
    pub replies: Vec<ReplyNode>,
}

/// One rendered reply.
#[derive(Debug, Clone)]
pub struct ReplyNode {
    pub id: i64,
    pub author: String,
    /// Sanitized — safe to render as markup.
    pub content: String,
    pub created: String,
    /// Whether the delete control is shown.  Render gating only: the daemon
    /// does not enforce ownership.
    pub can_delete: bool,
}

pub struct FeedView {
    station_id: i64,
    local_user: String,
    comments: Vec<CommentNode>,
    comment_ids: HashSet<i64>,
    reply_ids: HashSet<i64>,
}

impl FeedView {
    pub fn new(station_id: i64, local_user: impl Into<String>) -> Self {
        Self {
            station_id,
            local_user: local_user.into(),
            comments: Vec::new(),
            comment_ids: HashSet::new(),
            reply_ids: HashSet::new(),
        }
    }

    pub fn station_id(&self) -> i64 {
        self.station_id
    }

    pub fn comments(&self) -> &[CommentNode] {
        &self.comments
    }

    pub fn has_comment(&self, id: i64) -> bool {
        self.comment_ids.contains(&id)
    }

    pub fn has_reply(&self, id: i64) -> bool {
        self.reply_ids.contains(&id)
    }

    /// Merge a comment broadcast into the view.  The server broadcasts
    /// globally, so comments targeting other stations are ignored; ids
    /// already rendered are skipped.  Returns how many nodes were appended.
    pub fn reconcile_comments(&mut self, list: &[Comment]) -> usize {
        let mut appended = 0;
        for comment in list {
            if comment.commented_to_id != self.station_id {
                continue;
            }
            if self.comment_ids.contains(&comment.id) {
                continue;
            }
            self.comment_ids.insert(comment.id);
            self.comments.push(CommentNode {
                id: comment.id,
                author: comment.commentor.clone(),
                content: sanitize(&comment.content),
                created: comment.creation_time.clone(),
                replies: Vec::new(),
            });
            appended += 1;
        }
        appended
    }

    /// Merge a reply broadcast.  A reply only ever lands under a comment
    /// node that already exists; when the parent is absent the reply is
    /// silently dropped.  Returns how many nodes were appended.
    pub fn reconcile_replies(&mut self, list: &[Reply]) -> usize {
        let mut appended = 0;
        for reply in list {
            let Some(parent) = self
                .comments
                .iter_mut()
                .find(|c| c.id == reply.replied_to_id)
            else {
                continue;
            };
            if self.reply_ids.contains(&reply.id) {
                continue;
            }
            self.reply_ids.insert(reply.id);
            parent.replies.push(ReplyNode {
                id: reply.id,
                author: reply.replier.clone(),
                content: sanitize(&reply.content),
                created: reply.creation_time.clone(),
                can_delete: reply.replier == self.local_user,
            });
            appended += 1;
        }
        appended
    }

    /// Build an add-comment envelope for this station.  `None` on empty or
    /// whitespace-only text — nothing goes over the wire.
    pub fn compose_comment(&self, text: &str) -> Option<Command> {
        if text.trim().is_empty() {
            return None;
        }
        Some(Command::AddComment {
            text: text.to_string(),
            id: TargetId::Num(self.station_id),
        })
    }

    /// Build an add-reply envelope for a parent comment.  Same emptiness
    /// guard as comments.
    pub fn compose_reply(&self, parent_id: i64, text: &str) -> Option<Command> {
        if text.trim().is_empty() {
            return None;
        }
        Some(Command::AddReply {
            text: text.to_string(),
            id: TargetId::Num(parent_id),
        })
    }

    /// Build a delete envelope.  Unconditional — no ownership check is
    /// enforced client-side; the daemon does not enforce one either.
    pub fn compose_delete(&self, id: i64) -> Command {
        Command::Delete {
            id: TargetId::Num(id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: i64, content: &str, commentor: &str, station: i64) -> Comment {
        Comment {
            id,
            content: content.into(),
            commentor: commentor.into(),
            commented_to_id: station,
            name: commentor.into(),
            creation_time: String::new(),
        }
    }

    fn reply(id: i64, content: &str, replier: &str, parent: i64) -> Reply {
        Reply {
            id,
            content: content.into(),
            replier: replier.into(),
            replied_to_id: parent,
            name: replier.into(),
            creation_time: String::new(),
        }
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut view = FeedView::new(42, "alice");
        let broadcast = vec![
            comment(1, "hi", "alice", 42),
            comment(2, "bikes gone", "bob", 42),
        ];
        assert_eq!(view.reconcile_comments(&broadcast), 2);
        assert_eq!(view.reconcile_comments(&broadcast), 0);
        assert_eq!(view.comments().len(), 2);
    }

    #[test]
    fn test_other_station_comments_ignored() {
        let mut view = FeedView::new(7, "alice");
        let broadcast = vec![comment(1, "hi", "alice", 42)];
        assert_eq!(view.reconcile_comments(&broadcast), 0);
        assert!(view.comments().is_empty());

        let mut view_42 = FeedView::new(42, "alice");
        assert_eq!(view_42.reconcile_comments(&broadcast), 1);
        assert!(view_42.has_comment(1));
    }

    #[test]
    fn test_orphan_replies_dropped() {
        let mut view = FeedView::new(42, "alice");
        // No comment node exists yet; the reply must vanish without error
        // and without creating any container.
        assert_eq!(view.reconcile_replies(&[reply(9, "me too", "bob", 1)]), 0);
        assert!(!view.has_reply(9));

        // Once the parent arrives, a re-broadcast of the reply lands.
        view.reconcile_comments(&[comment(1, "hi", "alice", 42)]);
        assert_eq!(view.reconcile_replies(&[reply(9, "me too", "bob", 1)]), 1);
        assert_eq!(view.comments()[0].replies.len(), 1);

        // And repeated broadcasts stay deduplicated.
        assert_eq!(view.reconcile_replies(&[reply(9, "me too", "bob", 1)]), 0);
        assert_eq!(view.comments()[0].replies.len(), 1);
    }

    #[test]
    fn test_rendered_content_is_sanitized() {
        let mut view = FeedView::new(42, "alice");
        view.reconcile_comments(&[comment(1, "<script>&\"</script>", "mallory", 42)]);
        assert_eq!(
            view.comments()[0].content,
            "&lt;script&gt;&amp;&quot;&lt;/script&gt;"
        );
        assert!(!view.comments()[0].content.contains("&amp;amp;"));
    }

    #[test]
    fn test_empty_text_composes_nothing() {
        let view = FeedView::new(42, "alice");
        assert!(view.compose_comment("").is_none());
        assert!(view.compose_comment("   \t  ").is_none());
        assert!(view.compose_reply(1, "\n").is_none());
        assert!(view.compose_comment("dock is empty").is_some());
    }

    #[test]
    fn test_delete_is_unconditional() {
        let mut view = FeedView::new(42, "alice");
        view.reconcile_comments(&[comment(1, "hi", "bob", 42)]);
        view.reconcile_replies(&[reply(2, "mine", "alice", 1), reply(3, "not mine", "bob", 1)]);

        let replies = &view.comments()[0].replies;
        assert!(replies[0].can_delete);
        assert!(!replies[1].can_delete);

        // The control is hidden for bob's reply, but composing a delete for
        // it still works — the gate is render-only.
        assert!(matches!(
            view.compose_delete(3),
            Command::Delete { id: TargetId::Num(3) }
        ));
    }
}
