use serde::{Deserialize, Serialize};

/// A comment as broadcast by the daemon.
///
/// `commentor` is the field the shape classifier sniffs on — it must stay
/// present and so named.  `name` duplicates the author for display and
/// `creation_time` is a pre-formatted timestamp; both default to empty so
/// older frames still decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub commentor: String,
    pub commented_to_id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub creation_time: String,
}

/// A reply to a comment.  `replier` is the classifier's sniff field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub id: i64,
    pub content: String,
    pub replier: String,
    pub replied_to_id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub creation_time: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment_decodes_without_optional_fields() {
        let c: Comment = serde_json::from_str(
            r#"{"id": 3, "content": "hi", "commentor": "alice", "commented_to_id": 42}"#,
        )
        .unwrap();
        assert_eq!(c.id, 3);
        assert!(c.name.is_empty());
        assert!(c.creation_time.is_empty());
    }
}
