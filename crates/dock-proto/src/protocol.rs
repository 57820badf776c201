use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{Comment, Reply};

/// Target of a command.  Clients send station ids as numbers but reply
/// targets sometimes as strings, so the wire accepts both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetId {
    Num(i64),
    Str(String),
}

impl TargetId {
    /// Numeric view of the id, parsing string forms.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            TargetId::Num(n) => Some(*n),
            TargetId::Str(s) => s.trim().parse().ok(),
        }
    }
}

impl From<i64> for TargetId {
    fn from(n: i64) -> Self {
        TargetId::Num(n)
    }
}

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetId::Num(n) => write!(f, "{n}"),
            TargetId::Str(s) => write!(f, "{s}"),
        }
    }
}

/// The command envelope a client sends to request a mutation.
///
/// Wire shape: `{"action": "add_comment", "text": "...", "id": 42}`.
/// `id` is the station for `add_comment`, the parent comment for `add_reply`,
/// and the doomed item for `delete`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Command {
    AddComment { text: String, id: TargetId },
    AddReply { text: String, id: TargetId },
    Delete { id: TargetId },
}

/// Everything a client may write to the feed socket.
///
/// `Hello` identifies the connection and must be the first frame.  Untagged
/// works because `Command`
/// always carries an `action` field and `Hello` never does.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClientFrame {
    Command(Command),
    Hello { user: String },
}

/// A singleton status/error object from the daemon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusFrame {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusFrame {
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            error: Some(text.into()),
            message: None,
        }
    }

    pub fn message(text: impl Into<String>) -> Self {
        Self {
            error: None,
            message: Some(text.into()),
        }
    }
}

/// A classified inbound frame.
#[derive(Debug, Clone)]
pub enum Inbound {
    Comments(Vec<Comment>),
    Replies(Vec<Reply>),
    Status(StatusFrame),
}

impl Inbound {
    /// Classify a decoded frame by shape.
    ///
    /// The daemon broadcasts bare JSON arrays, so there is no envelope tag to
    /// dispatch on: an array whose first element carries `commentor` is a
    /// comment-list update, `replier` a reply-list update, and everything
    /// else (including empty arrays) falls through to the status branch.
    pub fn classify(value: &Value) -> Inbound {
        if let Some(items) = value.as_array() {
            if let Some(first) = items.first() {
                if first.get("commentor").is_some() {
                    let comments = items
                        .iter()
                        .filter_map(|v| serde_json::from_value(v.clone()).ok())
                        .collect();
                    return Inbound::Comments(comments);
                }
                if first.get("replier").is_some() {
                    let replies = items
                        .iter()
                        .filter_map(|v| serde_json::from_value(v.clone()).ok())
                        .collect();
                    return Inbound::Replies(replies);
                }
            }
        }
        let status = serde_json::from_value(value.clone()).unwrap_or_default();
        Inbound::Status(status)
    }
}

/// Encode a frame for the socket: 4-byte big-endian length header + JSON body.
pub fn encode_frame<T: Serialize>(frame: &T) -> anyhow::Result<Vec<u8>> {
    let json = serde_json::to_vec(frame)?;
    let len = json.len() as u32;
    let mut result = Vec::with_capacity(4 + json.len());
    result.extend_from_slice(&len.to_be_bytes());
    result.extend_from_slice(&json);
    Ok(result)
}

/// Decode one frame from the front of `data`.  Returns the JSON value and the
/// number of bytes consumed, or an error when the buffer does not yet hold a
/// complete frame.
pub fn decode_frame(data: &[u8]) -> anyhow::Result<(Value, usize)> {
    if data.len() < 4 {
        anyhow::bail!("Insufficient data for length header");
    }
    let len = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if data.len() < 4 + len {
        anyhow::bail!("Insufficient data for frame");
    }
    let value: Value = serde_json::from_slice(&data[4..4 + len])?;
    Ok((value, 4 + len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_command_wire_shape() {
        let cmd = Command::AddComment {
            text: "needs more bikes".into(),
            id: TargetId::Num(42),
        };
        let value = serde_json::to_value(&cmd).unwrap();
        assert_eq!(
            value,
            json!({"action": "add_comment", "text": "needs more bikes", "id": 42})
        );

        let parsed: Command =
            serde_json::from_value(json!({"action": "delete", "id": "17"})).unwrap();
        match parsed {
            Command::Delete { id } => assert_eq!(id.as_i64(), Some(17)),
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn test_client_frame_hello_vs_command() {
        let hello: ClientFrame = serde_json::from_value(json!({"user": "alice"})).unwrap();
        assert!(matches!(hello, ClientFrame::Hello { user } if user == "alice"));

        let cmd: ClientFrame =
            serde_json::from_value(json!({"action": "add_reply", "text": "hi", "id": 3})).unwrap();
        assert!(matches!(cmd, ClientFrame::Command(Command::AddReply { .. })));
    }

    #[test]
    fn test_frame_encode_decode() {
        let cmd = Command::AddReply {
            text: "agreed".into(),
            id: TargetId::Str("7".into()),
        };
        let encoded = encode_frame(&cmd).unwrap();
        let (value, consumed) = decode_frame(&encoded).unwrap();
        assert_eq!(consumed, encoded.len());
        assert_eq!(value["action"], "add_reply");
        assert_eq!(value["id"], "7");
    }

    #[test]
    fn test_decode_partial_buffer() {
        let encoded = encode_frame(&StatusFrame::message("ok")).unwrap();
        assert!(decode_frame(&encoded[..2]).is_err());
        assert!(decode_frame(&encoded[..encoded.len() - 1]).is_err());
    }

    #[test]
    fn test_classify_comment_list() {
        let frame = json!([
            {"id": 1, "content": "hi", "commentor": "alice", "commented_to_id": 42}
        ]);
        match Inbound::classify(&frame) {
            Inbound::Comments(list) => {
                assert_eq!(list.len(), 1);
                assert_eq!(list[0].id, 1);
                assert_eq!(list[0].commentor, "alice");
            }
            other => panic!("wrong classification: {other:?}"),
        }
    }

    #[test]
    fn test_classify_reply_list() {
        let frame = json!([
            {"id": 9, "content": "me too", "replier": "bob", "replied_to_id": 1}
        ]);
        match Inbound::classify(&frame) {
            Inbound::Replies(list) => {
                assert_eq!(list[0].replied_to_id, 1);
                assert_eq!(list[0].replier, "bob");
            }
            other => panic!("wrong classification: {other:?}"),
        }
    }

    #[test]
    fn test_classify_status_and_empty_array() {
        match Inbound::classify(&json!({"error": "nope"})) {
            Inbound::Status(s) => assert_eq!(s.error.as_deref(), Some("nope")),
            other => panic!("wrong classification: {other:?}"),
        }
        // An empty array has no first element to sniff — status branch,
        // which in turn has nothing to display.
        match Inbound::classify(&json!([])) {
            Inbound::Status(s) => {
                assert!(s.error.is_none());
                assert!(s.message.is_none());
            }
            other => panic!("wrong classification: {other:?}"),
        }
    }
}
