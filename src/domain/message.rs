//! Wire types exchanged with the message backend

use serde::{Deserialize, Serialize};
use strum::Display;

use super::sequence_index::SequenceIndex;

/// A chat message as delivered by the backend
///
/// The pagination core only reads `message_id` and `message_index`; the other
/// fields are carried through to the message store untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChatMessage {
    pub message_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_index: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ChatMessage {
    pub fn new(message_id: impl Into<String>, message_index: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            message_index: Some(message_index.into()),
            ..Self::default()
        }
    }

    /// A message that has not been assigned a position yet
    pub fn unindexed(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            ..Self::default()
        }
    }

    pub fn with_content(self, content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..self
        }
    }

    /// The message position, if it is a valid index other than the `"0"` sentinel
    pub fn sequence_index(&self) -> Option<SequenceIndex> {
        self.message_index
            .as_deref()
            .and_then(SequenceIndex::parse_assigned)
    }
}

/// Which way a page is fetched relative to the cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LoadDirection {
    /// Older history
    Prev,
    /// Newer messages
    Next,
}

/// A page request sent to the message source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadRequest {
    pub cursor: String,
    pub direction: LoadDirection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

impl LoadRequest {
    pub fn new(cursor: impl Into<String>, direction: LoadDirection) -> Self {
        Self {
            cursor: cursor.into(),
            direction,
            count: None,
        }
    }

    pub fn count(self, count: u32) -> Self {
        Self {
            count: Some(count),
            ..self
        }
    }
}

/// A page returned by the message source
///
/// Backends fill only the `hasmore` flag of the direction that was requested,
/// so the other flag must not be trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadResponse {
    #[serde(default)]
    pub message_list: Vec<ChatMessage>,
    #[serde(default = "default_cursor")]
    pub cursor: String,
    #[serde(default = "default_cursor")]
    pub next_cursor: String,
    #[serde(default)]
    pub hasmore: bool,
    #[serde(default)]
    pub next_has_more: bool,
    #[serde(default = "default_cursor")]
    pub read_message_index: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_message_index: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

fn default_cursor() -> String {
    String::from("0")
}

impl Default for LoadResponse {
    fn default() -> Self {
        Self {
            message_list: Vec::new(),
            cursor: default_cursor(),
            next_cursor: default_cursor(),
            hasmore: false,
            next_has_more: false,
            read_message_index: default_cursor(),
            end_message_index: None,
            conversation_id: None,
        }
    }
}

/// Request for the read-position endpoint
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReadIndexRequest {
    pub conversation_id: Option<String>,
}

/// Response of the read-position endpoint
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReadIndexResponse {
    pub read_message_index: String,
    pub end_message_index: String,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_sequence_index_ignores_sentinel_and_garbage() {
        assert_eq!(
            ChatMessage::new("a", "42").sequence_index(),
            SequenceIndex::parse("42")
        );
        assert_eq!(ChatMessage::new("b", "0").sequence_index(), None);
        assert_eq!(ChatMessage::new("c", "n/a").sequence_index(), None);
        assert_eq!(ChatMessage::unindexed("d").sequence_index(), None);
    }

    #[test]
    fn test_response_deserializes_backend_payload() {
        let json = r#"{
            "message_list": [
                {"message_id": "7355", "message_index": "9007199254740993", "role": "assistant"},
                {"message_id": "local-1"}
            ],
            "cursor": "9007199254740993",
            "next_cursor": "9007199254740993",
            "hasmore": true,
            "next_has_more": false,
            "read_message_index": "9007199254740990"
        }"#;

        let response: LoadResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.message_list.len(), 2);
        assert_eq!(response.message_list[1].message_index, None);
        assert!(response.hasmore);
        assert_eq!(response.end_message_index, None);
    }

    #[test]
    fn test_request_serializes_direction_lowercase() {
        let request = LoadRequest::new("0", LoadDirection::Next).count(20);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"cursor": "0", "direction": "next", "count": 20})
        );
    }
}
