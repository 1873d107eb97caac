//! Chat repository trait and request types

use serde::Deserialize;

use super::ChatError;
use crate::models::{
    ChatAttachment, ChatMessage, ChatThread, MessageId, MessagePage, ParticipantRole, ThreadId,
};

/// Filters for listing threads
#[derive(Debug, Clone, Default)]
pub struct ThreadQuery {
    pub archived: Option<bool>,
    pub unread: Option<bool>,
    pub my_ads: Option<bool>,
    pub role: Option<ParticipantRole>,
}

impl ThreadQuery {
    /// Serialize to query-string pairs; booleans go over the wire as 1/0
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(archived) = self.archived {
            pairs.push(("archived", flag(archived)));
        }
        if let Some(unread) = self.unread {
            pairs.push(("unread", flag(unread)));
        }
        if let Some(my_ads) = self.my_ads {
            pairs.push(("my_ads", flag(my_ads)));
        }
        if let Some(role) = self.role {
            pairs.push(("role", role.as_str().to_string()));
        }
        pairs
    }
}

fn flag(value: bool) -> String {
    if value { "1" } else { "0" }.to_string()
}

/// Cursor parameters for backward message pagination
///
/// `before` and `after` carry the created-at timestamp of the boundary
/// message, as returned by the server.
#[derive(Debug, Clone, Default)]
pub struct MessageQuery {
    pub before: Option<String>,
    pub after: Option<String>,
    pub limit: Option<usize>,
}

impl MessageQuery {
    /// Initial page fetch of the given size
    pub fn latest(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Page of messages strictly older than the given cursor
    pub fn older_than(cursor: impl Into<String>, limit: usize) -> Self {
        Self {
            before: Some(cursor.into()),
            limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(before) = &self.before {
            pairs.push(("before", before.clone()));
        }
        if let Some(after) = &self.after {
            pairs.push(("after", after.clone()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

/// Input for sending a message to an existing thread
#[derive(Debug, Clone, Default)]
pub struct SendMessageInput {
    pub body: Option<String>,
    pub attachments: Vec<ChatAttachment>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    /// Locally-unique id; the server treats a repeat for the same thread as
    /// the same logical message, which makes retrying a send safe
    pub client_message_id: Option<String>,
}

impl SendMessageInput {
    /// Plain text message with a dedup id
    pub fn text(body: impl Into<String>, client_message_id: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            client_message_id: Some(client_message_id.into()),
            ..Self::default()
        }
    }

    /// A send must carry a non-empty body or at least one attachment
    pub fn validate(&self) -> Result<(), ChatError> {
        let has_body = self
            .body
            .as_deref()
            .is_some_and(|b| !b.trim().is_empty());
        if !has_body && self.attachments.is_empty() {
            return Err(ChatError::Validation(
                "message needs a body or an attachment".to_string(),
            ));
        }
        Ok(())
    }
}

/// Input for starting a new thread about a listing
#[derive(Debug, Clone)]
pub struct CreateThreadInput {
    pub listing_id: i64,
    pub message: Option<String>,
    pub attachments: Vec<ChatAttachment>,
    pub client_message_id: Option<String>,
}

impl CreateThreadInput {
    pub fn new(listing_id: i64) -> Self {
        Self {
            listing_id,
            message: None,
            attachments: Vec::new(),
            client_message_id: None,
        }
    }
}

/// Result of a server-side availability recheck
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct AvailabilitySyncReport {
    /// Listings inspected by the server
    #[serde(default)]
    pub synced: usize,
    /// Snapshots whose availability actually changed
    #[serde(default)]
    pub updated: usize,
}

/// Repository for chat I/O
///
/// The sole component permitted to talk to the chat backend. Implementations
/// own no client state; callers decide retry policy. `list_messages` is an
/// idempotent GET and safe to retry; `send_message` and `create_thread` are
/// only retry-safe when the caller reuses the same `client_message_id`.
pub trait ChatApi: Send + Sync {
    /// List the viewer's threads, most recently active first
    fn list_threads(&self, query: &ThreadQuery) -> Result<Vec<ChatThread>, ChatError>;

    /// Fetch a single thread
    fn get_thread(&self, thread_id: &ThreadId) -> Result<ChatThread, ChatError>;

    /// Fetch one page of messages for a thread
    fn list_messages(
        &self,
        thread_id: &ThreadId,
        query: &MessageQuery,
    ) -> Result<MessagePage, ChatError>;

    /// Send a message to an existing thread
    fn send_message(
        &self,
        thread_id: &ThreadId,
        input: &SendMessageInput,
    ) -> Result<ChatMessage, ChatError>;

    /// Start a new thread about a listing, optionally with a first message
    fn create_thread(&self, input: &CreateThreadInput) -> Result<ChatThread, ChatError>;

    /// Mark the thread read up to the given message (or its latest)
    ///
    /// Returns the refreshed thread. Callers treat this as best-effort:
    /// failures are logged, never surfaced as blocking errors.
    fn mark_read(
        &self,
        thread_id: &ThreadId,
        up_to: Option<&MessageId>,
    ) -> Result<ChatThread, ChatError>;

    /// Archive a thread (threads are never deleted client-side)
    fn archive_thread(&self, thread_id: &ThreadId) -> Result<ChatThread, ChatError>;

    /// Bring an archived thread back
    fn unarchive_thread(&self, thread_id: &ThreadId) -> Result<ChatThread, ChatError>;

    /// Trigger a server-side recheck of listing availability across the
    /// viewer's threads
    fn sync_availability(&self) -> Result<AvailabilitySyncReport, ChatError>;
}

/// Generate a locally-unique client message id
///
/// Combines the current timestamp with a per-process random component so two
/// messages composed in the same millisecond still get distinct ids. The id
/// is generated once per logical send and reused across retries.
pub fn client_message_id() -> String {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};
    use std::sync::atomic::{AtomicU64, Ordering};

    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let hasher = RandomState::new().build_hasher();
    let nonce = hasher.finish();
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let millis = chrono::Utc::now().timestamp_millis();
    format!("c-{:x}-{:x}-{:x}", millis, nonce & 0xffff_ffff, seq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AttachmentKind;

    #[test]
    fn test_thread_query_pairs() {
        let query = ThreadQuery {
            archived: Some(false),
            unread: Some(true),
            my_ads: None,
            role: Some(ParticipantRole::Seller),
        };
        let pairs = query.to_query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("archived", "0".to_string()),
                ("unread", "1".to_string()),
                ("role", "seller".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_thread_query_has_no_pairs() {
        assert!(ThreadQuery::default().to_query_pairs().is_empty());
    }

    #[test]
    fn test_message_query_cursors() {
        let query = MessageQuery::older_than("2026-01-01T00:00:00Z", 30);
        let pairs = query.to_query_pairs();
        assert_eq!(pairs[0], ("before", "2026-01-01T00:00:00Z".to_string()));
        assert_eq!(pairs[1], ("limit", "30".to_string()));
    }

    #[test]
    fn test_send_validation_rejects_empty() {
        let input = SendMessageInput::default();
        assert!(matches!(
            input.validate(),
            Err(ChatError::Validation(_))
        ));

        let whitespace = SendMessageInput {
            body: Some("   ".to_string()),
            ..SendMessageInput::default()
        };
        assert!(whitespace.validate().is_err());
    }

    #[test]
    fn test_send_validation_accepts_attachment_only() {
        let input = SendMessageInput {
            attachments: vec![ChatAttachment::new(
                AttachmentKind::Image,
                "https://example.com/p.jpg",
            )],
            ..SendMessageInput::default()
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_client_message_ids_are_unique() {
        let a = client_message_id();
        let b = client_message_id();
        assert_ne!(a, b);
        assert!(a.starts_with("c-"));
    }
}
