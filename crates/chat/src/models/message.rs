//! Message model for thread conversations

use super::ThreadId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a message, scoped to its thread
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Kind of attachment carried by a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Image,
    File,
}

/// An attachment on a chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatAttachment {
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    pub url: String,
    pub name: Option<String>,
    pub size: Option<u64>,
    pub content_type: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ChatAttachment {
    /// Create an attachment with just a kind and URL
    pub fn new(kind: AttachmentKind, url: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            name: None,
            size: None,
            content_type: None,
            width: None,
            height: None,
        }
    }
}

/// A single message within a thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub thread_id: ThreadId,
    pub sender_id: i64,
    pub sender_display_name: String,
    pub body: String,
    pub attachments: Vec<ChatAttachment>,
    /// Free-form metadata attached by the sender or server
    pub metadata: serde_json::Map<String, serde_json::Value>,
    /// Client-generated id used by the server to deduplicate retried sends
    pub client_message_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub is_deleted: bool,
}

impl ChatMessage {
    /// Create a new message builder
    pub fn builder(id: MessageId, thread_id: ThreadId) -> MessageBuilder {
        MessageBuilder::new(id, thread_id)
    }

    /// Body text for display; deleted messages are tombstoned
    pub fn display_body(&self) -> &str {
        if self.is_deleted { "" } else { &self.body }
    }

    /// Attachments for display; deleted messages show none
    pub fn display_attachments(&self) -> &[ChatAttachment] {
        if self.is_deleted {
            &[]
        } else {
            &self.attachments
        }
    }
}

/// Builder for creating ChatMessage instances
pub struct MessageBuilder {
    id: MessageId,
    thread_id: ThreadId,
    sender_id: i64,
    sender_display_name: String,
    body: String,
    attachments: Vec<ChatAttachment>,
    metadata: serde_json::Map<String, serde_json::Value>,
    client_message_id: Option<String>,
    created_at: Option<DateTime<Utc>>,
    edited_at: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
    is_deleted: bool,
}

impl MessageBuilder {
    fn new(id: MessageId, thread_id: ThreadId) -> Self {
        Self {
            id,
            thread_id,
            sender_id: 0,
            sender_display_name: String::new(),
            body: String::new(),
            attachments: Vec::new(),
            metadata: serde_json::Map::new(),
            client_message_id: None,
            created_at: None,
            edited_at: None,
            deleted_at: None,
            is_deleted: false,
        }
    }

    pub fn sender(mut self, sender_id: i64, display_name: impl Into<String>) -> Self {
        self.sender_id = sender_id;
        self.sender_display_name = display_name.into();
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn attachments(mut self, attachments: Vec<ChatAttachment>) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn metadata(mut self, metadata: serde_json::Map<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn client_message_id(mut self, id: impl Into<String>) -> Self {
        self.client_message_id = Some(id.into());
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn deleted(mut self, deleted_at: DateTime<Utc>) -> Self {
        self.deleted_at = Some(deleted_at);
        self.is_deleted = true;
        self
    }

    pub fn build(self) -> ChatMessage {
        ChatMessage {
            id: self.id,
            thread_id: self.thread_id,
            sender_id: self.sender_id,
            sender_display_name: self.sender_display_name,
            body: self.body,
            attachments: self.attachments,
            metadata: self.metadata,
            client_message_id: self.client_message_id,
            created_at: self.created_at.unwrap_or_else(Utc::now),
            edited_at: self.edited_at,
            deleted_at: self.deleted_at,
            is_deleted: self.is_deleted,
        }
    }
}

/// One page of messages from backward pagination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePage {
    /// Messages in chronological order (oldest first)
    pub messages: Vec<ChatMessage>,
    /// Whether older messages exist beyond this page
    pub has_more: bool,
}

impl MessagePage {
    pub fn empty() -> Self {
        Self {
            messages: Vec::new(),
            has_more: false,
        }
    }
}
