//! Chat backend API integration
//!
//! This module provides:
//! - Wire DTO types mirroring the REST payloads (snake_case)
//! - Normalization from wire DTOs to domain models
//! - The `ChatApi` repository trait and its HTTP / in-memory implementations

mod error;
mod http;
mod memory;
mod normalize;
mod traits;

pub use error::ChatError;
pub use http::HttpChatApi;
pub use memory::InMemoryChatApi;
pub use normalize::{
    normalize_attachment, normalize_listing_snapshot, normalize_message, normalize_page,
    normalize_participant, normalize_thread,
};
pub use traits::{
    AvailabilitySyncReport, ChatApi, CreateThreadInput, MessageQuery, SendMessageInput,
    ThreadQuery, client_message_id,
};

/// Chat API wire types
pub mod wire {
    use crate::models::{AttachmentKind, ListingAvailability, ParticipantRole, ThreadStatus};
    use serde::{Deserialize, Serialize};

    /// Listing snapshot as embedded in a thread payload
    #[derive(Debug, Clone, Deserialize)]
    pub struct ListingSnapshotDto {
        pub listing_id: i64,
        #[serde(default)]
        pub title: String,
        #[serde(default)]
        pub price_amount: Option<PriceAmountDto>,
        #[serde(default)]
        pub price_currency: String,
        #[serde(default)]
        pub thumbnail_url: Option<String>,
        #[serde(default)]
        pub availability: Option<ListingAvailability>,
        #[serde(default)]
        pub availability_checked_at: Option<String>,
    }

    /// The wire sends prices as a string, a number, or null
    #[derive(Debug, Clone, Deserialize)]
    #[serde(untagged)]
    pub enum PriceAmountDto {
        Text(String),
        Number(f64),
    }

    /// The other participant as embedded in a thread payload
    #[derive(Debug, Clone, Deserialize)]
    pub struct ParticipantSummaryDto {
        pub user_id: i64,
        pub role: ParticipantRole,
        #[serde(default)]
        pub display_name: String,
        #[serde(default)]
        pub avatar_url: Option<String>,
    }

    /// Full thread payload
    #[derive(Debug, Clone, Deserialize)]
    pub struct ThreadDto {
        pub id: String,
        pub buyer_id: i64,
        pub seller_id: i64,
        pub status: ThreadStatus,
        pub listing: ListingSnapshotDto,
        #[serde(default)]
        pub other_participant: Option<ParticipantSummaryDto>,
        #[serde(default)]
        pub last_message_at: Option<String>,
        #[serde(default)]
        pub last_message_preview: String,
        #[serde(default)]
        pub unread_count: u32,
        #[serde(default)]
        pub is_archived: bool,
        #[serde(default)]
        pub last_read_message_id: Option<String>,
        #[serde(default)]
        pub last_read_at: Option<String>,
        pub created_at: String,
        pub updated_at: String,
    }

    /// Attachment payload (used inbound and outbound)
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct AttachmentDto {
        #[serde(rename = "type")]
        pub kind: AttachmentKind,
        pub url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub size: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub content_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub width: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub height: Option<u32>,
    }

    /// Full message payload
    #[derive(Debug, Clone, Deserialize)]
    pub struct MessageDto {
        pub id: String,
        pub thread_id: String,
        pub sender_id: i64,
        #[serde(default)]
        pub sender_display_name: String,
        #[serde(default)]
        pub body: String,
        #[serde(default)]
        pub attachments: Option<Vec<AttachmentDto>>,
        #[serde(default)]
        pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
        #[serde(default)]
        pub client_message_id: Option<String>,
        pub created_at: String,
        #[serde(default)]
        pub edited_at: Option<String>,
        #[serde(default)]
        pub deleted_at: Option<String>,
        #[serde(default)]
        pub is_deleted: bool,
    }

    /// One page of messages
    #[derive(Debug, Clone, Deserialize)]
    pub struct MessagePageDto {
        #[serde(default)]
        pub messages: Vec<MessageDto>,
        #[serde(default)]
        pub has_more: bool,
    }

    /// Body for POST /threads/{id}/messages
    #[derive(Debug, Clone, Serialize)]
    pub struct SendMessagePayload {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub body: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub attachments: Option<Vec<AttachmentDto>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub client_message_id: Option<String>,
    }

    /// Body for POST /threads
    #[derive(Debug, Clone, Serialize)]
    pub struct CreateThreadPayload {
        pub listing_id: i64,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub message: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub attachments: Option<Vec<AttachmentDto>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub client_message_id: Option<String>,
    }

    /// Body for POST /threads/{id}/read
    #[derive(Debug, Clone, Serialize)]
    pub struct MarkReadPayload {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub message_id: Option<String>,
    }
}
