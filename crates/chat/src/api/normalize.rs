//! Wire DTO normalization
//!
//! Converts snake_case REST payloads to domain models and builds outbound
//! payloads. Every function here is pure and total: the same DTO always
//! yields the same model, with no I/O.

use chrono::{DateTime, Utc};

use super::traits::{CreateThreadInput, SendMessageInput};
use super::wire::{
    AttachmentDto, CreateThreadPayload, ListingSnapshotDto, MessageDto, MessagePageDto,
    ParticipantSummaryDto, PriceAmountDto, SendMessagePayload, ThreadDto,
};
use crate::models::{
    ChatAttachment, ChatMessage, ChatThread, ListingAvailability, ListingSnapshot, MessageId,
    MessagePage, ParticipantSummary, ThreadId,
};

/// Parse a required RFC 3339 timestamp, falling back to now on bad input
fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Parse an optional RFC 3339 timestamp; absent or malformed becomes None
fn parse_timestamp_opt(value: Option<&String>) -> Option<DateTime<Utc>> {
    value.and_then(|v| {
        DateTime::parse_from_rfc3339(v)
            .map(|d| d.with_timezone(&Utc))
            .ok()
    })
}

fn normalize_price(price: Option<&PriceAmountDto>) -> Option<String> {
    match price {
        None => None,
        Some(PriceAmountDto::Text(s)) => Some(s.clone()),
        Some(PriceAmountDto::Number(n)) => {
            if n.fract() == 0.0 {
                Some(format!("{}", *n as i64))
            } else {
                Some(n.to_string())
            }
        }
    }
}

/// Normalize a listing snapshot
///
/// Missing availability defaults to `Available`; a missing check timestamp
/// stays `None` (never checked).
pub fn normalize_listing_snapshot(dto: &ListingSnapshotDto) -> ListingSnapshot {
    ListingSnapshot {
        listing_id: dto.listing_id,
        title: dto.title.clone(),
        price_amount: normalize_price(dto.price_amount.as_ref()),
        price_currency: dto.price_currency.clone(),
        thumbnail_url: dto.thumbnail_url.clone(),
        availability: dto.availability.unwrap_or(ListingAvailability::Available),
        availability_checked_at: parse_timestamp_opt(dto.availability_checked_at.as_ref()),
    }
}

/// Normalize the other-participant summary; unresolvable stays None
pub fn normalize_participant(dto: Option<&ParticipantSummaryDto>) -> Option<ParticipantSummary> {
    dto.map(|p| ParticipantSummary {
        user_id: p.user_id,
        role: p.role,
        display_name: p.display_name.clone(),
        avatar_url: p.avatar_url.clone(),
    })
}

/// Normalize a message attachment
pub fn normalize_attachment(dto: &AttachmentDto) -> ChatAttachment {
    ChatAttachment {
        kind: dto.kind,
        url: dto.url.clone(),
        name: dto.name.clone(),
        size: dto.size,
        content_type: dto.content_type.clone(),
        width: dto.width,
        height: dto.height,
    }
}

/// Normalize a thread payload
pub fn normalize_thread(dto: &ThreadDto) -> ChatThread {
    ChatThread {
        id: ThreadId::new(&dto.id),
        buyer_id: dto.buyer_id,
        seller_id: dto.seller_id,
        status: dto.status,
        listing: normalize_listing_snapshot(&dto.listing),
        other_participant: normalize_participant(dto.other_participant.as_ref()),
        last_message_at: parse_timestamp_opt(dto.last_message_at.as_ref()),
        last_message_preview: dto.last_message_preview.clone(),
        unread_count: dto.unread_count,
        is_archived: dto.is_archived,
        last_read_message_id: dto.last_read_message_id.as_deref().map(MessageId::new),
        last_read_at: parse_timestamp_opt(dto.last_read_at.as_ref()),
        created_at: parse_timestamp(&dto.created_at),
        updated_at: parse_timestamp(&dto.updated_at),
    }
}

/// Normalize a message payload
///
/// Absent attachments become an empty vec and absent metadata an empty map,
/// so downstream code never sees a missing collection.
pub fn normalize_message(dto: &MessageDto) -> ChatMessage {
    ChatMessage {
        id: MessageId::new(&dto.id),
        thread_id: ThreadId::new(&dto.thread_id),
        sender_id: dto.sender_id,
        sender_display_name: dto.sender_display_name.clone(),
        body: dto.body.clone(),
        attachments: dto
            .attachments
            .as_deref()
            .map(|items| items.iter().map(normalize_attachment).collect())
            .unwrap_or_default(),
        metadata: dto.metadata.clone().unwrap_or_default(),
        client_message_id: dto.client_message_id.clone(),
        created_at: parse_timestamp(&dto.created_at),
        edited_at: parse_timestamp_opt(dto.edited_at.as_ref()),
        deleted_at: parse_timestamp_opt(dto.deleted_at.as_ref()),
        is_deleted: dto.is_deleted,
    }
}

/// Normalize a message page; a missing `has_more` reads as false
pub fn normalize_page(dto: &MessagePageDto) -> MessagePage {
    MessagePage {
        messages: dto.messages.iter().map(normalize_message).collect(),
        has_more: dto.has_more,
    }
}

/// Convert a model attachment to its wire shape for an outbound request
pub fn attachment_to_wire(attachment: &ChatAttachment) -> AttachmentDto {
    AttachmentDto {
        kind: attachment.kind,
        url: attachment.url.clone(),
        name: attachment.name.clone(),
        size: attachment.size,
        content_type: attachment.content_type.clone(),
        width: attachment.width,
        height: attachment.height,
    }
}

fn attachments_to_wire(attachments: &[ChatAttachment]) -> Option<Vec<AttachmentDto>> {
    if attachments.is_empty() {
        None
    } else {
        Some(attachments.iter().map(attachment_to_wire).collect())
    }
}

/// Build the POST body for sending a message
pub fn send_payload(input: &SendMessageInput) -> SendMessagePayload {
    SendMessagePayload {
        body: input.body.clone(),
        attachments: attachments_to_wire(&input.attachments),
        metadata: if input.metadata.is_empty() {
            None
        } else {
            Some(input.metadata.clone())
        },
        client_message_id: input.client_message_id.clone(),
    }
}

/// Build the POST body for creating a thread
pub fn create_payload(input: &CreateThreadInput) -> CreateThreadPayload {
    CreateThreadPayload {
        listing_id: input.listing_id,
        message: input.message.clone(),
        attachments: attachments_to_wire(&input.attachments),
        client_message_id: input.client_message_id.clone(),
    }
}
