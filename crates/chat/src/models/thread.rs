//! Thread model representing a conversation about one listing

use super::MessageId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a thread (opaque, server-assigned)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadId(pub String);

impl ThreadId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ThreadId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ThreadId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle status of a thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadStatus {
    Active,
    Archived,
    Closed,
}

impl ThreadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
            Self::Closed => "closed",
        }
    }
}

/// Availability of the listing a thread is about
///
/// Only updated through an explicit availability sync; a stale value is
/// expected between syncs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingAvailability {
    Available,
    Unavailable,
    Deleted,
}

impl ListingAvailability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Unavailable => "unavailable",
            Self::Deleted => "deleted",
        }
    }
}

/// Which side of the transaction a participant is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    Buyer,
    Seller,
}

impl ParticipantRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buyer => "buyer",
            Self::Seller => "seller",
        }
    }
}

/// Denormalized copy of the listing a thread is about
///
/// Embedded for display without an extra fetch; may lag behind the real
/// listing until the next availability sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSnapshot {
    pub listing_id: i64,
    pub title: String,
    pub price_amount: Option<String>,
    pub price_currency: String,
    pub thumbnail_url: Option<String>,
    pub availability: ListingAvailability,
    pub availability_checked_at: Option<DateTime<Utc>>,
}

/// Summary of the other party in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantSummary {
    pub user_id: i64,
    pub role: ParticipantRole,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

/// A conversation between a buyer and a seller about one listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatThread {
    pub id: ThreadId,
    pub buyer_id: i64,
    pub seller_id: i64,
    pub status: ThreadStatus,
    /// Snapshot of the listing this conversation is about
    pub listing: ListingSnapshot,
    /// The other party, when the server can resolve one
    pub other_participant: Option<ParticipantSummary>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub last_message_preview: String,
    /// Messages the viewer has not read yet (non-negative by construction)
    pub unread_count: u32,
    pub is_archived: bool,
    pub last_read_message_id: Option<MessageId>,
    pub last_read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatThread {
    /// Create a new active thread with empty read/unread state
    pub fn new(id: ThreadId, buyer_id: i64, seller_id: i64, listing: ListingSnapshot) -> Self {
        let now = Utc::now();
        Self {
            id,
            buyer_id,
            seller_id,
            status: ThreadStatus::Active,
            listing,
            other_participant: None,
            last_message_at: None,
            last_message_preview: String::new(),
            unread_count: 0,
            is_archived: false,
            last_read_message_id: None,
            last_read_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// The viewer's role in this thread, if the viewer is a participant
    pub fn role_of(&self, viewer_id: i64) -> Option<ParticipantRole> {
        if viewer_id == self.buyer_id {
            Some(ParticipantRole::Buyer)
        } else if viewer_id == self.seller_id {
            Some(ParticipantRole::Seller)
        } else {
            None
        }
    }

    /// Whether the given user is one of the two participants
    pub fn involves(&self, viewer_id: i64) -> bool {
        self.role_of(viewer_id).is_some()
    }

    /// Whether the thread has messages the viewer has not read
    pub fn has_unread(&self) -> bool {
        self.unread_count > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_listing() -> ListingSnapshot {
        ListingSnapshot {
            listing_id: 42,
            title: "Road bike".to_string(),
            price_amount: Some("150".to_string()),
            price_currency: "USD".to_string(),
            thumbnail_url: None,
            availability: ListingAvailability::Available,
            availability_checked_at: None,
        }
    }

    #[test]
    fn test_role_of_participants() {
        let thread = ChatThread::new(ThreadId::new("t1"), 10, 20, make_listing());
        assert_eq!(thread.role_of(10), Some(ParticipantRole::Buyer));
        assert_eq!(thread.role_of(20), Some(ParticipantRole::Seller));
        assert_eq!(thread.role_of(30), None);
    }

    #[test]
    fn test_involves() {
        let thread = ChatThread::new(ThreadId::new("t1"), 10, 20, make_listing());
        assert!(thread.involves(10));
        assert!(thread.involves(20));
        assert!(!thread.involves(99));
    }

    #[test]
    fn test_new_thread_has_no_unread() {
        let thread = ChatThread::new(ThreadId::new("t1"), 10, 20, make_listing());
        assert!(!thread.has_unread());
        assert!(thread.last_message_at.is_none());
    }
}
