//! Thread list presentation state

use chrono::{DateTime, Utc};

use super::ChatShell;
use crate::models::{ListingAvailability, ThreadId};
use crate::store::ChatStore;

/// Everything a thread list row displays
#[derive(Debug, Clone)]
pub struct ThreadRow {
    pub id: ThreadId,
    pub title: String,
    pub preview: String,
    pub unread: u32,
    pub last_message_at: Option<DateTime<Utc>>,
    /// The other party's name, or the listing title when unresolved
    pub participant_name: String,
    pub availability: ListingAvailability,
    pub selected: bool,
}

impl ThreadRow {
    /// Whether the row should render an unavailable/deleted marker
    pub fn shows_availability_flag(&self) -> bool {
        self.availability != ListingAvailability::Available
    }
}

/// Derive display rows from the store, in store order
pub fn thread_rows(store: &ChatStore) -> Vec<ThreadRow> {
    store
        .threads()
        .iter()
        .map(|thread| ThreadRow {
            id: thread.id.clone(),
            title: thread.listing.title.clone(),
            preview: thread.last_message_preview.clone(),
            unread: thread.unread_count,
            last_message_at: thread.last_message_at,
            participant_name: thread
                .other_participant
                .as_ref()
                .map(|p| p.display_name.clone())
                .unwrap_or_else(|| thread.listing.title.clone()),
            availability: thread.listing.availability,
            selected: store.selected() == Some(&thread.id),
        })
        .collect()
}

/// Select a thread and open the detail pane
pub fn select_thread(store: &mut ChatStore, shell: &mut ChatShell, thread_id: ThreadId) {
    store.select_thread(Some(thread_id));
    shell.open_detail();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ChatThread, ListingSnapshot, ParticipantRole, ParticipantSummary,
    };

    fn listing(title: &str, availability: ListingAvailability) -> ListingSnapshot {
        ListingSnapshot {
            listing_id: 1,
            title: title.to_string(),
            price_amount: None,
            price_currency: "USD".to_string(),
            thumbnail_url: None,
            availability,
            availability_checked_at: None,
        }
    }

    fn thread(id: &str, availability: ListingAvailability) -> ChatThread {
        ChatThread::new(
            ThreadId::new(id),
            10,
            20,
            listing("Lamp", availability),
        )
    }

    #[test]
    fn test_rows_follow_store_order() {
        let mut store = ChatStore::new();
        store.update_thread(thread("a", ListingAvailability::Available));
        store.update_thread(thread("b", ListingAvailability::Available));

        let rows = thread_rows(&store);
        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_participant_name_falls_back_to_listing_title() {
        let mut store = ChatStore::new();
        let mut with_participant = thread("a", ListingAvailability::Available);
        with_participant.other_participant = Some(ParticipantSummary {
            user_id: 20,
            role: ParticipantRole::Seller,
            display_name: "Bob".to_string(),
            avatar_url: None,
        });
        store.update_thread(thread("b", ListingAvailability::Available));
        store.update_thread(with_participant);

        let rows = thread_rows(&store);
        assert_eq!(rows[0].participant_name, "Bob");
        assert_eq!(rows[1].participant_name, "Lamp");
    }

    #[test]
    fn test_availability_flag() {
        let mut store = ChatStore::new();
        store.update_thread(thread("a", ListingAvailability::Unavailable));
        store.update_thread(thread("b", ListingAvailability::Available));

        let rows = thread_rows(&store);
        assert!(!rows[0].shows_availability_flag());
        assert!(rows[1].shows_availability_flag());
    }

    #[test]
    fn test_select_marks_row_and_opens_detail() {
        let mut store = ChatStore::new();
        let mut shell = ChatShell::new();
        store.update_thread(thread("a", ListingAvailability::Available));

        select_thread(&mut store, &mut shell, ThreadId::new("a"));

        assert!(shell.is_mobile_detail_open());
        let rows = thread_rows(&store);
        assert!(rows[0].selected);
    }
}
