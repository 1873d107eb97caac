//! Conversation panel state
//!
//! Compose box, message window, and read tracking for one open conversation.
//! The panel can start from an existing thread or from a bare listing, in
//! which case the first submit creates the thread.

use log::debug;

use crate::api::{client_message_id, ChatApi, CreateThreadInput, MessageQuery, SendMessageInput};
use crate::models::{ChatAttachment, MessageId, ThreadId};
use crate::store::ChatStore;

const PAGE_SIZE: usize = 30;

/// State for the open conversation pane
#[derive(Default)]
pub struct ChatPanel {
    thread_id: Option<ThreadId>,
    listing_id: Option<i64>,
    pub draft: String,
    pub pending_attachments: Vec<ChatAttachment>,
    /// Reused across retries so the server can collapse duplicate sends
    pending_client_id: Option<String>,
    pub is_sending: bool,
    /// Inline failure under the compose box; cleared on the next attempt
    pub send_error: Option<String>,
    /// Failure loading the message window
    pub load_error: Option<String>,
    last_marked_read: Option<MessageId>,
}

impl ChatPanel {
    /// Open the panel on an existing thread
    pub fn for_thread(thread_id: ThreadId) -> Self {
        Self {
            thread_id: Some(thread_id),
            ..Self::default()
        }
    }

    /// Open the panel to start a conversation about a listing
    pub fn for_listing(listing_id: i64) -> Self {
        Self {
            listing_id: Some(listing_id),
            ..Self::default()
        }
    }

    pub fn thread_id(&self) -> Option<&ThreadId> {
        self.thread_id.as_ref()
    }

    /// Fetch the latest page, replacing the message window
    pub fn load_initial(&mut self, store: &mut ChatStore, api: &dyn ChatApi) {
        let Some(thread_id) = self.thread_id.clone() else {
            return;
        };
        match api.list_messages(&thread_id, &MessageQuery::latest(PAGE_SIZE)) {
            Ok(page) => {
                store.messages_mut(&thread_id).reset(page);
                self.load_error = None;
            }
            Err(e) => {
                self.load_error = Some(e.to_string());
            }
        }
    }

    /// Fetch the page older than the current window, if any remains
    pub fn fetch_older(&mut self, store: &mut ChatStore, api: &dyn ChatApi) {
        let Some(thread_id) = self.thread_id.clone() else {
            return;
        };
        let cursor = {
            let log = store.messages_mut(&thread_id);
            if !log.has_more() {
                return;
            }
            match log.oldest() {
                Some(oldest) => oldest.created_at.to_rfc3339(),
                None => return,
            }
        };
        match api.list_messages(&thread_id, &MessageQuery::older_than(cursor, PAGE_SIZE)) {
            Ok(page) => {
                store.messages_mut(&thread_id).prepend_older(page);
                self.load_error = None;
            }
            Err(e) => {
                self.load_error = Some(e.to_string());
            }
        }
    }

    /// Whether the compose box currently has anything to send
    pub fn can_submit(&self) -> bool {
        !self.is_sending
            && (!self.draft.trim().is_empty() || !self.pending_attachments.is_empty())
    }

    /// Send the draft
    ///
    /// On failure the draft and attachments stay put so the user can retry;
    /// the retry reuses the same client id and cannot double-send.
    pub fn submit(&mut self, store: &mut ChatStore, api: &dyn ChatApi) {
        let input = SendMessageInput {
            body: if self.draft.trim().is_empty() {
                None
            } else {
                Some(self.draft.clone())
            },
            attachments: self.pending_attachments.clone(),
            metadata: serde_json::Map::new(),
            client_message_id: Some(
                self.pending_client_id
                    .get_or_insert_with(client_message_id)
                    .clone(),
            ),
        };
        if let Err(e) = input.validate() {
            self.send_error = Some(e.to_string());
            return;
        }

        self.is_sending = true;
        self.send_error = None;
        let result = match self.thread_id.clone() {
            Some(thread_id) => self.send_to_thread(store, api, &thread_id, &input),
            None => self.create_and_send(store, api, &input),
        };
        self.is_sending = false;

        match result {
            Ok(()) => {
                self.draft.clear();
                self.pending_attachments.clear();
                self.pending_client_id = None;
            }
            Err(detail) => {
                // Draft survives so nothing typed is lost
                self.send_error = Some(detail);
            }
        }
    }

    fn send_to_thread(
        &mut self,
        store: &mut ChatStore,
        api: &dyn ChatApi,
        thread_id: &ThreadId,
        input: &SendMessageInput,
    ) -> Result<(), String> {
        let message = api
            .send_message(thread_id, input)
            .map_err(|e| e.to_string())?;

        if let Some(thread) = store.thread(thread_id) {
            let mut updated = thread.clone();
            updated.last_message_at = Some(message.created_at);
            updated.last_message_preview = message.body.clone();
            store.update_thread(updated);
        }
        store.messages_mut(thread_id).append(message);
        Ok(())
    }

    fn create_and_send(
        &mut self,
        store: &mut ChatStore,
        api: &dyn ChatApi,
        input: &SendMessageInput,
    ) -> Result<(), String> {
        let listing_id = self
            .listing_id
            .ok_or_else(|| "no listing to start a conversation about".to_string())?;

        let create = CreateThreadInput {
            listing_id,
            message: input.body.clone(),
            attachments: input.attachments.clone(),
            client_message_id: input.client_message_id.clone(),
        };
        let thread = api.create_thread(&create).map_err(|e| e.to_string())?;
        debug!("started thread {} for listing {}", thread.id.as_str(), listing_id);

        let thread_id = thread.id.clone();
        store.update_thread(thread);
        store.select_thread(Some(thread_id.clone()));
        self.thread_id = Some(thread_id);
        self.load_initial(store, api);
        Ok(())
    }

    /// Record that the conversation is on screen up to its latest message
    ///
    /// Issues at most one receipt per distinct latest message. The tracker
    /// advances before the request goes out, so a failed receipt is not
    /// retried until a newer message arrives.
    pub fn mark_read_if_needed(&mut self, store: &mut ChatStore, api: &dyn ChatApi) {
        let Some(thread_id) = self.thread_id.clone() else {
            return;
        };
        let latest = store
            .messages(&thread_id)
            .and_then(|log| log.latest().map(|m| m.id.clone()));
        let Some(latest) = latest else {
            return;
        };
        if self.last_marked_read.as_ref() == Some(&latest) {
            return;
        }
        let has_unread = store.thread(&thread_id).is_some_and(|t| t.has_unread());
        if !has_unread {
            self.last_marked_read = Some(latest);
            return;
        }

        self.last_marked_read = Some(latest.clone());
        store.mark_read_best_effort(api, &thread_id, Some(&latest));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ChatError, InMemoryChatApi};
    use crate::models::{
        ChatMessage, ChatThread, ListingAvailability, ListingSnapshot,
    };
    use chrono::{Duration, Utc};

    fn listing(listing_id: i64) -> ListingSnapshot {
        ListingSnapshot {
            listing_id,
            title: "Lamp".to_string(),
            price_amount: None,
            price_currency: "USD".to_string(),
            thumbnail_url: None,
            availability: ListingAvailability::Available,
            availability_checked_at: None,
        }
    }

    fn setup() -> (InMemoryChatApi, ChatStore, ChatPanel) {
        let api = InMemoryChatApi::new(10);
        api.seed_thread(ChatThread::new(ThreadId::new("t1"), 10, 20, listing(1)));
        let mut store = ChatStore::new();
        store.reload(&api, &crate::api::ThreadQuery::default());
        let panel = ChatPanel::for_thread(ThreadId::new("t1"));
        (api, store, panel)
    }

    #[test]
    fn test_submit_appends_and_clears_draft() {
        let (api, mut store, mut panel) = setup();
        panel.draft = "hello".to_string();
        panel.submit(&mut store, &api);

        assert!(panel.draft.is_empty());
        assert!(panel.send_error.is_none());
        let log = store.messages(&ThreadId::new("t1")).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log.latest().unwrap().body, "hello");
        assert_eq!(store.threads()[0].last_message_preview, "hello");
    }

    #[test]
    fn test_empty_submit_sets_error_without_io() {
        let (api, mut store, mut panel) = setup();
        panel.draft = "   ".to_string();
        panel.submit(&mut store, &api);

        assert!(panel.send_error.is_some());
        assert!(store.messages(&ThreadId::new("t1")).is_none());
    }

    #[test]
    fn test_failed_send_keeps_draft_and_retry_converges() {
        let (api, mut store, mut panel) = setup();
        panel.draft = "hello".to_string();

        api.fail_next(ChatError::Network("offline".to_string()));
        panel.submit(&mut store, &api);
        assert_eq!(panel.draft, "hello");
        assert!(panel.send_error.is_some());
        let client_id = panel.pending_client_id.clone().unwrap();

        // Retry reuses the client id and lands exactly one message
        panel.submit(&mut store, &api);
        assert!(panel.send_error.is_none());
        let log = store.messages(&ThreadId::new("t1")).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(
            log.latest().unwrap().client_message_id,
            Some(client_id)
        );
    }

    #[test]
    fn test_first_message_creates_thread() {
        let api = InMemoryChatApi::new(10);
        let mut store = ChatStore::new();
        let mut panel = ChatPanel::for_listing(99);

        panel.draft = "is this available?".to_string();
        panel.submit(&mut store, &api);

        let thread_id = panel.thread_id().cloned().unwrap();
        assert_eq!(store.selected(), Some(&thread_id));
        assert_eq!(store.threads().len(), 1);
        let log = store.messages(&thread_id).unwrap();
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_fetch_older_extends_window() {
        let (api, mut store, _panel) = setup();
        for i in 0..5 {
            api.seed_message(
                ChatMessage::builder(
                    MessageId::new(format!("m{}", i)),
                    ThreadId::new("t1"),
                )
                .sender(20, "Bob")
                .body(format!("msg {}", i))
                .created_at(Utc::now() - Duration::minutes(10 - i))
                .build(),
            );
        }

        let mut small_panel = ChatPanel::for_thread(ThreadId::new("t1"));
        // Window of 2, then page back; the older fetch uses the panel's
        // page size and here that covers all remaining history
        match api.list_messages(&ThreadId::new("t1"), &MessageQuery::latest(2)) {
            Ok(page) => store.messages_mut(&ThreadId::new("t1")).reset(page),
            Err(e) => panic!("seed fetch failed: {}", e),
        }
        assert!(store.messages(&ThreadId::new("t1")).unwrap().has_more());

        small_panel.fetch_older(&mut store, &api);

        let log = store.messages(&ThreadId::new("t1")).unwrap();
        assert_eq!(log.len(), 5);
        assert_eq!(log.oldest().unwrap().body, "msg 0");
        assert!(!log.has_more());

        // Nothing older remains; a further call is a no-op
        small_panel.fetch_older(&mut store, &api);
        assert_eq!(store.messages(&ThreadId::new("t1")).unwrap().len(), 5);
    }

    #[test]
    fn test_mark_read_fires_once_per_message() {
        let (api, mut store, mut panel) = setup();
        let mut unread = store.threads()[0].clone();
        unread.unread_count = 1;
        store.update_thread(unread);
        api.seed_message(
            ChatMessage::builder(MessageId::new("m1"), ThreadId::new("t1"))
                .sender(20, "Bob")
                .body("hi")
                .build(),
        );
        panel.load_initial(&mut store, &api);

        panel.mark_read_if_needed(&mut store, &api);
        assert_eq!(store.threads()[0].unread_count, 0);

        // Same latest message, no second receipt even if unread reappears
        let mut again = store.threads()[0].clone();
        again.unread_count = 1;
        store.update_thread(again);
        panel.mark_read_if_needed(&mut store, &api);
        assert_eq!(store.threads()[0].unread_count, 1);
    }
}
