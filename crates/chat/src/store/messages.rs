//! Per-thread message log
//!
//! Holds the loaded slice of one thread's history, oldest first. All inserts
//! deduplicate so retried fetches and sends cannot produce doubled entries.

use crate::models::{ChatMessage, MessagePage};

/// The loaded message window for one thread
#[derive(Debug, Default)]
pub struct MessageLog {
    items: Vec<ChatMessage>,
    has_more: bool,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the log with a freshly fetched latest page
    pub fn reset(&mut self, page: MessagePage) {
        self.items = page.messages;
        self.has_more = page.has_more;
    }

    /// Splice an older page in front of the current window
    pub fn prepend_older(&mut self, page: MessagePage) {
        let fresh: Vec<ChatMessage> = page
            .messages
            .into_iter()
            .filter(|m| !self.items.iter().any(|existing| existing.id == m.id))
            .collect();
        self.items.splice(0..0, fresh);
        self.has_more = page.has_more;
    }

    /// Append a new message, reconciling duplicates
    ///
    /// A message matching an existing entry by id, or by client_message_id,
    /// replaces that entry in place instead of being added. This makes a
    /// retried send converge on one row.
    pub fn append(&mut self, message: ChatMessage) {
        let existing = self.items.iter().position(|m| {
            m.id == message.id
                || (m.client_message_id.is_some()
                    && m.client_message_id == message.client_message_id)
        });
        match existing {
            Some(index) => self.items[index] = message,
            None => self.items.push(message),
        }
    }

    /// Replace an existing message in place; unknown ids are ignored
    pub fn apply_update(&mut self, message: ChatMessage) {
        if let Some(index) = self.items.iter().position(|m| m.id == message.id) {
            self.items[index] = message;
        }
    }

    pub fn oldest(&self) -> Option<&ChatMessage> {
        self.items.first()
    }

    pub fn latest(&self) -> Option<&ChatMessage> {
        self.items.last()
    }

    pub fn items(&self) -> &[ChatMessage] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether older history exists beyond the loaded window
    pub fn has_more(&self) -> bool {
        self.has_more
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MessageId, ThreadId};
    use chrono::{Duration, Utc};

    fn message(id: &str, minutes_ago: i64) -> ChatMessage {
        ChatMessage::builder(MessageId::new(id), ThreadId::new("t1"))
            .sender(10, "Alice")
            .body(id)
            .created_at(Utc::now() - Duration::minutes(minutes_ago))
            .build()
    }

    fn page(messages: Vec<ChatMessage>, has_more: bool) -> MessagePage {
        MessagePage { messages, has_more }
    }

    #[test]
    fn test_reset_replaces_window() {
        let mut log = MessageLog::new();
        log.reset(page(vec![message("m1", 5)], true));
        log.reset(page(vec![message("m2", 1)], false));

        assert_eq!(log.len(), 1);
        assert_eq!(log.latest().unwrap().id.as_str(), "m2");
        assert!(!log.has_more());
    }

    #[test]
    fn test_prepend_older_keeps_order_and_dedups() {
        let mut log = MessageLog::new();
        log.reset(page(vec![message("m3", 3), message("m4", 2)], true));

        // Older page overlaps on m3
        log.prepend_older(page(vec![message("m2", 4), message("m3", 3)], false));

        let ids: Vec<&str> = log.items().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["m2", "m3", "m4"]);
        assert!(!log.has_more());
    }

    #[test]
    fn test_append_reconciles_by_client_id() {
        let mut log = MessageLog::new();
        let mut first = message("m1", 1);
        first.client_message_id = Some("c1".to_string());
        log.append(first);

        // Retried send came back with the same client id
        let mut retry = message("m1-final", 1);
        retry.client_message_id = Some("c1".to_string());
        log.append(retry);

        assert_eq!(log.len(), 1);
        assert_eq!(log.latest().unwrap().id.as_str(), "m1-final");
    }

    #[test]
    fn test_append_dedups_by_id() {
        let mut log = MessageLog::new();
        log.append(message("m1", 1));
        log.append(message("m1", 1));
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_append_without_client_id_never_cross_matches() {
        let mut log = MessageLog::new();
        log.append(message("m1", 2));
        log.append(message("m2", 1));
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_apply_update_ignores_unknown() {
        let mut log = MessageLog::new();
        log.append(message("m1", 1));
        log.apply_update(message("m9", 1));
        assert_eq!(log.len(), 1);
        assert_eq!(log.latest().unwrap().id.as_str(), "m1");
    }

    #[test]
    fn test_oldest_and_latest() {
        let mut log = MessageLog::new();
        log.reset(page(vec![message("m1", 5), message("m2", 1)], false));
        assert_eq!(log.oldest().unwrap().id.as_str(), "m1");
        assert_eq!(log.latest().unwrap().id.as_str(), "m2");
    }
}
