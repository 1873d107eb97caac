//! In-memory implementation of the chat repository
//!
//! Mirrors the server's observable behavior closely enough for store and
//! view tests: client-id dedup on sends, cursor pagination, read receipts,
//! and scripted failures.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};

use chrono::Utc;

use super::traits::{
    AvailabilitySyncReport, ChatApi, CreateThreadInput, MessageQuery, SendMessageInput, ThreadQuery,
};
use super::ChatError;
use crate::models::{
    ChatMessage, ChatThread, ListingAvailability, ListingSnapshot, MessageId, MessagePage,
    ThreadId,
};

const DEFAULT_PAGE_SIZE: usize = 30;

/// In-memory chat backend
pub struct InMemoryChatApi {
    viewer_id: i64,
    threads: RwLock<Vec<ChatThread>>,
    /// Messages per thread id, oldest first
    messages: RwLock<HashMap<String, Vec<ChatMessage>>>,
    /// client_message_id of a create request -> thread id it produced
    client_thread_ids: RwLock<HashMap<String, String>>,
    next_id: AtomicU64,
    /// Error to return from the next operation, then cleared
    fail_next: Mutex<Option<ChatError>>,
    sync_calls: AtomicUsize,
    /// Availability changes applied on the next sync
    pending_availability: Mutex<HashMap<i64, ListingAvailability>>,
}

impl InMemoryChatApi {
    pub fn new(viewer_id: i64) -> Self {
        Self {
            viewer_id,
            threads: RwLock::new(Vec::new()),
            messages: RwLock::new(HashMap::new()),
            client_thread_ids: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            fail_next: Mutex::new(None),
            sync_calls: AtomicUsize::new(0),
            pending_availability: Mutex::new(HashMap::new()),
        }
    }

    pub fn viewer_id(&self) -> i64 {
        self.viewer_id
    }

    /// Add a thread directly, bypassing the API surface
    pub fn seed_thread(&self, thread: ChatThread) {
        if let Ok(mut threads) = self.threads.write() {
            threads.insert(0, thread);
        }
    }

    /// Add a message directly, keeping thread preview fields in step
    pub fn seed_message(&self, message: ChatMessage) {
        let thread_id = message.thread_id.clone();
        let preview = message.body.clone();
        let created_at = message.created_at;
        if let Ok(mut messages) = self.messages.write() {
            messages
                .entry(thread_id.as_str().to_string())
                .or_default()
                .push(message);
        }
        if let Ok(mut threads) = self.threads.write()
            && let Some(thread) = threads.iter_mut().find(|t| t.id == thread_id)
        {
            thread.last_message_at = Some(created_at);
            thread.last_message_preview = preview;
        }
    }

    /// Script the next operation to fail with the given error
    pub fn fail_next(&self, error: ChatError) {
        if let Ok(mut slot) = self.fail_next.lock() {
            *slot = Some(error);
        }
    }

    /// Queue an availability change to be applied on the next sync
    pub fn set_availability(&self, listing_id: i64, availability: ListingAvailability) {
        if let Ok(mut pending) = self.pending_availability.lock() {
            pending.insert(listing_id, availability);
        }
    }

    /// How many times sync_availability has been called
    pub fn sync_call_count(&self) -> usize {
        self.sync_calls.load(Ordering::SeqCst)
    }

    fn take_scripted_failure(&self) -> Result<(), ChatError> {
        if let Ok(mut slot) = self.fail_next.lock()
            && let Some(error) = slot.take()
        {
            return Err(error);
        }
        Ok(())
    }

    fn allocate_id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn find_thread(&self, thread_id: &ThreadId) -> Result<ChatThread, ChatError> {
        self.threads
            .read()
            .ok()
            .and_then(|threads| threads.iter().find(|t| t.id == *thread_id).cloned())
            .ok_or_else(|| ChatError::NotFound(format!("thread {}", thread_id.as_str())))
    }

    fn update_thread_after_send(&self, message: &ChatMessage) {
        if let Ok(mut threads) = self.threads.write()
            && let Some(thread) = threads.iter_mut().find(|t| t.id == message.thread_id)
        {
            thread.last_message_at = Some(message.created_at);
            thread.last_message_preview = message.body.clone();
            thread.updated_at = message.created_at;
            // Unread counts track the OTHER party; the sender's stays put
        }
    }

    fn with_thread_mut<F>(&self, thread_id: &ThreadId, apply: F) -> Result<ChatThread, ChatError>
    where
        F: FnOnce(&mut ChatThread),
    {
        let mut threads = self
            .threads
            .write()
            .map_err(|_| ChatError::Network("thread store poisoned".to_string()))?;
        let thread = threads
            .iter_mut()
            .find(|t| t.id == *thread_id)
            .ok_or_else(|| ChatError::NotFound(format!("thread {}", thread_id.as_str())))?;
        apply(thread);
        Ok(thread.clone())
    }
}

impl ChatApi for InMemoryChatApi {
    fn list_threads(&self, query: &ThreadQuery) -> Result<Vec<ChatThread>, ChatError> {
        self.take_scripted_failure()?;
        let threads = self
            .threads
            .read()
            .map_err(|_| ChatError::Network("thread store poisoned".to_string()))?;
        let mut result: Vec<ChatThread> = threads
            .iter()
            .filter(|t| query.archived.is_none_or(|want| t.is_archived == want))
            .filter(|t| query.unread.is_none_or(|want| t.has_unread() == want))
            .filter(|t| {
                query.my_ads.is_none_or(|want| {
                    let selling = t.seller_id == self.viewer_id;
                    selling == want
                })
            })
            .filter(|t| query.role.is_none_or(|want| t.role_of(self.viewer_id) == Some(want)))
            .cloned()
            .collect();
        result.sort_by(|a, b| {
            let a_key = a.last_message_at.unwrap_or(a.created_at);
            let b_key = b.last_message_at.unwrap_or(b.created_at);
            b_key.cmp(&a_key)
        });
        Ok(result)
    }

    fn get_thread(&self, thread_id: &ThreadId) -> Result<ChatThread, ChatError> {
        self.take_scripted_failure()?;
        self.find_thread(thread_id)
    }

    fn list_messages(
        &self,
        thread_id: &ThreadId,
        query: &MessageQuery,
    ) -> Result<MessagePage, ChatError> {
        self.take_scripted_failure()?;
        self.find_thread(thread_id)?;

        let messages = self
            .messages
            .read()
            .map_err(|_| ChatError::Network("message store poisoned".to_string()))?;
        let all = messages
            .get(thread_id.as_str())
            .cloned()
            .unwrap_or_default();

        let parse_cursor = |cursor: &str| {
            chrono::DateTime::parse_from_rfc3339(cursor).map(|d| d.with_timezone(&Utc))
        };
        let before = query.before.as_deref().and_then(|c| parse_cursor(c).ok());
        let after = query.after.as_deref().and_then(|c| parse_cursor(c).ok());

        let mut eligible: Vec<ChatMessage> = all
            .into_iter()
            .filter(|m| before.is_none_or(|cursor| m.created_at < cursor))
            .filter(|m| after.is_none_or(|cursor| m.created_at > cursor))
            .collect();
        eligible.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        let has_more = eligible.len() > limit;
        // Backward pagination keeps the newest `limit` of the eligible range
        let page = if has_more {
            eligible.split_off(eligible.len() - limit)
        } else {
            eligible
        };
        Ok(MessagePage {
            messages: page,
            has_more,
        })
    }

    fn send_message(
        &self,
        thread_id: &ThreadId,
        input: &SendMessageInput,
    ) -> Result<ChatMessage, ChatError> {
        self.take_scripted_failure()?;
        input.validate()?;
        self.find_thread(thread_id)?;

        // Same client id within a thread returns the original message
        if let Some(client_id) = &input.client_message_id
            && let Ok(messages) = self.messages.read()
            && let Some(existing) = messages.get(thread_id.as_str()).and_then(|list| {
                list.iter()
                    .find(|m| m.client_message_id.as_deref() == Some(client_id))
            })
        {
            return Ok(existing.clone());
        }

        let mut builder = ChatMessage::builder(
            MessageId::new(self.allocate_id("m")),
            thread_id.clone(),
        )
        .sender(self.viewer_id, "You")
        .body(input.body.clone().unwrap_or_default())
        .attachments(input.attachments.clone())
        .metadata(input.metadata.clone())
        .created_at(Utc::now());
        if let Some(client_id) = &input.client_message_id {
            builder = builder.client_message_id(client_id.clone());
        }
        let message = builder.build();

        if let Ok(mut messages) = self.messages.write() {
            messages
                .entry(thread_id.as_str().to_string())
                .or_default()
                .push(message.clone());
        }
        self.update_thread_after_send(&message);
        Ok(message)
    }

    fn create_thread(&self, input: &CreateThreadInput) -> Result<ChatThread, ChatError> {
        self.take_scripted_failure()?;

        // A retried create with the same client id returns the same thread
        if let Some(client_id) = &input.client_message_id
            && let Ok(ids) = self.client_thread_ids.read()
            && let Some(existing) = ids.get(client_id)
        {
            return self.find_thread(&ThreadId::new(existing.clone()));
        }

        let listing = ListingSnapshot {
            listing_id: input.listing_id,
            title: format!("Listing {}", input.listing_id),
            price_amount: None,
            price_currency: String::new(),
            thumbnail_url: None,
            availability: ListingAvailability::Available,
            availability_checked_at: None,
        };
        let thread_id = ThreadId::new(self.allocate_id("t"));
        let thread = ChatThread::new(thread_id.clone(), self.viewer_id, 0, listing);

        if let Ok(mut threads) = self.threads.write() {
            threads.insert(0, thread.clone());
        }
        if let Some(client_id) = &input.client_message_id
            && let Ok(mut ids) = self.client_thread_ids.write()
        {
            ids.insert(client_id.clone(), thread_id.as_str().to_string());
        }

        if input.message.is_some() || !input.attachments.is_empty() {
            let first = SendMessageInput {
                body: input.message.clone(),
                attachments: input.attachments.clone(),
                metadata: serde_json::Map::new(),
                client_message_id: input.client_message_id.clone(),
            };
            self.send_message(&thread_id, &first)?;
        }
        self.find_thread(&thread_id)
    }

    fn mark_read(
        &self,
        thread_id: &ThreadId,
        up_to: Option<&MessageId>,
    ) -> Result<ChatThread, ChatError> {
        self.take_scripted_failure()?;

        let latest = self
            .messages
            .read()
            .ok()
            .and_then(|m| m.get(thread_id.as_str()).and_then(|list| list.last().map(|m| m.id.clone())));
        let read_up_to = up_to.cloned().or(latest);

        self.with_thread_mut(thread_id, |thread| {
            thread.unread_count = 0;
            thread.last_read_message_id = read_up_to;
            thread.last_read_at = Some(Utc::now());
        })
    }

    fn archive_thread(&self, thread_id: &ThreadId) -> Result<ChatThread, ChatError> {
        self.take_scripted_failure()?;
        self.with_thread_mut(thread_id, |thread| {
            thread.is_archived = true;
        })
    }

    fn unarchive_thread(&self, thread_id: &ThreadId) -> Result<ChatThread, ChatError> {
        self.take_scripted_failure()?;
        self.with_thread_mut(thread_id, |thread| {
            thread.is_archived = false;
        })
    }

    fn sync_availability(&self) -> Result<AvailabilitySyncReport, ChatError> {
        self.take_scripted_failure()?;
        self.sync_calls.fetch_add(1, Ordering::SeqCst);

        let pending: HashMap<i64, ListingAvailability> = match self.pending_availability.lock() {
            Ok(mut pending) => pending.drain().collect(),
            Err(_) => HashMap::new(),
        };

        let mut synced = 0;
        let mut updated = 0;
        if let Ok(mut threads) = self.threads.write() {
            for thread in threads.iter_mut() {
                synced += 1;
                if let Some(next) = pending.get(&thread.listing.listing_id)
                    && thread.listing.availability != *next
                {
                    thread.listing.availability = *next;
                    thread.listing.availability_checked_at = Some(Utc::now());
                    updated += 1;
                }
            }
        }
        Ok(AvailabilitySyncReport { synced, updated })
    }
}
