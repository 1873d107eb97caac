//! Client-side thread state
//!
//! Single-owner, synchronous state container. Concurrency-adjacent hazards
//! (a reload finishing after a newer reload started) are handled with
//! request generations rather than locks.

use std::collections::HashMap;

use log::warn;

use super::messages::MessageLog;
use crate::api::{ChatApi, ChatError, ThreadQuery};
use crate::models::{ChatThread, MessageId, ThreadId};

/// Lifecycle of the thread list
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
    Error(String),
}

/// All chat state held by the client
#[derive(Default)]
pub struct ChatStore {
    threads: Vec<ChatThread>,
    selected: Option<ThreadId>,
    load: LoadState,
    /// Bumped on every load start; stale completions are discarded
    generation: u64,
    logs: HashMap<String, MessageLog>,
}

impl ChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn threads(&self) -> &[ChatThread] {
        &self.threads
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load
    }

    pub fn selected(&self) -> Option<&ThreadId> {
        self.selected.as_ref()
    }

    pub fn select_thread(&mut self, thread_id: Option<ThreadId>) {
        self.selected = thread_id;
    }

    /// The currently selected thread, if it is in the list
    pub fn selected_thread(&self) -> Option<&ChatThread> {
        let selected = self.selected.as_ref()?;
        self.threads.iter().find(|t| t.id == *selected)
    }

    pub fn thread(&self, thread_id: &ThreadId) -> Option<&ChatThread> {
        self.threads.iter().find(|t| t.id == *thread_id)
    }

    /// Total unread messages across all loaded threads
    pub fn total_unread(&self) -> u32 {
        self.threads.iter().map(|t| t.unread_count).sum()
    }

    /// Merge an updated thread into the list
    ///
    /// A known id is replaced in place, keeping list order stable. An unknown
    /// id is inserted at the front as the most recent conversation.
    pub fn update_thread(&mut self, thread: ChatThread) {
        match self.threads.iter_mut().find(|t| t.id == thread.id) {
            Some(existing) => *existing = thread,
            None => self.threads.insert(0, thread),
        }
    }

    /// Drop a thread from the current view (it still exists server-side)
    pub fn remove_from_view(&mut self, thread_id: &ThreadId) {
        self.threads.retain(|t| t.id != *thread_id);
        if self.selected.as_ref() == Some(thread_id) {
            self.selected = None;
        }
    }

    /// Start a load, invalidating any in-flight completion
    pub fn begin_load(&mut self) -> u64 {
        self.generation += 1;
        self.load = LoadState::Loading;
        self.generation
    }

    /// Complete a load started with [`begin_load`]
    ///
    /// A completion whose generation is no longer current is discarded; the
    /// response it carries was superseded before it arrived. Failures keep
    /// the previous thread list intact.
    pub fn finish_load(&mut self, generation: u64, result: Result<Vec<ChatThread>, ChatError>) {
        if generation != self.generation {
            return;
        }
        match result {
            Ok(threads) => {
                self.threads = threads;
                self.load = LoadState::Ready;
            }
            Err(error) => {
                self.load = LoadState::Error(error.to_string());
            }
        }
    }

    /// Fetch the thread list synchronously through the repository
    pub fn reload(&mut self, api: &dyn ChatApi, query: &ThreadQuery) {
        let generation = self.begin_load();
        let result = api.list_threads(query);
        self.finish_load(generation, result);
    }

    /// Mark a thread read, folding the refreshed thread back in
    ///
    /// Failures are logged and swallowed; read receipts never block the UI.
    pub fn mark_read_best_effort(
        &mut self,
        api: &dyn ChatApi,
        thread_id: &ThreadId,
        up_to: Option<&MessageId>,
    ) {
        match api.mark_read(thread_id, up_to) {
            Ok(thread) => self.update_thread(thread),
            Err(error) => {
                warn!("mark read failed for {}: {}", thread_id.as_str(), error);
            }
        }
    }

    /// The message log for a thread, if one has been loaded
    pub fn messages(&self, thread_id: &ThreadId) -> Option<&MessageLog> {
        self.logs.get(thread_id.as_str())
    }

    /// The message log for a thread, creating an empty one if needed
    pub fn messages_mut(&mut self, thread_id: &ThreadId) -> &mut MessageLog {
        self.logs
            .entry(thread_id.as_str().to_string())
            .or_default()
    }
}
