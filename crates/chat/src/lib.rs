//! Chat crate - Business logic for marketplace conversations
//!
//! This crate provides platform-independent chat functionality including:
//! - Domain models (ChatThread, ChatMessage, ListingSnapshot)
//! - REST API client and wire-format normalization
//! - Client-side state store with message logs
//! - Once-per-session availability sync
//! - Session persistence and auth events
//! - Headless view controllers for UI consumption
//!
//! This crate has zero UI dependencies; a rendering layer binds the view
//! controllers to actual widgets.

pub mod api;
pub mod models;
pub mod session;
pub mod store;
pub mod sync;
pub mod view;

pub use api::{
    AvailabilitySyncReport, ChatApi, ChatError, CreateThreadInput, HttpChatApi, InMemoryChatApi,
    MessageQuery, SendMessageInput, ThreadQuery, client_message_id,
};
pub use models::{
    AttachmentKind, ChatAttachment, ChatMessage, ChatThread, ListingAvailability, ListingSnapshot,
    MessageId, MessagePage, ParticipantRole, ParticipantSummary, ThreadId, ThreadStatus,
};
pub use session::{AuthEvent, AuthEvents, ProfileRecord, SessionStore, StoredTokens, Subscription};
pub use store::{ChatStore, LoadState, MessageLog};
pub use sync::{SyncLatch, should_sync, sync_availability_once};
pub use view::{ChatPanel, ChatShell, ThreadRow, select_thread, thread_rows};
