//! Domain models for marketplace chat

mod message;
mod thread;

pub use message::{
    AttachmentKind, ChatAttachment, ChatMessage, MessageBuilder, MessageId, MessagePage,
};
pub use thread::{
    ChatThread, ListingAvailability, ListingSnapshot, ParticipantRole, ParticipantSummary,
    ThreadId, ThreadStatus,
};
