//! Client-side chat state
//!
//! The store owns everything the views render: the thread list, selection,
//! load lifecycle, and per-thread message logs. It never talks to the
//! network on its own; every fetch goes through a [`crate::api::ChatApi`].

mod messages;
mod threads;

pub use messages::MessageLog;
pub use threads::{ChatStore, LoadState};
