//! Headless view controllers
//!
//! Presentation state with no rendering dependency. A UI layer binds these
//! to widgets; tests drive them directly.

mod panel;
mod thread_list;

pub use panel::ChatPanel;
pub use thread_list::{select_thread, thread_rows, ThreadRow};

/// Top-level chat surface state
///
/// On narrow layouts the list and the conversation share one column; this
/// tracks which of the two is showing. Pure view state, deliberately kept
/// out of the store.
#[derive(Debug, Default)]
pub struct ChatShell {
    is_mobile_detail_open: bool,
}

impl ChatShell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_mobile_detail_open(&self) -> bool {
        self.is_mobile_detail_open
    }

    pub fn open_detail(&mut self) {
        self.is_mobile_detail_open = true;
    }

    /// Return to the list without clearing the selection
    pub fn back(&mut self) {
        self.is_mobile_detail_open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_back_closes_detail_only() {
        let mut shell = ChatShell::new();
        shell.open_detail();
        assert!(shell.is_mobile_detail_open());
        shell.back();
        assert!(!shell.is_mobile_detail_open());
    }
}
