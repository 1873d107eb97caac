//! One-shot latch for session-scoped triggers

/// A latch that fires at most once per session
///
/// Starts pending and flips to fired on the first [`SyncLatch::fire`]. The
/// transition happens exactly once; callers that need a fresh shot (a new
/// session) call [`SyncLatch::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncLatch {
    #[default]
    Pending,
    Fired,
}

impl SyncLatch {
    /// Attempt the transition; true only on the pending -> fired edge
    pub fn fire(&mut self) -> bool {
        match self {
            Self::Pending => {
                *self = Self::Fired;
                true
            }
            Self::Fired => false,
        }
    }

    pub fn is_fired(&self) -> bool {
        matches!(self, Self::Fired)
    }

    /// Re-arm the latch for a new session
    pub fn reset(&mut self) {
        *self = Self::Pending;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_exactly_once() {
        let mut latch = SyncLatch::default();
        assert!(!latch.is_fired());
        assert!(latch.fire());
        assert!(!latch.fire());
        assert!(!latch.fire());
        assert!(latch.is_fired());
    }

    #[test]
    fn test_reset_rearms() {
        let mut latch = SyncLatch::default();
        assert!(latch.fire());
        latch.reset();
        assert!(latch.fire());
    }
}
