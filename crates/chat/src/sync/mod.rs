//! Availability synchronization
//!
//! After the first successful thread load of a session, the client asks the
//! server to recheck listing availability across the viewer's threads, then
//! refreshes the list to pick up any changes. This happens at most once per
//! session, guarded by a [`SyncLatch`].

mod latch;

pub use latch::SyncLatch;

use log::{debug, error};

use crate::api::{ChatApi, ThreadQuery};
use crate::store::{ChatStore, LoadState};

/// Whether an availability sync should run now
///
/// Pure predicate over observable state: threads must have finished loading,
/// at least one thread must exist, and the latch must still be pending.
pub fn should_sync(load_state: &LoadState, thread_count: usize, latch: &SyncLatch) -> bool {
    *load_state == LoadState::Ready && thread_count > 0 && !latch.is_fired()
}

/// Run the once-per-session availability sync if it is due
///
/// The latch flips before the request goes out, so a failed sync is not
/// retried this session. On success the thread list is refetched so updated
/// snapshots become visible.
pub fn sync_availability_once(
    latch: &mut SyncLatch,
    store: &mut ChatStore,
    api: &dyn ChatApi,
    query: &ThreadQuery,
) {
    if !should_sync(store.load_state(), store.threads().len(), latch) {
        return;
    }
    if !latch.fire() {
        return;
    }

    match api.sync_availability() {
        Ok(report) => {
            debug!(
                "availability sync checked {} listings, {} changed",
                report.synced, report.updated
            );
            store.reload(api, query);
        }
        Err(e) => {
            // Availability is advisory; stale snapshots are acceptable
            error!("availability sync failed: {}", e);
        }
    }
}
