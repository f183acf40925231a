//! Snapshot-based reconciliation after an item is used.
//!
//! The controller calls [`SnapshotReconciler::reconcile`] synchronously on
//! success. That only marks the screen stale; the screen then refetches the
//! authoritative snapshot from the server on its own schedule.

use std::future::Future;
use std::sync::Arc;

use numeron_client::GameClient;
use numeron_core::ports::{GameServer, Reconciler};
use numeron_core::protocol::GameSnapshot;
use numeron_core::types::AppliedItem;
use numeron_core::TransportError;
use parking_lot::Mutex;
use tracing::debug;

/// A server that can report authoritative play state.
pub trait SnapshotSource: GameServer {
    /// Fetch the current snapshot.
    fn snapshot(&self) -> impl Future<Output = Result<GameSnapshot, TransportError>> + Send;
}

impl SnapshotSource for GameClient {
    async fn snapshot(&self) -> Result<GameSnapshot, TransportError> {
        self.fetch_snapshot().await.map_err(TransportError::from)
    }
}

impl<T: SnapshotSource> SnapshotSource for Arc<T> {
    fn snapshot(&self) -> impl Future<Output = Result<GameSnapshot, TransportError>> + Send {
        (**self).snapshot()
    }
}

/// Records applied items until the screen refetches.
#[derive(Debug, Default)]
pub struct SnapshotReconciler {
    pending: Mutex<Vec<AppliedItem>>,
}

impl SnapshotReconciler {
    /// Create a reconciler with nothing pending.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a refetch is due.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        !self.pending.lock().is_empty()
    }

    /// Take every applied item recorded since the last call.
    pub fn take(&self) -> Vec<AppliedItem> {
        std::mem::take(&mut *self.pending.lock())
    }

    /// Put items back after a failed refetch so the next one retries.
    pub fn restore(&self, items: Vec<AppliedItem>) {
        let mut pending = self.pending.lock();
        let newer = std::mem::replace(&mut *pending, items);
        pending.extend(newer);
    }
}

impl Reconciler for SnapshotReconciler {
    fn reconcile(&self, applied: &AppliedItem) {
        debug!(item = %applied.key, "Snapshot marked stale");
        self.pending.lock().push(applied.clone());
    }
}
