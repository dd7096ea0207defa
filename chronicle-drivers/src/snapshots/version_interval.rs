//! 按版本间隔的快照策略
//!
use chronicle_domain::event::Event;
use chronicle_domain::sourcing::{Snapshot, SnapshotStore, SnapshotStrategy};
use std::sync::Arc;

/// 自上次快照以来新应用的事件数超过 `every_nth` 时生成新快照
pub struct VersionIntervalStrategy {
    every_nth: usize,
    store: Arc<dyn SnapshotStore>,
}

impl VersionIntervalStrategy {
    pub fn new(every_nth: usize, store: Arc<dyn SnapshotStore>) -> Self {
        Self { every_nth, store }
    }
}

impl SnapshotStrategy for VersionIntervalStrategy {
    fn should_snapshot(&self, _snapshot: Option<&Snapshot>, events: &[Event]) -> bool {
        events.len() > self.every_nth
    }

    fn store(&self) -> Option<Arc<dyn SnapshotStore>> {
        Some(self.store.clone())
    }
}
