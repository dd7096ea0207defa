//! 事件溯源（sourcing）
//!
//! 定义事件存储、快照存储与聚合仓储的协议及通用编排实现：
//! - 追加式事件持久化与按条件查询（`EventStore`/`LoadEventsOptions`）；
//! - 快照读写与落盘策略（`SnapshotStore`/`SnapshotStrategy`）；
//! - 仓储（`Repository`）：快照 + 增量事件重建、原子追加并发布、合规替换。
//!
//! 该模块聚焦协议与装配逻辑，具体存储后端（如 SQLite）由 `chronicle-drivers`
//! 提供实现并注入。
//!
mod event_store;
mod load_options;
mod repository;
mod snapshot_store;

pub use event_store::{EventStore, LoadEventsOptions};
pub use load_options::LoadOptions;
pub use repository::Repository;
pub use snapshot_store::{Snapshot, SnapshotStore, SnapshotStrategy};
