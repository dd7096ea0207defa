//! 快照存储协议与策略
//!
//! 快照只是重放的优化手段，事件历史才是权威状态来源；
//! 快照写入失败不应使已重建的聚合失效。
//!
use crate::error::DomainResult;
use crate::event::Event;
use async_trait::async_trait;
use bon::Builder;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// 聚合在某已知版本的状态快照
///
/// 版本约定：`version` 是导入快照后聚合所处的版本，
/// 即下一条待应用事件的 `version`。对同一聚合，
/// 以 `version >= snapshot.version` 的事件在导入状态上重放，
/// 必须与从版本 0 完整重放得到相同的聚合。
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct Snapshot {
    /// 聚合 ID
    pub id: String,
    /// 快照时刻的聚合版本
    pub version: u64,
    /// 聚合导出的不透明状态字节
    pub data: Vec<u8>,
    /// 快照生成时间
    #[builder(default = Utc::now())]
    pub timestamp: DateTime<Utc>,
}

/// 快照存储：每个聚合 ID 仅保留最近一份快照（upsert 语义）
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// 加载某聚合最近的快照；不存在返回 `None`（传输故障才是错误）
    async fn load(&self, id: &str) -> DomainResult<Option<Snapshot>>;

    /// 写入快照，后写覆盖先写
    async fn store(&self, aggregate_id: &str, snapshot: Snapshot) -> DomainResult<()>;

    /// 删除某聚合的快照；不存在视为成功
    async fn delete(&self, aggregate_id: &str) -> DomainResult<()>;
}

#[async_trait]
impl<T> SnapshotStore for Arc<T>
where
    T: SnapshotStore + ?Sized,
{
    async fn load(&self, id: &str) -> DomainResult<Option<Snapshot>> {
        (**self).load(id).await
    }

    async fn store(&self, aggregate_id: &str, snapshot: Snapshot) -> DomainResult<()> {
        (**self).store(aggregate_id, snapshot).await
    }

    async fn delete(&self, aggregate_id: &str) -> DomainResult<()> {
        (**self).delete(aggregate_id).await
    }
}

/// 可替换的快照时机策略
pub trait SnapshotStrategy: Send + Sync {
    /// 依据上一份快照与本次新应用的事件，决定是否生成新快照
    fn should_snapshot(&self, snapshot: Option<&Snapshot>, events: &[Event]) -> bool;

    /// 返回策略关联的快照存储；`None` 表示不启用快照
    fn store(&self) -> Option<Arc<dyn SnapshotStore>>;
}
