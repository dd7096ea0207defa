//! 事件存储协议（EventStore）
//!
use crate::error::DomainResult;
use crate::event::Event;
use async_trait::async_trait;
use bon::Builder;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// 事件存储：事件溯源方案的持久化底座
///
/// 除合规用途的 `replace` 外，存储应保持追加式（append-only）。
#[async_trait]
pub trait EventStore: Send + Sync {
    /// 原子追加一批事件：要么全部落盘，要么全部失败。
    /// 重复的 `(aggregate_id, version)` 必须失败。
    async fn store(&self, events: &[Event]) -> DomainResult<()>;

    /// 按条件加载某聚合的事件，按 `version` 严格升序返回
    async fn load(&self, aggregate_id: &str, options: LoadEventsOptions)
    -> DomainResult<Vec<Event>>;

    /// 以新事件覆盖 `(aggregate_id, version)` 处的事件。
    /// 仅为合规删改而存在，新事件的 `version` 必须等于 `version`。
    async fn replace(&self, aggregate_id: &str, version: u64, event: Event) -> DomainResult<()>;
}

#[async_trait]
impl<T> EventStore for Arc<T>
where
    T: EventStore + ?Sized,
{
    async fn store(&self, events: &[Event]) -> DomainResult<()> {
        (**self).store(events).await
    }

    async fn load(
        &self,
        aggregate_id: &str,
        options: LoadEventsOptions,
    ) -> DomainResult<Vec<Event>> {
        (**self).load(aggregate_id, options).await
    }

    async fn replace(&self, aggregate_id: &str, version: u64, event: Event) -> DomainResult<()> {
        (**self).replace(aggregate_id, version, event).await
    }
}

/// 事件加载条件；未设置的维度不构成约束
///
/// `min_version`/`max_version` 均为闭区间边界。
#[derive(Debug, Clone, Default, Builder)]
pub struct LoadEventsOptions {
    /// 加载的最小聚合版本（含）
    pub min_version: Option<u64>,
    /// 加载的最大聚合版本（含），可用于加载聚合的某个历史视图
    pub max_version: Option<u64>,
    /// 仅加载这些事件类型；为空则不限
    #[builder(default)]
    pub event_types: Vec<String>,
    /// 仅加载不早于该时刻的事件
    pub from_time: Option<DateTime<Utc>>,
    /// 仅加载不晚于该时刻的事件
    pub to_time: Option<DateTime<Utc>>,
}
