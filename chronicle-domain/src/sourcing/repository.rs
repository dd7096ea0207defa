//! 聚合仓储（Repository）
//!
//! 编排事件存储、快照策略与队列，覆盖三条路径：
//! - 写路径：`store` 原子追加事件，随后逐条按事件类型发布到队列；
//! - 读路径：`load` 以快照 + 增量事件重建聚合，并按策略生成新快照；
//! - 合规路径：`replace_version` 在重放验证通过后覆盖历史上的单条事件。
//!
use crate::aggregate::Aggregate;
use crate::error::{DomainError, DomainResult};
use crate::event::Event;
use crate::messaging::Queue;
use crate::sourcing::{EventStore, LoadEventsOptions, LoadOptions, Snapshot, SnapshotStrategy};
use bon::Builder;
use std::sync::Arc;

/// 聚合仓储
///
/// 构造后自身不持有可变状态；事件存储为必选，
/// 快照策略与队列可选，缺省时对应行为关闭而非报错。
#[derive(Builder)]
pub struct Repository {
    event_store: Arc<dyn EventStore>,
    snapshot_strategy: Option<Arc<dyn SnapshotStrategy>>,
    queue: Option<Arc<dyn Queue>>,
}

impl Repository {
    /// 原子追加一批事件并逐条发布到队列
    ///
    /// 发布被视为存储契约的一部分：未配置队列直接返回
    /// [`DomainError::NoQueueDefined`]，避免事件被静默丢失。
    ///
    /// 注意投递语义：事件先落盘后发布，发布中途失败时已发布的事件呈
    /// at-least-once，其余事件的本次发布丢失（不回滚存储）；
    /// 消费侧需要以幂等方式处理。
    pub async fn store(&self, events: &[Event]) -> DomainResult<()> {
        let queue = self.queue.as_ref().ok_or(DomainError::NoQueueDefined)?;

        self.event_store
            .store(events)
            .await
            .map_err(DomainError::storing_events)?;

        for event in events {
            queue
                .send(event.event_type(), event.data().to_vec())
                .await
                .map_err(DomainError::sending_event)?;
        }

        Ok(())
    }

    /// 从事件存储重建聚合
    ///
    /// 前置条件：`aggregate.id()` 返回目标聚合 ID。流程：
    /// 1. 未跳过快照时尝试加载快照；
    /// 2. 快照版本高于请求的 `max_version` 时丢弃快照（它超前于所请求的视图），
    ///    并跳过本次加载后的快照生成；
    /// 3. 采用快照时导入状态并把 `min_version` 置为快照版本
    ///    （快照状态即处于该版本，已并入快照的事件绝不重放）；
    /// 4. 加载增量事件并按序应用；
    /// 5. 既无快照也无事件时返回 [`DomainError::NoEvents`]；
    /// 6. 策略命中时导出状态写入新快照；快照失败不回滚聚合，导出失败上报
    ///    [`DomainError::ExportState`]，写入失败上报
    ///    [`DomainError::SnapshotFailed`]，两者都可在返回值上按变体判定。
    pub async fn load<A>(&self, aggregate: &mut A, options: Option<LoadOptions>) -> DomainResult<()>
    where
        A: Aggregate,
    {
        let mut opts = options.unwrap_or_default();

        let mut snapshot = if opts.skip_snapshot {
            None
        } else {
            self.load_snapshot(aggregate.id()).await?
        };

        let snapshot_ahead = matches!(
            (&snapshot, opts.events.max_version),
            (Some(s), Some(max)) if s.version > max
        );
        if snapshot_ahead {
            opts.skip_snapshot = true;
            snapshot = None;
        }

        if let Some(s) = &snapshot {
            opts.events.min_version = Some(s.version);
            self.import_state(aggregate, s)?;
        }

        let events = self
            .event_store
            .load(aggregate.id(), opts.events.clone())
            .await
            .map_err(DomainError::loading_events)?;

        if snapshot.is_none() && events.is_empty() {
            return Err(DomainError::NoEvents);
        }

        Self::apply_events(aggregate, &events)?;

        if !opts.skip_snapshot {
            if let Some(strategy) = &self.snapshot_strategy {
                if strategy.should_snapshot(snapshot.as_ref(), &events) {
                    self.generate_snapshot(aggregate, strategy.as_ref()).await?;
                }
            }
        }

        Ok(())
    }

    /// 绕过聚合语义直接查询事件
    pub async fn load_events(
        &self,
        aggregate_id: &str,
        options: LoadEventsOptions,
    ) -> DomainResult<Vec<Event>> {
        self.event_store
            .load(aggregate_id, options)
            .await
            .map_err(DomainError::loading_events)
    }

    /// 覆盖 `(aggregate_id, version)` 处的历史事件
    ///
    /// 危险操作，仅为合规删改而存在。调用方传入空聚合：
    /// 落盘前会把补丁后的完整序列重放到该聚合上，
    /// 确认新序列仍可被消化，避免以无法应用的事件污染历史。
    pub async fn replace_version<A>(
        &self,
        aggregate_id: &str,
        aggregate: &mut A,
        version: u64,
        event: Event,
    ) -> DomainResult<()>
    where
        A: Aggregate,
    {
        let options = LoadEventsOptions::builder().max_version(version).build();
        let mut events = self
            .load_events(aggregate_id, options)
            .await
            .map_err(DomainError::replacing_version)?;

        if events.is_empty() {
            return Err(DomainError::NoEvents);
        }

        let slot = events
            .iter_mut()
            .find(|e| e.version() == version)
            .ok_or(DomainError::VersionNotFound)?;
        *slot = event.clone();

        Self::apply_events(aggregate, &events).map_err(DomainError::replacing_version)?;

        self.event_store
            .replace(aggregate_id, version, event)
            .await
            .map_err(DomainError::replacing_version)
    }

    async fn load_snapshot(&self, aggregate_id: &str) -> DomainResult<Option<Snapshot>> {
        let Some(strategy) = &self.snapshot_strategy else {
            return Ok(None);
        };
        let Some(store) = strategy.store() else {
            return Ok(None);
        };

        store
            .load(aggregate_id)
            .await
            .map_err(DomainError::snapshot_load)
    }

    fn import_state<A>(&self, aggregate: &mut A, snapshot: &Snapshot) -> DomainResult<()>
    where
        A: Aggregate,
    {
        aggregate
            .import_state(&snapshot.data)
            .map_err(DomainError::snapshot_load)?;

        aggregate.set_version(snapshot.version);
        aggregate.set_id(&snapshot.id);

        Ok(())
    }

    fn apply_events<A>(aggregate: &mut A, events: &[Event]) -> DomainResult<()>
    where
        A: Aggregate,
    {
        for event in events {
            aggregate
                .apply(event)
                .map_err(DomainError::applying_event)?;
        }
        Ok(())
    }

    // 各失败环节各自定型：导出失败为 ExportState，写入失败为 SnapshotFailed，
    // 两者都可在 load 的返回值上直接按变体判定，不做二次包装。
    async fn generate_snapshot<A>(
        &self,
        aggregate: &A,
        strategy: &dyn SnapshotStrategy,
    ) -> DomainResult<()>
    where
        A: Aggregate,
    {
        let Some(store) = strategy.store() else {
            return Ok(());
        };

        let data = aggregate
            .export_state()
            .map_err(DomainError::export_state)?;

        let snapshot = Snapshot::builder()
            .id(aggregate.id().to_string())
            .version(aggregate.version())
            .data(data)
            .build();

        store
            .store(aggregate.id(), snapshot)
            .await
            .map_err(DomainError::snapshot_failed)
    }
}
