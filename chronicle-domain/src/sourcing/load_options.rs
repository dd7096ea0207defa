//! 仓储加载配置（LoadOptions）
//!
use super::event_store::LoadEventsOptions;
use bon::Builder;

/// `Repository::load` 的请求配置：事件过滤条件加上是否跳过快照
///
/// 注意：对聚合重建设置 `min_version`/`event_types`/时间窗过滤会得到
/// 不一致的状态，这些条件只应在直接查询事件时使用。
#[derive(Debug, Clone, Default, Builder)]
pub struct LoadOptions {
    /// 事件加载条件
    #[builder(default)]
    pub events: LoadEventsOptions,
    /// 跳过快照：既不从快照恢复，也不在本次加载后生成快照
    #[builder(default)]
    pub skip_snapshot: bool,
}
