//! 聚合（Aggregate）抽象与安全应用
//!
//! 约束一个可被事件溯源的聚合的核心能力：
//! - `apply` 按版本严格递增的顺序将事件投影到状态；
//! - `import_state`/`export_state` 与快照字节互转；
//! - 标识与版本的读写访问器，供仓储在重建时回填。
//!
//! `safe_apply` 是重放过程中唯一的版本单调性守卫：聚合的 `apply`
//! 实现应直接（或经由封装）调用它。
//!
use crate::error::{BoxError, DomainError, DomainResult};
use crate::event::Event;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// 聚合接口
///
/// 生命周期：由调用方以空状态创建（版本 0、空 ID），经 `Repository::load`
/// 填充，随后由领域方法产生新事件并交回 `Repository::store` 持久化。
pub trait Aggregate: Send + Sync {
    /// 事件应用或状态导入导出环节的错误类型
    type Error: std::error::Error + Send + Sync + 'static;

    /// 应用单条事件，推进聚合状态；要求事件版本与当前聚合版本一致
    fn apply(&mut self, event: &Event) -> Result<(), Self::Error>;

    /// 从快照字节恢复状态
    fn import_state(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// 导出状态为快照字节
    fn export_state(&self) -> Result<Vec<u8>, Self::Error>;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: &str);

    fn version(&self) -> u64;

    fn set_version(&mut self, version: u64);
}

/// 版本守卫式的事件应用
///
/// 1. 以 panic 捕获为兜底：`apply_fn` 的任何 panic 都被转换为
///    [`DomainError::ApplyFailed`]，不会击穿仓储；
/// 2. 校验 `event.version == aggregate.version()`，不一致返回
///    [`DomainError::VersionMismatch`]，聚合保持原状；
/// 3. 执行 `apply_fn`，失败同样归为 [`DomainError::ApplyFailed`]；
/// 4. 成功后将聚合版本置为 `event.version + 1`。
pub fn safe_apply<A, E, F>(aggregate: &mut A, event: &Event, apply_fn: F) -> DomainResult<()>
where
    A: Aggregate,
    E: std::error::Error + Send + Sync + 'static,
    F: FnOnce(&mut A, &Event) -> Result<(), E>,
{
    let outcome = catch_unwind(AssertUnwindSafe(|| -> DomainResult<()> {
        let (event_version, aggregate_version) = (event.version(), aggregate.version());
        if event_version != aggregate_version {
            return Err(DomainError::VersionMismatch {
                event_version,
                aggregate_version,
            });
        }

        apply_fn(aggregate, event).map_err(DomainError::apply_failed)?;
        aggregate.set_version(event_version + 1);
        Ok(())
    }));

    match outcome {
        Ok(result) => result,
        Err(payload) => Err(DomainError::ApplyFailed {
            source: BoxError::from(panic_reason(payload)),
        }),
    }
}

fn panic_reason(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic: unknown payload".to_string()
    }
}
