//! 事件溯源与消息分发基础库（chronicle-domain）
//!
//! 提供以追加事件流为状态来源的应用所需的核心构件：
//! - 事件（`event`）与聚合（`aggregate`）建模，含版本守卫式的安全应用（`safe_apply`）
//! - 基于事件存储与快照的聚合仓储（`sourcing`）：重建、追加、合规替换与快照策略
//! - 类型化消息流（`messaging`）：可插拔队列之上的序列化发送、订阅分发与处置回执
//!
//! 本 crate 只定义协议与编排逻辑，不绑定具体存储与传输实现；
//! 内存队列、JSON 编解码与 SQL 存储等适配器由 `chronicle-drivers` 提供并注入。
//!
//! 典型用法：
//! 1. 为领域类型实现 `Aggregate`，在 `apply` 中通过 `safe_apply` 应用事件；
//! 2. 组装 `Repository`（事件存储 + 快照策略 + 队列），以 `store`/`load` 驱动写读路径；
//! 3. 通过 `MessageStream` 发送类型化消息，并按消息类型注册接收器消费队列投递。
//!
pub mod aggregate;
pub mod error;
pub mod event;
pub mod messaging;
pub mod sourcing;

pub use aggregate::{Aggregate, safe_apply};
pub use error::{DomainError, DomainResult};
pub use event::Event;
