//! 队列协议（Queue）
//!
use crate::error::DomainResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_core::stream::BoxStream;
use std::sync::Arc;

/// 订阅返回的投递流；订阅被取消时流随之关闭
pub type QueueStream = BoxStream<'static, Box<dyn QueueMessage>>;

/// 按消息类型扇出的队列
///
/// 同一类型可有多个订阅者，每个订阅者独立收到每条消息；
/// 单订阅内对同一发送方保持 FIFO，跨订阅者与跨类型的顺序不作约定。
#[async_trait]
pub trait Queue: Send + Sync {
    /// 投递给 `message_type` 的全部订阅者；该类型无任何订阅时失败
    async fn send(&self, message_type: &str, message: Vec<u8>) -> DomainResult<()>;

    /// 注册订阅，返回用于退订的订阅 ID 与接收流
    async fn subscribe(&self, message_type: &str) -> DomainResult<(String, QueueStream)>;

    /// 取消订阅并关闭其接收流；类型或 ID 不存在时失败
    async fn unsubscribe(&self, message_type: &str, id: &str) -> DomainResult<()>;
}

#[async_trait]
impl<T> Queue for Arc<T>
where
    T: Queue + ?Sized,
{
    async fn send(&self, message_type: &str, message: Vec<u8>) -> DomainResult<()> {
        (**self).send(message_type, message).await
    }

    async fn subscribe(&self, message_type: &str) -> DomainResult<(String, QueueStream)> {
        (**self).subscribe(message_type).await
    }

    async fn unsubscribe(&self, message_type: &str, id: &str) -> DomainResult<()> {
        (**self).unsubscribe(message_type, id).await
    }
}

/// 单条队列投递：携带负载与重投计数，并承接处置回执
#[async_trait]
pub trait QueueMessage: Send + Sync {
    /// 消息类型，与 `send`/`subscribe` 所用的值一致
    fn message_type(&self) -> &str;

    /// 原始负载字节
    fn message(&self) -> &[u8];

    /// 队列观察到的重投次数，首投为 0
    fn attempts(&self) -> u32;

    /// 标记处理成功
    async fn ack(&self) -> DomainResult<()>;

    /// 标记处理失败，不再重投
    async fn nack(&self) -> DomainResult<()>;

    /// 安排一次不早于 `params.backoff_until` 的重投
    async fn retry(&self, params: RetryParams) -> DomainResult<()>;
}

/// 重投参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryParams {
    /// 重投不得早于该时刻
    pub backoff_until: DateTime<Utc>,
}
