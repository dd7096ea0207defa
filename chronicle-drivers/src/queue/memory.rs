//! 内存队列（MemoryQueue）
//!
//! 基于 `tokio::sync::mpsc` 无界通道的进程内队列，满足 `Queue` 协议：
//! - 每个订阅持有独立通道，发布方逐个克隆投递（扇出）；
//! - 无界缓冲意味着发布永不因慢订阅者阻塞，代价是积压占用内存；
//! - 单订阅内保持发送顺序（FIFO）；
//! - 退订移除注册并丢弃发送端，接收流随之关闭；
//! - 队列状态不跨进程重启存活。
//!
//! 处置语义：ack/nack 均为空操作；retry 睡眠至 `backoff_until` 后
//! 以递增后的尝试计数重新投递给该类型的全部订阅者。
//!
use async_trait::async_trait;
use chronicle_domain::error::{DomainError, DomainResult};
use chronicle_domain::messaging::{Queue, QueueMessage, QueueStream, RetryParams};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::warn;
use ulid::Ulid;

type Registry = HashMap<String, Vec<MemorySubscription>>;

struct MemorySubscription {
    id: String,
    tx: mpsc::UnboundedSender<Box<dyn QueueMessage>>,
}

/// 进程内内存队列
#[derive(Clone, Default)]
pub struct MemoryQueue {
    registry: Arc<Mutex<Registry>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 向某类型的全部订阅者投递一份消息拷贝
    fn deliver(&self, message_type: &str, message: &[u8], attempts: u32) -> DomainResult<()> {
        let mut registry = self.registry.lock().unwrap();
        let subscriptions = registry
            .get_mut(message_type)
            .filter(|subscriptions| !subscriptions.is_empty())
            .ok_or_else(|| DomainError::QueueDoesNotExist {
                message_type: message_type.to_string(),
            })?;

        // 未经退订就丢弃接收端的订阅在此剔除
        subscriptions.retain(|subscription| {
            let qm = MemoryQueueMessage {
                queue: self.clone(),
                message_type: message_type.to_string(),
                message: message.to_vec(),
                attempts,
            };
            let delivered = subscription.tx.send(Box::new(qm)).is_ok();
            if !delivered {
                warn!(
                    message_type,
                    subscription = %subscription.id,
                    "dropping subscription with closed receiver"
                );
            }
            delivered
        });

        Ok(())
    }
}

#[async_trait]
impl Queue for MemoryQueue {
    async fn send(&self, message_type: &str, message: Vec<u8>) -> DomainResult<()> {
        self.deliver(message_type, &message, 0)
    }

    async fn subscribe(&self, message_type: &str) -> DomainResult<(String, QueueStream)> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Ulid::new().to_string();

        self.registry
            .lock()
            .unwrap()
            .entry(message_type.to_string())
            .or_default()
            .push(MemorySubscription { id: id.clone(), tx });

        Ok((id, Box::pin(UnboundedReceiverStream::new(rx))))
    }

    async fn unsubscribe(&self, message_type: &str, id: &str) -> DomainResult<()> {
        let mut registry = self.registry.lock().unwrap();
        let subscriptions =
            registry
                .get_mut(message_type)
                .ok_or_else(|| DomainError::SubscriptionNotFound {
                    message_type: message_type.to_string(),
                    id: id.to_string(),
                })?;

        let before = subscriptions.len();
        subscriptions.retain(|subscription| subscription.id != id);
        if subscriptions.len() == before {
            return Err(DomainError::SubscriptionNotFound {
                message_type: message_type.to_string(),
                id: id.to_string(),
            });
        }

        Ok(())
    }
}

/// 内存队列的单条投递
struct MemoryQueueMessage {
    queue: MemoryQueue,
    message_type: String,
    message: Vec<u8>,
    attempts: u32,
}

#[async_trait]
impl QueueMessage for MemoryQueueMessage {
    fn message_type(&self) -> &str {
        &self.message_type
    }

    fn message(&self) -> &[u8] {
        &self.message
    }

    fn attempts(&self) -> u32 {
        self.attempts
    }

    async fn ack(&self) -> DomainResult<()> {
        Ok(())
    }

    async fn nack(&self) -> DomainResult<()> {
        Ok(())
    }

    async fn retry(&self, params: RetryParams) -> DomainResult<()> {
        let now = Utc::now();
        if let Ok(backoff) = (params.backoff_until - now).to_std() {
            tokio::time::sleep(backoff).await;
        }

        self.queue
            .deliver(&self.message_type, &self.message, self.attempts + 1)
    }
}
