//! 类型化消息流（MessageStream）
//!
//! 发送侧把信封序列化后交给队列；消费侧按消息类型订阅，
//! 每次注册派生恰好一个分发工作者，独占地顺序消费该订阅的投递流，
//! 并把接收器的处置结果翻译为底层队列消息的 ack/retry/nack。
//!
//! 工作者在订阅流关闭（退订）或流级关停令牌触发时结束；
//! 单条消息的任何失败只记录日志，绝不终止工作者。
//!
use crate::error::{DomainError, DomainResult};
use crate::messaging::message::{HandlerResult, Message, MessageReceiver, SerDe};
use crate::messaging::queue::{Queue, QueueMessage, QueueStream, RetryParams};
use bon::Builder;
use chrono::{Duration, Utc};
use futures_util::StreamExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::error;

/// 类型化消息流
///
/// 泛型参数 `T` 为负载类型；同一条队列上可并存多个不同 `T` 的流。
/// 重投退避对每个流可配置，缺省 1 秒。
#[derive(Builder)]
pub struct MessageStream<T> {
    queue: Arc<dyn Queue>,
    serde: Arc<dyn SerDe<T>>,
    /// 接收器判定 Retry 时的重投退避
    #[builder(default = Duration::seconds(1))]
    retry_backoff: Duration,
    /// 流级关停令牌：取消后所有分发工作者退出
    #[builder(default)]
    token: CancellationToken,
}

impl<T> MessageStream<T>
where
    T: Send + Sync + 'static,
{
    /// 序列化信封并投递到队列
    pub async fn send(&self, message: Message<T>) -> DomainResult<()> {
        let bytes = self.serde.serialize(&message)?;

        self.queue
            .send(message.message_type(), bytes)
            .await
            .map_err(DomainError::sending_event)
    }

    /// 为 `message_type` 注册接收器，返回订阅 ID
    ///
    /// 每次调用订阅一次并派生一个独立的分发工作者；
    /// 同类型的多次注册互不影响（进程内扇出）。
    /// 通过 [`Self::unregister_receiver`] 退订即停止对应工作者。
    pub async fn register_receiver<R>(
        &self,
        message_type: &str,
        receiver: R,
    ) -> DomainResult<String>
    where
        R: MessageReceiver<T> + 'static,
    {
        let (id, stream) = self.queue.subscribe(message_type).await?;

        let worker = DispatchWorker {
            serde: self.serde.clone(),
            receiver,
            retry_backoff: self.retry_backoff,
            token: self.token.clone(),
        };
        tokio::spawn(worker.run(stream));

        Ok(id)
    }

    /// 退订并关闭对应工作者的投递流
    pub async fn unregister_receiver(&self, message_type: &str, id: &str) -> DomainResult<()> {
        self.queue.unsubscribe(message_type, id).await
    }

    /// 关停本流派生的全部分发工作者
    pub fn shutdown(&self) {
        self.token.cancel();
    }
}

/// 单个订阅的分发工作者：顺序消费投递流并回执处置结果
struct DispatchWorker<T, R> {
    serde: Arc<dyn SerDe<T>>,
    receiver: R,
    retry_backoff: Duration,
    token: CancellationToken,
}

impl<T, R> DispatchWorker<T, R>
where
    T: Send + Sync + 'static,
    R: MessageReceiver<T> + 'static,
{
    async fn run(self, mut stream: QueueStream) {
        loop {
            tokio::select! {
                _ = self.token.cancelled() => break,
                maybe = stream.next() => match maybe {
                    Some(qm) => self.dispatch(qm).await,
                    None => break,
                },
            }
        }
    }

    async fn dispatch(&self, qm: Box<dyn QueueMessage>) {
        let result = match self.serde.deserialize(qm.message()) {
            Ok(mut message) => {
                message.set_attempts(qm.attempts());
                self.receiver.receive(message).await
            }
            Err(err) => {
                error!(
                    message_type = qm.message_type(),
                    error = %err,
                    "failed to deserialize message"
                );
                HandlerResult::Fail
            }
        };

        match result {
            HandlerResult::Success => {
                if let Err(err) = qm.ack().await {
                    error!(message_type = qm.message_type(), error = %err, "failed to ack message");
                }
            }
            HandlerResult::Retry => {
                let params = RetryParams {
                    backoff_until: Utc::now() + self.retry_backoff,
                };
                if let Err(err) = qm.retry(params).await {
                    error!(message_type = qm.message_type(), error = %err, "failed to retry message");
                }
            }
            HandlerResult::Fail => {
                if let Err(err) = qm.nack().await {
                    error!(message_type = qm.message_type(), error = %err, "failed to nack message");
                }
            }
        }
    }
}
