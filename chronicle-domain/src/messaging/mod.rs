//! 类型化消息流（messaging）
//!
//! 在仅搬运字节的可插拔队列之上提供类型化的发布与消费：
//! - `Queue`/`QueueMessage`：按消息类型扇出的发布/订阅协议与逐条处置回执；
//! - `Message<T>`/`SerDe`：带身份与投递元数据的类型化信封及其编解码协议；
//! - `MessageStream`：序列化发送、按订阅派生分发工作者、以处置结果驱动
//!   ack/retry/nack。
//!
//! 类型化信封叠加无类型队列的分层必须保持：不同接收器可在同一条队列上
//! 各自拥有不同的负载类型。
//!
mod message;
mod queue;
mod stream;

pub use message::{HandlerResult, Message, MessageReceiver, SerDe};
pub use queue::{Queue, QueueMessage, QueueStream, RetryParams};
pub use stream::MessageStream;
