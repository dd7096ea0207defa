//! 类型化消息信封（Message）与编解码协议
//!
use crate::error::DomainResult;
use async_trait::async_trait;
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 类型化消息信封
///
/// `attempts` 来自队列在接收侧观察到的重投计数，
/// 发送方不持久化它，线上编码也不包含该字段。
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
pub struct Message<T> {
    /// 消息类型，决定队列路由
    #[serde(rename = "type")]
    message_type: String,
    /// 消息唯一标识，随信封跨越传输存活
    id: String,
    /// 消息创建时间
    #[builder(default = Utc::now())]
    created_at: DateTime<Utc>,
    /// 投递尝试计数，接收侧由队列回填
    #[serde(skip)]
    #[builder(default)]
    attempts: u32,
    /// 类型化负载
    payload: T,
}

impl<T> Message<T> {
    pub fn message_type(&self) -> &str {
        &self.message_type
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub fn into_payload(self) -> T {
        self.payload
    }

    pub(crate) fn set_attempts(&mut self, attempts: u32) {
        self.attempts = attempts;
    }
}

/// 消息处置结果：接收器对一次投递的裁决
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerResult {
    /// 处理成功，确认消息
    Success,
    /// 暂时失败，退避后重投
    Retry,
    /// 处理失败，不再重投
    Fail,
}

/// 信封编解码协议
pub trait SerDe<T>: Send + Sync {
    fn serialize(&self, message: &Message<T>) -> DomainResult<Vec<u8>>;

    fn deserialize(&self, bytes: &[u8]) -> DomainResult<Message<T>>;
}

/// 类型化消息接收器
///
/// 同一订阅内消息被顺序投递，接收器始终看到单线程的收件箱视图。
#[async_trait]
pub trait MessageReceiver<T>: Send + Sync {
    async fn receive(&self, message: Message<T>) -> HandlerResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_wire_shape_matches_contract() {
        let message = Message::builder()
            .message_type("greeting".to_string())
            .id("01J00000000000000000000000".to_string())
            .payload("hello".to_string())
            .build();

        let value = serde_json::to_value(&message).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object["type"], "greeting");
        assert_eq!(object["id"], "01J00000000000000000000000");
        assert_eq!(object["payload"], "hello");
        // created_at 以 RFC3339 编码
        assert!(object["created_at"].as_str().unwrap().contains('T'));
        // attempts 不进入线上编码，由队列在接收侧回填
        assert!(!object.contains_key("attempts"));
    }

    #[test]
    fn deserialized_envelope_starts_with_zero_attempts() {
        let json = r#"{
            "type": "greeting",
            "id": "m-1",
            "created_at": "2024-05-01T10:00:00Z",
            "payload": 42
        }"#;

        let message: Message<i64> = serde_json::from_str(json).unwrap();
        assert_eq!(message.message_type(), "greeting");
        assert_eq!(message.attempts(), 0);
        assert_eq!(*message.payload(), 42);
    }
}
