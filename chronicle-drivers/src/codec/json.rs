//! JSON 信封编解码（`SerDe` 的参考实现）
//!
//! 线上形态：`{"type": ..., "id": ..., "created_at": RFC3339, "payload": T}`。
//! `attempts` 不参与编码，接收侧由队列的重投计数回填。
//!
use chronicle_domain::error::DomainResult;
use chronicle_domain::messaging::{Message, SerDe};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;

/// 基于 `serde_json` 的信封编解码器
pub struct JsonCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonCodec<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SerDe<T> for JsonCodec<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    fn serialize(&self, message: &Message<T>) -> DomainResult<Vec<u8>> {
        Ok(serde_json::to_vec(message)?)
    }

    fn deserialize(&self, bytes: &[u8]) -> DomainResult<Message<T>> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
