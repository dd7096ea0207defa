//! 事件模型（Event）
//!
//! 事件是对一次状态变更的不可变记录：创建后不再修改，
//! 以聚合内严格递增的 `version` 排序构成该聚合的权威历史。
//!
use bon::Builder;
use chrono::{DateTime, Utc};

/// 单条领域事件
///
/// `version` 为聚合内序号：应用本事件后聚合版本为 `version + 1`。
/// `data` 为领域侧编码的不透明字节，本库不解释其内容。
#[derive(Debug, Clone, PartialEq, Builder)]
pub struct Event {
    /// 事件类型（短标识，非空），同时作为队列发布的消息类型
    event_type: String,
    /// 事件负载（领域侧编码的不透明字节）
    data: Vec<u8>,
    /// 聚合内序号，自 0 起严格递增且无空洞
    version: u64,
    /// 事件发生时间
    #[builder(default = Utc::now())]
    timestamp: DateTime<Utc>,
    /// 所属聚合 ID（非空）
    aggregate_id: String,
}

impl Event {
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn aggregate_id(&self) -> &str {
        &self.aggregate_id
    }
}
