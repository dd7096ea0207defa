use thiserror::Error;

/// 错误原因的统一装箱形态，保留底层错误链
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// 统一错误类型（基础库最小必要集）
///
/// 每个变体即一个稳定的错误种类：调用方通过 `matches!` 按变体判定种类，
/// 底层原因以 `#[source]` 挂载，经 `Error::source` 链路可达。
#[derive(Debug, Error)]
pub enum DomainError {
    // --- 事件加载与重放 ---
    #[error("error loading events")]
    LoadingEvents {
        #[source]
        source: BoxError,
    },
    #[error("error applying event")]
    ApplyingEvent {
        #[source]
        source: BoxError,
    },
    #[error("no events found")]
    NoEvents,
    #[error("version not found")]
    VersionNotFound,
    #[error("error replacing version")]
    ReplacingVersion {
        #[source]
        source: BoxError,
    },

    // --- 事件写入与发布 ---
    #[error("error storing events")]
    StoringEvents {
        #[source]
        source: BoxError,
    },
    #[error("no queue defined")]
    NoQueueDefined,
    #[error("error sending event")]
    SendingEvent {
        #[source]
        source: BoxError,
    },

    // --- 快照 ---
    #[error("failed to load snapshot")]
    SnapshotLoad {
        #[source]
        source: BoxError,
    },
    #[error("snapshot failed")]
    SnapshotFailed {
        #[source]
        source: BoxError,
    },
    #[error("failed to export state")]
    ExportState {
        #[source]
        source: BoxError,
    },

    // --- 版本守卫（safe_apply） ---
    #[error("event version not equal to aggregate version: event={event_version}, aggregate={aggregate_version}")]
    VersionMismatch {
        event_version: u64,
        aggregate_version: u64,
    },
    #[error("failed to apply event")]
    ApplyFailed {
        #[source]
        source: BoxError,
    },

    // --- 队列与消息流 ---
    #[error("queue does not exist: {message_type}")]
    QueueDoesNotExist { message_type: String },
    #[error("subscription not found: {message_type}/{id}")]
    SubscriptionNotFound { message_type: String, id: String },
    #[error("queue error: {reason}")]
    Queue { reason: String },
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },

    // --- 存储适配器 ---
    #[error("table name not set")]
    TableNameNotSet,
    #[error("event store error: {reason}")]
    EventStore { reason: String },
    #[error("snapshot store error: {reason}")]
    SnapshotStore { reason: String },
}

impl DomainError {
    pub fn loading_events(source: impl Into<BoxError>) -> Self {
        Self::LoadingEvents {
            source: source.into(),
        }
    }

    pub fn applying_event(source: impl Into<BoxError>) -> Self {
        Self::ApplyingEvent {
            source: source.into(),
        }
    }

    pub fn replacing_version(source: impl Into<BoxError>) -> Self {
        Self::ReplacingVersion {
            source: source.into(),
        }
    }

    pub fn storing_events(source: impl Into<BoxError>) -> Self {
        Self::StoringEvents {
            source: source.into(),
        }
    }

    pub fn sending_event(source: impl Into<BoxError>) -> Self {
        Self::SendingEvent {
            source: source.into(),
        }
    }

    pub fn snapshot_load(source: impl Into<BoxError>) -> Self {
        Self::SnapshotLoad {
            source: source.into(),
        }
    }

    pub fn snapshot_failed(source: impl Into<BoxError>) -> Self {
        Self::SnapshotFailed {
            source: source.into(),
        }
    }

    pub fn export_state(source: impl Into<BoxError>) -> Self {
        Self::ExportState {
            source: source.into(),
        }
    }

    pub fn apply_failed(source: impl Into<BoxError>) -> Self {
        Self::ApplyFailed {
            source: source.into(),
        }
    }

    pub fn queue(reason: impl Into<String>) -> Self {
        Self::Queue {
            reason: reason.into(),
        }
    }

    pub fn event_store(reason: impl Into<String>) -> Self {
        Self::EventStore {
            reason: reason.into(),
        }
    }

    pub fn snapshot_store(reason: impl Into<String>) -> Self {
        Self::SnapshotStore {
            reason: reason.into(),
        }
    }
}

/// 统一 Result 类型别名
pub type DomainResult<T> = Result<T, DomainError>;
