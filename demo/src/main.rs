//! chronicle 端到端演示
//!
//! 走通两条路径：
//! 1. 事件溯源：SQLite 事件/快照存储 + 内存队列，开户与入金事件落盘、
//!    发布并重建聚合；
//! 2. 类型化消息流：JSON 信封经由同一条队列投递给注册的接收器。
//!
use anyhow::Result as AnyResult;
use async_trait::async_trait;
use chronicle_domain::aggregate::{Aggregate, safe_apply};
use chronicle_domain::error::{DomainError, DomainResult};
use chronicle_domain::event::Event;
use chronicle_domain::messaging::{
    HandlerResult, Message, MessageReceiver, MessageStream, Queue, SerDe,
};
use chronicle_domain::sourcing::{EventStore, Repository, SnapshotStore, SnapshotStrategy};
use chronicle_drivers::codec::JsonCodec;
use chronicle_drivers::eventstore::SqlEventStore;
use chronicle_drivers::queue::MemoryQueue;
use chronicle_drivers::snapshots::{SqlSnapshotStore, VersionIntervalStrategy};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Default)]
struct Account {
    id: String,
    version: u64,
    owner: String,
    balance: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
enum AccountEvent {
    Opened { owner: String },
    Deposited { amount: i64 },
}

impl AccountEvent {
    fn event(&self, id: &str, version: u64) -> AnyResult<Event> {
        let event_type = match self {
            AccountEvent::Opened { .. } => "opened",
            AccountEvent::Deposited { .. } => "deposited",
        };
        Ok(Event::builder()
            .event_type(event_type.to_string())
            .data(serde_json::to_vec(self)?)
            .version(version)
            .aggregate_id(id.to_string())
            .build())
    }
}

impl Aggregate for Account {
    type Error = DomainError;

    fn apply(&mut self, event: &Event) -> Result<(), Self::Error> {
        safe_apply(self, event, |agg, e| -> DomainResult<()> {
            match serde_json::from_slice::<AccountEvent>(e.data())? {
                AccountEvent::Opened { owner } => agg.owner = owner,
                AccountEvent::Deposited { amount } => agg.balance += amount,
            }
            Ok(())
        })
    }

    fn import_state(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        let (owner, balance): (String, i64) = serde_json::from_slice(data)?;
        self.owner = owner;
        self.balance = balance;
        Ok(())
    }

    fn export_state(&self) -> Result<Vec<u8>, Self::Error> {
        Ok(serde_json::to_vec(&(&self.owner, self.balance))?)
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

/// 账户通知：经由类型化消息流投递的业务消息
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AccountNotice {
    account_id: String,
    text: String,
}

struct NoticePrinter;

#[async_trait]
impl MessageReceiver<AccountNotice> for NoticePrinter {
    async fn receive(&self, message: Message<AccountNotice>) -> HandlerResult {
        info!(
            id = message.id(),
            account = %message.payload().account_id,
            text = %message.payload().text,
            attempts = message.attempts(),
            "notice received"
        );
        HandlerResult::Success
    }
}

/// 为某事件类型挂一个旁路订阅：记录仓储发布的原始事件并确认
async fn tail_events(queue: &MemoryQueue, event_type: &'static str) -> AnyResult<()> {
    let (_id, mut stream) = queue.subscribe(event_type).await?;
    tokio::spawn(async move {
        while let Some(qm) = stream.next().await {
            info!(
                event_type,
                payload = %String::from_utf8_lossy(qm.message()),
                "event published"
            );
            let _ = qm.ack().await;
        }
    });
    Ok(())
}

#[tokio::main]
async fn main() -> AnyResult<()> {
    tracing_subscriber::fmt::init();

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    sqlx::query(
        "CREATE TABLE account_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            type TEXT NOT NULL,
            data BLOB NOT NULL,
            version INTEGER NOT NULL,
            timestamp INTEGER NOT NULL,
            aggregate_id TEXT NOT NULL,
            UNIQUE (aggregate_id, version)
        )",
    )
    .execute(&pool)
    .await?;
    sqlx::query(
        "CREATE TABLE account_snapshots (
            id TEXT PRIMARY KEY,
            version INTEGER NOT NULL,
            data BLOB NOT NULL,
            timestamp INTEGER NOT NULL
        )",
    )
    .execute(&pool)
    .await?;

    let queue = MemoryQueue::new();
    tail_events(&queue, "opened").await?;
    tail_events(&queue, "deposited").await?;

    let snapshots = Arc::new(SqlSnapshotStore::new(pool.clone(), "account_snapshots"));
    let repo = Repository::builder()
        .event_store(
            Arc::new(SqlEventStore::new(pool.clone(), "account_events")) as Arc<dyn EventStore>
        )
        .snapshot_strategy(Arc::new(VersionIntervalStrategy::new(
            2,
            snapshots.clone() as Arc<dyn SnapshotStore>,
        )) as Arc<dyn SnapshotStrategy>)
        .queue(Arc::new(queue.clone()) as Arc<dyn Queue>)
        .build();

    // 写路径：开户 + 三笔入金，落盘并发布
    let account_id = "acct-1";
    let events = vec![
        AccountEvent::Opened {
            owner: "ada".to_string(),
        }
        .event(account_id, 0)?,
        AccountEvent::Deposited { amount: 100 }.event(account_id, 1)?,
        AccountEvent::Deposited { amount: 250 }.event(account_id, 2)?,
        AccountEvent::Deposited { amount: 50 }.event(account_id, 3)?,
    ];
    repo.store(&events).await?;

    // 读路径：重建聚合，事件数超过间隔会顺带写出快照
    let mut account = Account {
        id: account_id.to_string(),
        ..Account::default()
    };
    repo.load(&mut account, None).await?;
    info!(
        owner = %account.owner,
        balance = account.balance,
        version = account.version(),
        "account reloaded"
    );
    if let Some(snapshot) = snapshots.load(account_id).await? {
        info!(version = snapshot.version, "snapshot written");
    }

    // 消息路径：类型化通知经同一条队列投递给注册的接收器
    let stream = MessageStream::builder()
        .queue(Arc::new(queue.clone()) as Arc<dyn Queue>)
        .serde(Arc::new(JsonCodec::<AccountNotice>::new()) as Arc<dyn SerDe<AccountNotice>>)
        .build();
    stream
        .register_receiver("account-notice", NoticePrinter)
        .await?;
    stream
        .send(
            Message::builder()
                .message_type("account-notice".to_string())
                .id(ulid::Ulid::new().to_string())
                .payload(AccountNotice {
                    account_id: account_id.to_string(),
                    text: format!("balance is now {}", account.balance),
                })
                .build(),
        )
        .await?;

    // 留给分发工作者处理的时间窗，然后关停
    tokio::time::sleep(Duration::from_millis(100)).await;
    stream.shutdown();
    Ok(())
}
