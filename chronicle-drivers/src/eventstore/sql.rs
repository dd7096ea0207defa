//! SQLite 事件存储（SqlEventStore）
//!
//! 以单表承载同一聚合类型的全部事件，表结构与 `Event` 字段一一对应；
//! 每种聚合类型使用独立的表（没有聚合类型列）：
//!
//! ```sql
//! CREATE TABLE events (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     type TEXT NOT NULL,
//!     data BLOB NOT NULL,
//!     version INTEGER NOT NULL,
//!     timestamp INTEGER NOT NULL,
//!     aggregate_id TEXT NOT NULL,
//!     UNIQUE (aggregate_id, version)
//! );
//! ```
//!
//! `timestamp` 以 unix 秒存储。`(aggregate_id, version)` 的唯一约束
//! 即追加不变量的落地：重复版本的写入会使整批回滚。
//!
use async_trait::async_trait;
use chronicle_domain::error::{DomainError, DomainResult};
use chronicle_domain::event::Event;
use chronicle_domain::sourcing::{EventStore, LoadEventsOptions};
use chrono::DateTime;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

/// 以 SQLite 为后端的事件存储
pub struct SqlEventStore {
    pool: SqlitePool,
    table: String,
}

impl SqlEventStore {
    pub fn new(pool: SqlitePool, table: impl Into<String>) -> Self {
        Self {
            pool,
            table: table.into(),
        }
    }

    fn table(&self) -> DomainResult<&str> {
        if self.table.is_empty() {
            return Err(DomainError::TableNameNotSet);
        }
        Ok(&self.table)
    }
}

#[async_trait]
impl EventStore for SqlEventStore {
    async fn store(&self, events: &[Event]) -> DomainResult<()> {
        let table = self.table()?;
        let insert = format!(
            "INSERT INTO {table} (type, data, version, timestamp, aggregate_id) \
             VALUES (?, ?, ?, ?, ?)"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::event_store(e.to_string()))?;

        for event in events {
            sqlx::query(&insert)
                .bind(event.event_type())
                .bind(event.data())
                .bind(event.version() as i64)
                .bind(event.timestamp().timestamp())
                .bind(event.aggregate_id())
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    DomainError::event_store(format!(
                        "storing aggregate {} version {}: {e}",
                        event.aggregate_id(),
                        event.version()
                    ))
                })?;
        }

        tx.commit()
            .await
            .map_err(|e| DomainError::event_store(e.to_string()))
    }

    async fn load(
        &self,
        aggregate_id: &str,
        options: LoadEventsOptions,
    ) -> DomainResult<Vec<Event>> {
        let table = self.table()?;

        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "SELECT type, data, version, timestamp FROM {table} WHERE aggregate_id = "
        ));
        builder.push_bind(aggregate_id.to_string());

        if let Some(min) = options.min_version {
            builder.push(" AND version >= ");
            builder.push_bind(min as i64);
        }
        if let Some(max) = options.max_version {
            builder.push(" AND version <= ");
            builder.push_bind(max as i64);
        }
        if !options.event_types.is_empty() {
            builder.push(" AND type IN (");
            let mut types = builder.separated(", ");
            for event_type in &options.event_types {
                types.push_bind(event_type.clone());
            }
            builder.push(")");
        }
        if let Some(from) = options.from_time {
            builder.push(" AND timestamp >= ");
            builder.push_bind(from.timestamp());
        }
        if let Some(to) = options.to_time {
            builder.push(" AND timestamp <= ");
            builder.push_bind(to.timestamp());
        }
        builder.push(" ORDER BY version ASC");

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::event_store(e.to_string()))?;

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let event_type: String = row
                .try_get("type")
                .map_err(|e| DomainError::event_store(e.to_string()))?;
            let data: Vec<u8> = row
                .try_get("data")
                .map_err(|e| DomainError::event_store(e.to_string()))?;
            let version: i64 = row
                .try_get("version")
                .map_err(|e| DomainError::event_store(e.to_string()))?;
            let timestamp: i64 = row
                .try_get("timestamp")
                .map_err(|e| DomainError::event_store(e.to_string()))?;

            let timestamp = DateTime::from_timestamp(timestamp, 0)
                .ok_or_else(|| DomainError::event_store(format!("invalid timestamp {timestamp}")))?;

            events.push(
                Event::builder()
                    .event_type(event_type)
                    .data(data)
                    .version(version as u64)
                    .timestamp(timestamp)
                    .aggregate_id(aggregate_id.to_string())
                    .build(),
            );
        }

        Ok(events)
    }

    async fn replace(&self, aggregate_id: &str, version: u64, event: Event) -> DomainResult<()> {
        let table = self.table()?;

        if event.version() != version {
            return Err(DomainError::event_store(format!(
                "replacement event version {} does not match target version {version}",
                event.version()
            )));
        }

        let update = format!(
            "UPDATE {table} SET type = ?, data = ?, timestamp = ? \
             WHERE aggregate_id = ? AND version = ?"
        );
        let result = sqlx::query(&update)
            .bind(event.event_type())
            .bind(event.data())
            .bind(event.timestamp().timestamp())
            .bind(aggregate_id)
            .bind(version as i64)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::event_store(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::VersionNotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn event_store() -> SqlEventStore {
        // 单连接池：每个 SQLite 内存库绑定于其连接
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query(
            "CREATE TABLE events (
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
        .await
        .unwrap();

        SqlEventStore::new(pool, "events")
    }

    fn event(id: &str, event_type: &str, version: u64, at_unix: i64) -> Event {
        Event::builder()
            .event_type(event_type.to_string())
            .data(format!("payload-{version}").into_bytes())
            .version(version)
            .timestamp(DateTime::from_timestamp(at_unix, 0).unwrap())
            .aggregate_id(id.to_string())
            .build()
    }

    #[tokio::test]
    async fn store_and_load_in_version_order() {
        let store = event_store().await;
        store
            .store(&[
                event("a1", "created", 0, 1_000),
                event("a1", "renamed", 1, 2_000),
                event("a1", "renamed", 2, 3_000),
            ])
            .await
            .unwrap();

        let events = store
            .load("a1", LoadEventsOptions::default())
            .await
            .unwrap();

        assert_eq!(events.len(), 3);
        assert_eq!(
            events.iter().map(Event::version).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(events[0].event_type(), "created");
        assert_eq!(events[1].data(), b"payload-1");
        assert_eq!(events[2].timestamp().timestamp(), 3_000);
    }

    #[tokio::test]
    async fn duplicate_version_rolls_back_the_whole_batch() {
        let store = event_store().await;
        store
            .store(&[event("a1", "created", 0, 1_000)])
            .await
            .unwrap();

        let err = store
            .store(&[
                event("a1", "renamed", 1, 2_000),
                event("a1", "renamed", 0, 3_000),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::EventStore { .. }));

        // 整批都不可见
        let events = store
            .load("a1", LoadEventsOptions::default())
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn load_honors_version_bounds_inclusively() {
        let store = event_store().await;
        let history: Vec<Event> = (0..6)
            .map(|v| event("a1", "created", v, 1_000 + v as i64))
            .collect();
        store.store(&history).await.unwrap();

        let events = store
            .load(
                "a1",
                LoadEventsOptions::builder()
                    .min_version(1)
                    .max_version(4)
                    .build(),
            )
            .await
            .unwrap();

        assert_eq!(
            events.iter().map(Event::version).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
    }

    #[tokio::test]
    async fn load_honors_event_type_filter() {
        let store = event_store().await;
        store
            .store(&[
                event("a1", "created", 0, 1_000),
                event("a1", "renamed", 1, 2_000),
                event("a1", "archived", 2, 3_000),
            ])
            .await
            .unwrap();

        let events = store
            .load(
                "a1",
                LoadEventsOptions::builder()
                    .event_types(vec!["created".to_string(), "archived".to_string()])
                    .build(),
            )
            .await
            .unwrap();

        assert_eq!(
            events.iter().map(Event::version).collect::<Vec<_>>(),
            vec![0, 2]
        );
    }

    #[tokio::test]
    async fn load_honors_time_window() {
        let store = event_store().await;
        store
            .store(&[
                event("a1", "created", 0, 1_000),
                event("a1", "renamed", 1, 2_000),
                event("a1", "renamed", 2, 3_000),
            ])
            .await
            .unwrap();

        let events = store
            .load(
                "a1",
                LoadEventsOptions::builder()
                    .from_time(DateTime::from_timestamp(2_000, 0).unwrap())
                    .to_time(DateTime::from_timestamp(2_999, 0).unwrap())
                    .build(),
            )
            .await
            .unwrap();

        assert_eq!(
            events.iter().map(Event::version).collect::<Vec<_>>(),
            vec![1]
        );
    }

    #[tokio::test]
    async fn load_scopes_to_the_requested_aggregate() {
        let store = event_store().await;
        store
            .store(&[
                event("a1", "created", 0, 1_000),
                event("a2", "created", 0, 1_000),
            ])
            .await
            .unwrap();

        let events = store
            .load("a1", LoadEventsOptions::default())
            .await
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].aggregate_id(), "a1");
    }

    #[tokio::test]
    async fn replace_swaps_exactly_one_event() {
        let store = event_store().await;
        store
            .store(&[
                event("a1", "created", 0, 1_000),
                event("a1", "renamed", 1, 2_000),
                event("a1", "renamed", 2, 3_000),
            ])
            .await
            .unwrap();

        let replacement = Event::builder()
            .event_type("redacted".to_string())
            .data(b"gone".to_vec())
            .version(1)
            .timestamp(Utc::now())
            .aggregate_id("a1".to_string())
            .build();
        store.replace("a1", 1, replacement).await.unwrap();

        let events = store
            .load("a1", LoadEventsOptions::default())
            .await
            .unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[1].event_type(), "redacted");
        assert_eq!(events[1].data(), b"gone");
        assert_eq!(events[0].event_type(), "created");
    }

    #[tokio::test]
    async fn replace_rejects_version_mismatch_and_missing_rows() {
        let store = event_store().await;
        store
            .store(&[event("a1", "created", 0, 1_000)])
            .await
            .unwrap();

        let err = store
            .replace("a1", 1, event("a1", "redacted", 2, 2_000))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::EventStore { .. }));

        let err = store
            .replace("a1", 5, event("a1", "redacted", 5, 2_000))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::VersionNotFound));
    }

    #[tokio::test]
    async fn empty_table_name_is_a_precondition_failure() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SqlEventStore::new(pool, "");

        let err = store
            .load("a1", LoadEventsOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::TableNameNotSet));
    }
}
