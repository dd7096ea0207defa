//! SQLite 快照存储（SqlSnapshotStore）
//!
//! 每个聚合 ID 一行，upsert 语义；每种聚合类型使用独立的表：
//!
//! ```sql
//! CREATE TABLE snapshots (
//!     id TEXT PRIMARY KEY,
//!     version INTEGER NOT NULL,
//!     data BLOB NOT NULL,
//!     timestamp INTEGER NOT NULL
//! );
//! ```
//!
use async_trait::async_trait;
use chronicle_domain::error::{DomainError, DomainResult};
use chronicle_domain::sourcing::{Snapshot, SnapshotStore};
use chrono::DateTime;
use sqlx::{Row, SqlitePool};

/// 以 SQLite 为后端的快照存储
pub struct SqlSnapshotStore {
    pool: SqlitePool,
    table: String,
}

impl SqlSnapshotStore {
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
impl SnapshotStore for SqlSnapshotStore {
    async fn load(&self, id: &str) -> DomainResult<Option<Snapshot>> {
        let table = self.table()?;
        let select = format!("SELECT version, data, timestamp FROM {table} WHERE id = ?");

        let row = sqlx::query(&select)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::snapshot_store(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let version: i64 = row
            .try_get("version")
            .map_err(|e| DomainError::snapshot_store(e.to_string()))?;
        let data: Vec<u8> = row
            .try_get("data")
            .map_err(|e| DomainError::snapshot_store(e.to_string()))?;
        let timestamp: i64 = row
            .try_get("timestamp")
            .map_err(|e| DomainError::snapshot_store(e.to_string()))?;

        let timestamp = DateTime::from_timestamp(timestamp, 0)
            .ok_or_else(|| DomainError::snapshot_store(format!("invalid timestamp {timestamp}")))?;

        Ok(Some(
            Snapshot::builder()
                .id(id.to_string())
                .version(version as u64)
                .data(data)
                .timestamp(timestamp)
                .build(),
        ))
    }

    async fn store(&self, aggregate_id: &str, snapshot: Snapshot) -> DomainResult<()> {
        let table = self.table()?;
        let upsert = format!(
            "INSERT INTO {table} (id, version, data, timestamp) VALUES (?, ?, ?, ?) \
             ON CONFLICT (id) DO UPDATE SET \
             version = excluded.version, data = excluded.data, timestamp = excluded.timestamp"
        );

        sqlx::query(&upsert)
            .bind(aggregate_id)
            .bind(snapshot.version as i64)
            .bind(&snapshot.data)
            .bind(snapshot.timestamp.timestamp())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::snapshot_store(e.to_string()))?;

        Ok(())
    }

    async fn delete(&self, aggregate_id: &str) -> DomainResult<()> {
        let table = self.table()?;
        let delete = format!("DELETE FROM {table} WHERE id = ?");

        sqlx::query(&delete)
            .bind(aggregate_id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::snapshot_store(e.to_string()))?;

        Ok(())
    }
}
