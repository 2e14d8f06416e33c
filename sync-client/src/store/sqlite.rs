//! SQLite local store.

use super::{LocalStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use terrace_sync_types::{MappingEntry, OutboxOperation, Reservation, ReservationId};

/// SQLite-based local store.
///
/// Rows are stored as JSON payloads next to the columns the engine filters
/// on. Uses WAL mode so status queries do not block a running pass.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database file at `path`.
    ///
    /// Fails with [`StoreError::Unavailable`] if the file cannot be opened,
    /// e.g. when its directory does not exist or is not writable.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|source| StoreError::Unavailable {
                path: path.to_path_buf(),
                source,
            })?;

        let store = Self { pool };
        store.run_migrations().await?;
        tracing::debug!(path = %path.display(), "local store opened");
        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing).
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(":memory:")?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        // One connection that never expires: the database lives inside it.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|source| StoreError::Unavailable {
                path: ":memory:".into(),
                source,
            })?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Close the pool, flushing the WAL.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS reservations (
                id TEXT PRIMARY KEY,
                pending INTEGER NOT NULL,
                payload TEXT NOT NULL,
                stored_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS outbox (
                op_id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                payload TEXT NOT NULL,
                queued_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS id_mappings (
                client_id TEXT PRIMARY KEY,
                server_id TEXT NOT NULL,
                mapped_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_reservations_pending ON reservations(pending)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_outbox_queued_at ON outbox(queued_at)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

const UPSERT_RESERVATION: &str = r#"
    INSERT INTO reservations (id, pending, payload)
    VALUES (?1, ?2, ?3)
    ON CONFLICT(id) DO UPDATE SET
        pending = excluded.pending,
        payload = excluded.payload,
        stored_at = strftime('%s', 'now')
"#;

const UPSERT_OUTBOX: &str = r#"
    INSERT INTO outbox (op_id, kind, payload, queued_at)
    VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT(op_id) DO UPDATE SET
        kind = excluded.kind,
        payload = excluded.payload,
        queued_at = excluded.queued_at
"#;

const UPSERT_MAPPING: &str = r#"
    INSERT INTO id_mappings (client_id, server_id, mapped_at)
    VALUES (?1, ?2, ?3)
    ON CONFLICT(client_id) DO UPDATE SET
        server_id = excluded.server_id,
        mapped_at = excluded.mapped_at
"#;

#[async_trait]
impl LocalStore for SqliteStore {
    async fn upsert_reservation(&self, reservation: &Reservation) -> Result<(), StoreError> {
        let payload = serde_json::to_string(reservation)?;

        sqlx::query(UPSERT_RESERVATION)
            .bind(reservation.id.as_str())
            .bind(reservation.pending)
            .bind(payload)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn replace_reservations(&self, reservations: &[Reservation]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM reservations").execute(&mut *tx).await?;

        for reservation in reservations {
            let payload = serde_json::to_string(reservation)?;
            sqlx::query(UPSERT_RESERVATION)
                .bind(reservation.id.as_str())
                .bind(reservation.pending)
                .bind(payload)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_reservation(&self, id: &ReservationId) -> Result<Option<Reservation>, StoreError> {
        let payload: Option<String> =
            sqlx::query_scalar("SELECT payload FROM reservations WHERE id = ?1")
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await?;

        match payload {
            Some(p) => Ok(Some(serde_json::from_str(&p)?)),
            None => Ok(None),
        }
    }

    async fn delete_reservation(&self, id: &ReservationId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM reservations WHERE id = ?1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_reservations(&self) -> Result<Vec<Reservation>, StoreError> {
        let payloads: Vec<String> =
            sqlx::query_scalar("SELECT payload FROM reservations ORDER BY id ASC")
                .fetch_all(&self.pool)
                .await?;

        payloads
            .iter()
            .map(|p| serde_json::from_str(p).map_err(StoreError::from))
            .collect()
    }

    async fn stage_create(
        &self,
        reservation: &Reservation,
        operation: &OutboxOperation,
    ) -> Result<(), StoreError> {
        let reservation_payload = serde_json::to_string(reservation)?;
        let operation_payload = serde_json::to_string(operation)?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(UPSERT_RESERVATION)
            .bind(reservation.id.as_str())
            .bind(reservation.pending)
            .bind(reservation_payload)
            .execute(&mut *tx)
            .await?;

        sqlx::query(UPSERT_OUTBOX)
            .bind(operation.op_id())
            .bind(operation.kind().as_str())
            .bind(operation_payload)
            .bind(operation.queued_at().timestamp_millis())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn promote(
        &self,
        client_id: &ReservationId,
        server_id: &ReservationId,
        at: DateTime<Utc>,
    ) -> Result<Option<Reservation>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let payload: Option<String> =
            sqlx::query_scalar("SELECT payload FROM reservations WHERE id = ?1")
                .bind(client_id.as_str())
                .fetch_optional(&mut *tx)
                .await?;

        // Dropping the transaction rolls it back.
        let Some(payload) = payload else {
            return Ok(None);
        };

        let reservation: Reservation = serde_json::from_str(&payload)?;
        let promoted = reservation.promote(server_id.clone());
        let promoted_payload = serde_json::to_string(&promoted)?;

        sqlx::query("DELETE FROM reservations WHERE id = ?1")
            .bind(client_id.as_str())
            .execute(&mut *tx)
            .await?;

        sqlx::query(UPSERT_RESERVATION)
            .bind(promoted.id.as_str())
            .bind(promoted.pending)
            .bind(promoted_payload)
            .execute(&mut *tx)
            .await?;

        sqlx::query(UPSERT_MAPPING)
            .bind(client_id.as_str())
            .bind(server_id.as_str())
            .bind(at.timestamp_millis())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(promoted))
    }

    async fn enqueue(&self, operation: &OutboxOperation) -> Result<(), StoreError> {
        let payload = serde_json::to_string(operation)?;

        sqlx::query(UPSERT_OUTBOX)
            .bind(operation.op_id())
            .bind(operation.kind().as_str())
            .bind(payload)
            .bind(operation.queued_at().timestamp_millis())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_outbox(&self) -> Result<Vec<OutboxOperation>, StoreError> {
        let payloads: Vec<String> =
            sqlx::query_scalar("SELECT payload FROM outbox ORDER BY queued_at ASC, op_id ASC")
                .fetch_all(&self.pool)
                .await?;

        payloads
            .iter()
            .map(|p| serde_json::from_str(p).map_err(StoreError::from))
            .collect()
    }

    async fn remove_outbox(&self, op_ids: &[String]) -> Result<(), StoreError> {
        if op_ids.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for op_id in op_ids {
            sqlx::query("DELETE FROM outbox WHERE op_id = ?1")
                .bind(op_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn clear_outbox(&self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM outbox").execute(&self.pool).await?;
        Ok(())
    }

    async fn outbox_len(&self) -> Result<usize, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM outbox")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    async fn set_mapping(&self, entry: &MappingEntry) -> Result<(), StoreError> {
        sqlx::query(UPSERT_MAPPING)
            .bind(entry.client_id.as_str())
            .bind(entry.server_id.as_str())
            .bind(entry.mapped_at.timestamp_millis())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get_mapping(
        &self,
        client_id: &ReservationId,
    ) -> Result<Option<MappingEntry>, StoreError> {
        let row = sqlx::query_as::<_, MappingRow>(
            "SELECT client_id, server_id, mapped_at FROM id_mappings WHERE client_id = ?1",
        )
        .bind(client_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(MappingEntry::try_from).transpose()
    }
}

/// Internal row type for the mapping table.
#[derive(sqlx::FromRow)]
struct MappingRow {
    client_id: String,
    server_id: String,
    mapped_at: i64,
}

impl TryFrom<MappingRow> for MappingEntry {
    type Error = StoreError;

    fn try_from(row: MappingRow) -> Result<Self, Self::Error> {
        let mapped_at = DateTime::<Utc>::from_timestamp_millis(row.mapped_at).ok_or_else(|| {
            StoreError::Corrupt(format!(
                "mapping {} has invalid timestamp {}",
                row.client_id, row.mapped_at
            ))
        })?;

        Ok(MappingEntry::new(
            ReservationId::new(row.client_id),
            ReservationId::new(row.server_id),
            mapped_at,
        ))
    }
}
