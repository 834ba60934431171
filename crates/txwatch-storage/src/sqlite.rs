//! SQLite address index.
//!
//! Persists every record as one row; an address's sequence is its rows in
//! insertion (rowid) order. Uses `sqlx` with WAL mode for concurrent reads.
//!
//! # Usage
//! ```rust,no_run
//! use txwatch_storage::sqlite::SqliteAddressIndex;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // File-backed (persistent)
//! let index = SqliteAddressIndex::open("./txwatch.db").await?;
//!
//! // In-memory (tests / ephemeral)
//! let index = SqliteAddressIndex::in_memory().await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use txwatch_core::error::IndexError;
use txwatch_core::store::AddressIndex;
use txwatch_core::types::{Direction, TxRecord};

/// SQLite-backed address index.
pub struct SqliteAddressIndex {
    pool: SqlitePool,
}

fn storage_err(e: sqlx::Error) -> IndexError {
    IndexError::Storage(e.to_string())
}

fn kind_to_str(kind: Direction) -> &'static str {
    match kind {
        Direction::Inbound => "inbound",
        Direction::Outbound => "outbound",
        Direction::Unspecified => "",
    }
}

fn kind_from_str(s: &str) -> Direction {
    match s {
        "inbound" => Direction::Inbound,
        "outbound" => Direction::Outbound,
        _ => Direction::Unspecified,
    }
}

impl SqliteAddressIndex {
    /// Open (or create) a SQLite database at `path`.
    ///
    /// The path may be a plain file path (`"./txwatch.db"`) or a full
    /// SQLite URL (`"sqlite:./txwatch.db?mode=rwc"`).
    pub async fn open(path: &str) -> Result<Self, IndexError> {
        let url = if path.starts_with("sqlite:") {
            path.to_string()
        } else {
            format!("sqlite:{path}?mode=rwc")
        };

        let pool = SqlitePool::connect(&url).await.map_err(storage_err)?;
        let index = Self { pool };
        index.init_schema().await?;
        Ok(index)
    }

    /// Open an in-memory SQLite database.
    ///
    /// The pool is pinned to one connection, since every connection to
    /// `sqlite::memory:` gets its own empty database.
    pub async fn in_memory() -> Result<Self, IndexError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(storage_err)?;

        let index = Self { pool };
        index.init_schema().await?;
        Ok(index)
    }

    async fn init_schema(&self) -> Result<(), IndexError> {
        sqlx::query("PRAGMA journal_mode=WAL;")
            .execute(&self.pool)
            .await
            .map_err(storage_err)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS address_records (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                address      TEXT    NOT NULL,
                block_height TEXT    NOT NULL,
                hash         TEXT    NOT NULL,
                from_address TEXT    NOT NULL,
                to_address   TEXT    NOT NULL,
                kind         TEXT    NOT NULL
            );",
        )
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_address_records_address
             ON address_records (address, id);",
        )
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        Ok(())
    }
}

#[async_trait]
impl AddressIndex for SqliteAddressIndex {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn append(&self, address: &str, record: TxRecord) -> Result<(), IndexError> {
        sqlx::query(
            "INSERT INTO address_records
             (address, block_height, hash, from_address, to_address, kind)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(address)
        .bind(&record.block_height)
        .bind(&record.hash)
        .bind(&record.from)
        .bind(&record.to)
        .bind(kind_to_str(record.kind))
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;

        debug!(address, hash = %record.hash, "record stored");
        Ok(())
    }

    async fn get(&self, address: &str) -> Result<Vec<TxRecord>, IndexError> {
        let rows = sqlx::query(
            "SELECT block_height, hash, from_address, to_address, kind
             FROM address_records WHERE address = ? ORDER BY id",
        )
        .bind(address)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;

        if rows.is_empty() {
            return Err(IndexError::NotFound(format!("address {address}")));
        }

        Ok(rows
            .into_iter()
            .map(|row| TxRecord {
                block_height: row.get("block_height"),
                hash: row.get("hash"),
                from: row.get("from_address"),
                to: row.get("to_address"),
                kind: kind_from_str(row.get::<&str, _>("kind")),
            })
            .collect())
    }

    async fn keys(&self) -> Result<Vec<String>, IndexError> {
        let rows = sqlx::query("SELECT DISTINCT address FROM address_records")
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err)?;

        Ok(rows.into_iter().map(|r| r.get("address")).collect())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(hash: &str, kind: Direction) -> TxRecord {
        TxRecord {
            block_height: "0x12fd689".into(),
            hash: hash.into(),
            from: "0x1111111111111111111111111111111111111111".into(),
            to: "0x2222222222222222222222222222222222222222".into(),
            kind,
        }
    }

    #[tokio::test]
    async fn append_and_get_in_order() {
        let index = SqliteAddressIndex::in_memory().await.unwrap();
        index.append("0xa", rec("0x1", Direction::Outbound)).await.unwrap();
        index.append("0xb", rec("0x1", Direction::Inbound)).await.unwrap();
        index.append("0xa", rec("0x2", Direction::Inbound)).await.unwrap();

        let a = index.get("0xa").await.unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(a[0], rec("0x1", Direction::Outbound));
        assert_eq!(a[1], rec("0x2", Direction::Inbound));
    }

    #[tokio::test]
    async fn marker_survives_storage() {
        let index = SqliteAddressIndex::in_memory().await.unwrap();
        index.append("0xa", TxRecord::marker()).await.unwrap();

        let a = index.get("0xa").await.unwrap();
        assert_eq!(a.len(), 1);
        assert!(a[0].is_marker());
    }

    #[tokio::test]
    async fn missing_address_is_not_found() {
        let index = SqliteAddressIndex::in_memory().await.unwrap();
        assert!(index.get("0xnobody").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn keys_are_distinct() {
        let index = SqliteAddressIndex::in_memory().await.unwrap();
        index.append("0xa", rec("0x1", Direction::Outbound)).await.unwrap();
        index.append("0xa", rec("0x2", Direction::Outbound)).await.unwrap();
        index.append("0xb", TxRecord::marker()).await.unwrap();

        let mut keys = index.keys().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["0xa", "0xb"]);
    }
}
