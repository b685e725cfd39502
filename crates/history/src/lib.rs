//! Append-only trade history on SQLite.
//!
//! Records are write-once rows; analysis of past trades happens out of band
//! with plain SQL, never inside the scan loop.

use async_trait::async_trait;
use sqlx::{Executor, SqlitePool};
use tracing::debug;

use common::{HistorySink, Result, TradeRecord};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS trades (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    action       TEXT NOT NULL,
    symbol       TEXT NOT NULL,
    side         TEXT NOT NULL,
    entry_price  REAL NOT NULL,
    amount       REAL NOT NULL,
    leverage     INTEGER NOT NULL,
    stop_price   REAL NOT NULL,
    target_price REAL NOT NULL,
    opened_at    TEXT NOT NULL,
    exit_price   REAL,
    pnl          REAL,
    reason       TEXT,
    recorded_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_trades_symbol ON trades(symbol);
"#;

pub struct SqliteHistory {
    pool: SqlitePool,
}

impl SqliteHistory {
    /// Ensure the schema exists and wrap the pool.
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        // Unprepared execute: the schema holds more than one statement
        pool.execute(SCHEMA).await?;
        Ok(Self { pool })
    }

    /// All records for one instrument, oldest first. Used by tests and
    /// offline reporting, not by the scan loop.
    pub async fn records_for(&self, symbol: &str) -> Result<Vec<TradeRecord>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT json_object(
                'action', action, 'symbol', symbol, 'side', side,
                'entry_price', entry_price, 'amount', amount, 'leverage', leverage,
                'stop_price', stop_price, 'target_price', target_price,
                'opened_at', opened_at, 'exit_price', exit_price, 'pnl', pnl,
                'reason', reason, 'recorded_at', recorded_at
            ) FROM trades WHERE symbol = ? ORDER BY id",
        )
        .bind(symbol)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|(json,)| serde_json::from_str(json).map_err(Into::into))
            .collect()
    }
}

#[async_trait]
impl HistorySink for SqliteHistory {
    async fn append(&self, record: &TradeRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO trades (
                action, symbol, side, entry_price, amount, leverage,
                stop_price, target_price, opened_at,
                exit_price, pnl, reason, recorded_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.action.to_string())
        .bind(&record.symbol)
        .bind(record.side.to_string())
        .bind(record.entry_price)
        .bind(record.amount)
        .bind(record.leverage)
        .bind(record.stop_price)
        .bind(record.target_price)
        .bind(record.opened_at.to_rfc3339())
        .bind(record.exit_price)
        .bind(record.pnl)
        .bind(record.reason.map(|r| r.to_string()))
        .bind(record.recorded_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        debug!(symbol = %record.symbol, action = %record.action, "trade recorded");
        Ok(())
    }
}
