//! SQLite-backed durable store for detected mints, executed trades and
//! simulated buys.
//!
//! Detected mint events are keyed by mint address with last-write-wins
//! semantics; there is no dedup guard upstream, so a mint seen twice simply
//! overwrites its record. Trade and simulation records are append-only.
//! SQLite gives record-level atomicity for the concurrent writers; no
//! cross-process locking is assumed.

use anyhow::{Context, Result};
use sqlx::{sqlite::SqlitePoolOptions, FromRow, Pool, Sqlite};
use tracing::info;

use crate::types::{now_millis, MintEvent};

/// Side of an executed trade as recorded in the trade log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
        }
    }
}

/// One confirmed trade, as persisted.
#[derive(Debug, Clone, FromRow)]
pub struct TradeRow {
    pub id: i64,
    pub timestamp: i64,
    pub side: String,
    pub mint: String,
    pub signature: String,
}

/// One simulated buy, as persisted.
#[derive(Debug, Clone, FromRow)]
pub struct SimulationRow {
    pub id: i64,
    pub timestamp: i64,
    pub mint: String,
    pub bonding_curve: String,
    pub associated_bonding_curve: String,
}

#[derive(FromRow)]
struct MintEventRow {
    mint: String,
    bonding_curve: String,
    associated_bonding_curve: String,
    payer: String,
    signature: String,
    created_at: i64,
}

impl MintEventRow {
    fn into_event(self) -> MintEvent {
        MintEvent {
            mint: self.mint,
            bonding_curve: self.bonding_curve,
            associated_bonding_curve: self.associated_bonding_curve,
            payer: self.payer,
            signature: self.signature,
            created_at: self.created_at as u64,
        }
    }
}

/// Persistent sink shared by the listener, the orchestrator and the
/// executors.
pub struct TradeLedger {
    pool: Pool<Sqlite>,
}

impl TradeLedger {
    /// Open (or create) the ledger database at `db_path`.
    pub async fn open(db_path: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&format!("sqlite:{}?mode=rwc", db_path))
            .await
            .context("failed to connect to ledger database")?;
        Self::create_schema(&pool).await?;
        info!("trade ledger opened at {}", db_path);
        Ok(Self { pool })
    }

    /// In-memory ledger for tests. Single connection: each SQLite `:memory:`
    /// connection is its own database.
    pub async fn open_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .context("failed to open in-memory ledger")?;
        Self::create_schema(&pool).await?;
        Ok(Self { pool })
    }

    async fn create_schema(pool: &Pool<Sqlite>) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS mint_events (
                mint TEXT PRIMARY KEY,
                bonding_curve TEXT NOT NULL,
                associated_bonding_curve TEXT NOT NULL,
                payer TEXT NOT NULL,
                signature TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await
        .context("failed to create mint_events table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS trades (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp INTEGER NOT NULL,
                side TEXT NOT NULL,
                mint TEXT NOT NULL,
                signature TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await
        .context("failed to create trades table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS simulations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp INTEGER NOT NULL,
                mint TEXT NOT NULL,
                bonding_curve TEXT NOT NULL,
                associated_bonding_curve TEXT NOT NULL
            );
            "#,
        )
        .execute(pool)
        .await
        .context("failed to create simulations table")?;

        Ok(())
    }

    /// Record a detected mint, keyed by mint address. Last write wins.
    pub async fn record_mint_event(&self, event: &MintEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO mint_events
                (mint, bonding_curve, associated_bonding_curve, payer, signature, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(mint) DO UPDATE SET
                bonding_curve = excluded.bonding_curve,
                associated_bonding_curve = excluded.associated_bonding_curve,
                payer = excluded.payer,
                signature = excluded.signature,
                created_at = excluded.created_at
            "#,
        )
        .bind(&event.mint)
        .bind(&event.bonding_curve)
        .bind(&event.associated_bonding_curve)
        .bind(&event.payer)
        .bind(&event.signature)
        .bind(event.created_at as i64)
        .execute(&self.pool)
        .await
        .context("failed to record mint event")?;
        Ok(())
    }

    /// Load a detected mint event by mint address.
    pub async fn get_mint_event(&self, mint: &str) -> Result<Option<MintEvent>> {
        let row: Option<MintEventRow> = sqlx::query_as(
            r#"
            SELECT mint, bonding_curve, associated_bonding_curve, payer, signature, created_at
            FROM mint_events WHERE mint = ?
            "#,
        )
        .bind(mint)
        .fetch_optional(&self.pool)
        .await
        .context("failed to load mint event")?;
        Ok(row.map(MintEventRow::into_event))
    }

    /// Append one confirmed trade to the trade log.
    pub async fn record_trade(&self, side: TradeSide, mint: &str, signature: &str) -> Result<()> {
        sqlx::query("INSERT INTO trades (timestamp, side, mint, signature) VALUES (?, ?, ?, ?)")
            .bind(now_millis() as i64)
            .bind(side.as_str())
            .bind(mint)
            .bind(signature)
            .execute(&self.pool)
            .await
            .context("failed to record trade")?;
        Ok(())
    }

    /// Append one simulated buy to the simulation log.
    pub async fn record_simulation(&self, event: &MintEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO simulations (timestamp, mint, bonding_curve, associated_bonding_curve)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(now_millis() as i64)
        .bind(&event.mint)
        .bind(&event.bonding_curve)
        .bind(&event.associated_bonding_curve)
        .execute(&self.pool)
        .await
        .context("failed to record simulated buy")?;
        Ok(())
    }

    /// All trades in insertion order.
    pub async fn trades(&self) -> Result<Vec<TradeRow>> {
        sqlx::query_as("SELECT id, timestamp, side, mint, signature FROM trades ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .context("failed to load trades")
    }

    /// All simulated buys in insertion order.
    pub async fn simulations(&self) -> Result<Vec<SimulationRow>> {
        sqlx::query_as(
            r#"
            SELECT id, timestamp, mint, bonding_curve, associated_bonding_curve
            FROM simulations ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("failed to load simulations")
    }
}
