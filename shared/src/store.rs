//! Read access to the price store.
//!
//! Every query distinguishes "no rows" (`Ok(None)`) from "query failed"
//! (`Err(StoreError)`), so callers never have to guess what an empty answer
//! means.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;
use tracing::debug;

use crate::indicators::Macd;
use crate::models::{PricePoint, SymbolClose};

/// How many recent daily closes feed the MACD screen.
const MACD_LOOKBACK_BARS: i64 = 200;

const DAILY_RESOLUTION: &str = "D";

const LAST_DAILY_CLOSE: &str =
    "SELECT close FROM prices WHERE symbol = $1 AND resolution = $2 ORDER BY time DESC LIMIT 1";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("indicator computation failed: {0}")]
    Indicator(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait StockStore: Send + Sync {
    /// All known ticker symbols.
    async fn select_stocks(&self) -> StoreResult<Option<Vec<String>>>;

    /// Full price history of `symbol` at `resolution`, oldest first.
    async fn select_history(
        &self,
        symbol: &str,
        resolution: &str,
    ) -> StoreResult<Option<Vec<PricePoint>>>;

    /// Prices of `symbol` between `start` and `end`; `end = None` means up to now.
    async fn select_symbol_prices(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
        resolution: &str,
    ) -> StoreResult<Option<Vec<PricePoint>>>;

    /// Symbols whose MACD line just crossed above the signal line.
    async fn select_recommendations_by_macd(&self) -> StoreResult<Option<Vec<String>>>;

    async fn select_symbol_industry(&self, symbol: &str) -> StoreResult<Option<String>>;

    /// Latest daily close of `symbol`, as the raw value the store holds.
    async fn select_symbol_last_price(&self, symbol: &str) -> StoreResult<Option<Value>>;
}

/// `StockStore` backed by PostgreSQL/TimescaleDB.
#[derive(Clone)]
pub struct TimescaleStore {
    pool: PgPool,
}

impl TimescaleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn symbol_exists(&self, symbol: &str) -> StoreResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM stocks WHERE symbol = $1)")
                .bind(symbol)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}

#[async_trait]
impl StockStore for TimescaleStore {
    async fn select_stocks(&self) -> StoreResult<Option<Vec<String>>> {
        let symbols: Vec<String> = sqlx::query_scalar("SELECT symbol FROM stocks ORDER BY symbol")
            .fetch_all(&self.pool)
            .await?;
        Ok(non_empty(symbols))
    }

    async fn select_history(
        &self,
        symbol: &str,
        resolution: &str,
    ) -> StoreResult<Option<Vec<PricePoint>>> {
        let prices = sqlx::query_as::<_, PricePoint>(
            r#"
            SELECT symbol, resolution, time, open, high, low, close, volume
            FROM prices
            WHERE symbol = $1 AND resolution = $2
            ORDER BY time
            "#,
        )
        .bind(symbol)
        .bind(resolution)
        .fetch_all(&self.pool)
        .await?;

        debug!("history {} {}: {} rows", symbol, resolution, prices.len());
        Ok(non_empty(prices))
    }

    async fn select_symbol_prices(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
        resolution: &str,
    ) -> StoreResult<Option<Vec<PricePoint>>> {
        if !self.symbol_exists(symbol).await? {
            return Ok(None);
        }

        let prices = sqlx::query_as::<_, PricePoint>(
            r#"
            SELECT symbol, resolution, time, open, high, low, close, volume
            FROM prices
            WHERE symbol = $1
              AND resolution = $2
              AND time >= $3
              AND time <= COALESCE($4::timestamptz, now())
            ORDER BY time
            "#,
        )
        .bind(symbol)
        .bind(resolution)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(prices))
    }

    async fn select_recommendations_by_macd(&self) -> StoreResult<Option<Vec<String>>> {
        let rows = sqlx::query_as::<_, SymbolClose>(
            r#"
            SELECT symbol, close
            FROM (
                SELECT symbol, time, close,
                       row_number() OVER (PARTITION BY symbol ORDER BY time DESC) AS rn
                FROM prices
                WHERE resolution = $1
            ) recent
            WHERE rn <= $2
            ORDER BY symbol, time
            "#,
        )
        .bind(DAILY_RESOLUTION)
        .bind(MACD_LOOKBACK_BARS)
        .fetch_all(&self.pool)
        .await?;

        let mut recommended = Vec::new();
        for (symbol, closes) in group_closes(rows) {
            let crossed = Macd::bullish_crossover(&closes)
                .map_err(|e| StoreError::Indicator(e.to_string()))?;
            if crossed {
                recommended.push(symbol);
            }
        }

        Ok(Some(recommended))
    }

    async fn select_symbol_industry(&self, symbol: &str) -> StoreResult<Option<String>> {
        let industry: Option<Option<String>> =
            sqlx::query_scalar("SELECT industry FROM stocks WHERE symbol = $1")
                .bind(symbol)
                .fetch_optional(&self.pool)
                .await?;
        Ok(industry.flatten())
    }

    async fn select_symbol_last_price(&self, symbol: &str) -> StoreResult<Option<Value>> {
        let close: Option<f64> = sqlx::query_scalar(LAST_DAILY_CLOSE)
        .bind(symbol)
        .bind(DAILY_RESOLUTION)
        .fetch_optional(&self.pool)
        .await?;
        Ok(close.map(Value::from))
    }
}

fn non_empty<T>(rows: Vec<T>) -> Option<Vec<T>> {
    if rows.is_empty() {
        None
    } else {
        Some(rows)
    }
}

/// Groups rows already ordered by symbol into one close series per symbol.
fn group_closes(rows: Vec<SymbolClose>) -> Vec<(String, Vec<f64>)> {
    let mut grouped: Vec<(String, Vec<f64>)> = Vec::new();
    for row in rows {
        match grouped.last_mut() {
            Some((symbol, closes)) if *symbol == row.symbol => closes.push(row.close),
            _ => grouped.push((row.symbol, vec![row.close])),
        }
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(symbol: &str, close: f64) -> SymbolClose {
        SymbolClose {
            symbol: symbol.to_string(),
            close,
        }
    }

    #[test]
    fn test_group_closes_keeps_order() {
        let grouped = group_closes(vec![
            row("AAPL", 1.0),
            row("AAPL", 2.0),
            row("MSFT", 3.0),
        ]);

        assert_eq!(
            grouped,
            vec![
                ("AAPL".to_string(), vec![1.0, 2.0]),
                ("MSFT".to_string(), vec![3.0]),
            ]
        );
    }

    #[test]
    fn test_last_price_reads_daily_bars_only() {
        // Intraday bars share the table; ordering by time alone would pick them.
        assert!(LAST_DAILY_CLOSE.contains("resolution = $2"));
        assert_eq!(DAILY_RESOLUTION, "D");
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty::<i32>(vec![]), None);
        assert_eq!(non_empty(vec![1]), Some(vec![1]));
    }
}
