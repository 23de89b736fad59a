use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One OHLCV bar of a symbol at a given resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PricePoint {
    pub symbol: String,
    pub resolution: String,
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Daily close used for indicator computations.
#[derive(Debug, Clone, FromRow)]
pub struct SymbolClose {
    pub symbol: String,
    pub close: f64,
}
