//! Endpoint handlers. Every body is `{"response": ...}`.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;
use crate::timestamp::parse_timestamp;

type ApiResult = Result<Json<Value>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct HistoryRequest {
    pub symbol: Option<String>,
    pub resolution: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SymbolPricesRequest {
    pub symbol: Option<String>,
    pub start_operation: Option<String>,
    pub end_operation: Option<String>,
    pub resolution: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SymbolRequest {
    pub symbol: Option<String>,
}

fn respond<T: Serialize>(value: T) -> Json<Value> {
    Json(json!({ "response": value }))
}

/// Empty collections go out as `null`, not `[]`.
fn respond_list<T: Serialize>(items: Vec<T>) -> Json<Value> {
    if items.is_empty() {
        respond(Value::Null)
    } else {
        respond(items)
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, ApiError> {
    value.ok_or(ApiError::MissingField(field))
}

pub async fn health_check() -> Json<Value> {
    respond("ok")
}

pub async fn start_puller(State(state): State<AppState>) -> ApiResult {
    state.pull_guard.start().await?;
    Ok(respond("Puller started"))
}

pub async fn is_running(State(state): State<AppState>) -> Json<Value> {
    respond(state.pull_guard.status().await)
}

pub async fn get_symbols(State(state): State<AppState>) -> ApiResult {
    let symbols = state
        .store
        .select_stocks()
        .await?
        .ok_or(ApiError::NotFound)?;

    info!("List of symbols retrieved");
    Ok(respond_list(symbols))
}

pub async fn get_history(
    State(state): State<AppState>,
    Json(request): Json<HistoryRequest>,
) -> ApiResult {
    let symbol = required(request.symbol, "symbol")?;
    let resolution = required(request.resolution, "resolution")?;

    let prices = state
        .store
        .select_history(&symbol, &resolution)
        .await?
        .ok_or(ApiError::NotFound)?;

    info!("Prices for symbol {} on resolution {} retrieved", symbol, resolution);
    Ok(respond_list(prices))
}

pub async fn get_symbol_prices(
    State(state): State<AppState>,
    Json(request): Json<SymbolPricesRequest>,
) -> ApiResult {
    let symbol = required(request.symbol, "symbol")?;
    let start = parse_timestamp(&required(request.start_operation, "start_operation")?)?;
    let end = request
        .end_operation
        .as_deref()
        .map(parse_timestamp)
        .transpose()?;
    let resolution = required(request.resolution, "resolution")?;

    let prices = state
        .store
        .select_symbol_prices(&symbol, start, end, &resolution)
        .await?
        .ok_or(ApiError::NotFound)?;

    info!("Prices for symbol {} on resolution {} retrieved", symbol, resolution);
    Ok(respond_list(prices))
}

pub async fn get_by_macd(State(state): State<AppState>) -> ApiResult {
    let stocks = state
        .store
        .select_recommendations_by_macd()
        .await?
        .ok_or(ApiError::NotFound)?;

    info!("Recommended stocks by MACD pulled");
    Ok(respond_list(stocks))
}

pub async fn get_symbol_industry(
    State(state): State<AppState>,
    Json(request): Json<SymbolRequest>,
) -> ApiResult {
    let symbol = required(request.symbol, "symbol")?;

    let industry = state
        .store
        .select_symbol_industry(&symbol)
        .await?
        .ok_or(ApiError::NotFound)?;

    info!("Stock industry pulled");
    Ok(respond(industry))
}

pub async fn get_symbol_last_price(
    State(state): State<AppState>,
    Json(request): Json<SymbolRequest>,
) -> ApiResult {
    let symbol = required(request.symbol, "symbol")?;

    let price = state
        .store
        .select_symbol_last_price(&symbol)
        .await?
        .ok_or(ApiError::NotFound)?;

    info!("Last stock close price pulled");
    Ok(respond(as_float(&price)))
}

/// Only genuine floating-point values pass; integers and strings become `null`.
fn as_float(value: &Value) -> Option<f64> {
    if value.is_f64() {
        value.as_f64()
    } else {
        None
    }
}
