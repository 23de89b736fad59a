use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::endpoints;
use crate::handlers;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    // Browser dashboards call the API directly from any origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(endpoints::HEALTH, get(handlers::health_check))
        .route(endpoints::START, get(handlers::start_puller))
        .route(endpoints::IS_RUNNING, get(handlers::is_running))
        .route(endpoints::SYMBOLS, get(handlers::get_symbols))
        .route(endpoints::HISTORY, post(handlers::get_history))
        .route(endpoints::SYMBOL_PRICES, post(handlers::get_symbol_prices))
        .route(endpoints::BY_MACD, get(handlers::get_by_macd))
        .route(endpoints::INDUSTRY, post(handlers::get_symbol_industry))
        .route(endpoints::LAST_PRICE, post(handlers::get_symbol_last_price))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
