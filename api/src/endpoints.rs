//! Routing table

pub const START: &str = "/start";
pub const IS_RUNNING: &str = "/is_running";
pub const SYMBOLS: &str = "/symbols";
pub const HISTORY: &str = "/history";
pub const SYMBOL_PRICES: &str = "/symbol_prices";
pub const BY_MACD: &str = "/by_macd";
pub const INDUSTRY: &str = "/industry";
pub const LAST_PRICE: &str = "/last_price";
pub const HEALTH: &str = "/health";
