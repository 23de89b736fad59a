//! Technical indicators computed over stored price history

pub mod macd;

pub use macd::{Macd, MacdOutput};
