pub mod config;
pub mod database;
pub mod entity;
pub mod finnhub;
pub mod indicators;
pub mod models;
pub mod puller;
pub mod store;

pub use config::{Config, PullConfig};
pub use database::{get_db_connection, get_pool};
pub use finnhub::FinnhubClient;
pub use models::*;
pub use puller::{FinnhubPullerFactory, Puller, PullerFactory};
pub use store::{StockStore, StoreError, StoreResult, TimescaleStore};
