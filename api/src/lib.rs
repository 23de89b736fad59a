//! HTTP surface of the stock price service: price queries against the store
//! and a single-flight trigger for the background puller.

pub mod endpoints;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod task_guard;
pub mod timestamp;

pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
pub use task_guard::PullGuard;
