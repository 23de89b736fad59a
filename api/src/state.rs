use std::sync::Arc;

use shared::{PullerFactory, StockStore};

use crate::task_guard::PullGuard;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn StockStore>,
    pub pull_guard: Arc<PullGuard>,
}

impl AppState {
    pub fn new(store: Arc<dyn StockStore>, puller_factory: Arc<dyn PullerFactory>) -> Self {
        Self {
            store,
            pull_guard: Arc::new(PullGuard::new(puller_factory)),
        }
    }
}
