//! Application state shared across request handlers.

use std::sync::Arc;

use draincache_core::{AggregateStore, Store};

/// Cheap-to-clone handle on the stores the HTTP surface reads from.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub aggregate: Arc<AggregateStore>,
}

impl AppState {
    pub fn new(store: Arc<Store>, aggregate: Arc<AggregateStore>) -> Self {
        Self { store, aggregate }
    }
}
