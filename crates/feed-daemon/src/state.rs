//! Shared runtime state for feed-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The only persistent
//! state is behind the order service's store; nothing here caches orders.

use std::sync::Arc;

use feed_orders::OrderService;
use feed_store::OrderStore;
use serde::Serialize;

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

/// Static build metadata included in health responses.
#[derive(Clone, Debug, Serialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            service: "feed-daemon",
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub build: BuildInfo,
    pub orders: OrderService,
}

impl AppState {
    pub fn new(orders: OrderService) -> Self {
        Self {
            build: BuildInfo::default(),
            orders,
        }
    }

    /// State over `store` with the given completion note.
    pub fn with_store(store: Arc<dyn OrderStore>, done_note: &str) -> Self {
        Self::new(OrderService::new(store, done_note))
    }
}
