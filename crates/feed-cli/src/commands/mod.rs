//! Command handler modules for feed-cli.
//!
//! Shared utilities used by multiple command paths live here.
//! Command-specific logic lives in the submodules.

pub mod orders;
pub mod store;

use anyhow::{Context, Result};
use feed_config::{
    load_from_env, load_layered_yaml, resolve_storage, FeedConfig, LoadedConfig,
    StorageSelection,
};
use feed_orders::{OrderSelector, ValidationError};
use feed_schemas::OrderId;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// `--config` paths win over `$FEED_CONFIG`.
pub fn load_config(paths: &[String]) -> Result<LoadedConfig> {
    if paths.is_empty() {
        return load_from_env();
    }
    let refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    load_layered_yaml(&refs)
}

pub fn selection(cfg: &FeedConfig) -> Result<StorageSelection> {
    resolve_storage(&cfg.storage, |k| std::env::var(k).ok())
}

pub async fn open_service(cfg: &FeedConfig) -> Result<feed_orders::OrderService> {
    let sel = selection(cfg)?;
    let store = feed_db::open_store(&sel)
        .await
        .with_context(|| format!("failed to open {} store", sel.label()))?;
    Ok(feed_orders::OrderService::new(store, &cfg.orders.done_note))
}

/// Exactly one of `--id` / `--customer` picks the order.
pub fn selector(id: Option<i64>, customer: Option<String>) -> Result<OrderSelector> {
    match (id, customer) {
        (Some(id), _) => Ok(OrderSelector::Id(OrderId(id))),
        (None, Some(c)) if !c.trim().is_empty() => Ok(OrderSelector::Customer(c.trim().to_string())),
        _ => Err(ValidationError::EmptySelector.into()),
    }
}
