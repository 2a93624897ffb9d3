//! `feed store status|init`.

use anyhow::{Context, Result};
use feed_config::{FeedConfig, StorageSelection};
use feed_store::{FlatFileStore, OrderStore};

pub async fn status(cfg: &FeedConfig) -> Result<()> {
    let sel = super::selection(cfg)?;
    println!("backend={}", sel.label());

    match &sel {
        StorageSelection::Relational {
            url,
            max_connections,
        } => {
            let pool = feed_db::connect(url, *max_connections).await?;
            let s = feed_db::status(&pool).await?;
            println!(
                "db_ok={} has_orders_table={} orders={}",
                s.ok, s.has_orders_table, s.order_count
            );
        }
        StorageSelection::FlatFile { path } => {
            println!("path={}", path.display());
            if !path.exists() {
                println!("exists=false orders=0");
                return Ok(());
            }
            // Opening an existing file does not write to it.
            let store = FlatFileStore::open(path)
                .with_context(|| format!("failed to open '{}'", path.display()))?;
            let n = store.load_all().await?.len();
            println!("exists=true orders={n}");
        }
    }
    Ok(())
}

pub async fn init(cfg: &FeedConfig) -> Result<()> {
    let sel = super::selection(cfg)?;
    let store = feed_db::open_store(&sel).await?;
    println!("initialized=true backend={}", store.kind().as_str());
    Ok(())
}
