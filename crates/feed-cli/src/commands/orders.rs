//! `feed orders ...`: thin wrappers over [`OrderService`] that print
//! `key=value` lines.

use anyhow::{Context, Result};
use feed_orders::{OrderForm, OrderSelector, OrderService};
use feed_store::FlatFileStore;

pub async fn list(svc: &OrderService, json: bool) -> Result<()> {
    let views = svc.list_orders().await;
    if json {
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }
    for v in views {
        println!(
            "id={} date={} days_left={} tag={} customer={:?} feed_type={:?} quantity={} note={:?}",
            v.id,
            v.delivery_date,
            v.days_left,
            v.tag.as_str(),
            v.customer,
            v.feed_type,
            v.quantity,
            v.status_note
        );
    }
    Ok(())
}

pub async fn totals(svc: &OrderService) {
    for (feed_type, kg) in svc.totals().await {
        println!("{feed_type}={kg}");
    }
}

pub async fn add(svc: &OrderService, form: &OrderForm) -> Result<()> {
    let applied = svc.add(form).await?;
    println!("added=true id={}", applied.id());
    Ok(())
}

pub async fn edit(svc: &OrderService, sel: &OrderSelector, form: &OrderForm) -> Result<()> {
    let applied = svc.edit(sel, form).await?;
    println!("updated=true id={}", applied.id());
    Ok(())
}

pub async fn mark_done(svc: &OrderService, sel: &OrderSelector) -> Result<()> {
    let applied = svc.mark_done(sel).await?;
    println!("done=true id={}", applied.id());
    Ok(())
}

pub async fn delete(svc: &OrderService, sel: &OrderSelector) -> Result<()> {
    let applied = svc.delete(sel).await?;
    println!("deleted=true id={}", applied.id());
    Ok(())
}

pub async fn export(svc: &OrderService, path: &str) -> Result<()> {
    let target =
        FlatFileStore::open(path).with_context(|| format!("failed to open export file '{path}'"))?;
    let n = svc.export_to(&target).await?;
    println!("exported={n} path={path}");
    Ok(())
}
