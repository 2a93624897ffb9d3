//! Scenario: a failing insert inside replace_all rolls the whole
//! transaction back. The table keeps its previous contents; it never holds
//! a mix of old and new rows.
//!
//! The failure is provoked with a negative quantity, which the table's
//! CHECK constraint rejects.
//!
//! DB-backed test, skipped if DATABASE_URL is not set.

use anyhow::Result;
use chrono::NaiveDate;
use feed_db::PgOrderStore;
use feed_schemas::OrderFields;
use feed_store::{OrderStore, StoreError};

fn order(customer: &str, qty: f64) -> OrderFields {
    OrderFields {
        customer: customer.to_string(),
        delivery_date: NaiveDate::from_ymd_opt(2099, 3, 1).unwrap(),
        feed_type: "Wheat".to_string(),
        quantity: qty,
        status_note: String::new(),
    }
}

#[tokio::test]
async fn pg_replace_all_failure_keeps_previous_state() -> Result<()> {
    let url = match std::env::var(feed_db::ENV_DB_URL) {
        Ok(v) => v,
        Err(_) => {
            eprintln!("SKIP: DATABASE_URL not set");
            return Ok(());
        }
    };

    let store = PgOrderStore::open(&url, 2).await?;
    store
        .replace_all(&[order("Keep 1", 1.0), order("Keep 2", 2.0)])
        .await?;

    let err = store
        .replace_all(&[order("New 1", 5.0), order("Bad", -1.0), order("New 3", 6.0)])
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Database(_)), "got {err:?}");

    let customers: Vec<String> = store
        .load_all()
        .await?
        .into_iter()
        .map(|r| r.customer)
        .collect();
    assert_eq!(customers, vec!["Keep 1", "Keep 2"]);

    store.replace_all(&[]).await?;
    Ok(())
}
