//! Scenario: flat-file replace_all followed by load_all returns exactly the
//! written set, in write order.
//!
//! Pure filesystem test; no database required.

use chrono::NaiveDate;
use feed_schemas::{format_delivery_date, OrderFields};
use feed_store::{FlatFileStore, OrderStore, RawDate, StoreKind};

fn order(customer: &str, feed: &str, qty: f64, ymd: (i32, u32, u32), note: &str) -> OrderFields {
    OrderFields {
        customer: customer.to_string(),
        delivery_date: NaiveDate::from_ymd_opt(ymd.0, ymd.1, ymd.2).unwrap(),
        feed_type: feed.to_string(),
        quantity: qty,
        status_note: note.to_string(),
    }
}

#[tokio::test]
async fn replace_all_then_load_all_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = FlatFileStore::open(dir.path().join("orders.csv")).unwrap();
    assert_eq!(store.kind(), StoreKind::FlatFile);

    // Seed something that replace_all must discard.
    store
        .insert(&order("Old Farm", "Barley", 1.0, (2020, 1, 1), ""))
        .await
        .unwrap();

    let written = vec![
        order("Farm A", "Wheat", 100.0, (2099, 1, 1), ""),
        order("Farm B, North", "Corn", 12.5, (2030, 6, 15), "done"),
        order("Farm \"C\"", "Soy meal", 0.0, (2031, 2, 28), "call first"),
        // Surrounding whitespace is data: "done " is not the completion note.
        order(" Farm D ", " Oats", 3.0, (2032, 7, 7), "done "),
    ];
    store.replace_all(&written).await.unwrap();

    let loaded = store.load_all().await.unwrap();
    assert_eq!(loaded.len(), written.len());
    for (raw, w) in loaded.iter().zip(&written) {
        assert_eq!(raw.id, None, "flat file has no stored ids");
        assert_eq!(raw.customer, w.customer);
        assert_eq!(
            raw.delivery_date,
            RawDate::Text(format_delivery_date(w.delivery_date))
        );
        assert_eq!(raw.feed_type, w.feed_type);
        assert_eq!(raw.quantity, w.quantity);
        assert_eq!(raw.status_note, w.status_note);
    }
}

#[tokio::test]
async fn replace_all_with_empty_set_leaves_header_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("orders.csv");
    let store = FlatFileStore::open(&path).unwrap();
    store
        .insert(&order("Farm A", "Wheat", 1.0, (2099, 1, 1), ""))
        .await
        .unwrap();

    store.replace_all(&[]).await.unwrap();

    assert!(store.load_all().await.unwrap().is_empty());
    let body = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        body.trim_end(),
        "Customer/Farm,Delivery date,Feed type,Quantity (kg),Note"
    );
}
