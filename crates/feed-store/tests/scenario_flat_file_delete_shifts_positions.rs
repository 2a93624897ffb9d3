//! Scenario: flat-file ids are row positions.
//!
//! Deleting position 0 removes exactly the first row, and every later row
//! moves down by one. An id captured before the delete now points at a
//! different order (or at nothing). This drift is the documented behaviour
//! of the flat-file backend; relational storage does not have it.

use chrono::NaiveDate;
use feed_schemas::{OrderFields, OrderId};
use feed_store::{FlatFileStore, OrderStore};

fn order(customer: &str) -> OrderFields {
    OrderFields {
        customer: customer.to_string(),
        delivery_date: NaiveDate::from_ymd_opt(2099, 1, 1).unwrap(),
        feed_type: "Wheat".to_string(),
        quantity: 10.0,
        status_note: String::new(),
    }
}

async fn customers(store: &FlatFileStore) -> Vec<String> {
    store
        .load_all()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.customer)
        .collect()
}

#[tokio::test]
async fn delete_position_zero_shifts_later_rows_down() {
    let dir = tempfile::tempdir().unwrap();
    let store = FlatFileStore::open(dir.path().join("orders.csv")).unwrap();
    for c in ["A", "B", "C"] {
        store.insert(&order(c)).await.unwrap();
    }

    assert!(store.delete(OrderId(0)).await.unwrap());
    assert_eq!(customers(&store).await, vec!["B", "C"]);

    // "C" used to be id 2; it is now id 1 and id 2 resolves to nothing.
    assert!(!store.delete(OrderId(2)).await.unwrap());
    assert!(store.update(OrderId(1), &order("C2")).await.unwrap());
    assert_eq!(customers(&store).await, vec!["B", "C2"]);
}
