//! Scenario: a flat-file selection opens without touching Postgres.
//!
//! GREEN when `open_store` creates the header-only file (and its parent
//! directory) and reports the flat-file kind.

use feed_config::StorageSelection;
use feed_store::StoreKind;

#[tokio::test]
async fn flat_file_selection_creates_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("orders.csv");

    let store = feed_db::open_store(&StorageSelection::FlatFile { path: path.clone() })
        .await
        .unwrap();

    assert_eq!(store.kind(), StoreKind::FlatFile);
    assert!(path.exists());
    assert!(store.load_all().await.unwrap().is_empty());
}
