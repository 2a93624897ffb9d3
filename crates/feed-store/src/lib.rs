//! feed-store
//!
//! Storage boundary for orders.
//!
//! This crate defines the [`OrderStore`] contract shared by every backend,
//! the flat-file (CSV) backend and an in-memory backend for tests. The
//! relational backend lives in `feed-db` so only binaries that need a
//! PostgreSQL driver link one.
//!
//! Backends return rows as [`RawOrder`]: the delivery date is passed through
//! in whatever form the backend holds it, and positional backends leave the
//! id empty. Normalising both is the materializer's job (`feed-orders`).

pub mod error;
pub mod flat_file;
pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDate;
use feed_schemas::{OrderFields, OrderId};

pub use error::StoreError;
pub use flat_file::FlatFileStore;
pub use memory::MemoryStore;

// ---------------------------------------------------------------------------
// Store kind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKind {
    Relational,
    FlatFile,
    Memory,
}

impl StoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::Relational => "relational",
            StoreKind::FlatFile => "flat_file",
            StoreKind::Memory => "memory",
        }
    }
}

// ---------------------------------------------------------------------------
// Raw rows
// ---------------------------------------------------------------------------

/// Delivery date exactly as the backend holds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawDate {
    /// Typed column (relational, memory).
    Date(NaiveDate),
    /// Text cell (flat file); not yet validated.
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawOrder {
    /// `None` for positional backends.
    pub id: Option<OrderId>,
    pub customer: String,
    pub delivery_date: RawDate,
    pub feed_type: String,
    pub quantity: f64,
    pub status_note: String,
}

impl RawOrder {
    pub fn from_fields(id: Option<OrderId>, f: &OrderFields) -> Self {
        Self {
            id,
            customer: f.customer.clone(),
            delivery_date: RawDate::Date(f.delivery_date),
            feed_type: f.feed_type.clone(),
            quantity: f.quantity,
            status_note: f.status_note.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

/// Durable persistence of orders.
///
/// Object safe so callers hold an `Arc<dyn OrderStore>` chosen once at
/// startup. `Send + Sync` because handlers run on a multi-threaded runtime.
#[async_trait]
pub trait OrderStore: Send + Sync {
    fn kind(&self) -> StoreKind;

    /// Every persisted order in backend-native order: primary-key order for
    /// relational storage, row order for the flat file.
    async fn load_all(&self) -> Result<Vec<RawOrder>, StoreError>;

    /// Discard everything and persist exactly `orders`, all or nothing.
    async fn replace_all(&self, orders: &[OrderFields]) -> Result<(), StoreError>;

    /// Persist one new order and return its id.
    async fn insert(&self, order: &OrderFields) -> Result<OrderId, StoreError>;

    /// Overwrite the order `id`. `Ok(false)` when no such order exists.
    async fn update(&self, id: OrderId, order: &OrderFields) -> Result<bool, StoreError>;

    /// Remove the order `id`. `Ok(false)` when no such order exists.
    async fn delete(&self, id: OrderId) -> Result<bool, StoreError>;
}
