//! feed-schemas
//!
//! Shared record types for the feed-order tracker. No I/O lives here; the
//! storage crates and the order service all speak these types.

pub mod format;
pub mod tag;

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub use format::{format_delivery_date, parse_delivery_date, parse_quantity, DATE_FORMAT};
pub use tag::Tag;

/// Status note that marks an order as delivered unless configured otherwise.
pub const DEFAULT_DONE_NOTE: &str = "done";

/// Fixed column set of the tabular view, in display order. The flat-file
/// backend uses the same names as its CSV header.
pub const COLUMNS: [&str; 5] = [
    "Customer/Farm",
    "Delivery date",
    "Feed type",
    "Quantity (kg)",
    "Note",
];

// ---------------------------------------------------------------------------
// OrderId
// ---------------------------------------------------------------------------

/// Identifier of one order.
///
/// Relational storage hands out primary keys, so the value is stable for
/// the lifetime of the row. Flat-file storage has no key column; there the
/// value is the row position and shifts when an earlier row is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub i64);

impl OrderId {
    pub fn get(self) -> i64 {
        self.0
    }

    /// Row position for positional (flat-file) identifiers. `None` when the
    /// id is negative.
    pub fn position(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for OrderId {
    fn from(pos: usize) -> Self {
        // Row counts never approach i64::MAX.
        OrderId(i64::try_from(pos).unwrap_or(i64::MAX))
    }
}

// ---------------------------------------------------------------------------
// Order fields / record
// ---------------------------------------------------------------------------

/// The mutable part of an order: everything except its identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderFields {
    pub customer: String,
    pub delivery_date: NaiveDate,
    pub feed_type: String,
    /// Kilograms; never negative.
    pub quantity: f64,
    #[serde(default)]
    pub status_note: String,
}

impl OrderFields {
    pub fn is_done(&self, done_note: &str) -> bool {
        self.status_note == done_note
    }
}

/// One order as materialized from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    #[serde(flatten)]
    pub fields: OrderFields,
}

// ---------------------------------------------------------------------------
// OrderView
// ---------------------------------------------------------------------------

/// Display row produced by the list operation.
///
/// `delivery_date` is already rendered with [`DATE_FORMAT`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderView {
    pub id: OrderId,
    pub customer: String,
    pub delivery_date: String,
    pub feed_type: String,
    pub quantity: f64,
    pub status_note: String,
    /// Whole days until delivery; negative once the date has passed.
    pub days_left: i64,
    pub tag: Tag,
}
