//! Request and response types for the feed-daemon HTTP endpoints.
//!
//! Form bodies are deserialized leniently (every field optional) so a
//! malformed submission reaches the order service and is refused there
//! with a typed error. No business logic lives here.

use feed_orders::{OrderForm, OrderSelector, Totals, ValidationError};
use feed_schemas::OrderView;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
    /// "relational" | "flat_file" | "memory"
    pub backend: &'static str,
}

// ---------------------------------------------------------------------------
// GET /  and  GET /v1/orders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct IndexResponse {
    pub columns: [&'static str; 5],
    /// Ascending by delivery date.
    pub orders: Vec<OrderView>,
    /// Feed type -> kilograms still to deliver.
    pub totals: Totals,
}

// ---------------------------------------------------------------------------
// POST /add
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddForm {
    #[serde(default)]
    pub customer: String,
    #[serde(default)]
    pub feed_type: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub note: String,
}

impl From<AddForm> for OrderForm {
    fn from(f: AddForm) -> Self {
        OrderForm::new(f.customer, f.feed_type, f.quantity, f.date, f.note)
    }
}

// ---------------------------------------------------------------------------
// POST /edit
// ---------------------------------------------------------------------------

/// Edit picks the order by `id`, or by `customer_match` when no usable id is
/// given; `customer` is the new value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EditForm {
    pub id: Option<String>,
    pub customer_match: Option<String>,
    #[serde(default)]
    pub customer: String,
    #[serde(default)]
    pub feed_type: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub note: String,
}

impl EditForm {
    pub fn selector(&self) -> Result<OrderSelector, ValidationError> {
        OrderSelector::from_parts(self.id.as_deref(), self.customer_match.as_deref())
    }

    pub fn into_order_form(self) -> OrderForm {
        OrderForm::new(self.customer, self.feed_type, self.quantity, self.date, self.note)
    }
}

// ---------------------------------------------------------------------------
// POST /delete  and  POST /mark_done
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectForm {
    pub id: Option<String>,
    pub customer: Option<String>,
}

impl SelectForm {
    pub fn selector(&self) -> Result<OrderSelector, ValidationError> {
        OrderSelector::from_parts(self.id.as_deref(), self.customer.as_deref())
    }
}
