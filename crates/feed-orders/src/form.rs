//! Untrusted input: submitted order forms and order selectors.

use std::fmt;

use feed_schemas::{parse_delivery_date, parse_quantity, OrderFields, OrderId};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Order fields exactly as submitted, before any coercion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderForm {
    #[serde(default)]
    pub customer: String,
    #[serde(default)]
    pub feed_type: String,
    /// Kilograms; decimal comma accepted.
    #[serde(default)]
    pub quantity: String,
    /// `DD.MM.YYYY.`
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub note: String,
}

impl OrderForm {
    pub fn new(
        customer: impl Into<String>,
        feed_type: impl Into<String>,
        quantity: impl Into<String>,
        date: impl Into<String>,
        note: impl Into<String>,
    ) -> Self {
        Self {
            customer: customer.into(),
            feed_type: feed_type.into(),
            quantity: quantity.into(),
            date: date.into(),
            note: note.into(),
        }
    }

    /// Coerce into typed fields. Customer and feed type are trimmed; the
    /// note is kept verbatim.
    pub fn validate(&self) -> Result<OrderFields, ValidationError> {
        let customer = required("customer", &self.customer)?;
        let feed_type = required("feed_type", &self.feed_type)?;
        let quantity_raw = required("quantity", &self.quantity)?;
        let date_raw = required("date", &self.date)?;

        let quantity = parse_quantity(quantity_raw)
            .ok_or_else(|| ValidationError::InvalidQuantity(quantity_raw.to_string()))?;
        let delivery_date = parse_delivery_date(date_raw)
            .ok_or_else(|| ValidationError::InvalidDate(date_raw.to_string()))?;

        Ok(OrderFields {
            customer: customer.to_string(),
            delivery_date,
            feed_type: feed_type.to_string(),
            quantity,
            status_note: self.note.clone(),
        })
    }
}

fn required<'a>(name: &'static str, v: &'a str) -> Result<&'a str, ValidationError> {
    let t = v.trim();
    if t.is_empty() {
        return Err(ValidationError::MissingField(name));
    }
    Ok(t)
}

/// Picks one order out of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderSelector {
    Id(OrderId),
    /// First order (in store order) whose customer matches exactly.
    ///
    /// Only that one order is affected: later orders for the same customer
    /// are left alone, so delete and mark-done by name never act in bulk.
    Customer(String),
}

impl OrderSelector {
    /// Build from the loose pair of form fields used by the HTTP surface:
    /// an id wins when present and numeric, otherwise the customer name.
    pub fn from_parts(id: Option<&str>, customer: Option<&str>) -> Result<Self, ValidationError> {
        if let Some(raw) = id.map(str::trim).filter(|s| !s.is_empty()) {
            if let Ok(n) = raw.parse::<i64>() {
                return Ok(OrderSelector::Id(OrderId(n)));
            }
        }
        match customer.map(str::trim).filter(|s| !s.is_empty()) {
            Some(c) => Ok(OrderSelector::Customer(c.to_string())),
            None => Err(ValidationError::EmptySelector),
        }
    }
}

impl fmt::Display for OrderSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderSelector::Id(id) => write!(f, "id {id}"),
            OrderSelector::Customer(c) => write!(f, "customer '{c}'"),
        }
    }
}
