use std::fmt;

use feed_store::StoreError;

use crate::form::OrderSelector;

/// Why a submitted order form was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was empty or whitespace.
    MissingField(&'static str),
    /// Quantity did not parse as a non-negative number.
    InvalidQuantity(String),
    /// Date did not match `DD.MM.YYYY.`.
    InvalidDate(String),
    /// Neither an id nor a customer name was supplied to pick an order.
    EmptySelector,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingField(name) => write!(f, "missing required field '{name}'"),
            ValidationError::InvalidQuantity(raw) => {
                write!(f, "cannot parse quantity from '{raw}'")
            }
            ValidationError::InvalidDate(raw) => {
                write!(f, "cannot parse date '{raw}' (expected DD.MM.YYYY.)")
            }
            ValidationError::EmptySelector => write!(f, "no order id or customer given"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Outcome of a refused mutation.
///
/// All three are reported to HTTP callers the same way (redirect to the
/// list), but they stay distinct here so logs and tests can tell them apart.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderError {
    Validation(ValidationError),
    NotFound(OrderSelector),
    Storage(StoreError),
}

impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderError::Validation(e) => write!(f, "validation failed: {e}"),
            OrderError::NotFound(sel) => write!(f, "no order matches {sel}"),
            OrderError::Storage(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for OrderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OrderError::Validation(e) => Some(e),
            OrderError::NotFound(_) => None,
            OrderError::Storage(e) => Some(e),
        }
    }
}

impl From<ValidationError> for OrderError {
    fn from(e: ValidationError) -> Self {
        OrderError::Validation(e)
    }
}

impl From<StoreError> for OrderError {
    fn from(e: StoreError) -> Self {
        OrderError::Storage(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use feed_schemas::OrderId;

    #[test]
    fn display_names_the_cause() {
        let e = OrderError::from(ValidationError::InvalidQuantity("abc".to_string()));
        assert!(e.to_string().contains("abc"));

        let e = OrderError::NotFound(OrderSelector::Id(OrderId(9)));
        assert_eq!(e.to_string(), "no order matches id 9");

        let e = OrderError::from(StoreError::Unavailable("down".to_string()));
        assert!(e.to_string().contains("down"));
    }
}
