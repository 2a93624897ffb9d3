//! feed-orders
//!
//! The order service and the snapshot it works on.
//!
//! Every operation starts from a fresh [`Snapshot`] materialized from the
//! active [`feed_store::OrderStore`]; nothing is cached between calls, so the
//! store stays the only persistent state. Mutations validate and locate
//! against the snapshot, then persist with one targeted store call.

pub mod error;
pub mod form;
pub mod service;
pub mod snapshot;

pub use error::{OrderError, ValidationError};
pub use form::{OrderForm, OrderSelector};
pub use service::{Applied, OrderService, Totals};
pub use snapshot::{materialize, try_materialize, Snapshot};
