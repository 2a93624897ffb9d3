//! Order operations over a fresh snapshot.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use feed_schemas::{format_delivery_date, OrderFields, OrderId, OrderView, Tag, DEFAULT_DONE_NOTE};
use feed_store::{OrderStore, StoreKind};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::OrderError;
use crate::form::{OrderForm, OrderSelector};
use crate::snapshot::{materialize, try_materialize, Snapshot};

/// Summed quantity per feed type.
pub type Totals = BTreeMap<String, f64>;

/// What a successful mutation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", content = "id", rename_all = "snake_case")]
pub enum Applied {
    Added(OrderId),
    Updated(OrderId),
    MarkedDone(OrderId),
    Deleted(OrderId),
}

impl Applied {
    pub fn id(&self) -> OrderId {
        match *self {
            Applied::Added(id)
            | Applied::Updated(id)
            | Applied::MarkedDone(id)
            | Applied::Deleted(id) => id,
        }
    }
}

/// Add, edit, mark done, delete, list and total orders against one store.
///
/// Concurrent mutations are not coordinated: two writers that materialize
/// the same snapshot race, and the later write wins.
#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn OrderStore>,
    done_note: String,
}

impl OrderService {
    pub fn new(store: Arc<dyn OrderStore>, done_note: impl Into<String>) -> Self {
        Self {
            store,
            done_note: done_note.into(),
        }
    }

    /// Service using the default status note for completed orders.
    pub fn with_default_note(store: Arc<dyn OrderStore>) -> Self {
        Self::new(store, DEFAULT_DONE_NOTE)
    }

    pub fn store_kind(&self) -> StoreKind {
        self.store.kind()
    }

    // -----------------------------------------------------------------------
    // Reads (fail-soft)
    // -----------------------------------------------------------------------

    pub async fn snapshot(&self) -> Snapshot {
        materialize(self.store.as_ref(), today()).await
    }

    pub async fn list_orders(&self) -> Vec<OrderView> {
        self.list_orders_on(today()).await
    }

    /// Orders by ascending delivery date, tagged relative to `today`.
    pub async fn list_orders_on(&self, today: NaiveDate) -> Vec<OrderView> {
        let snap = materialize(self.store.as_ref(), today).await;
        self.views(&snap, today)
    }

    pub async fn totals(&self) -> Totals {
        let snap = self.snapshot().await;
        self.totals_of(&snap)
    }

    pub async fn overview(&self) -> (Vec<OrderView>, Totals) {
        self.overview_on(today()).await
    }

    /// Both views from a single load.
    pub async fn overview_on(&self, today: NaiveDate) -> (Vec<OrderView>, Totals) {
        let snap = materialize(self.store.as_ref(), today).await;
        (self.views(&snap, today), self.totals_of(&snap))
    }

    fn views(&self, snap: &Snapshot, today: NaiveDate) -> Vec<OrderView> {
        let mut records: Vec<_> = snap.records().iter().collect();
        // Stable: equal dates keep backend order.
        records.sort_by_key(|r| r.fields.delivery_date);

        records
            .into_iter()
            .map(|r| {
                let f = &r.fields;
                let days_left = (f.delivery_date - today).num_days();
                OrderView {
                    id: r.id,
                    customer: f.customer.clone(),
                    delivery_date: format_delivery_date(f.delivery_date),
                    feed_type: f.feed_type.clone(),
                    quantity: f.quantity,
                    status_note: f.status_note.clone(),
                    days_left,
                    tag: Tag::classify(days_left, f.is_done(&self.done_note)),
                }
            })
            .collect()
    }

    fn totals_of(&self, snap: &Snapshot) -> Totals {
        let mut out = Totals::new();
        for r in snap.records() {
            if r.fields.is_done(&self.done_note) {
                continue;
            }
            *out.entry(r.fields.feed_type.clone()).or_insert(0.0) += r.fields.quantity;
        }
        out
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    pub async fn add(&self, form: &OrderForm) -> Result<Applied, OrderError> {
        let fields = form.validate()?;
        let id = self.store.insert(&fields).await?;
        info!(%id, customer = %fields.customer, feed_type = %fields.feed_type, "order added");
        Ok(Applied::Added(id))
    }

    /// Overwrite every mutable field of the selected order.
    pub async fn edit(&self, sel: &OrderSelector, form: &OrderForm) -> Result<Applied, OrderError> {
        let fields = form.validate()?;
        let id = self.locate(sel).await?;
        self.write(sel, id, &fields).await?;
        info!(%id, "order updated");
        Ok(Applied::Updated(id))
    }

    pub async fn mark_done(&self, sel: &OrderSelector) -> Result<Applied, OrderError> {
        let snap = try_materialize(self.store.as_ref(), today()).await?;
        let rec = snap
            .find(sel)
            .ok_or_else(|| OrderError::NotFound(sel.clone()))?;
        let mut fields = rec.fields.clone();
        fields.status_note = self.done_note.clone();
        self.write(sel, rec.id, &fields).await?;
        info!(id = %rec.id, "order marked done");
        Ok(Applied::MarkedDone(rec.id))
    }

    pub async fn delete(&self, sel: &OrderSelector) -> Result<Applied, OrderError> {
        let id = self.locate(sel).await?;
        if !self.store.delete(id).await? {
            return Err(OrderError::NotFound(sel.clone()));
        }
        info!(%id, "order deleted");
        Ok(Applied::Deleted(id))
    }

    /// Persist the current snapshot into `target`, replacing its contents.
    /// Returns the number of orders written.
    pub async fn export_to(&self, target: &dyn OrderStore) -> Result<usize, OrderError> {
        let snap = try_materialize(self.store.as_ref(), today()).await?;
        let fields = snap.into_fields();
        target.replace_all(&fields).await?;
        info!(
            from = self.store.kind().as_str(),
            to = target.kind().as_str(),
            rows = fields.len(),
            "orders exported"
        );
        Ok(fields.len())
    }

    async fn locate(&self, sel: &OrderSelector) -> Result<OrderId, OrderError> {
        let snap = try_materialize(self.store.as_ref(), today()).await?;
        match snap.find(sel) {
            Some(r) => Ok(r.id),
            None => {
                debug!(selector = %sel, rows = snap.len(), "selector matched nothing");
                Err(OrderError::NotFound(sel.clone()))
            }
        }
    }

    async fn write(
        &self,
        sel: &OrderSelector,
        id: OrderId,
        fields: &OrderFields,
    ) -> Result<(), OrderError> {
        // The row can vanish between load and write under a concurrent delete.
        if !self.store.update(id, fields).await? {
            return Err(OrderError::NotFound(sel.clone()));
        }
        Ok(())
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
