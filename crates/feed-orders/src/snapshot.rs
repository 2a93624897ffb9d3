//! Materialized view of every order in the active store.

use chrono::NaiveDate;
use feed_schemas::{parse_delivery_date, OrderFields, OrderId, OrderRecord, COLUMNS};
use feed_store::{OrderStore, RawDate, RawOrder, StoreError, StoreKind};
use tracing::{error, warn};

use crate::form::OrderSelector;

/// Every order in backend-native order, with dates normalised and ids
/// assigned. Built fresh for each operation and dropped afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    kind: StoreKind,
    records: Vec<OrderRecord>,
}

impl Snapshot {
    /// Column set of the tabular view; present even when there are no rows.
    pub const COLUMNS: [&'static str; 5] = COLUMNS;

    pub fn empty(kind: StoreKind) -> Self {
        Self {
            kind,
            records: Vec::new(),
        }
    }

    pub fn kind(&self) -> StoreKind {
        self.kind
    }

    pub fn records(&self) -> &[OrderRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Locate one order. A customer selector takes the first match in
    /// backend order.
    pub fn find(&self, sel: &OrderSelector) -> Option<&OrderRecord> {
        match sel {
            OrderSelector::Id(id) => self.records.iter().find(|r| r.id == *id),
            OrderSelector::Customer(name) => {
                self.records.iter().find(|r| r.fields.customer == *name)
            }
        }
    }

    pub fn into_fields(self) -> Vec<OrderFields> {
        self.records.into_iter().map(|r| r.fields).collect()
    }
}

/// Load and normalise every order; a failed load is returned as an error.
pub async fn try_materialize(
    store: &dyn OrderStore,
    today: NaiveDate,
) -> Result<Snapshot, StoreError> {
    let raw = store.load_all().await?;
    let records = raw
        .into_iter()
        .enumerate()
        .map(|(pos, r)| normalize(pos, r, today))
        .collect();
    Ok(Snapshot {
        kind: store.kind(),
        records,
    })
}

/// Like [`try_materialize`], but a failed load is logged and yields an
/// empty snapshot so read-only views still render.
pub async fn materialize(store: &dyn OrderStore, today: NaiveDate) -> Snapshot {
    match try_materialize(store, today).await {
        Ok(s) => s,
        Err(e) => {
            error!(backend = store.kind().as_str(), error = %e, "loading orders failed");
            Snapshot::empty(store.kind())
        }
    }
}

fn normalize(pos: usize, raw: RawOrder, today: NaiveDate) -> OrderRecord {
    let id = raw.id.unwrap_or_else(|| OrderId::from(pos));
    let delivery_date = match raw.delivery_date {
        RawDate::Date(d) => d,
        RawDate::Text(text) => match parse_text_date(&text) {
            Some(d) => d,
            None => {
                warn!(%id, raw = %text, "unparseable delivery date; using today");
                today
            }
        },
    };
    OrderRecord {
        id,
        fields: OrderFields {
            customer: raw.customer,
            delivery_date,
            feed_type: raw.feed_type,
            quantity: raw.quantity,
            status_note: raw.status_note,
        },
    }
}

/// Fixed pattern first; ISO dates show up after a spreadsheet round trip.
fn parse_text_date(text: &str) -> Option<NaiveDate> {
    parse_delivery_date(text)
        .or_else(|| NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use feed_store::MemoryStore;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn raw(date: RawDate) -> RawOrder {
        RawOrder {
            id: None,
            customer: "Farm A".to_string(),
            delivery_date: date,
            feed_type: "Wheat".to_string(),
            quantity: 1.0,
            status_note: String::new(),
        }
    }

    #[test]
    fn text_dates_normalise() {
        let today = d(2030, 6, 1);
        let r = normalize(0, raw(RawDate::Text("02.01.2031.".to_string())), today);
        assert_eq!(r.fields.delivery_date, d(2031, 1, 2));

        let r = normalize(0, raw(RawDate::Text("2031-01-02".to_string())), today);
        assert_eq!(r.fields.delivery_date, d(2031, 1, 2));

        let r = normalize(0, raw(RawDate::Text("soon-ish".to_string())), today);
        assert_eq!(r.fields.delivery_date, today);
    }

    #[test]
    fn positional_id_only_when_missing() {
        let today = d(2030, 6, 1);
        let r = normalize(4, raw(RawDate::Date(today)), today);
        assert_eq!(r.id, OrderId(4));

        let mut with_id = raw(RawDate::Date(today));
        with_id.id = Some(OrderId(77));
        assert_eq!(normalize(4, with_id, today).id, OrderId(77));
    }

    #[tokio::test]
    async fn failed_load_is_empty_snapshot() {
        let store = MemoryStore::new();
        store.set_unavailable(true);
        let today = d(2030, 6, 1);

        assert!(try_materialize(&store, today).await.is_err());

        let snap = materialize(&store, today).await;
        assert!(snap.is_empty());
        assert_eq!(snap.kind(), StoreKind::Memory);
        assert_eq!(Snapshot::COLUMNS.len(), 5);
    }

    #[test]
    fn find_by_customer_takes_first() {
        let today = d(2030, 6, 1);
        let mut snap = Snapshot::empty(StoreKind::FlatFile);
        for (i, name) in ["Farm A", "Farm B", "Farm A"].iter().enumerate() {
            let mut r = raw(RawDate::Date(today));
            r.customer = name.to_string();
            snap.records.push(normalize(i, r, today));
        }
        let hit = snap
            .find(&OrderSelector::Customer("Farm A".to_string()))
            .unwrap();
        assert_eq!(hit.id, OrderId(0));
        assert!(snap.find(&OrderSelector::Id(OrderId(9))).is_none());
    }
}
