//! In-memory order storage with relational-style ids.
//!
//! Ids are handed out from a counter and never reused, like a serial
//! primary key. `set_unavailable(true)` makes every call fail, which lets
//! tests drive the storage-failure paths of the service.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use feed_schemas::{OrderFields, OrderId};
use tokio::sync::RwLock;

use crate::{OrderStore, RawOrder, StoreError, StoreKind};

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    rows: Vec<(OrderId, OrderFields)>,
}

impl Inner {
    fn allocate(&mut self) -> OrderId {
        self.next_id += 1;
        OrderId(self.next_id)
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store switched off".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Memory
    }

    async fn load_all(&self) -> Result<Vec<RawOrder>, StoreError> {
        self.check()?;
        let inner = self.inner.read().await;
        Ok(inner
            .rows
            .iter()
            .map(|(id, f)| RawOrder::from_fields(Some(*id), f))
            .collect())
    }

    async fn replace_all(&self, orders: &[OrderFields]) -> Result<(), StoreError> {
        self.check()?;
        let mut inner = self.inner.write().await;
        inner.rows.clear();
        for f in orders {
            let id = inner.allocate();
            inner.rows.push((id, f.clone()));
        }
        Ok(())
    }

    async fn insert(&self, order: &OrderFields) -> Result<OrderId, StoreError> {
        self.check()?;
        let mut inner = self.inner.write().await;
        let id = inner.allocate();
        inner.rows.push((id, order.clone()));
        Ok(id)
    }

    async fn update(&self, id: OrderId, order: &OrderFields) -> Result<bool, StoreError> {
        self.check()?;
        let mut inner = self.inner.write().await;
        match inner.rows.iter_mut().find(|(rid, _)| *rid == id) {
            Some((_, f)) => {
                *f = order.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: OrderId) -> Result<bool, StoreError> {
        self.check()?;
        let mut inner = self.inner.write().await;
        let before = inner.rows.len();
        inner.rows.retain(|(rid, _)| *rid != id);
        Ok(inner.rows.len() != before)
    }
}
