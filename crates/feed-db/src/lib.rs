//! feed-db
//!
//! PostgreSQL order storage, and [`open_store`], which turns the startup
//! [`StorageSelection`] into a live backend.
//!
//! Connection setup and bootstrap return `anyhow::Result` (they run once, at
//! startup, and their errors go straight to the operator). The
//! [`PgOrderStore`] methods speak the storage contract and return
//! [`StoreError`].

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use feed_config::StorageSelection;
use feed_schemas::{OrderFields, OrderId};
use feed_store::{FlatFileStore, OrderStore, RawDate, RawOrder, StoreError, StoreKind};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{debug, info};

/// Env var the DB-backed tests read their connection string from.
pub const ENV_DB_URL: &str = "DATABASE_URL";

const CREATE_ORDERS_TABLE: &str = r#"
create table if not exists orders (
  id            bigserial primary key,
  customer      text not null,
  delivery_date date not null,
  feed_type     text not null,
  quantity      double precision not null check (quantity >= 0),
  status_note   text not null default ''
)
"#;

const SELECT_ORDERS: &str = r#"
select id, customer, delivery_date, feed_type, quantity, status_note
from orders
order by id
"#;

const INSERT_ORDER: &str = r#"
insert into orders (customer, delivery_date, feed_type, quantity, status_note)
values ($1, $2, $3, $4, $5)
returning id
"#;

// ---------------------------------------------------------------------------
// Connection / bootstrap
// ---------------------------------------------------------------------------

/// Connect to Postgres at `url`.
pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await
        .context("failed to connect to Postgres")?;
    Ok(pool)
}

/// Create the `orders` table when it does not exist yet. Safe to call on
/// every boot; an existing table is left untouched.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(CREATE_ORDERS_TABLE)
        .execute(pool)
        .await
        .context("create orders table failed")?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct DbStatus {
    pub ok: bool,
    pub has_orders_table: bool,
    pub order_count: i64,
}

/// Connectivity + schema presence + row count.
pub async fn status(pool: &PgPool) -> Result<DbStatus> {
    let (one,): (i32,) = sqlx::query_as::<_, (i32,)>("select 1")
        .fetch_one(pool)
        .await
        .context("status connectivity query failed")?;

    let (exists,): (bool,) = sqlx::query_as::<_, (bool,)>(
        r#"
        select exists (
            select 1
            from information_schema.tables
            where table_schema = current_schema() and table_name = 'orders'
        )
        "#,
    )
    .fetch_one(pool)
    .await
    .context("status table-exists query failed")?;

    let order_count = if exists {
        let (n,): (i64,) = sqlx::query_as::<_, (i64,)>("select count(*)::bigint from orders")
            .fetch_one(pool)
            .await
            .context("status count query failed")?;
        n
    } else {
        0
    };

    Ok(DbStatus {
        ok: one == 1,
        has_orders_table: exists,
        order_count,
    })
}

/// Open the backend chosen at startup.
pub async fn open_store(sel: &StorageSelection) -> Result<Arc<dyn OrderStore>> {
    match sel {
        StorageSelection::Relational {
            url,
            max_connections,
        } => Ok(Arc::new(PgOrderStore::open(url, *max_connections).await?)),
        StorageSelection::FlatFile { path } => {
            let store = FlatFileStore::open(path)
                .with_context(|| format!("failed to open order file '{}'", path.display()))?;
            info!(path = %path.display(), "flat-file order store ready");
            Ok(Arc::new(store))
        }
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Orders in the `orders` table. Ids are the serial primary key.
#[derive(Debug, Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect, create the table if needed, and wrap the pool.
    pub async fn open(url: &str, max_connections: u32) -> Result<Self> {
        let pool = connect(url, max_connections).await?;
        ensure_schema(&pool).await?;
        info!(max_connections, "relational order store ready");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn db_err(op: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |e| StoreError::Database(format!("{op} failed: {e}"))
}

fn row_to_raw(row: &PgRow) -> Result<RawOrder, sqlx::Error> {
    let id: i64 = row.try_get("id")?;
    let delivery_date: NaiveDate = row.try_get("delivery_date")?;
    Ok(RawOrder {
        id: Some(OrderId(id)),
        customer: row.try_get("customer")?,
        delivery_date: RawDate::Date(delivery_date),
        feed_type: row.try_get("feed_type")?,
        quantity: row.try_get("quantity")?,
        status_note: row.try_get("status_note")?,
    })
}

#[async_trait]
impl OrderStore for PgOrderStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Relational
    }

    async fn load_all(&self) -> Result<Vec<RawOrder>, StoreError> {
        let rows = sqlx::query(SELECT_ORDERS)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("load orders"))?;

        rows.iter()
            .map(row_to_raw)
            .collect::<Result<Vec<_>, _>>()
            .map_err(db_err("decode order row"))
    }

    async fn replace_all(&self, orders: &[OrderFields]) -> Result<(), StoreError> {
        // Any early return drops `tx` uncommitted, which rolls it back: the
        // table is never left holding a mix of old and new rows.
        let mut tx = self.pool.begin().await.map_err(db_err("begin"))?;

        sqlx::query("delete from orders")
            .execute(&mut *tx)
            .await
            .map_err(db_err("delete all orders"))?;

        for o in orders {
            sqlx::query(INSERT_ORDER)
                .bind(&o.customer)
                .bind(o.delivery_date)
                .bind(&o.feed_type)
                .bind(o.quantity)
                .bind(&o.status_note)
                .execute(&mut *tx)
                .await
                .map_err(db_err("insert order"))?;
        }

        tx.commit().await.map_err(db_err("commit"))?;
        debug!(rows = orders.len(), "orders table replaced");
        Ok(())
    }

    async fn insert(&self, order: &OrderFields) -> Result<OrderId, StoreError> {
        let (id,): (i64,) = sqlx::query_as::<_, (i64,)>(INSERT_ORDER)
            .bind(&order.customer)
            .bind(order.delivery_date)
            .bind(&order.feed_type)
            .bind(order.quantity)
            .bind(&order.status_note)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err("insert order"))?;
        Ok(OrderId(id))
    }

    async fn update(&self, id: OrderId, order: &OrderFields) -> Result<bool, StoreError> {
        let res = sqlx::query(
            r#"
            update orders
            set customer = $2,
                delivery_date = $3,
                feed_type = $4,
                quantity = $5,
                status_note = $6
            where id = $1
            "#,
        )
        .bind(id.get())
        .bind(&order.customer)
        .bind(order.delivery_date)
        .bind(&order.feed_type)
        .bind(order.quantity)
        .bind(&order.status_note)
        .execute(&self.pool)
        .await
        .map_err(db_err("update order"))?;

        Ok(res.rows_affected() > 0)
    }

    async fn delete(&self, id: OrderId) -> Result<bool, StoreError> {
        let res = sqlx::query("delete from orders where id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(db_err("delete order"))?;

        Ok(res.rows_affected() > 0)
    }
}
