//! Axum router and all HTTP handlers for feed-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. Every POST answers `303 See Other` back to `/`
//! whatever the outcome; the cause of a refused mutation only shows up in
//! the log.

use std::sync::Arc;

use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    routing::{get, post},
    Form, Json, Router,
};
use feed_orders::{Applied, OrderError, Snapshot};
use tracing::{error, info, warn};

use crate::{
    api_types::{AddForm, EditForm, HealthResponse, IndexResponse, SelectForm},
    state::AppState,
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/v1/health", get(health))
        .route("/v1/orders", get(index))
        .route("/add", post(add))
        .route("/edit", post(edit))
        .route("/delete", post(delete))
        .route("/mark_done", post(mark_done))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            ok: true,
            service: st.build.service,
            version: st.build.version,
            backend: st.orders.store_kind().as_str(),
        }),
    )
}

// ---------------------------------------------------------------------------
// GET /  and  GET /v1/orders
// ---------------------------------------------------------------------------

/// Fresh snapshot on every call. A storage failure renders as an empty
/// list (logged by the materializer), never as an error page.
pub(crate) async fn index(State(st): State<Arc<AppState>>) -> impl IntoResponse {
    let (orders, totals) = st.orders.overview().await;
    (
        StatusCode::OK,
        Json(IndexResponse {
            columns: Snapshot::COLUMNS,
            orders,
            totals,
        }),
    )
}

// ---------------------------------------------------------------------------
// POST /add
// ---------------------------------------------------------------------------

pub(crate) async fn add(
    State(st): State<Arc<AppState>>,
    form: Result<Form<AddForm>, FormRejection>,
) -> Redirect {
    let Form(form) = match form {
        Ok(f) => f,
        Err(e) => return rejected("add", e),
    };
    back_to_list("add", st.orders.add(&form.into()).await)
}

// ---------------------------------------------------------------------------
// POST /edit
// ---------------------------------------------------------------------------

pub(crate) async fn edit(
    State(st): State<Arc<AppState>>,
    form: Result<Form<EditForm>, FormRejection>,
) -> Redirect {
    let Form(form) = match form {
        Ok(f) => f,
        Err(e) => return rejected("edit", e),
    };
    let res = match form.selector() {
        Ok(sel) => st.orders.edit(&sel, &form.into_order_form()).await,
        Err(e) => Err(OrderError::from(e)),
    };
    back_to_list("edit", res)
}

// ---------------------------------------------------------------------------
// POST /delete
// ---------------------------------------------------------------------------

pub(crate) async fn delete(
    State(st): State<Arc<AppState>>,
    form: Result<Form<SelectForm>, FormRejection>,
) -> Redirect {
    let Form(form) = match form {
        Ok(f) => f,
        Err(e) => return rejected("delete", e),
    };
    let res = match form.selector() {
        Ok(sel) => st.orders.delete(&sel).await,
        Err(e) => Err(OrderError::from(e)),
    };
    back_to_list("delete", res)
}

// ---------------------------------------------------------------------------
// POST /mark_done
// ---------------------------------------------------------------------------

pub(crate) async fn mark_done(
    State(st): State<Arc<AppState>>,
    form: Result<Form<SelectForm>, FormRejection>,
) -> Redirect {
    let Form(form) = match form {
        Ok(f) => f,
        Err(e) => return rejected("mark_done", e),
    };
    let res = match form.selector() {
        Ok(sel) => st.orders.mark_done(&sel).await,
        Err(e) => Err(OrderError::from(e)),
    };
    back_to_list("mark_done", res)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn back_to_list(op: &'static str, res: Result<Applied, OrderError>) -> Redirect {
    match res {
        Ok(applied) => info!(op, id = %applied.id(), "mutation applied"),
        Err(OrderError::Storage(e)) => error!(op, error = %e, "storage failure; nothing changed"),
        Err(e) => warn!(op, error = %e, "mutation refused"),
    }
    Redirect::to("/")
}

fn rejected(op: &'static str, e: FormRejection) -> Redirect {
    warn!(op, error = %e, "unreadable form body");
    Redirect::to("/")
}
