use axum::{
    extract::{Path, Query, RawQuery, State},
    response::Redirect,
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::Value;
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    customers::{handlers::CUSTOMERS_PATH, repo::CustomerStore},
    dashboard::DASHBOARD_PATH,
    db::StoreError,
    error::AppError,
    invoices::{
        dto::{CreateInvoicePage, EditInvoicePage, InvoiceForm, InvoiceTableItem},
        repo::InvoiceStore,
    },
    listing::{cached_page, Pagination, TablePage},
    state::AppState,
};

pub const INVOICES_PATH: &str = "/dashboard/invoices";
const NOT_FOUND: &str = "Invoice not found.";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(INVOICES_PATH, get(list_invoices).post(create_invoice))
        .route("/dashboard/invoices/create", get(create_form))
        .route("/dashboard/invoices/:id/edit", get(edit_form))
        .route(
            "/dashboard/invoices/:id",
            post(update_invoice).put(update_invoice).delete(delete_invoice),
        )
        .route("/dashboard/invoices/:id/delete", post(delete_invoice))
}

/// Invoice pages, customer totals and the overview all derive from invoices.
async fn revalidate(state: &AppState) {
    state.cache.revalidate(INVOICES_PATH).await;
    state.cache.revalidate(CUSTOMERS_PATH).await;
    state.cache.revalidate_page(DASHBOARD_PATH).await;
}

fn store_failure(e: StoreError, action: &'static str) -> AppError {
    match e {
        StoreError::NotFound => AppError::NotFound(NOT_FOUND),
        e => {
            error!(error = %e, "invoice store failure");
            AppError::Database(action)
        }
    }
}

#[instrument(skip(state, form))]
pub async fn create_invoice(
    State(state): State<AppState>,
    _user: AuthUser,
    Form(form): Form<InvoiceForm>,
) -> Result<Redirect, AppError> {
    let input = form.validate().map_err(|errors| {
        warn!("invoice rejected by schema");
        AppError::validation(errors, "Missing Fields. Failed to Create Invoice.")
    })?;

    let today = OffsetDateTime::now_utc().date();
    let id = state
        .store
        .create_invoice(&input, today)
        .await
        .map_err(|e| store_failure(e, "Database Error: Failed to Create Invoice."))?;

    info!(invoice_id = %id, amount = input.amount_cents, status = %input.status, "invoice created");
    revalidate(&state).await;
    Ok(Redirect::to(INVOICES_PATH))
}

#[instrument(skip(state, form))]
pub async fn update_invoice(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
    Form(form): Form<InvoiceForm>,
) -> Result<Redirect, AppError> {
    let input = form.validate().map_err(|errors| {
        warn!(invoice_id = %id, "invoice update rejected by schema");
        AppError::validation(errors, "Missing Fields. Failed to Update Invoice.")
    })?;

    state
        .store
        .update_invoice(id, &input)
        .await
        .map_err(|e| store_failure(e, "Database Error: Failed to Update Invoice."))?;

    info!(invoice_id = %id, "invoice updated");
    revalidate(&state).await;
    Ok(Redirect::to(INVOICES_PATH))
}

#[instrument(skip(state))]
pub async fn delete_invoice(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Redirect, AppError> {
    state
        .store
        .delete_invoice(id)
        .await
        .map_err(|e| store_failure(e, "Database Error: Failed to Delete Invoice."))?;

    info!(invoice_id = %id, "invoice deleted");
    revalidate(&state).await;
    Ok(Redirect::to(INVOICES_PATH))
}

#[instrument(skip(state))]
pub async fn list_invoices(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(p): Query<Pagination>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Value>, AppError> {
    let per_page = state.config.items_per_page;
    cached_page(&state, INVOICES_PATH, raw.as_deref(), || async {
        let failed = |e| store_failure(e, "Database Error: Failed to fetch invoices.");
        let rows = state
            .store
            .filtered_invoices(p.query(), per_page, p.offset(per_page))
            .await
            .map_err(failed)?;
        let total = state.store.count_invoices(p.query()).await.map_err(failed)?;
        let rows: Vec<InvoiceTableItem> = rows.into_iter().map(Into::into).collect();
        Ok::<_, AppError>(TablePage::new(rows, &p, total, per_page))
    })
    .await
}

#[instrument(skip(state))]
pub async fn create_form(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<Value>, AppError> {
    cached_page(&state, "/dashboard/invoices/create", None, || async {
        let customers = state
            .store
            .customer_fields()
            .await
            .map_err(|e| store_failure(e, "Database Error: Failed to fetch all customers."))?;
        Ok::<_, AppError>(CreateInvoicePage { customers })
    })
    .await
}

#[instrument(skip(state))]
pub async fn edit_form(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let path = format!("{INVOICES_PATH}/{id}/edit");
    cached_page(&state, &path, None, || async {
        let failed = |e| store_failure(e, "Database Error: Failed to fetch invoice.");
        let invoice = state
            .store
            .invoice_by_id(id)
            .await
            .map_err(failed)?
            .ok_or(AppError::NotFound(NOT_FOUND))?;
        let customers = state.store.customer_fields().await.map_err(failed)?;
        Ok::<_, AppError>(EditInvoicePage {
            invoice: invoice.into(),
            customers,
        })
    })
    .await
}
