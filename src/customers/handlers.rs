use axum::{
    extract::{Path, Query, RawQuery, State},
    response::Redirect,
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::Value;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    customers::{
        dto::{CustomerForm, CustomerTableItem},
        repo::CustomerStore,
    },
    dashboard::DASHBOARD_PATH,
    db::StoreError,
    error::AppError,
    invoices::handlers::INVOICES_PATH,
    listing::{cached_page, Pagination, TablePage},
    state::AppState,
};

pub const CUSTOMERS_PATH: &str = "/dashboard/customers";
const NOT_FOUND: &str = "Customer not found.";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(CUSTOMERS_PATH, get(list_customers).post(create_customer))
        .route("/dashboard/customers/:id/edit", get(edit_form))
        .route(
            "/dashboard/customers/:id",
            post(update_customer).put(update_customer).delete(delete_customer),
        )
        .route("/dashboard/customers/:id/delete", post(delete_customer))
}

/// Customer rows are embedded in invoice pages and the overview cards.
async fn revalidate(state: &AppState) {
    state.cache.revalidate(CUSTOMERS_PATH).await;
    state.cache.revalidate(INVOICES_PATH).await;
    state.cache.revalidate_page(DASHBOARD_PATH).await;
}

fn store_failure(e: StoreError, action: &'static str) -> AppError {
    match e {
        StoreError::NotFound => AppError::NotFound(NOT_FOUND),
        e => {
            error!(error = %e, "customer store failure");
            AppError::Database(action)
        }
    }
}

#[instrument(skip(state, form))]
pub async fn create_customer(
    State(state): State<AppState>,
    _user: AuthUser,
    Form(form): Form<CustomerForm>,
) -> Result<Redirect, AppError> {
    let input = form.validate().map_err(|errors| {
        warn!("customer rejected by schema");
        AppError::validation(errors, "Missing Fields. Failed to Create Customer.")
    })?;

    let id = state
        .store
        .create_customer(&input)
        .await
        .map_err(|e| store_failure(e, "Database Error: Failed to Create Customer."))?;

    info!(customer_id = %id, "customer created");
    revalidate(&state).await;
    Ok(Redirect::to(CUSTOMERS_PATH))
}

#[instrument(skip(state, form))]
pub async fn update_customer(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
    Form(form): Form<CustomerForm>,
) -> Result<Redirect, AppError> {
    let input = form.validate().map_err(|errors| {
        warn!(customer_id = %id, "customer update rejected by schema");
        AppError::validation(errors, "Missing Fields. Failed to Update Customer.")
    })?;

    state
        .store
        .update_customer(id, &input)
        .await
        .map_err(|e| store_failure(e, "Database Error: Failed to Update Customer."))?;

    info!(customer_id = %id, "customer updated");
    revalidate(&state).await;
    Ok(Redirect::to(CUSTOMERS_PATH))
}

#[instrument(skip(state))]
pub async fn delete_customer(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Redirect, AppError> {
    state
        .store
        .delete_customer(id)
        .await
        .map_err(|e| store_failure(e, "Database Error: Failed to Delete Customer."))?;

    info!(customer_id = %id, "customer deleted");
    revalidate(&state).await;
    Ok(Redirect::to(CUSTOMERS_PATH))
}

#[instrument(skip(state))]
pub async fn list_customers(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(p): Query<Pagination>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Value>, AppError> {
    let per_page = state.config.items_per_page;
    cached_page(&state, CUSTOMERS_PATH, raw.as_deref(), || async {
        let failed = |e| store_failure(e, "Database Error: Failed to fetch customer table.");
        let rows = state
            .store
            .filtered_customers(p.query(), per_page, p.offset(per_page))
            .await
            .map_err(failed)?;
        let total = state.store.count_customers(p.query()).await.map_err(failed)?;
        let rows: Vec<CustomerTableItem> = rows.into_iter().map(Into::into).collect();
        Ok::<_, AppError>(TablePage::new(rows, &p, total, per_page))
    })
    .await
}

#[instrument(skip(state))]
pub async fn edit_form(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let path = format!("{CUSTOMERS_PATH}/{id}/edit");
    cached_page(&state, &path, None, || async {
        state
            .store
            .customer_by_id(id)
            .await
            .map_err(|e| store_failure(e, "Database Error: Failed to fetch customer."))?
            .ok_or(AppError::NotFound(NOT_FOUND))
    })
    .await
}
