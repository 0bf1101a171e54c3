use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, instrument};

use crate::{
    auth::AuthUser,
    db::StoreError,
    error::AppError,
    format::format_currency,
    invoices::{dto::LatestInvoice, repo::InvoiceStore, repo_types::CardTotals},
    listing::cached_page,
    revenue::{Revenue, RevenueStore},
    state::AppState,
};

pub const DASHBOARD_PATH: &str = "/dashboard";
const LATEST_INVOICES: i64 = 5;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct CardData {
    pub number_of_invoices: i64,
    pub number_of_customers: i64,
    pub total_paid_invoices: String,
    pub total_pending_invoices: String,
}

impl From<CardTotals> for CardData {
    fn from(t: CardTotals) -> Self {
        Self {
            number_of_invoices: t.number_of_invoices,
            number_of_customers: t.number_of_customers,
            total_paid_invoices: format_currency(t.total_paid),
            total_pending_invoices: format_currency(t.total_pending),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Overview {
    pub cards: CardData,
    pub revenue: Vec<Revenue>,
    pub latest_invoices: Vec<LatestInvoice>,
}

pub fn router() -> Router<AppState> {
    Router::new().route(DASHBOARD_PATH, get(overview))
}

fn failed(what: &'static str) -> impl Fn(StoreError) -> AppError {
    move |e| {
        error!(error = %e, what, "dashboard query failed");
        AppError::Database(what)
    }
}

#[instrument(skip(state))]
pub async fn overview(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<Value>, AppError> {
    cached_page(&state, DASHBOARD_PATH, None, || async {
        let (cards, revenue, latest) = tokio::join!(
            state.store.card_totals(),
            state.store.revenue(),
            state.store.latest_invoices(LATEST_INVOICES),
        );
        Ok::<_, AppError>(Overview {
            cards: cards.map_err(failed("Database Error: Failed to fetch card data."))?.into(),
            revenue: revenue.map_err(failed("Database Error: Failed to fetch revenue data."))?,
            latest_invoices: latest
                .map_err(failed("Database Error: Failed to fetch the latest invoices."))?
                .into_iter()
                .map(Into::into)
                .collect(),
        })
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoices::repo_types::InvoiceStatus;
    use crate::memory::MemoryStore;
    use std::sync::Arc;
    use time::macros::date;
    use uuid::Uuid;

    #[test]
    fn card_data_formats_totals() {
        let cards = CardData::from(CardTotals {
            number_of_invoices: 13,
            number_of_customers: 6,
            total_paid: 1_000_000,
            total_pending: 45_00,
        });
        assert_eq!(cards.total_paid_invoices, "$10,000.00");
        assert_eq!(cards.total_pending_invoices, "$45.00");
    }

    #[tokio::test]
    async fn overview_collects_cards_revenue_and_latest() {
        let store = Arc::new(MemoryStore::default());
        let c = store.add_customer("Delba de Oliveira", "delba@oliveira.com");
        for day in 1..=6u8 {
            let status = if day % 2 == 1 { InvoiceStatus::Paid } else { InvoiceStatus::Pending };
            store.add_invoice(c, 1000, status, date!(2023 - 01 - 01).replace_day(day).unwrap());
        }
        store.revenue.lock().unwrap().push(Revenue { month: "Jan".into(), revenue: 2000 });
        let state = AppState::fake(store);

        let Json(body) = overview(State(state), AuthUser(Uuid::new_v4())).await.unwrap();
        assert_eq!(body["cards"]["number_of_invoices"], 6);
        assert_eq!(body["cards"]["number_of_customers"], 1);
        assert_eq!(body["cards"]["total_paid_invoices"], "$30.00");
        assert_eq!(body["cards"]["total_pending_invoices"], "$30.00");
        assert_eq!(body["revenue"][0]["month"], "Jan");
        assert_eq!(body["latest_invoices"].as_array().unwrap().len(), 5);
        assert_eq!(body["latest_invoices"][0]["amount"], "$10.00");
    }

    #[tokio::test]
    async fn overview_failure_is_static_message() {
        let store = Arc::new(MemoryStore::default());
        store.fail();
        let state = AppState::fake(store);
        let err = overview(State(state), AuthUser(Uuid::new_v4())).await.unwrap_err();
        assert!(err.to_string().starts_with("Database Error"));
    }
}
