use std::future::Future;

use anyhow::Context;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::cache_key;
use crate::db::{page_offset, total_pages};
use crate::error::AppError;
use crate::state::AppState;

/// `?query=&page=` of the dashboard tables.
#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub page: Option<i64>,
}

impl Pagination {
    pub fn query(&self) -> &str {
        self.query.as_deref().unwrap_or_default()
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn offset(&self, per_page: i64) -> i64 {
        page_offset(self.page(), per_page)
    }
}

#[derive(Debug, Serialize)]
pub struct TablePage<T> {
    pub rows: Vec<T>,
    pub current_page: i64,
    pub total_pages: i64,
}

impl<T> TablePage<T> {
    pub fn new(rows: Vec<T>, p: &Pagination, total: i64, per_page: i64) -> Self {
        Self {
            rows,
            current_page: p.page(),
            total_pages: total_pages(total, per_page),
        }
    }
}

/// Serves page data from the route cache, loading and storing it on a miss.
pub async fn cached_page<T, F, Fut>(
    state: &AppState,
    path: &str,
    raw_query: Option<&str>,
    load: F,
) -> Result<Json<Value>, AppError>
where
    T: Serialize,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let key = cache_key(path, raw_query);
    if let Some(hit) = state.cache.get(&key).await {
        return Ok(Json(hit));
    }
    let generation = state.cache.generation();
    let page = load().await?;
    let body = serde_json::to_value(&page).context("serialize page data")?;
    state.cache.put(key, body.clone(), generation).await;
    Ok(Json(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn pagination_defaults() {
        let p = Pagination::default();
        assert_eq!(p.query(), "");
        assert_eq!(p.page(), 1);
        assert_eq!(p.offset(6), 0);
        let p = Pagination { query: Some("amy".into()), page: Some(3) };
        assert_eq!(p.offset(6), 12);
        let p = Pagination { query: None, page: Some(0) };
        assert_eq!(p.page(), 1);
    }

    #[tokio::test]
    async fn second_read_is_served_from_cache() {
        let state = AppState::fake(Arc::new(MemoryStore::default()));
        let loads = AtomicUsize::new(0);
        for _ in 0..2 {
            let Json(body) = cached_page(&state, "/dashboard/users", Some("page=1"), || async {
                loads.fetch_add(1, Ordering::SeqCst);
                Ok::<_, AppError>(vec![1, 2, 3])
            })
            .await
            .unwrap();
            assert_eq!(body, serde_json::json!([1, 2, 3]));
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);

        state.cache.revalidate("/dashboard/users").await;
        cached_page(&state, "/dashboard/users", Some("page=1"), || async {
            loads.fetch_add(1, Ordering::SeqCst);
            Ok::<_, AppError>(vec![1])
        })
        .await
        .unwrap();
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn rows_read_before_a_mutation_are_not_cached() {
        let state = AppState::fake(Arc::new(MemoryStore::default()));
        let Json(body) = cached_page(&state, "/dashboard/invoices", None, || async {
            let rows = vec!["old"];
            state.cache.revalidate("/dashboard/invoices").await;
            Ok::<_, AppError>(rows)
        })
        .await
        .unwrap();
        assert_eq!(body, serde_json::json!(["old"]));
        assert!(state.cache.get("/dashboard/invoices").await.is_none());

        let Json(fresh) = cached_page(&state, "/dashboard/invoices", None, || async {
            Ok::<_, AppError>(vec!["new"])
        })
        .await
        .unwrap();
        assert_eq!(fresh, serde_json::json!(["new"]));
        assert_eq!(
            state.cache.get("/dashboard/invoices").await,
            Some(serde_json::json!(["new"]))
        );
    }

    #[test]
    fn huge_page_numbers_do_not_overflow() {
        let p = Pagination { query: None, page: Some(i64::MAX) };
        assert_eq!(p.offset(6), i64::MAX);
    }
}
