use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

use crate::config::AppConfig;
use crate::customers::repo::CustomerStore;
use crate::invoices::repo::InvoiceStore;
use crate::revenue::RevenueStore;
use crate::users::repo::UserStore;

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate record")]
    Duplicate,

    #[error("record not found")]
    NotFound,

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(ref db)
                if db.code().as_deref() == Some(UNIQUE_VIOLATION) =>
            {
                StoreError::Duplicate
            }
            other => StoreError::Sqlx(other),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Everything the handlers need from persistence.
pub trait Store: InvoiceStore + CustomerStore + UserStore + RevenueStore {}

impl<T> Store for T where T: InvoiceStore + CustomerStore + UserStore + RevenueStore {}

/// PostgreSQL-backed store; every operation is a single statement.
#[derive(Clone)]
pub struct PgStore {
    pub pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;
        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("run migrations")
    }
}

/// `%query%` pattern for ILIKE filters.
pub fn like_pattern(query: &str) -> String {
    format!("%{}%", query.trim())
}

/// Number of pages needed for `total` rows.
pub fn total_pages(total: i64, per_page: i64) -> i64 {
    if total <= 0 || per_page <= 0 {
        return 0;
    }
    (total + per_page - 1) / per_page
}

/// Row offset of a 1-based page number; pages below 1 clamp to the first page
/// and offsets past `i64::MAX` saturate.
pub fn page_offset(page: i64, per_page: i64) -> i64 {
    (page.max(1) - 1).saturating_mul(per_page.max(0))
}
