use async_trait::async_trait;
use serde::Serialize;
use sqlx::FromRow;

use crate::db::{PgStore, StoreResult};

/// Revenue of one month, in whole dollars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Revenue {
    pub month: String,
    pub revenue: i32,
}

#[async_trait]
pub trait RevenueStore: Send + Sync {
    async fn revenue(&self) -> StoreResult<Vec<Revenue>>;
}

#[async_trait]
impl RevenueStore for PgStore {
    async fn revenue(&self) -> StoreResult<Vec<Revenue>> {
        let rows = sqlx::query_as::<_, Revenue>(r#"SELECT month, revenue FROM revenue ORDER BY position ASC"#)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
