use async_trait::async_trait;
use uuid::Uuid;

use crate::customers::repo_types::{Customer, CustomerField, CustomerInput, CustomerTableRow};
use crate::db::{like_pattern, PgStore, StoreError, StoreResult};

#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn customer_fields(&self) -> StoreResult<Vec<CustomerField>>;
    async fn customer_by_id(&self, id: Uuid) -> StoreResult<Option<Customer>>;
    async fn filtered_customers(
        &self,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<CustomerTableRow>>;
    async fn count_customers(&self, query: &str) -> StoreResult<i64>;
    async fn create_customer(&self, input: &CustomerInput) -> StoreResult<Uuid>;
    async fn update_customer(&self, id: Uuid, input: &CustomerInput) -> StoreResult<()>;
    async fn delete_customer(&self, id: Uuid) -> StoreResult<()>;
}

#[async_trait]
impl CustomerStore for PgStore {
    async fn customer_fields(&self) -> StoreResult<Vec<CustomerField>> {
        let rows = sqlx::query_as::<_, CustomerField>(
            r#"SELECT id, name FROM customers ORDER BY name ASC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn customer_by_id(&self, id: Uuid) -> StoreResult<Option<Customer>> {
        let row = sqlx::query_as::<_, Customer>(
            r#"SELECT id, name, email, image_url FROM customers WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn filtered_customers(
        &self,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<CustomerTableRow>> {
        let rows = sqlx::query_as::<_, CustomerTableRow>(
            r#"
            SELECT
              customers.id,
              customers.name,
              customers.email,
              customers.image_url,
              COUNT(invoices.id) AS total_invoices,
              COALESCE(SUM(CASE WHEN invoices.status = 'pending' THEN invoices.amount ELSE 0 END), 0)::BIGINT AS total_pending,
              COALESCE(SUM(CASE WHEN invoices.status = 'paid' THEN invoices.amount ELSE 0 END), 0)::BIGINT AS total_paid
            FROM customers
            LEFT JOIN invoices ON customers.id = invoices.customer_id
            WHERE customers.name ILIKE $1 OR customers.email ILIKE $1
            GROUP BY customers.id, customers.name, customers.email, customers.image_url
            ORDER BY customers.name ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(like_pattern(query))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn count_customers(&self, query: &str) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM customers WHERE name ILIKE $1 OR email ILIKE $1"#,
        )
        .bind(like_pattern(query))
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn create_customer(&self, input: &CustomerInput) -> StoreResult<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO customers (name, email, image_url)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.image_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn update_customer(&self, id: Uuid, input: &CustomerInput) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE customers
            SET name = $1, email = $2, image_url = $3
            WHERE id = $4
            "#,
        )
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.image_url)
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_customer(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query(r#"DELETE FROM customers WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
