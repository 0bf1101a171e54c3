use async_trait::async_trait;
use time::Date;
use uuid::Uuid;

use crate::db::{like_pattern, PgStore, StoreError, StoreResult};
use crate::invoices::repo_types::{CardTotals, Invoice, InvoiceInput, InvoiceTableRow, LatestInvoiceRow};

#[async_trait]
pub trait InvoiceStore: Send + Sync {
    async fn latest_invoices(&self, limit: i64) -> StoreResult<Vec<LatestInvoiceRow>>;
    async fn filtered_invoices(
        &self,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<InvoiceTableRow>>;
    async fn count_invoices(&self, query: &str) -> StoreResult<i64>;
    async fn invoice_by_id(&self, id: Uuid) -> StoreResult<Option<Invoice>>;
    async fn create_invoice(&self, input: &InvoiceInput, date: Date) -> StoreResult<Uuid>;
    async fn update_invoice(&self, id: Uuid, input: &InvoiceInput) -> StoreResult<()>;
    async fn delete_invoice(&self, id: Uuid) -> StoreResult<()>;
    async fn card_totals(&self) -> StoreResult<CardTotals>;
}

#[async_trait]
impl InvoiceStore for PgStore {
    async fn latest_invoices(&self, limit: i64) -> StoreResult<Vec<LatestInvoiceRow>> {
        let rows = sqlx::query_as::<_, LatestInvoiceRow>(
            r#"
            SELECT invoices.id, customers.name, customers.email, customers.image_url, invoices.amount
            FROM invoices
            JOIN customers ON invoices.customer_id = customers.id
            ORDER BY invoices.date DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn filtered_invoices(
        &self,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<InvoiceTableRow>> {
        let rows = sqlx::query_as::<_, InvoiceTableRow>(
            r#"
            SELECT
              invoices.id,
              invoices.customer_id,
              customers.name,
              customers.email,
              customers.image_url,
              invoices.date,
              invoices.amount,
              invoices.status
            FROM invoices
            JOIN customers ON invoices.customer_id = customers.id
            WHERE
              customers.name ILIKE $1 OR
              customers.email ILIKE $1 OR
              invoices.amount::text ILIKE $1 OR
              invoices.date::text ILIKE $1 OR
              invoices.status ILIKE $1
            ORDER BY invoices.date DESC
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

    async fn count_invoices(&self, query: &str) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM invoices
            JOIN customers ON invoices.customer_id = customers.id
            WHERE
              customers.name ILIKE $1 OR
              customers.email ILIKE $1 OR
              invoices.amount::text ILIKE $1 OR
              invoices.date::text ILIKE $1 OR
              invoices.status ILIKE $1
            "#,
        )
        .bind(like_pattern(query))
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn invoice_by_id(&self, id: Uuid) -> StoreResult<Option<Invoice>> {
        let row = sqlx::query_as::<_, Invoice>(
            r#"SELECT id, customer_id, amount, status, date FROM invoices WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn create_invoice(&self, input: &InvoiceInput, date: Date) -> StoreResult<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO invoices (customer_id, amount, status, date)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(input.customer_id)
        .bind(input.amount_cents)
        .bind(input.status.as_str())
        .bind(date)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn update_invoice(&self, id: Uuid, input: &InvoiceInput) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE invoices
            SET customer_id = $1, amount = $2, status = $3
            WHERE id = $4
            "#,
        )
        .bind(input.customer_id)
        .bind(input.amount_cents)
        .bind(input.status.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete_invoice(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query(r#"DELETE FROM invoices WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn card_totals(&self) -> StoreResult<CardTotals> {
        let totals = sqlx::query_as::<_, CardTotals>(
            r#"
            SELECT
              (SELECT COUNT(*) FROM invoices) AS number_of_invoices,
              (SELECT COUNT(*) FROM customers) AS number_of_customers,
              (SELECT COALESCE(SUM(amount), 0)::BIGINT FROM invoices WHERE status = 'paid') AS total_paid,
              (SELECT COALESCE(SUM(amount), 0)::BIGINT FROM invoices WHERE status = 'pending') AS total_pending
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(totals)
    }
}
