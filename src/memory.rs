//! In-memory store used by handler tests in place of PostgreSQL.
//!
//! Locks are always taken `customers` before `invoices`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::customers::repo::CustomerStore;
use crate::customers::repo_types::{Customer, CustomerField, CustomerInput, CustomerTableRow};
use crate::db::{StoreError, StoreResult};
use crate::invoices::repo::InvoiceStore;
use crate::invoices::repo_types::{
    CardTotals, Invoice, InvoiceInput, InvoiceStatus, InvoiceTableRow, LatestInvoiceRow,
};
use crate::revenue::{Revenue, RevenueStore};
use crate::users::repo::UserStore;
use crate::users::repo_types::{NewUser, User, UserRow};

#[derive(Default)]
pub struct MemoryStore {
    pub users: Mutex<Vec<User>>,
    pub customers: Mutex<Vec<Customer>>,
    pub invoices: Mutex<Vec<Invoice>>,
    pub revenue: Mutex<Vec<Revenue>>,
    failing: AtomicBool,
    stale_email_lookups: AtomicBool,
}

fn matches<S: AsRef<str>>(query: &str, fields: &[S]) -> bool {
    let q = query.trim().to_lowercase();
    fields.iter().any(|f| f.as_ref().to_lowercase().contains(&q))
}

fn page<T>(rows: Vec<T>, limit: i64, offset: i64) -> Vec<T> {
    rows.into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect()
}

impl MemoryStore {
    /// Makes every following call fail like a dropped connection.
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    /// Makes `find_user_by_email` miss, as when another sign-up with the same
    /// email commits between the lookup and the insert.
    pub fn stale_email_lookups(&self) {
        self.stale_email_lookups.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Sqlx(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    pub fn add_customer(&self, name: &str, email: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.customers.lock().unwrap().push(Customer {
            id,
            name: name.into(),
            email: email.into(),
            image_url: format!("https://example.com/{}.png", name.to_lowercase()),
        });
        id
    }

    pub fn add_invoice(&self, customer_id: Uuid, amount: i32, status: InvoiceStatus, date: Date) -> Uuid {
        let id = Uuid::new_v4();
        self.invoices.lock().unwrap().push(Invoice {
            id,
            customer_id,
            amount,
            status: status.as_str().into(),
            date,
        });
        id
    }

    fn joined(&self) -> Vec<InvoiceTableRow> {
        let customers = self.customers.lock().unwrap();
        let mut rows: Vec<InvoiceTableRow> = self
            .invoices
            .lock()
            .unwrap()
            .iter()
            .filter_map(|inv| {
                let c = customers.iter().find(|c| c.id == inv.customer_id)?;
                Some(InvoiceTableRow {
                    id: inv.id,
                    customer_id: c.id,
                    name: c.name.clone(),
                    email: c.email.clone(),
                    image_url: c.image_url.clone(),
                    date: inv.date,
                    amount: inv.amount,
                    status: inv.status.clone(),
                })
            })
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        rows
    }

    fn filtered_joined(&self, query: &str) -> Vec<InvoiceTableRow> {
        self.joined()
            .into_iter()
            .filter(|r| {
                matches(
                    query,
                    &[&r.name, &r.email, &r.amount.to_string(), &r.date.to_string(), &r.status],
                )
            })
            .collect()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.check()?;
        if self.stale_email_lookups.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(self.users.lock().unwrap().iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.check()?;
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, user: &NewUser) -> StoreResult<User> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate);
        }
        let created = User {
            id: Uuid::new_v4(),
            name: user.name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn filtered_users(&self, query: &str, limit: i64, offset: i64) -> StoreResult<Vec<UserRow>> {
        self.check()?;
        let mut rows: Vec<UserRow> = self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| matches(query, &[&u.name, &u.email]))
            .map(|u| UserRow {
                id: u.id,
                name: u.name.clone(),
                email: u.email.clone(),
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(page(rows, limit, offset))
    }

    async fn count_users(&self, query: &str) -> StoreResult<i64> {
        self.check()?;
        let users = self.users.lock().unwrap();
        Ok(users.iter().filter(|u| matches(query, &[&u.name, &u.email])).count() as i64)
    }
}

#[async_trait]
impl CustomerStore for MemoryStore {
    async fn customer_fields(&self) -> StoreResult<Vec<CustomerField>> {
        self.check()?;
        let mut rows: Vec<CustomerField> = self
            .customers
            .lock()
            .unwrap()
            .iter()
            .map(|c| CustomerField {
                id: c.id,
                name: c.name.clone(),
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn customer_by_id(&self, id: Uuid) -> StoreResult<Option<Customer>> {
        self.check()?;
        Ok(self.customers.lock().unwrap().iter().find(|c| c.id == id).cloned())
    }

    async fn filtered_customers(
        &self,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<CustomerTableRow>> {
        self.check()?;
        let customers = self.customers.lock().unwrap();
        let invoices = self.invoices.lock().unwrap();
        let mut rows: Vec<CustomerTableRow> = customers
            .iter()
            .filter(|c| matches(query, &[&c.name, &c.email]))
            .map(|c| {
                let own = invoices.iter().filter(|i| i.customer_id == c.id);
                let sum = |status: &str| -> i64 {
                    own.clone()
                        .filter(|i| i.status == status)
                        .map(|i| i64::from(i.amount))
                        .sum()
                };
                CustomerTableRow {
                    id: c.id,
                    name: c.name.clone(),
                    email: c.email.clone(),
                    image_url: c.image_url.clone(),
                    total_invoices: own.clone().count() as i64,
                    total_pending: sum("pending"),
                    total_paid: sum("paid"),
                }
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(page(rows, limit, offset))
    }

    async fn count_customers(&self, query: &str) -> StoreResult<i64> {
        self.check()?;
        let customers = self.customers.lock().unwrap();
        Ok(customers
            .iter()
            .filter(|c| matches(query, &[&c.name, &c.email]))
            .count() as i64)
    }

    async fn create_customer(&self, input: &CustomerInput) -> StoreResult<Uuid> {
        self.check()?;
        let id = Uuid::new_v4();
        self.customers.lock().unwrap().push(Customer {
            id,
            name: input.name.clone(),
            email: input.email.clone(),
            image_url: input.image_url.clone(),
        });
        Ok(id)
    }

    async fn update_customer(&self, id: Uuid, input: &CustomerInput) -> StoreResult<()> {
        self.check()?;
        let mut customers = self.customers.lock().unwrap();
        let c = customers
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(StoreError::NotFound)?;
        c.name = input.name.clone();
        c.email = input.email.clone();
        c.image_url = input.image_url.clone();
        Ok(())
    }

    async fn delete_customer(&self, id: Uuid) -> StoreResult<()> {
        self.check()?;
        let mut customers = self.customers.lock().unwrap();
        let before = customers.len();
        customers.retain(|c| c.id != id);
        if customers.len() == before {
            return Err(StoreError::NotFound);
        }
        self.invoices.lock().unwrap().retain(|i| i.customer_id != id);
        Ok(())
    }
}

#[async_trait]
impl InvoiceStore for MemoryStore {
    async fn latest_invoices(&self, limit: i64) -> StoreResult<Vec<LatestInvoiceRow>> {
        self.check()?;
        Ok(page(self.joined(), limit, 0)
            .into_iter()
            .map(|r| LatestInvoiceRow {
                id: r.id,
                name: r.name,
                email: r.email,
                image_url: r.image_url,
                amount: r.amount,
            })
            .collect())
    }

    async fn filtered_invoices(
        &self,
        query: &str,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<InvoiceTableRow>> {
        self.check()?;
        Ok(page(self.filtered_joined(query), limit, offset))
    }

    async fn count_invoices(&self, query: &str) -> StoreResult<i64> {
        self.check()?;
        Ok(self.filtered_joined(query).len() as i64)
    }

    async fn invoice_by_id(&self, id: Uuid) -> StoreResult<Option<Invoice>> {
        self.check()?;
        Ok(self.invoices.lock().unwrap().iter().find(|i| i.id == id).cloned())
    }

    async fn create_invoice(&self, input: &InvoiceInput, date: Date) -> StoreResult<Uuid> {
        self.check()?;
        if !self.customers.lock().unwrap().iter().any(|c| c.id == input.customer_id) {
            return Err(StoreError::Sqlx(sqlx::Error::RowNotFound));
        }
        Ok(self.add_invoice(input.customer_id, input.amount_cents, input.status, date))
    }

    async fn update_invoice(&self, id: Uuid, input: &InvoiceInput) -> StoreResult<()> {
        self.check()?;
        let mut invoices = self.invoices.lock().unwrap();
        let inv = invoices
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(StoreError::NotFound)?;
        inv.customer_id = input.customer_id;
        inv.amount = input.amount_cents;
        inv.status = input.status.as_str().into();
        Ok(())
    }

    async fn delete_invoice(&self, id: Uuid) -> StoreResult<()> {
        self.check()?;
        let mut invoices = self.invoices.lock().unwrap();
        let before = invoices.len();
        invoices.retain(|i| i.id != id);
        if invoices.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn card_totals(&self) -> StoreResult<CardTotals> {
        self.check()?;
        let number_of_customers = self.customers.lock().unwrap().len() as i64;
        let invoices = self.invoices.lock().unwrap();
        let sum = |status: &str| -> i64 {
            invoices
                .iter()
                .filter(|i| i.status == status)
                .map(|i| i64::from(i.amount))
                .sum()
        };
        Ok(CardTotals {
            number_of_invoices: invoices.len() as i64,
            number_of_customers,
            total_paid: sum("paid"),
            total_pending: sum("pending"),
        })
    }
}

#[async_trait]
impl RevenueStore for MemoryStore {
    async fn revenue(&self) -> StoreResult<Vec<Revenue>> {
        self.check()?;
        Ok(self.revenue.lock().unwrap().clone())
    }
}
