use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::customers::repo_types::CustomerField;
use crate::format::{cents_to_dollars, format_currency};
use crate::invoices::repo_types::{
    Invoice, InvoiceInput, InvoiceStatus, InvoiceTableRow, LatestInvoiceRow,
};
use crate::validation::FieldErrors;

pub const MSG_CUSTOMER: &str = "Please select a customer.";
pub const MSG_AMOUNT: &str = "Please enter an amount greater than $0.";
pub const MSG_AMOUNT_NAN: &str = "Please enter a valid amount.";
pub const MSG_AMOUNT_LARGE: &str = "Please enter a smaller amount.";
pub const MSG_STATUS: &str = "Please select an invoice status.";

/// Create / edit invoice form; `amount` is in dollars.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceForm {
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Dollars -> cents. A blank amount counts as zero.
fn parse_amount(errors: &mut FieldErrors, raw: Option<&str>) -> i32 {
    let raw = raw.map(str::trim).unwrap_or_default();
    let dollars = if raw.is_empty() {
        0.0
    } else {
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            _ => {
                errors.add("amount", MSG_AMOUNT_NAN);
                return 0;
            }
        }
    };
    let cents = (dollars * 100.0).round();
    if cents < 1.0 {
        errors.add("amount", MSG_AMOUNT);
        return 0;
    }
    if cents > f64::from(i32::MAX) {
        errors.add("amount", MSG_AMOUNT_LARGE);
        return 0;
    }
    cents as i32
}

impl InvoiceForm {
    pub fn validate(&self) -> Result<InvoiceInput, FieldErrors> {
        let mut errors = FieldErrors::new();

        let customer_id = self
            .customer_id
            .as_deref()
            .and_then(|raw| Uuid::parse_str(raw.trim()).ok());
        if customer_id.is_none() {
            errors.add("customerId", MSG_CUSTOMER);
        }

        let amount_cents = parse_amount(&mut errors, self.amount.as_deref());

        let status = self
            .status
            .as_deref()
            .and_then(|s| s.trim().parse::<InvoiceStatus>().ok());
        if status.is_none() {
            errors.add("status", MSG_STATUS);
        }

        match (customer_id, status) {
            (Some(customer_id), Some(status)) if errors.is_empty() => Ok(InvoiceInput {
                customer_id,
                amount_cents,
                status,
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InvoiceTableItem {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub name: String,
    pub email: String,
    pub image_url: String,
    pub date: String,
    pub amount: String,
    pub status: String,
}

impl From<InvoiceTableRow> for InvoiceTableItem {
    fn from(r: InvoiceTableRow) -> Self {
        Self {
            id: r.id,
            customer_id: r.customer_id,
            name: r.name,
            email: r.email,
            image_url: r.image_url,
            date: r.date.to_string(),
            amount: format_currency(i64::from(r.amount)),
            status: r.status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LatestInvoice {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub image_url: String,
    pub amount: String,
}

impl From<LatestInvoiceRow> for LatestInvoice {
    fn from(r: LatestInvoiceRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            email: r.email,
            image_url: r.image_url,
            amount: format_currency(i64::from(r.amount)),
        }
    }
}

/// Invoice as pre-filled into the edit form, amount back in dollars.
#[derive(Debug, Serialize)]
pub struct InvoiceFormData {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub amount: f64,
    pub status: String,
}

impl From<Invoice> for InvoiceFormData {
    fn from(i: Invoice) -> Self {
        Self {
            id: i.id,
            customer_id: i.customer_id,
            amount: cents_to_dollars(i.amount),
            status: i.status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateInvoicePage {
    pub customers: Vec<CustomerField>,
}

#[derive(Debug, Serialize)]
pub struct EditInvoicePage {
    pub invoice: InvoiceFormData,
    pub customers: Vec<CustomerField>,
}
