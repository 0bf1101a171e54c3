use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::customers::repo_types::{CustomerInput, CustomerTableRow};
use crate::format::format_currency;
use crate::validation::{check_email, check_name, is_valid_url, non_empty, FieldErrors, MSG_URL};

/// Create / edit customer form.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl CustomerForm {
    pub fn validate(&self) -> Result<CustomerInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = check_name(&mut errors, self.name.as_deref());
        let email = check_email(&mut errors, self.email.as_deref(), false);
        let image_url = non_empty(self.image_url.as_deref()).unwrap_or_default();
        if !is_valid_url(&image_url) {
            errors.add("imageUrl", MSG_URL);
        }
        errors.into_result(CustomerInput {
            name,
            email,
            image_url,
        })
    }
}

/// Customers table row as rendered, totals formatted.
#[derive(Debug, Serialize)]
pub struct CustomerTableItem {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub image_url: String,
    pub total_invoices: i64,
    pub total_pending: String,
    pub total_paid: String,
}

impl From<CustomerTableRow> for CustomerTableItem {
    fn from(r: CustomerTableRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            email: r.email,
            image_url: r.image_url,
            total_invoices: r.total_invoices,
            total_pending: format_currency(r.total_pending),
            total_paid: format_currency(r.total_paid),
        }
    }
}
