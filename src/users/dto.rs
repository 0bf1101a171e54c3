use serde::Deserialize;

use crate::validation::{check_email, check_name, FieldErrors};

pub const MSG_PASSWORD: &str = "Please enter a password with at least 6 characters.";

/// Sign-up form.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub callback_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl UserForm {
    pub fn validate(&self) -> Result<UserInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        let name = check_name(&mut errors, self.name.as_deref());
        let email = check_email(&mut errors, self.email.as_deref(), true);
        let password = self.password.clone().unwrap_or_default();
        if password.chars().count() < 6 {
            errors.add("password", MSG_PASSWORD);
        }
        errors.into_result(UserInput {
            name,
            email,
            password,
        })
    }
}
