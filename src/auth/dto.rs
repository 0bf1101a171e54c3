use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::is_valid_email;

/// Sign-in form.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginForm {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub callback_url: Option<String>,
}

/// Credentials that passed the sign-in schema.
#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    /// Sign-in schema: a valid email and a password of at least 6 characters.
    pub fn credentials(&self) -> Option<Credentials> {
        let email = self.email.as_deref()?.trim().to_lowercase();
        let password = self.password.clone()?;
        if !is_valid_email(&email) || password.chars().count() < 6 {
            return None;
        }
        Some(Credentials { email, password })
    }
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: PublicUser,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Local redirect target from a form's `callbackUrl`, or `default`.
pub fn safe_callback(raw: Option<&str>, default: &str) -> String {
    match raw.map(str::trim) {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path.to_string()
        }
        _ => default.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(email: &str, password: &str) -> LoginForm {
        LoginForm {
            email: Some(email.into()),
            password: Some(password.into()),
            callback_url: None,
        }
    }

    #[test]
    fn credentials_schema() {
        let c = form(" User@Nextmail.com ", "123456").credentials().unwrap();
        assert_eq!(c.email, "user@nextmail.com");
        assert!(form("user@nextmail.com", "12345").credentials().is_none());
        assert!(form("not-an-email", "123456").credentials().is_none());
        assert!(LoginForm::default().credentials().is_none());
    }

    #[test]
    fn callback_must_be_local() {
        assert_eq!(safe_callback(Some("/dashboard/invoices"), "/dashboard"), "/dashboard/invoices");
        assert_eq!(safe_callback(Some("https://evil.example"), "/dashboard"), "/dashboard");
        assert_eq!(safe_callback(Some("//evil.example"), "/dashboard"), "/dashboard");
        assert_eq!(safe_callback(None, "/login"), "/login");
    }

    #[test]
    fn public_user_serialization() {
        let user = PublicUser {
            id: Uuid::new_v4(),
            name: "User".into(),
            email: "user@nextmail.com".into(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("user@nextmail.com"));
        assert!(!json.contains("password"));
    }
}
