use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::validation::FieldErrors;

/// Body returned whenever an action does not complete; forms render
/// `message` at the top and `errors` next to each field.
#[derive(Debug, Clone, Serialize)]
pub struct FormState {
    pub message: String,
    #[serde(skip_serializing_if = "FieldErrors::is_empty")]
    pub errors: FieldErrors,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{message}")]
    Validation {
        message: &'static str,
        errors: FieldErrors,
    },

    #[error("{0}")]
    Database(&'static str),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Unauthorized(String),

    #[error("Something went wrong.")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(errors: FieldErrors, message: &'static str) -> Self {
        AppError::Validation { message, errors }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn form_state(&self) -> FormState {
        let errors = match self {
            AppError::Validation { errors, .. } => errors.clone(),
            _ => FieldErrors::new(),
        };
        FormState {
            message: self.to_string(),
            errors,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal(ref e) = self {
            tracing::error!(error = %e, "internal error");
        }
        (self.status(), Json(self.form_state())).into_response()
    }
}
