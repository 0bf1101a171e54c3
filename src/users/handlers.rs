use axum::{
    extract::{Query, RawQuery, State},
    response::Redirect,
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{dto::safe_callback, handlers::LOGIN_PATH, password::hash_password, AuthUser},
    db::StoreError,
    error::AppError,
    listing::{cached_page, Pagination, TablePage},
    state::AppState,
    users::{dto::UserForm, repo::UserStore, repo_types::NewUser},
};

pub const USERS_PATH: &str = "/dashboard/users";
pub const USER_EXISTS: &str = "User already exists.";

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(create_user))
        .route(USERS_PATH, get(list_users))
}

/// Sign-up: validates, refuses taken emails, stores an argon2 hash.
#[instrument(skip(state, form))]
pub async fn create_user(
    State(state): State<AppState>,
    Form(form): Form<UserForm>,
) -> Result<Redirect, AppError> {
    let input = form.validate().map_err(|errors| {
        warn!("sign-up rejected by schema");
        AppError::validation(errors, "Missing Fields. Failed to Create User.")
    })?;

    match state.store.find_user_by_email(&input.email).await {
        Ok(Some(_)) => {
            warn!(email = %input.email, "email already registered");
            return Err(AppError::Conflict(USER_EXISTS));
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, "find_user_by_email failed");
            return Err(AppError::Database("Database Error: Failed to Create User."));
        }
    }

    let password_hash = hash_password(&input.password)?;
    let new_user = NewUser {
        name: input.name,
        email: input.email,
        password_hash,
    };

    let user = match state.store.create_user(&new_user).await {
        Ok(u) => u,
        Err(StoreError::Duplicate) => {
            warn!(email = %new_user.email, "email registered concurrently");
            return Err(AppError::Conflict(USER_EXISTS));
        }
        Err(e) => {
            error!(error = %e, "create_user failed");
            return Err(AppError::Database("Database Error: Failed to Create User."));
        }
    };

    info!(user_id = %user.id, "user registered");
    state.cache.revalidate(USERS_PATH).await;
    Ok(Redirect::to(&safe_callback(form.callback_url.as_deref(), LOGIN_PATH)))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(p): Query<Pagination>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Value>, AppError> {
    let per_page = state.config.items_per_page;
    cached_page(&state, USERS_PATH, raw.as_deref(), || async {
        let failed = |e: StoreError| {
            error!(error = %e, "fetch users failed");
            AppError::Database("Database Error: Failed to fetch user table.")
        };
        let rows = state
            .store
            .filtered_users(p.query(), per_page, p.offset(per_page))
            .await
            .map_err(failed)?;
        let total = state.store.count_users(p.query()).await.map_err(failed)?;
        Ok::<_, AppError>(TablePage::new(rows, &p, total, per_page))
    })
    .await
}
