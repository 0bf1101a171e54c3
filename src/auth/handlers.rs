use axum::{
    extract::{FromRef, State},
    http::header,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{safe_callback, LoginForm, PublicUser, RefreshRequest, TokenResponse},
        extractors::{AuthUser, REFRESH_COOKIE, SESSION_COOKIE},
        jwt::JwtKeys,
        password::verify_password,
    },
    error::AppError,
    state::AppState,
    users::repo::UserStore,
};

pub const LOGIN_PATH: &str = "/login";
pub const INVALID_CREDENTIALS: &str = "Invalid credentials.";
pub const INVALID_SESSION: &str = "Invalid or expired session.";

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn cookie(state: &AppState, name: &str, value: &str, path: &str, max_age: u64) -> String {
    let secure = if state.config.cookie_secure { "; Secure" } else { "" };
    format!("{name}={value}; Path={path}; HttpOnly; SameSite=Lax; Max-Age={max_age}{secure}")
}

/// Checks the credentials and starts a session cookie.
#[instrument(skip(state, form))]
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let Some(creds) = form.credentials() else {
        warn!("login rejected by credentials schema");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    };

    let user = match state.store.find_user_by_email(&creds.email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(email = %creds.email, "login unknown email");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
        }
        Err(e) => {
            error!(error = %e, "find_user_by_email failed");
            return Err(AppError::Internal(e.into()));
        }
    };

    if !verify_password(&creds.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let access = keys.sign_access(user.id)?;
    let refresh = keys.sign_refresh(user.id)?;

    info!(user_id = %user.id, "user logged in");
    let target = safe_callback(form.callback_url.as_deref(), "/dashboard");
    Ok((
        AppendHeaders([
            (
                header::SET_COOKIE,
                cookie(&state, SESSION_COOKIE, &access, "/", keys.access_ttl.as_secs()),
            ),
            (
                header::SET_COOKIE,
                cookie(&state, REFRESH_COOKIE, &refresh, "/auth", keys.refresh_ttl.as_secs()),
            ),
        ]),
        Redirect::to(&target),
    )
        .into_response())
}

#[instrument(skip(state))]
pub async fn logout(State(state): State<AppState>) -> Response {
    (
        AppendHeaders([
            (header::SET_COOKIE, cookie(&state, SESSION_COOKIE, "", "/", 0)),
            (header::SET_COOKIE, cookie(&state, REFRESH_COOKIE, "", "/auth", 0)),
        ]),
        Redirect::to(LOGIN_PATH),
    )
        .into_response()
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| {
            warn!(error = %e, "refresh token rejected");
            AppError::Unauthorized(INVALID_SESSION.into())
        })?;

    let user = state
        .store
        .find_user_by_id(claims.sub)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::Unauthorized("User not found.".into()))?;

    Ok(Json(TokenResponse {
        access_token: keys.sign_access(user.id)?,
        refresh_token: keys.sign_refresh(user.id)?,
        user: PublicUser {
            id: user.id,
            name: user.name,
            email: user.email,
        },
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    let user = state
        .store
        .find_user_by_id(user_id)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| {
            error!(user_id = %user_id, "user not found");
            AppError::Unauthorized("User not found.".into())
        })?;

    Ok(Json(PublicUser {
        id: user.id,
        name: user.name,
        email: user.email,
    }))
}
