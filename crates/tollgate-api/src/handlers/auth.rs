// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication handlers.

use axum::{
    extract::State,
    http::{header, HeaderValue},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use subtle::ConstantTimeEq;

use crate::auth::{password, Identity, Role};
use crate::config::AuthConfig;
use crate::error::{ApiError, ApiResult};
use crate::extractors::{Auth, ValidatedJson};
use crate::response::{AuthResponse, CurrentUser, MessageResponse};
use crate::state::AppState;
use crate::store::{NewUser, StoreError};

/// Returned for every failed login, whatever the cause.
const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Minimum password length for new accounts.
pub const MIN_PASSWORD_LEN: usize = 6;

// =============================================================================
// Login
// =============================================================================

/// Login request body.
#[derive(Deserialize)]
pub struct LoginRequest {
    /// Username.
    #[serde(default)]
    pub username: String,
    /// Password.
    #[serde(default)]
    pub password: String,
}

/// POST /api/auth/login
///
/// Verifies a username and password and issues a session token, both in the
/// body and as the session cookie.
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    if request.username.is_empty() || request.password.is_empty() {
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    let user = match state.store().find_by_username(&request.username).await {
        Ok(user) => user,
        Err(StoreError::NotFound { .. }) => {
            tracing::warn!(username = %request.username, "Login failed: unknown user");
            return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
        }
        Err(e) => return Err(e.into()),
    };

    let hash = user.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || password::verify_password(&request.password, &hash))
        .await
        .map_err(|e| ApiError::internal(format!("Password verification task failed: {}", e)))?;

    if !verified {
        tracing::warn!(username = %user.username, "Login failed: wrong password");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    let identity = user.identity();
    tracing::info!(user_id = %identity.id, role = %identity.role, "User logged in");

    session_response(&state, &identity)
}

// =============================================================================
// Signup
// =============================================================================

/// Signup request body.
#[derive(Deserialize)]
pub struct SignupRequest {
    /// Username.
    #[serde(default)]
    pub username: String,
    /// Email.
    #[serde(default)]
    pub email: String,
    /// Password.
    #[serde(default)]
    pub password: String,
    /// Shared registration key.
    #[serde(default)]
    pub signup_key: String,
}

/// POST /api/auth/signup
///
/// Creates an uploader account and signs it in. Requires the configured
/// signup key; when none is configured signup is disabled.
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<SignupRequest>,
) -> ApiResult<impl IntoResponse> {
    check_signup_key(&state.config.auth, &request.signup_key)?;

    let username = request.username.trim().to_string();
    let email = request.email.trim().to_string();
    let plain = request.password.trim().to_string();

    if username.is_empty() || email.is_empty() || plain.is_empty() {
        return Err(ApiError::bad_request(
            "Username, email and password are required",
        ));
    }
    if plain.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    ensure_unused(state.store().find_by_username(&username).await, "username")?;
    ensure_unused(state.store().find_by_email(&email).await, "email")?;

    let password_hash = tokio::task::spawn_blocking(move || password::hash_password(&plain))
        .await
        .map_err(|e| ApiError::internal(format!("Password hashing task failed: {}", e)))??;

    let user = state
        .store()
        .create_user(NewUser {
            id: None,
            username,
            email,
            password_hash,
            role: Role::Uploader,
        })
        .await?;

    let identity = user.identity();
    tracing::info!(user_id = %identity.id, username = %user.username, "User registered");

    session_response(&state, &identity)
}

fn check_signup_key(config: &AuthConfig, provided: &str) -> ApiResult<()> {
    let expected = config
        .signup_key()
        .ok_or_else(|| ApiError::forbidden("Signup is disabled"))?;

    if bool::from(expected.as_bytes().ct_eq(provided.as_bytes())) {
        Ok(())
    } else {
        tracing::warn!("Signup rejected: invalid signup key");
        Err(ApiError::unauthorized("Invalid signup key"))
    }
}

fn ensure_unused<T>(lookup: Result<T, StoreError>, field: &'static str) -> ApiResult<()> {
    match lookup {
        Ok(_) => Err(StoreError::Conflict { field }.into()),
        Err(StoreError::NotFound { .. }) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Logout
// =============================================================================

/// POST /api/auth/logout
///
/// Expires the session cookie. The token itself stays valid until its `exp`.
pub async fn logout(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let cookie = clear_cookie(&state.config.auth)?;

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(MessageResponse::new("Logged out")),
    ))
}

// =============================================================================
// Current User
// =============================================================================

/// GET /api/auth/me
///
/// Returns the authenticated identity and its resolved permissions.
pub async fn current_user(
    State(state): State<AppState>,
    Auth(identity): Auth,
) -> ApiResult<impl IntoResponse> {
    let permissions = state.rbac().permissions_for(identity.role);
    Ok(Json(CurrentUser::new(&identity, permissions)))
}

// =============================================================================
// Session Cookie
// =============================================================================

fn session_response(state: &AppState, identity: &Identity) -> ApiResult<impl IntoResponse> {
    let ttl = state.tokens().default_ttl();
    let token = state.tokens().issue_token(identity)?;
    let cookie = session_cookie(&state.config.auth, &token, ttl.as_secs())?;
    let user = CurrentUser::new(identity, state.rbac().permissions_for(identity.role));

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse::new(token, ttl.as_secs(), user)),
    ))
}

/// Builds the `Set-Cookie` value carrying a session token.
pub fn session_cookie(config: &AuthConfig, token: &str, max_age: u64) -> ApiResult<HeaderValue> {
    cookie_header(config, token, max_age)
}

/// Builds the `Set-Cookie` value that removes the session cookie.
pub fn clear_cookie(config: &AuthConfig) -> ApiResult<HeaderValue> {
    cookie_header(config, "", 0)
}

fn cookie_header(config: &AuthConfig, value: &str, max_age: u64) -> ApiResult<HeaderValue> {
    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        config.cookie_name, value, max_age
    );
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }

    HeaderValue::from_str(&cookie)
        .map_err(|e| ApiError::internal(format!("Invalid cookie header: {}", e)))
}

// =============================================================================
// Tests
// =============================================================================
