// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session token authentication middleware.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::{header, HeaderMap, Request},
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};

use crate::auth::{Identity, TokenError, TokenManager};
use crate::error::ApiError;

/// Default name of the session cookie.
pub const DEFAULT_COOKIE_NAME: &str = "auth_token";

// =============================================================================
// AuthLayer
// =============================================================================

/// Layer for session token authentication.
///
/// Every request passing through must carry a valid token, either in the
/// session cookie or as an `Authorization: Bearer` header. On success the
/// derived [`Identity`] is inserted into request extensions; otherwise the
/// request is answered with 401 and never reaches the inner service.
///
/// Public routes are kept off this layer at the router level.
#[derive(Clone)]
pub struct AuthLayer {
    token_manager: Arc<TokenManager>,
    cookie_name: Arc<str>,
}

impl AuthLayer {
    /// Creates a new auth layer reading the default cookie name.
    pub fn new(token_manager: Arc<TokenManager>) -> Self {
        Self {
            token_manager,
            cookie_name: Arc::from(DEFAULT_COOKIE_NAME),
        }
    }

    /// Sets the session cookie name.
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = Arc::from(name.into());
        self
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthMiddleware {
            inner,
            token_manager: self.token_manager.clone(),
            cookie_name: self.cookie_name.clone(),
        }
    }
}

// =============================================================================
// AuthMiddleware
// =============================================================================

/// Middleware for session token authentication.
#[derive(Clone)]
pub struct AuthMiddleware<S> {
    inner: S,
    token_manager: Arc<TokenManager>,
    cookie_name: Arc<str>,
}

impl<S> Service<Request<Body>> for AuthMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let outcome = authenticate(&self.token_manager, req.headers(), &self.cookie_name);
        let mut inner = self.inner.clone();

        Box::pin(async move {
            match outcome {
                Ok(identity) => {
                    tracing::trace!(
                        user_id = %identity.id,
                        role = %identity.role,
                        "Request authenticated"
                    );
                    req.extensions_mut().insert(identity);
                    inner.call(req).await
                }
                Err(failure) => {
                    tracing::debug!(
                        reason = failure.as_str(),
                        path = %req.uri().path(),
                        "Authentication failed"
                    );
                    Ok(ApiError::unauthenticated().into_response())
                }
            }
        })
    }
}

// =============================================================================
// Authentication
// =============================================================================

/// Why a request could not be authenticated.
///
/// Only used for logging; the client always sees the same 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// Neither the cookie nor the bearer header carried a token.
    MissingToken,
    /// A token was found but rejected.
    Token(TokenError),
}

impl AuthFailure {
    /// Returns a short tag for structured logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthFailure::MissingToken => "missing_token",
            AuthFailure::Token(e) => e.as_str(),
        }
    }
}

/// Authenticates a request from its headers.
///
/// The session cookie is consulted first and the bearer header only when no
/// cookie is present. Nothing here suspends or touches shared mutable state.
pub fn authenticate(
    token_manager: &TokenManager,
    headers: &HeaderMap,
    cookie_name: &str,
) -> Result<Identity, AuthFailure> {
    let token = extract_cookie_token(headers, cookie_name)
        .or_else(|| extract_bearer_token(headers))
        .ok_or(AuthFailure::MissingToken)?;

    token_manager
        .validate_token(token)
        .map(Identity::from)
        .map_err(AuthFailure::Token)
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Extracts the session token from the `Cookie` header(s).
pub fn extract_cookie_token<'a>(headers: &'a HeaderMap, cookie_name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.trim_matches('"'))
        .filter(|value| !value.is_empty())
}

/// Extracts the bearer token from the Authorization header.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

// =============================================================================
// Tests
// =============================================================================
