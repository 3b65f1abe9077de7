// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Custom Test Assertions
//!
//! Responses are buffered into a [`TestResponse`] so status, headers and
//! JSON body can be asserted together with informative failure messages.

use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Response, StatusCode};
use serde_json::Value;

/// Largest body the helpers will buffer.
const MAX_BODY: usize = 1024 * 1024;

// =============================================================================
// TestResponse
// =============================================================================

/// A buffered response.
#[derive(Debug)]
pub struct TestResponse {
    /// Status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Body parsed as JSON, or `Null` when empty or not JSON.
    pub body: Value,
}

impl TestResponse {
    /// Buffer a response.
    pub async fn from_response(response: Response<Body>) -> Self {
        let (parts, body) = response.into_parts();
        let bytes = to_bytes(body, MAX_BODY)
            .await
            .expect("Failed to read response body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        Self {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }

    /// Assert the status code.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status, expected,
            "Expected status {}, got {} with body {}",
            expected, self.status, self.body
        );
        self
    }

    /// Assert an error response with the given status, code and message.
    pub fn assert_error(&self, status: StatusCode, code: &str, message: &str) -> &Self {
        self.assert_status(status);
        assert_eq!(
            self.body["error"]["code"], code,
            "Unexpected error code in {}",
            self.body
        );
        assert_eq!(
            self.body["error"]["message"], message,
            "Unexpected error message in {}",
            self.body
        );
        self
    }

    /// Assert the generic 401 body.
    pub fn assert_unauthenticated(&self) -> &Self {
        self.assert_error(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "Authentication required",
        )
    }

    /// Assert the generic 403 body.
    pub fn assert_access_denied(&self) -> &Self {
        self.assert_error(StatusCode::FORBIDDEN, "FORBIDDEN", "Access denied")
    }

    /// Returns the `Set-Cookie` header, if any.
    pub fn set_cookie(&self) -> Option<&str> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
    }

    /// Returns the value carried by the `Set-Cookie` header.
    pub fn cookie_value(&self) -> Option<&str> {
        let cookie = self.set_cookie()?;
        let pair = cookie.split(';').next()?;
        pair.split_once('=').map(|(_, value)| value)
    }

    /// Returns `body.token` as a string.
    pub fn token(&self) -> &str {
        self.body["token"]
            .as_str()
            .unwrap_or_else(|| panic!("No token in {}", self.body))
    }
}
