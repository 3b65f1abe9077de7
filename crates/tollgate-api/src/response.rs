// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::{Identity, Permission, Role};
use crate::store::UserSummary;

// =============================================================================
// ApiResponse
// =============================================================================

/// Generic API response wrapper.
///
/// Provides consistent response structure across all endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the operation was successful.
    pub success: bool,
    /// Response data (if successful).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (if failed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Creates a successful response with data.
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

// =============================================================================
// Typed Responses
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: String,
    /// Version string.
    pub version: String,
}

impl HealthResponse {
    /// Creates a healthy response.
    pub fn healthy() -> Self {
        Self {
            status: "ok".to_string(),
            version: crate::VERSION.to_string(),
        }
    }
}

/// Returned by login and signup.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// Always `true`; failures use the error body.
    pub success: bool,
    /// Session token.
    pub token: String,
    /// Token type (always "Bearer").
    pub token_type: String,
    /// Expires in seconds.
    pub expires_in: u64,
    /// The authenticated user.
    pub user: CurrentUser,
}

impl AuthResponse {
    /// Creates a new auth response.
    pub fn new(token: String, expires_in: u64, user: CurrentUser) -> Self {
        Self {
            success: true,
            token,
            token_type: "Bearer".to_string(),
            expires_in,
            user,
        }
    }
}

/// An identity together with its resolved capabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User ID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Role tag.
    pub role: Role,
    /// Capabilities granted to the role.
    pub permissions: Permission,
}

impl CurrentUser {
    /// Creates the view of an identity under the given grant.
    pub fn new(identity: &Identity, permissions: Permission) -> Self {
        Self {
            id: identity.id.clone(),
            name: identity.display_name.clone(),
            email: identity.email.clone(),
            role: identity.role,
            permissions,
        }
    }
}

/// Body of `GET /api/admin/users`.
#[derive(Debug, Serialize)]
pub struct UserListResponse {
    /// Users without password hashes.
    pub users: Vec<UserSummary>,
    /// Number of users.
    pub total: usize,
}

/// A plain acknowledgement message.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    /// The message.
    pub message: String,
}

impl MessageResponse {
    /// Creates a message response.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_success() {
        let response = ApiResponse::success(42);
        assert!(response.success);
        assert_eq!(response.data, Some(42));
        assert!(response.error.is_none());
    }

    #[test]
    fn test_api_response_error() {
        let response: ApiResponse<()> = ApiResponse::error("Something went wrong");
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.error, Some("Something went wrong".to_string()));
    }

    #[test]
    fn test_current_user_shape() {
        let identity = Identity::new("user_1", "Uma", "uma@example.com", Role::Uploader);
        let user = CurrentUser::new(&identity, Role::Uploader.default_permissions());
        let value = serde_json::to_value(&user).unwrap();

        assert_eq!(value["name"], "Uma");
        assert_eq!(value["role"], "uploader");
        assert_eq!(value["permissions"]["can_upload"], true);
        assert_eq!(value["permissions"]["can_delete"], false);
    }
}
