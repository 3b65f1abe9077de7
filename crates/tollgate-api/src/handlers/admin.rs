// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! User management handlers.
//!
//! Routed behind the admin role guard; the mutating endpoints additionally
//! require the matching capability.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::auth::Role;
use crate::error::{ApiError, ApiResult};
use crate::extractors::{Auth, ValidatedJson};
use crate::response::{ApiResponse, MessageResponse, UserListResponse};
use crate::state::AppState;
use crate::store::UserRecord;

/// GET /api/admin/users
///
/// Lists all users without their password hashes.
pub async fn list_users(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let users: Vec<_> = state
        .store()
        .list_users()
        .await?
        .iter()
        .map(UserRecord::summary)
        .collect();

    Ok(ApiResponse::success(UserListResponse {
        total: users.len(),
        users,
    }))
}

/// Role change request body.
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    /// New role tag.
    pub role: Role,
}

/// PUT /api/admin/users/{id}/role
///
/// Changes a user's role. Takes effect on the user's next token; tokens
/// already issued keep the old role until they expire.
pub async fn update_user_role(
    State(state): State<AppState>,
    Auth(admin): Auth,
    Path(user_id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateRoleRequest>,
) -> ApiResult<impl IntoResponse> {
    if user_id == admin.id && request.role != admin.role {
        return Err(ApiError::bad_request("Cannot change your own role"));
    }

    let user = state.store().update_role(&user_id, request.role).await?;

    tracing::info!(
        admin = %admin.id,
        user_id = %user.id,
        role = %user.role,
        "User role changed"
    );

    Ok(ApiResponse::success(user.summary()))
}

/// DELETE /api/admin/users/{id}
///
/// Deletes a user. An admin cannot delete their own account.
pub async fn delete_user(
    State(state): State<AppState>,
    Auth(admin): Auth,
    Path(user_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    if user_id == admin.id {
        return Err(ApiError::bad_request("Cannot delete yourself"));
    }

    state.store().delete_user(&user_id).await?;

    tracing::info!(admin = %admin.id, deleted_user = %user_id, "User deleted");

    Ok(Json(MessageResponse::new("User deleted")))
}
