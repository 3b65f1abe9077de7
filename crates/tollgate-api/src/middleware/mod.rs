// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Middleware implementations for the API server.
//!
//! Protected routes are wrapped in two layers, outermost first:
//!
//! - [`AuthLayer`]: token extraction and validation, attaches [`Identity`](crate::auth::Identity)
//! - [`RbacLayer`]: role or permission guard over the attached identity

mod auth;
mod rbac;

pub use auth::{
    authenticate, extract_bearer_token, extract_cookie_token, AuthFailure, AuthLayer,
    AuthMiddleware, DEFAULT_COOKIE_NAME,
};
pub use rbac::{check_permission, check_role, RbacLayer, RbacMiddleware};
