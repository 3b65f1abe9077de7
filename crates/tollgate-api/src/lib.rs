// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # tollgate-api
//!
//! Authentication and authorization layer for axum services.
//!
//! This crate issues and validates stateless HMAC-signed session tokens,
//! attaches the authenticated [`Identity`](auth::Identity) to each request,
//! and enforces role and permission guards before handlers run. It also
//! ships the login, signup and user management endpoints built on top.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod server;
pub mod state;
pub mod store;

pub use auth::{
    Claims, Identity, Permission, RbacPolicy, Role, TokenConfig, TokenError, TokenManager,
};
pub use config::{ApiConfig, AuthConfig, ConfigError, ConfigLoader};
pub use error::{ApiError, ApiResult};
pub use extractors::{Auth, OptionalAuth};
pub use middleware::{AuthLayer, RbacLayer};
pub use server::{ApiServer, ApiServerBuilder};
pub use state::AppState;
pub use store::{CredentialStore, MemoryCredentialStore, StoreError, UserRecord};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
