// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authentication and authorization module.
//!
//! This module provides:
//! - Signed session token issuing and validation
//! - Role-Based Access Control (RBAC)
//! - Permission definitions
//! - The request-scoped identity
//! - Password hashing for stored credentials

mod claims;
mod identity;
pub mod password;
pub mod permission;
mod rbac;
mod token;

pub use claims::Claims;
pub use identity::Identity;
pub use permission::Permission;
pub use rbac::{RbacPolicy, RbacPolicyBuilder, Role};
pub use token::{TokenConfig, TokenError, TokenManager, MAX_TOKEN_TTL_SECS, RECOMMENDED_SECRET_LEN};
