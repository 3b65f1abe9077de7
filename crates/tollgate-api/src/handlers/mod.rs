// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API handlers for all endpoints.
//!
//! - [`health`]: Liveness check
//! - [`auth`]: Login, signup, logout and the current identity
//! - [`admin`]: User management

mod admin;
mod auth;
mod health;

pub use admin::*;
pub use auth::*;
pub use health::*;
