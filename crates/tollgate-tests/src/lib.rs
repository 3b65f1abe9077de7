// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # tollgate Integration Tests
//!
//! Shared helpers for the end-to-end tests under `tests/`.
//!
//! ## Module Structure
//!
//! - [`common`]: Shared test utilities
//!   - `fixtures`: Seed users, secrets and configurations
//!   - `builders`: HTTP request builder
//!   - `assertions`: Response capture and assertions
//!   - `mocks`: Credential stores with injected failures
//!   - `harness`: In-process application wrapper
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p tollgate-tests
//! cargo test -p tollgate-tests --test integration_api
//! cargo test -p tollgate-tests -- --nocapture
//! ```
//!
//! ## Writing New Tests
//!
//! ```rust,ignore
//! use tollgate_tests::prelude::*;
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let app = TestApp::new();
//!     let token = app.token_for(&UserFixtures::viewer());
//!     let response = app
//!         .send(TestRequest::get("/api/auth/me").bearer(&token))
//!         .await;
//!     response.assert_status(StatusCode::OK);
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod common;

/// Re-export commonly used items for convenience.
pub mod prelude {
    pub use crate::common::assertions::*;
    pub use crate::common::builders::*;
    pub use crate::common::fixtures::*;
    pub use crate::common::harness::*;
    pub use crate::common::mocks::*;
    pub use crate::common::init_test_logging;
    pub use axum::http::StatusCode;
}
