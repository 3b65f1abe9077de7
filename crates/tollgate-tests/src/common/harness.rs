// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Harness
//!
//! [`TestApp`] wraps a fully wired router so tests can drive it in-process
//! with `tower::ServiceExt::oneshot`.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use serde_json::json;
use tower::ServiceExt;

use tollgate_api::config::ApiConfig;
use tollgate_api::state::AppState;
use tollgate_api::{ApiServerBuilder, CredentialStore, Identity};

use super::assertions::TestResponse;
use super::builders::TestRequest;
use super::fixtures::{ConfigFixtures, SeedAccount};
use super::init_test_logging;

// =============================================================================
// TestApp
// =============================================================================

/// An in-process application.
#[derive(Clone)]
pub struct TestApp {
    state: AppState,
    router: Router,
}

impl TestApp {
    /// Standard seeded application.
    pub fn new() -> Self {
        Self::with_config(ConfigFixtures::standard())
    }

    /// Application built from the given configuration.
    pub fn with_config(config: ApiConfig) -> Self {
        Self::from_builder(ApiServerBuilder::new().config(config))
    }

    /// Application backed by the given store.
    pub fn with_store(config: ApiConfig, store: Arc<dyn CredentialStore>) -> Self {
        Self::from_builder(ApiServerBuilder::new().config(config).store(store))
    }

    /// Application from a preconfigured server builder.
    pub fn from_builder(builder: ApiServerBuilder) -> Self {
        init_test_logging();

        let server = builder.build().expect("Failed to build test server");
        Self {
            state: server.state().clone(),
            router: server.router(),
        }
    }

    /// Shared state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Sends a request and buffers the response.
    pub async fn send(&self, request: TestRequest) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request.build())
            .await
            .expect("Router is infallible");
        TestResponse::from_response(response).await
    }

    /// Issues a token for an identity with the configured TTL.
    pub fn token_for(&self, identity: &Identity) -> String {
        self.state
            .tokens()
            .issue_token(identity)
            .expect("Failed to issue token")
    }

    /// Issues a token with an explicit TTL.
    pub fn token_with_ttl(&self, identity: &Identity, ttl: Duration) -> String {
        self.state
            .tokens()
            .generate_token(identity, ttl)
            .expect("Failed to issue token")
    }

    /// Logs in through the HTTP endpoint.
    pub async fn login(&self, username: &str, password: &str) -> TestResponse {
        self.send(
            TestRequest::post("/api/auth/login")
                .json(json!({ "username": username, "password": password })),
        )
        .await
    }

    /// Logs in as a seeded account and returns its token.
    pub async fn login_as(&self, account: SeedAccount) -> String {
        let response = self.login(account.username, account.password).await;
        response.token().to_string()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}
