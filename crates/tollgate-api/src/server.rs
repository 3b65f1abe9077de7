// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! API server implementation.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    routing::{delete, get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

use crate::auth::{Permission, RbacPolicy, Role, TokenManager};
use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::handlers;
use crate::middleware::{AuthLayer, RbacLayer};
use crate::state::{AppState, AppStateBuilder};
use crate::store::CredentialStore;

// =============================================================================
// ApiServer
// =============================================================================

/// The API server.
///
/// This is the main entry point for creating and running the HTTP server.
pub struct ApiServer {
    state: AppState,
    config: Arc<ApiConfig>,
}

impl ApiServer {
    /// Creates a new API server with the given state.
    pub fn new(state: AppState) -> Self {
        let config = state.config.clone();
        Self { state, config }
    }

    /// Returns the shared state.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Creates the router with all routes and middleware.
    ///
    /// Public routes carry no auth layer at all. Protected routes get the
    /// authentication layer outermost, then the role guard, then any
    /// per-route permission guard.
    pub fn router(&self) -> Router {
        let auth = AuthLayer::new(self.state.token_manager.clone())
            .with_cookie_name(self.config.auth.cookie_name.clone());
        let policy = self.state.rbac_policy.clone();

        // Authenticated, any role
        let session_routes: Router<AppState> = Router::new()
            .route("/api/auth/me", get(handlers::current_user))
            .route_layer(auth.clone());

        // Authenticated admin, with per-route capabilities
        let admin_routes: Router<AppState> = Router::new()
            .route("/api/admin/users", get(handlers::list_users))
            .route(
                "/api/admin/users/{id}/role",
                put(handlers::update_user_role)
                    .route_layer(RbacLayer::require_permission(policy.clone(), Permission::manage())),
            )
            .route(
                "/api/admin/users/{id}",
                delete(handlers::delete_user)
                    .route_layer(RbacLayer::require_permission(policy, Permission::delete())),
            )
            .route_layer(RbacLayer::require_role(Role::Admin))
            .route_layer(auth);

        let middleware_stack = ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new())
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                self.config.request_timeout,
            ))
            .layer(create_cors_layer(&self.config));

        Router::new()
            // Health (public)
            .route("/health", get(handlers::health))
            // Auth endpoints (public)
            .route("/api/auth/login", post(handlers::login))
            .route("/api/auth/signup", post(handlers::signup))
            .route("/api/auth/logout", post(handlers::logout))
            .merge(session_routes)
            .merge(admin_routes)
            .layer(middleware_stack)
            .with_state(self.state.clone())
    }

    /// Runs the server until the process is killed.
    pub async fn run(self) -> ApiResult<()> {
        self.run_with_shutdown(std::future::pending()).await
    }

    /// Runs the server with graceful shutdown.
    pub async fn run_with_shutdown(
        self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let addr = self.config.socket_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to bind {}: {}", addr, e)))?;

        self.serve(listener, shutdown_signal).await
    }

    /// Serves on an already bound listener.
    pub async fn serve(
        self,
        listener: TcpListener,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> ApiResult<()> {
        let router = self.router();
        let local_addr = listener.local_addr()?;

        info!("Starting API server on {}", local_addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ApiError::internal(format!("Server error: {}", e)))?;

        info!("API server shutdown complete");

        Ok(())
    }

    /// Returns the configured server address.
    pub fn addr(&self) -> SocketAddr {
        self.config.socket_addr()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Creates the CORS layer from configuration.
fn create_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = &config.cors;

    let methods: Vec<Method> = cors
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();

    let layer = CorsLayer::new()
        .max_age(Duration::from_secs(cors.max_age))
        .allow_methods(methods)
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]);

    if cors.allows_any_origin() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = cors
        .allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    layer
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(cors.allow_credentials)
}

// =============================================================================
// Server Builder
// =============================================================================

/// Builder for creating the API server.
#[derive(Default)]
pub struct ApiServerBuilder {
    state_builder: AppStateBuilder,
}

impl ApiServerBuilder {
    /// Creates a new server builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.state_builder = self.state_builder.config(config);
        self
    }

    /// Sets the token manager.
    pub fn token_manager(mut self, manager: Arc<TokenManager>) -> Self {
        self.state_builder = self.state_builder.token_manager(manager);
        self
    }

    /// Sets the RBAC policy.
    pub fn rbac_policy(mut self, policy: Arc<RbacPolicy>) -> Self {
        self.state_builder = self.state_builder.rbac_policy(policy);
        self
    }

    /// Sets the credential store.
    pub fn store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.state_builder = self.state_builder.store(store);
        self
    }

    /// Builds the server.
    pub fn build(self) -> ApiResult<ApiServer> {
        let state = self.state_builder.build()?;
        Ok(ApiServer::new(state))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::config::{AuthConfig, CorsConfig};

    fn test_config() -> ApiConfig {
        ApiConfig::default().with_auth(AuthConfig::new("test-secret-key-that-is-long-enough-for-testing"))
    }

    #[test]
    fn test_server_builder() {
        let server = ApiServerBuilder::new().config(test_config()).build().unwrap();
        assert_eq!(server.addr().port(), 8080);
    }

    #[test]
    fn test_cors_layer_with_origins() {
        let mut config = test_config();
        config.cors = CorsConfig::strict(vec!["https://app.example.com".to_string()]);
        let _layer = create_cors_layer(&config);
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let router = ApiServerBuilder::new().config(test_config()).build().unwrap().router();

        let response = router
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        let server = ApiServerBuilder::new().config(test_config()).build().unwrap();

        for (method, uri) in [
            ("GET", "/api/auth/me"),
            ("GET", "/api/admin/users"),
            ("PUT", "/api/admin/users/user_1/role"),
            ("DELETE", "/api/admin/users/user_1"),
        ] {
            let response = server
                .router()
                .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        }
    }
}
