// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Service runtime orchestration.
//!
//! Loads configuration, builds the API server and drives it until an OS
//! signal arrives, then gives in-flight requests `shutdown_timeout` to
//! finish.

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use tollgate_api::config::{ApiConfig, ConfigLoader};
use tollgate_api::ApiServerBuilder;

use crate::error::{BinError, BinResult};
use crate::shutdown::ShutdownCoordinator;

// =============================================================================
// ServiceRuntime
// =============================================================================

/// Runs the API server with signal-driven graceful shutdown.
pub struct ServiceRuntime {
    config: Arc<ApiConfig>,
    shutdown: ShutdownCoordinator,
}

impl ServiceRuntime {
    /// Creates a new runtime.
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config: Arc::new(config),
            shutdown: ShutdownCoordinator::new(),
        }
    }

    /// Returns the effective configuration.
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Returns the shutdown coordinator.
    pub fn shutdown(&self) -> &ShutdownCoordinator {
        &self.shutdown
    }

    /// Runs the server until shutdown is signaled.
    pub async fn run(self) -> BinResult<()> {
        info!("Starting tollgate v{}", tollgate_api::VERSION);

        let server = ApiServerBuilder::new()
            .config((*self.config).clone())
            .build()
            .map_err(|e| BinError::init(e.to_string()))?;

        info!(
            addr = %server.addr(),
            users = self.config.users.len(),
            signup = self.config.auth.signup_key().is_some(),
            "tollgate is ready"
        );

        let signals = tokio::spawn({
            let shutdown = self.shutdown.clone();
            async move { shutdown.wait_for_os_signal().await }
        });

        let result = self.serve(server).await;
        signals.abort();

        info!("tollgate shutdown complete");
        result
    }

    async fn serve(&self, server: tollgate_api::ApiServer) -> BinResult<()> {
        let grace = self.config.shutdown_timeout;
        let serving = server.run_with_shutdown(self.shutdown.shutdown_signal());
        tokio::pin!(serving);

        tokio::select! {
            result = &mut serving => return result.map_err(BinError::from),
            _ = self.shutdown.shutdown_signal() => {
                info!("Shutdown initiated, draining connections...");
            }
        }

        match tokio::time::timeout(grace, serving).await {
            Ok(result) => result.map_err(BinError::from),
            Err(_) => {
                warn!(timeout = ?grace, "Graceful shutdown timed out, dropping open connections");
                Ok(())
            }
        }
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for constructing the service runtime.
#[derive(Default)]
pub struct RuntimeBuilder {
    config_path: Option<PathBuf>,
    config: Option<ApiConfig>,
    host: Option<IpAddr>,
    port: Option<u16>,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration file path.
    pub fn config_path(mut self, path: Option<impl AsRef<Path>>) -> Self {
        self.config_path = path.map(|p| p.as_ref().to_path_buf());
        self
    }

    /// Sets the configuration directly.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Overrides the bind address.
    pub fn host(mut self, host: Option<IpAddr>) -> Self {
        self.host = host;
        self
    }

    /// Overrides the port.
    pub fn port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    /// Builds the runtime.
    ///
    /// Without an explicit config, the file (if any) is loaded and the
    /// `TOLLGATE_*` environment overrides applied.
    pub fn build(self) -> BinResult<ServiceRuntime> {
        let mut config = match self.config {
            Some(config) => config,
            None => ConfigLoader::new()
                .load_optional(self.config_path.as_deref())
                .map_err(|e| BinError::from(e).with_context("Failed to load configuration"))?,
        };

        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        config.validate()?;

        Ok(ServiceRuntime::new(config))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tollgate_api::config::AuthConfig;

    fn test_config() -> ApiConfig {
        ApiConfig::default().with_auth(AuthConfig::new("runtime-test-secret-0123456789abcdef"))
    }

    #[test]
    fn test_runtime_builder_overrides() {
        let runtime = RuntimeBuilder::new()
            .config(test_config())
            .host(Some("127.0.0.1".parse().unwrap()))
            .port(Some(9100))
            .build()
            .unwrap();

        assert_eq!(runtime.config().socket_addr().to_string(), "127.0.0.1:9100");
    }

    #[test]
    fn test_runtime_builder_rejects_invalid_config() {
        let result = RuntimeBuilder::new().config(ApiConfig::default()).build();
        assert!(matches!(result, Err(BinError::Config(_))));
    }

    #[test]
    fn test_runtime_builder_missing_file() {
        let result = RuntimeBuilder::new()
            .config_path(Some("/nonexistent/tollgate.yaml"))
            .build();

        let err = result.err().expect("missing file must fail");
        assert_eq!(err.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let runtime = RuntimeBuilder::new()
            .config(test_config())
            .host(Some("127.0.0.1".parse().unwrap()))
            .port(Some(0))
            .build()
            .unwrap();

        let shutdown = runtime.shutdown().clone();
        let handle = tokio::spawn(runtime.run());

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        shutdown.initiate_shutdown();

        let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("runtime should stop")
            .expect("task should not panic");
        assert!(result.is_ok());
    }
}
