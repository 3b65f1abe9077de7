// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Application state shared across handlers.

use std::sync::Arc;

use chrono::Utc;

use crate::auth::{RbacPolicy, TokenManager};
use crate::config::{ApiConfig, SeedUser};
use crate::error::{ApiError, ApiResult};
use crate::store::{CredentialStore, MemoryCredentialStore, UserRecord};

// =============================================================================
// AppState
// =============================================================================

/// Application state shared across all handlers.
///
/// Everything in here is read-only after startup apart from the credential
/// store, which synchronizes internally.
#[derive(Clone)]
pub struct AppState {
    /// API configuration.
    pub config: Arc<ApiConfig>,
    /// Token issuing and validation.
    pub token_manager: Arc<TokenManager>,
    /// RBAC policy for authorization.
    pub rbac_policy: Arc<RbacPolicy>,
    /// User records.
    pub store: Arc<dyn CredentialStore>,
}

impl AppState {
    /// Creates a new app state builder.
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::new()
    }

    /// Returns the token manager.
    pub fn tokens(&self) -> &TokenManager {
        &self.token_manager
    }

    /// Returns the RBAC policy.
    pub fn rbac(&self) -> &RbacPolicy {
        &self.rbac_policy
    }

    /// Returns the credential store.
    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("token_manager", &self.token_manager)
            .field("rbac_policy", &self.rbac_policy)
            .field("store", &self.store.name())
            .finish()
    }
}

// =============================================================================
// AppStateBuilder
// =============================================================================

/// Builder for constructing AppState.
#[derive(Default)]
pub struct AppStateBuilder {
    config: Option<ApiConfig>,
    token_manager: Option<Arc<TokenManager>>,
    rbac_policy: Option<Arc<RbacPolicy>>,
    store: Option<Arc<dyn CredentialStore>>,
}

impl AppStateBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the configuration.
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the token manager.
    pub fn token_manager(mut self, manager: Arc<TokenManager>) -> Self {
        self.token_manager = Some(manager);
        self
    }

    /// Sets the RBAC policy.
    pub fn rbac_policy(mut self, policy: Arc<RbacPolicy>) -> Self {
        self.rbac_policy = Some(policy);
        self
    }

    /// Sets the credential store.
    ///
    /// Seed users in the configuration are ignored when a store is supplied.
    pub fn store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Builds the AppState.
    ///
    /// Missing components are created from the configuration: the token
    /// manager from `auth`, an in-memory store from `users`, and the default
    /// role table.
    pub fn build(self) -> ApiResult<AppState> {
        let config = self.config.unwrap_or_default();

        let token_manager = match self.token_manager {
            Some(manager) => manager,
            None => Arc::new(TokenManager::new(config.auth.token_config())?),
        };

        let rbac_policy = self.rbac_policy.unwrap_or_else(|| Arc::new(RbacPolicy::new()));

        let store = match self.store {
            Some(store) => store,
            None => {
                let users = config.users.iter().map(seed_record);
                let store = MemoryCredentialStore::with_users(users)
                    .map_err(|e| ApiError::internal(format!("Invalid seed users: {}", e)))?;
                tracing::debug!(users = store.len(), "Seeded in-memory credential store");
                Arc::new(store) as Arc<dyn CredentialStore>
            }
        };

        Ok(AppState {
            config: Arc::new(config),
            token_manager,
            rbac_policy,
            store,
        })
    }
}

fn seed_record(seed: &SeedUser) -> UserRecord {
    UserRecord {
        id: seed
            .id
            .clone()
            .unwrap_or_else(|| format!("user_{}", seed.username)),
        username: seed.username.clone(),
        email: seed.email.clone(),
        password_hash: seed.password_hash.clone(),
        role: seed.role,
        created_at: Utc::now(),
    }
}

// =============================================================================
// FromRef implementations for extracting parts of state
// =============================================================================

impl axum::extract::FromRef<AppState> for Arc<TokenManager> {
    fn from_ref(state: &AppState) -> Self {
        state.token_manager.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<RbacPolicy> {
    fn from_ref(state: &AppState) -> Self {
        state.rbac_policy.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<ApiConfig> {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<dyn CredentialStore> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

// =============================================================================
// Tests
// =============================================================================
