// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Mock Implementations

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use tollgate_api::store::{NewUser, StoreError, StoreResult, UserRecord};
use tollgate_api::{CredentialStore, Role};

// =============================================================================
// Unavailable Store
// =============================================================================

/// A credential store whose backend is always down.
#[derive(Debug, Default)]
pub struct UnavailableStore {
    calls: AtomicU64,
}

impl UnavailableStore {
    /// Create a new unavailable store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of store calls received.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> StoreResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Backend {
            message: "connection refused".to_string(),
        })
    }
}

#[async_trait]
impl CredentialStore for UnavailableStore {
    async fn find_by_username(&self, _username: &str) -> StoreResult<UserRecord> {
        self.fail()
    }

    async fn find_by_email(&self, _email: &str) -> StoreResult<UserRecord> {
        self.fail()
    }

    async fn find_by_id(&self, _id: &str) -> StoreResult<UserRecord> {
        self.fail()
    }

    async fn list_users(&self) -> StoreResult<Vec<UserRecord>> {
        self.fail()
    }

    async fn create_user(&self, _user: NewUser) -> StoreResult<UserRecord> {
        self.fail()
    }

    async fn update_role(&self, _id: &str, _role: Role) -> StoreResult<UserRecord> {
        self.fail()
    }

    async fn delete_user(&self, _id: &str) -> StoreResult<()> {
        self.fail()
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}
