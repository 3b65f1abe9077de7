// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Credential store.
//!
//! The auth core only needs lookups by username and by id. The remaining
//! operations back signup and the admin endpoints.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use thiserror::Error;

use crate::auth::{Identity, Role};

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// StoreError
// =============================================================================

/// Credential store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No user matches the key.
    #[error("user not found: {key}")]
    NotFound {
        /// The username, email or id that was looked up.
        key: String,
    },

    /// A unique field is already taken.
    #[error("{field} already exists")]
    Conflict {
        /// Name of the conflicting field.
        field: &'static str,
    },

    /// The backing storage failed.
    #[error("store backend error: {message}")]
    Backend {
        /// Error message.
        message: String,
    },
}

impl StoreError {
    /// Creates a not found error.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Returns `true` for [`StoreError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

// =============================================================================
// Records
// =============================================================================

/// A stored user.
#[derive(Clone, PartialEq, Eq)]
pub struct UserRecord {
    /// Stable user ID.
    pub id: String,
    /// Unique login name, also used as the display name.
    pub username: String,
    /// Unique email address.
    pub email: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// Assigned role.
    pub role: Role,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Returns the identity this user authenticates as.
    pub fn identity(&self) -> Identity {
        Identity::new(&self.id, &self.username, &self.email, self.role)
    }

    /// Returns the public view of this record.
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
            created_at: self.created_at,
        }
    }
}

impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("role", &self.role)
            .finish()
    }
}

/// A user record without its password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    /// User ID.
    pub id: String,
    /// Login name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Assigned role.
    pub role: Role,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Input for [`CredentialStore::create_user`].
#[derive(Clone)]
pub struct NewUser {
    /// Explicit ID, or `None` to let the store assign one.
    pub id: Option<String>,
    /// Login name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    /// Assigned role.
    pub role: Role,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// CredentialStore
// =============================================================================

/// Source of user records.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Looks up a user by login name.
    async fn find_by_username(&self, username: &str) -> StoreResult<UserRecord>;

    /// Looks up a user by email.
    async fn find_by_email(&self, email: &str) -> StoreResult<UserRecord>;

    /// Looks up a user by ID.
    async fn find_by_id(&self, id: &str) -> StoreResult<UserRecord>;

    /// Returns all users ordered by creation time.
    async fn list_users(&self) -> StoreResult<Vec<UserRecord>>;

    /// Inserts a user. Username and email must both be unused.
    async fn create_user(&self, user: NewUser) -> StoreResult<UserRecord>;

    /// Changes a user's role.
    async fn update_role(&self, id: &str, role: Role) -> StoreResult<UserRecord>;

    /// Removes a user.
    async fn delete_user(&self, id: &str) -> StoreResult<()>;

    /// Returns the store name for identification.
    fn name(&self) -> &str {
        "credential_store"
    }
}

// =============================================================================
// MemoryCredentialStore
// =============================================================================

/// In-process credential store.
///
/// Contents live only as long as the process; seed users come from
/// configuration.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl MemoryCredentialStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the given users.
    pub fn with_users(users: impl IntoIterator<Item = UserRecord>) -> StoreResult<Self> {
        let store = Self::new();
        {
            let mut map = store.users.write();
            for user in users {
                Self::check_unique(&map, &user.id, &user.username, &user.email)?;
                map.insert(user.id.clone(), user);
            }
        }
        Ok(store)
    }

    /// Returns the number of stored users.
    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    /// Returns `true` if no users are stored.
    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }

    fn check_unique(
        users: &HashMap<String, UserRecord>,
        id: &str,
        username: &str,
        email: &str,
    ) -> StoreResult<()> {
        if users.contains_key(id) {
            return Err(StoreError::Conflict { field: "id" });
        }
        if users.values().any(|u| u.username == username) {
            return Err(StoreError::Conflict { field: "username" });
        }
        if users.values().any(|u| u.email == email) {
            return Err(StoreError::Conflict { field: "email" });
        }
        Ok(())
    }

    fn find_by<F>(&self, key: &str, pred: F) -> StoreResult<UserRecord>
    where
        F: Fn(&UserRecord) -> bool,
    {
        self.users
            .read()
            .values()
            .find(|&u| pred(u))
            .cloned()
            .ok_or_else(|| StoreError::not_found(key))
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> StoreResult<UserRecord> {
        self.find_by(username, |u| u.username == username)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<UserRecord> {
        self.find_by(email, |u| u.email == email)
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<UserRecord> {
        self.users
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(id))
    }

    async fn list_users(&self) -> StoreResult<Vec<UserRecord>> {
        let mut users: Vec<UserRecord> = self.users.read().values().cloned().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(users)
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<UserRecord> {
        let id = match user.id {
            Some(id) => id,
            None => generate_user_id()?,
        };

        let mut users = self.users.write();
        Self::check_unique(&users, &id, &user.username, &user.email)?;

        let record = UserRecord {
            id: id.clone(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: Utc::now(),
        };
        users.insert(id, record.clone());

        Ok(record)
    }

    async fn update_role(&self, id: &str, role: Role) -> StoreResult<UserRecord> {
        let mut users = self.users.write();
        let user = users.get_mut(id).ok_or_else(|| StoreError::not_found(id))?;
        user.role = role;
        Ok(user.clone())
    }

    async fn delete_user(&self, id: &str) -> StoreResult<()> {
        self.users
            .write()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(id))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Generates a random, non-sequential user ID.
fn generate_user_id() -> StoreResult<String> {
    let mut bytes = [0u8; 8];
    getrandom::getrandom(&mut bytes).map_err(|e| StoreError::Backend {
        message: format!("failed to generate user id: {}", e),
    })?;

    Ok(format!("user_{}", hex::encode(bytes)))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str, role: Role) -> NewUser {
        NewUser {
            id: None,
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$placeholder".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let store = MemoryCredentialStore::new();
        let created = store
            .create_user(new_user("alice", "alice@example.com", Role::Uploader))
            .await
            .unwrap();

        assert!(created.id.starts_with("user_"));
        assert_eq!(created.id.len(), "user_".len() + 16);

        let by_name = store.find_by_username("alice").await.unwrap();
        let by_email = store.find_by_email("alice@example.com").await.unwrap();
        let by_id = store.find_by_id(&created.id).await.unwrap();

        assert_eq!(by_name, created);
        assert_eq!(by_email, created);
        assert_eq!(by_id, created);
    }

    #[test]
    fn test_generated_ids_are_lowercase_hex() {
        let first = generate_user_id().unwrap();
        let second = generate_user_id().unwrap();

        let suffix = first.strip_prefix("user_").unwrap();
        assert_eq!(suffix.len(), 16);
        assert!(suffix.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_not_found() {
        let store = MemoryCredentialStore::new();

        assert!(store.find_by_username("ghost").await.unwrap_err().is_not_found());
        assert!(store.find_by_id("user_0").await.unwrap_err().is_not_found());
        assert!(store.delete_user("user_0").await.unwrap_err().is_not_found());
        assert!(store
            .update_role("user_0", Role::Admin)
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_unique_username_and_email() {
        let store = MemoryCredentialStore::new();
        store
            .create_user(new_user("alice", "alice@example.com", Role::Viewer))
            .await
            .unwrap();

        let err = store
            .create_user(new_user("alice", "other@example.com", Role::Viewer))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::Conflict { field: "username" });

        let err = store
            .create_user(new_user("bob", "alice@example.com", Role::Viewer))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::Conflict { field: "email" });
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_update_role_and_delete() {
        let store = MemoryCredentialStore::new();
        let user = store
            .create_user(new_user("carol", "carol@example.com", Role::Viewer))
            .await
            .unwrap();

        let updated = store.update_role(&user.id, Role::Uploader).await.unwrap();
        assert_eq!(updated.role, Role::Uploader);
        assert_eq!(updated.identity().role, Role::Uploader);

        store.delete_user(&user.id).await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_seeded_store() {
        let mut first = new_user("root", "root@example.com", Role::Admin);
        first.id = Some("user_admin".to_string());

        let store = MemoryCredentialStore::new();
        let admin = store.create_user(first).await.unwrap();
        let seeded = MemoryCredentialStore::with_users(vec![admin.clone()]).unwrap();

        assert_eq!(seeded.find_by_id("user_admin").await.unwrap(), admin);
        assert_eq!(seeded.list_users().await.unwrap().len(), 1);
        assert!(MemoryCredentialStore::with_users(vec![admin.clone(), admin]).is_err());
    }

    #[test]
    fn test_debug_redacts_hash() {
        let record = UserRecord {
            id: "user_1".into(),
            username: "dave".into(),
            email: "dave@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            role: Role::Viewer,
            created_at: Utc::now(),
        };
        assert!(!format!("{:?}", record).contains("secret"));
    }
}
