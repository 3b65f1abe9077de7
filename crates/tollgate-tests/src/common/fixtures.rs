// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Test Fixtures
//!
//! Seed users, secrets and configurations shared by the integration tests.
//! Password hashing is slow, so seed hashes are computed once per test
//! binary.

use std::sync::OnceLock;

use tollgate_api::auth::password;
use tollgate_api::config::{ApiConfig, AuthConfig, SeedUser};
use tollgate_api::{Identity, Role};

/// Signing secret used by every fixture configuration.
pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";

/// Signup key enabled by [`ConfigFixtures::with_signup`].
pub const SIGNUP_KEY: &str = "let-me-in";

// =============================================================================
// User Fixtures
// =============================================================================

/// A seeded account with its plaintext password.
#[derive(Debug, Clone, Copy)]
pub struct SeedAccount {
    /// User ID.
    pub id: &'static str,
    /// Login name.
    pub username: &'static str,
    /// Email address.
    pub email: &'static str,
    /// Plaintext password.
    pub password: &'static str,
    /// Role.
    pub role: Role,
}

impl SeedAccount {
    /// Returns the identity this account authenticates as.
    pub fn identity(&self) -> Identity {
        Identity::new(self.id, self.username, self.email, self.role)
    }
}

/// Fixture providing the seeded accounts.
pub struct UserFixtures;

impl UserFixtures {
    /// The administrator.
    pub const ADMIN: SeedAccount = SeedAccount {
        id: "user_admin",
        username: "admin",
        email: "admin@example.com",
        password: "admin-password",
        role: Role::Admin,
    };

    /// An uploader.
    pub const UPLOADER: SeedAccount = SeedAccount {
        id: "user_alice",
        username: "alice",
        email: "alice@example.com",
        password: "alice-password",
        role: Role::Uploader,
    };

    /// A viewer.
    pub const VIEWER: SeedAccount = SeedAccount {
        id: "user_bob",
        username: "bob",
        email: "bob@example.com",
        password: "bob-password",
        role: Role::Viewer,
    };

    /// All seeded accounts.
    pub fn all() -> [SeedAccount; 3] {
        [Self::ADMIN, Self::UPLOADER, Self::VIEWER]
    }

    /// Identity of the administrator.
    pub fn admin() -> Identity {
        Self::ADMIN.identity()
    }

    /// Identity of the uploader.
    pub fn uploader() -> Identity {
        Self::UPLOADER.identity()
    }

    /// Identity of the viewer.
    pub fn viewer() -> Identity {
        Self::VIEWER.identity()
    }

    /// Seed entries for every account, with hashed passwords.
    pub fn seeds() -> Vec<SeedUser> {
        static SEEDS: OnceLock<Vec<SeedUser>> = OnceLock::new();

        SEEDS
            .get_or_init(|| {
                Self::all()
                    .iter()
                    .map(|account| SeedUser {
                        id: Some(account.id.to_string()),
                        username: account.username.to_string(),
                        email: account.email.to_string(),
                        password_hash: password::hash_password(account.password)
                            .expect("Failed to hash fixture password"),
                        role: account.role,
                    })
                    .collect()
            })
            .clone()
    }
}

// =============================================================================
// Config Fixtures
// =============================================================================

/// Fixture providing API configurations.
pub struct ConfigFixtures;

impl ConfigFixtures {
    /// Seeded configuration with signup disabled.
    pub fn standard() -> ApiConfig {
        let mut config = ApiConfig::default().with_auth(AuthConfig::new(TEST_SECRET));
        config.users = UserFixtures::seeds();
        config
    }

    /// Seeded configuration with signup enabled under [`SIGNUP_KEY`].
    pub fn with_signup() -> ApiConfig {
        let mut config = Self::standard();
        config.auth = config.auth.with_signup_key(SIGNUP_KEY);
        config
    }

    /// Configuration without any users.
    pub fn empty() -> ApiConfig {
        ApiConfig::default().with_auth(AuthConfig::new(TEST_SECRET))
    }
}
