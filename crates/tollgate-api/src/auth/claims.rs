// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Session token claims.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{Identity, Role};

/// Claims embedded in a session token.
///
/// Field order is the wire order: the signature covers the exact JSON
/// bytes produced by serializing this struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub user_id: String,

    /// User's email.
    pub email: String,

    /// User's display name.
    pub name: String,

    /// User's role.
    pub role: Role,

    /// Expiration time.
    #[serde(rename = "exp")]
    pub expires_at: DateTime<Utc>,

    /// Issued at time.
    #[serde(rename = "iat")]
    pub issued_at: DateTime<Utc>,
}

impl Claims {
    /// Creates claims for an identity, issued now.
    ///
    /// Returns `None` when `ttl` pushes the expiry past the representable
    /// date range.
    pub fn new(identity: &Identity, ttl: Duration) -> Option<Self> {
        Self::issued_at(identity, Utc::now(), ttl)
    }

    /// Creates claims for an identity with an explicit issue time.
    pub fn issued_at(identity: &Identity, now: DateTime<Utc>, ttl: Duration) -> Option<Self> {
        Some(Self {
            user_id: identity.id.clone(),
            email: identity.email.clone(),
            name: identity.display_name.clone(),
            role: identity.role,
            expires_at: now.checked_add_signed(ttl)?,
            issued_at: now,
        })
    }

    /// Returns the user ID.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Returns `true` if the claims have lapsed at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Returns `true` if the claims have lapsed.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Returns the time remaining until expiration.
    pub fn time_until_expiration(&self) -> Option<std::time::Duration> {
        (self.expires_at - Utc::now()).to_std().ok()
    }

    /// Returns the identity carried by these claims.
    pub fn identity(&self) -> Identity {
        Identity::from(self)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn viewer() -> Identity {
        Identity::new("user_1", "Vera", "vera@example.com", Role::Viewer)
    }

    #[test]
    fn test_claims_creation() {
        let claims = Claims::new(&viewer(), Duration::hours(1)).unwrap();

        assert_eq!(claims.user_id(), "user_1");
        assert_eq!(claims.name, "Vera");
        assert_eq!(claims.role, Role::Viewer);
        assert!(claims.expires_at > claims.issued_at);
        assert!(!claims.is_expired());
        assert!(claims.time_until_expiration().is_some());
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let now = Utc::now();
        let claims = Claims::issued_at(&viewer(), now, Duration::seconds(10)).unwrap();

        assert!(!claims.is_expired_at(now + Duration::seconds(9)));
        assert!(claims.is_expired_at(now + Duration::seconds(10)));
        assert!(claims.is_expired_at(now + Duration::seconds(11)));
    }

    #[test]
    fn test_wire_field_names() {
        let claims = Claims::new(&viewer(), Duration::minutes(5)).unwrap();
        let value = serde_json::to_value(&claims).unwrap();

        for key in ["user_id", "email", "name", "role", "exp", "iat"] {
            assert!(value.get(key).is_some(), "missing {}", key);
        }
        assert_eq!(value["role"], "viewer");
    }

    #[test]
    fn test_identity_round_trip() {
        let identity = viewer();
        let claims = Claims::new(&identity, Duration::minutes(5)).unwrap();
        assert_eq!(claims.identity(), identity);
    }

    #[test]
    fn test_expiry_overflow_is_none() {
        assert!(Claims::new(&viewer(), Duration::MAX).is_none());
        assert!(Claims::issued_at(&viewer(), DateTime::<Utc>::MAX_UTC, Duration::seconds(1)).is_none());
    }
}
