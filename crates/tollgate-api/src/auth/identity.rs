// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Request-scoped identity.

use serde::{Deserialize, Serialize};

use super::{Claims, Role};

/// The authenticated subject of a request.
///
/// Attached to request extensions by the authentication middleware after a
/// token validates. Guards and handlers only ever ask whether one is
/// present; they never see the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// User ID.
    pub id: String,
    /// User's display name.
    pub display_name: String,
    /// User's email.
    pub email: String,
    /// User's role.
    pub role: Role,
}

impl Identity {
    /// Creates a new identity.
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            email: email.into(),
            role,
        }
    }

    /// Returns `true` if this identity passes a role guard for `required`.
    pub fn has_role(&self, required: Role) -> bool {
        self.role.satisfies_role(required)
    }

    /// Returns `true` if this identity has the admin role.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&Claims> for Identity {
    fn from(claims: &Claims) -> Self {
        Self {
            id: claims.user_id.clone(),
            display_name: claims.name.clone(),
            email: claims.email.clone(),
            role: claims.role,
        }
    }
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.user_id,
            display_name: claims.name,
            email: claims.email,
            role: claims.role,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_identity_from_claims() {
        let source = Identity::new("user_7", "Uma", "uma@example.com", Role::Uploader);
        let claims = Claims::new(&source, Duration::minutes(1)).unwrap();

        let identity = Identity::from(claims);

        assert_eq!(identity.id, "user_7");
        assert_eq!(identity.display_name, "Uma");
        assert_eq!(identity.email, "uma@example.com");
        assert_eq!(identity.role, Role::Uploader);
    }

    #[test]
    fn test_has_role() {
        let admin = Identity::new("a", "Ada", "ada@example.com", Role::Admin);
        let uploader = Identity::new("u", "Uma", "uma@example.com", Role::Uploader);

        assert!(admin.has_role(Role::Viewer));
        assert!(admin.is_admin());
        assert!(uploader.has_role(Role::Uploader));
        assert!(!uploader.has_role(Role::Admin));
        assert!(!uploader.is_admin());
    }
}
