// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Role-Based Access Control (RBAC).

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::Permission;

// =============================================================================
// Role
// =============================================================================

/// Predefined roles.
///
/// `Admin` is the only hierarchy in the model: role guards always let it
/// through, and its default grant covers every capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access, including user management.
    Admin,
    /// Can upload and view objects.
    Uploader,
    /// Read-only access.
    Viewer,
}

impl Role {
    /// Returns the role tag as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Uploader => "uploader",
            Role::Viewer => "viewer",
        }
    }

    /// Parses a role from its exact tag.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "uploader" => Some(Role::Uploader),
            "viewer" => Some(Role::Viewer),
            _ => None,
        }
    }

    /// Returns all roles.
    pub fn all() -> &'static [Role] {
        &[Role::Admin, Role::Uploader, Role::Viewer]
    }

    /// Returns the default capabilities for this role.
    pub fn default_permissions(&self) -> Permission {
        match self {
            Role::Admin => Permission::ALL,
            Role::Uploader => Permission::NONE.with_upload().with_view(),
            Role::Viewer => Permission::view(),
        }
    }

    /// Returns `true` if this role passes a guard for `required`.
    pub fn satisfies_role(&self, required: Role) -> bool {
        *self == Role::Admin || *self == required
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::parse(s).ok_or_else(|| format!("unknown role '{}'", s))
    }
}

// =============================================================================
// RBAC Policy
// =============================================================================

/// Role to capability table.
///
/// Built once at startup and shared read-only across all requests. A role
/// missing from the table is granted nothing.
#[derive(Debug, Clone)]
pub struct RbacPolicy {
    role_permissions: Arc<HashMap<Role, Permission>>,
}

impl RbacPolicy {
    /// Creates a policy with the default grant for every role.
    pub fn new() -> Self {
        Self::builder().with_default_roles().build()
    }

    /// Creates a policy builder.
    pub fn builder() -> RbacPolicyBuilder {
        RbacPolicyBuilder::new()
    }

    /// Returns the capabilities granted to a role.
    pub fn permissions_for(&self, role: Role) -> Permission {
        self.role_permissions
            .get(&role)
            .copied()
            .unwrap_or(Permission::NONE)
    }

    /// Returns `true` if `role` is granted every capability set in `requested`.
    pub fn has_permission(&self, role: Role, requested: &Permission) -> bool {
        self.permissions_for(role).satisfies(requested)
    }

    /// Returns the roles present in the table.
    pub fn roles(&self) -> Vec<Role> {
        let mut roles: Vec<Role> = self.role_permissions.keys().copied().collect();
        roles.sort_by_key(|r| r.as_str());
        roles
    }
}

impl Default for RbacPolicy {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// RBAC Policy Builder
// =============================================================================

/// Builder for constructing RBAC policies.
#[derive(Debug, Default)]
pub struct RbacPolicyBuilder {
    role_permissions: HashMap<Role, Permission>,
}

impl RbacPolicyBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds every role with its default grant.
    pub fn with_default_roles(mut self) -> Self {
        for role in Role::all() {
            self.role_permissions
                .insert(*role, role.default_permissions());
        }
        self
    }

    /// Sets the grant for a role, replacing any previous one.
    pub fn grant(mut self, role: Role, permissions: Permission) -> Self {
        self.role_permissions.insert(role, permissions);
        self
    }

    /// Removes a role from the table.
    pub fn revoke(mut self, role: Role) -> Self {
        self.role_permissions.remove(&role);
        self
    }

    /// Builds the policy.
    pub fn build(self) -> RbacPolicy {
        RbacPolicy {
            role_permissions: Arc::new(self.role_permissions),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn all_requests() -> Vec<Permission> {
        let mut requests = Vec::new();
        for bits in 0u8..16 {
            requests.push(Permission::new(
                bits & 1 != 0,
                bits & 2 != 0,
                bits & 4 != 0,
                bits & 8 != 0,
            ));
        }
        requests
    }

    #[test]
    fn test_viewer_permissions() {
        let policy = RbacPolicy::new();

        assert!(policy.has_permission(Role::Viewer, &Permission::view()));
        assert!(!policy.has_permission(Role::Viewer, &Permission::upload()));
    }

    #[test]
    fn test_uploader_permissions() {
        let policy = RbacPolicy::new();

        assert!(policy.has_permission(Role::Uploader, &Permission::upload().with_view()));
        assert!(!policy.has_permission(Role::Uploader, &Permission::delete()));
        assert!(!policy.has_permission(Role::Uploader, &Permission::manage()));
    }

    #[test]
    fn test_admin_dominates_every_role() {
        let policy = RbacPolicy::new();

        for requested in all_requests() {
            for role in Role::all() {
                if policy.has_permission(*role, &requested) {
                    assert!(
                        policy.has_permission(Role::Admin, &requested),
                        "admin denied {} granted to {}",
                        requested,
                        role
                    );
                }
            }
        }
    }

    #[test]
    fn test_unmapped_role_fails_closed() {
        let policy = RbacPolicy::builder()
            .with_default_roles()
            .revoke(Role::Viewer)
            .build();

        assert_eq!(policy.permissions_for(Role::Viewer), Permission::NONE);
        assert!(!policy.has_permission(Role::Viewer, &Permission::view()));
        assert!(policy.has_permission(Role::Viewer, &Permission::NONE));
    }

    #[test]
    fn test_builder_grant_overrides_default() {
        let policy = RbacPolicy::builder()
            .with_default_roles()
            .grant(Role::Viewer, Permission::view().with_upload())
            .build();

        assert!(policy.has_permission(Role::Viewer, &Permission::upload()));
        assert_eq!(policy.roles(), vec![Role::Admin, Role::Uploader, Role::Viewer]);
    }

    #[test]
    fn test_role_guard_admin_override() {
        assert!(Role::Admin.satisfies_role(Role::Uploader));
        assert!(Role::Admin.satisfies_role(Role::Viewer));
        assert!(Role::Uploader.satisfies_role(Role::Uploader));
        assert!(!Role::Uploader.satisfies_role(Role::Admin));
        assert!(!Role::Viewer.satisfies_role(Role::Uploader));
    }

    #[test]
    fn test_role_parse_is_exact() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("viewer"), Some(Role::Viewer));
        assert_eq!(Role::parse("ADMIN"), None);
        assert_eq!(Role::parse("root"), None);
        assert_eq!(serde_json::to_string(&Role::Uploader).unwrap(), "\"uploader\"");
    }
}
