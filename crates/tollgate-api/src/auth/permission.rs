// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Capability flags for RBAC.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A record of four independent capabilities.
///
/// The same shape is used both for what a role is granted and for what a
/// guard asks for. A request is satisfied when every capability it sets is
/// also set on the grant; capabilities left unset are not checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Permission {
    /// Upload new objects.
    pub can_upload: bool,
    /// View and download objects.
    pub can_view: bool,
    /// Delete objects and users.
    pub can_delete: bool,
    /// Manage users and roles.
    pub can_manage: bool,
}

impl Permission {
    /// No capabilities. As a request, trivially satisfied.
    pub const NONE: Permission = Permission {
        can_upload: false,
        can_view: false,
        can_delete: false,
        can_manage: false,
    };

    /// Every capability.
    pub const ALL: Permission = Permission {
        can_upload: true,
        can_view: true,
        can_delete: true,
        can_manage: true,
    };

    /// Creates a permission record from explicit flags.
    pub const fn new(can_upload: bool, can_view: bool, can_delete: bool, can_manage: bool) -> Self {
        Self {
            can_upload,
            can_view,
            can_delete,
            can_manage,
        }
    }

    /// Request for the upload capability only.
    pub const fn upload() -> Self {
        Self::NONE.with_upload()
    }

    /// Request for the view capability only.
    pub const fn view() -> Self {
        Self::NONE.with_view()
    }

    /// Request for the delete capability only.
    pub const fn delete() -> Self {
        Self::NONE.with_delete()
    }

    /// Request for the manage capability only.
    pub const fn manage() -> Self {
        Self::NONE.with_manage()
    }

    /// Adds the upload capability.
    pub const fn with_upload(mut self) -> Self {
        self.can_upload = true;
        self
    }

    /// Adds the view capability.
    pub const fn with_view(mut self) -> Self {
        self.can_view = true;
        self
    }

    /// Adds the delete capability.
    pub const fn with_delete(mut self) -> Self {
        self.can_delete = true;
        self
    }

    /// Adds the manage capability.
    pub const fn with_manage(mut self) -> Self {
        self.can_manage = true;
        self
    }

    /// Returns `true` if every capability set in `requested` is also set here.
    pub const fn satisfies(&self, requested: &Permission) -> bool {
        (!requested.can_upload || self.can_upload)
            && (!requested.can_view || self.can_view)
            && (!requested.can_delete || self.can_delete)
            && (!requested.can_manage || self.can_manage)
    }

    /// Returns `true` if no capability is set.
    pub const fn is_empty(&self) -> bool {
        !(self.can_upload || self.can_view || self.can_delete || self.can_manage)
    }

    /// Returns the names of the capabilities that are set.
    pub fn names(&self) -> Vec<&'static str> {
        let flags = [
            (self.can_upload, "upload"),
            (self.can_view, "view"),
            (self.can_delete, "delete"),
            (self.can_manage, "manage"),
        ];
        flags
            .into_iter()
            .filter_map(|(set, name)| set.then_some(name))
            .collect()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        f.write_str(&self.names().join("+"))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_request_is_always_satisfied() {
        assert!(Permission::NONE.satisfies(&Permission::NONE));
        assert!(Permission::view().satisfies(&Permission::NONE));
    }

    #[test]
    fn test_satisfies_checks_only_requested_bits() {
        let grant = Permission::NONE.with_upload().with_view();

        assert!(grant.satisfies(&Permission::view()));
        assert!(grant.satisfies(&Permission::upload().with_view()));
        assert!(!grant.satisfies(&Permission::delete()));
        assert!(!grant.satisfies(&Permission::view().with_manage()));
    }

    #[test]
    fn test_all_satisfies_everything() {
        assert!(Permission::ALL.satisfies(&Permission::ALL));
        assert!(Permission::ALL.satisfies(&Permission::manage()));
    }

    #[test]
    fn test_display() {
        assert_eq!(Permission::NONE.to_string(), "none");
        assert_eq!(Permission::upload().with_view().to_string(), "upload+view");
    }

    #[test]
    fn test_deserialize_partial_request() {
        let perm: Permission = serde_json::from_str(r#"{"can_view":true}"#).unwrap();
        assert_eq!(perm, Permission::view());
    }
}
