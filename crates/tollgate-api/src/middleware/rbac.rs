// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! RBAC (Role-Based Access Control) middleware.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
};
use tower::{Layer, Service};

use crate::auth::{Identity, Permission, RbacPolicy, Role};
use crate::error::{ApiError, ApiResult};

// =============================================================================
// Guards
// =============================================================================

/// Role guard.
///
/// No identity is 401. Otherwise admin always passes, and any other role
/// passes only on an exact match.
pub fn check_role(identity: Option<&Identity>, required: Role) -> ApiResult<()> {
    let identity = identity.ok_or_else(ApiError::unauthenticated)?;

    if identity.has_role(required) {
        Ok(())
    } else {
        tracing::warn!(
            user_id = %identity.id,
            role = %identity.role,
            required_role = %required,
            "Role denied"
        );
        Err(ApiError::access_denied())
    }
}

/// Permission guard.
///
/// No identity is 401. Otherwise the identity's role must be granted every
/// capability set in `requested`.
pub fn check_permission(
    policy: &RbacPolicy,
    identity: Option<&Identity>,
    requested: &Permission,
) -> ApiResult<()> {
    let identity = identity.ok_or_else(ApiError::unauthenticated)?;

    if policy.has_permission(identity.role, requested) {
        Ok(())
    } else {
        tracing::warn!(
            user_id = %identity.id,
            role = %identity.role,
            required_permissions = %requested,
            "Permission denied"
        );
        Err(ApiError::access_denied())
    }
}

// =============================================================================
// RbacLayer
// =============================================================================

#[derive(Debug, Clone)]
enum Requirement {
    Role(Role),
    Permission {
        policy: Arc<RbacPolicy>,
        requested: Permission,
    },
}

impl Requirement {
    fn check(&self, identity: Option<&Identity>) -> ApiResult<()> {
        match self {
            Requirement::Role(role) => check_role(identity, *role),
            Requirement::Permission { policy, requested } => {
                check_permission(policy, identity, requested)
            }
        }
    }
}

/// Layer for role-based access control.
///
/// Must sit inside [`AuthLayer`](super::AuthLayer) so the identity is already
/// attached when the guard runs.
#[derive(Debug, Clone)]
pub struct RbacLayer {
    requirement: Arc<Requirement>,
}

impl RbacLayer {
    /// Creates a layer requiring a role (admin always passes).
    pub fn require_role(role: Role) -> Self {
        Self {
            requirement: Arc::new(Requirement::Role(role)),
        }
    }

    /// Creates a layer requiring a set of capabilities.
    pub fn require_permission(policy: Arc<RbacPolicy>, requested: Permission) -> Self {
        Self {
            requirement: Arc::new(Requirement::Permission { policy, requested }),
        }
    }
}

impl<S> Layer<S> for RbacLayer {
    type Service = RbacMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RbacMiddleware {
            inner,
            requirement: self.requirement.clone(),
        }
    }
}

// =============================================================================
// RbacMiddleware
// =============================================================================

/// Middleware for RBAC enforcement.
#[derive(Clone)]
pub struct RbacMiddleware<S> {
    inner: S,
    requirement: Arc<Requirement>,
}

impl<S> Service<Request<Body>> for RbacMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let verdict = self.requirement.check(req.extensions().get::<Identity>());
        let mut inner = self.inner.clone();

        Box::pin(async move {
            match verdict {
                Ok(()) => inner.call(req).await,
                Err(e) => Ok(e.into_response()),
            }
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    use axum::http::StatusCode;
    use tower::ServiceExt;

    fn mock_service(
    ) -> impl Service<Request<Body>, Response = Response, Error = Infallible, Future = impl Future<Output = Result<Response, Infallible>> + Send>
           + Clone
           + Send {
        tower::service_fn(|_req| async { Ok::<_, Infallible>(Response::new(Body::empty())) })
    }

    fn identity(role: Role) -> Identity {
        Identity::new(format!("user_{}", role), role.as_str(), format!("{}@example.com", role), role)
    }

    fn request(identity: Option<Identity>) -> Request<Body> {
        let mut req = Request::builder().uri("/test").body(Body::empty()).unwrap();
        if let Some(identity) = identity {
            req.extensions_mut().insert(identity);
        }
        req
    }

    #[test]
    fn test_check_role() {
        let uploader = identity(Role::Uploader);

        assert!(check_role(Some(&uploader), Role::Uploader).is_ok());
        assert!(matches!(
            check_role(Some(&uploader), Role::Admin),
            Err(ApiError::Forbidden { .. })
        ));
        assert!(check_role(Some(&identity(Role::Admin)), Role::Viewer).is_ok());
        assert!(matches!(
            check_role(None, Role::Viewer),
            Err(ApiError::Unauthorized { .. })
        ));
    }

    #[test]
    fn test_check_permission() {
        let policy = RbacPolicy::new();
        let viewer = identity(Role::Viewer);

        assert!(check_permission(&policy, Some(&viewer), &Permission::view()).is_ok());
        assert!(matches!(
            check_permission(&policy, Some(&viewer), &Permission::upload()),
            Err(ApiError::Forbidden { .. })
        ));
        assert!(matches!(
            check_permission(&policy, None, &Permission::NONE),
            Err(ApiError::Unauthorized { .. })
        ));
    }

    #[tokio::test]
    async fn test_uploader_denied_admin_route() {
        let mut service = RbacLayer::require_role(Role::Admin).layer(mock_service());

        let response = service
            .ready()
            .await
            .unwrap()
            .call(request(Some(identity(Role::Uploader))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_uploader_passes_uploader_route() {
        let mut service = RbacLayer::require_role(Role::Uploader).layer(mock_service());

        let response = service
            .ready()
            .await
            .unwrap()
            .call(request(Some(identity(Role::Uploader))))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_admin_passes_any_role_route() {
        for role in Role::all() {
            let service = RbacLayer::require_role(*role).layer(mock_service());
            let response = service.oneshot(request(Some(identity(Role::Admin)))).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "required {}", role);
        }
    }

    #[tokio::test]
    async fn test_permission_layer() {
        let policy = Arc::new(RbacPolicy::new());

        let service = RbacLayer::require_permission(policy.clone(), Permission::upload())
            .layer(mock_service());
        let response = service.oneshot(request(Some(identity(Role::Viewer)))).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let service = RbacLayer::require_permission(policy, Permission::upload().with_view())
            .layer(mock_service());
        let response = service.oneshot(request(Some(identity(Role::Uploader)))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_rbac_no_identity() {
        let policy = Arc::new(RbacPolicy::new());

        let service = RbacLayer::require_role(Role::Viewer).layer(mock_service());
        let response = service.oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let service = RbacLayer::require_permission(policy, Permission::NONE).layer(mock_service());
        let response = service.oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
