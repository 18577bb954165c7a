use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;
use ventra_core::{AppError, AppResult, CompanyId};
use ventra_domain::Permission;

/// The caller's resolved identity inside one company.
///
/// Resolved exactly once per request from the path company id and the
/// authenticated subject, then threaded explicitly through every
/// operation; no service re-derives it from ambient state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipContext {
    /// Stable membership identifier.
    pub membership_id: Uuid,
    /// Company the membership belongs to.
    pub company_id: CompanyId,
    /// Authenticated subject holding the membership.
    pub subject: String,
}

/// Repository port for permission lookups.
#[async_trait]
pub trait AuthorizationRepository: Send + Sync {
    /// Lists effective permissions for a membership: the four-hop walk
    /// membership, membership role, role grant, permission key.
    async fn list_permissions_for_membership(
        &self,
        company_id: CompanyId,
        membership_id: Uuid,
    ) -> AppResult<Vec<Permission>>;
}

/// Application service for company-scoped authorization checks.
///
/// A pure predicate over the authorization graph: no caching, every
/// call re-reads current state so role edits take effect immediately
/// for all holders.
#[derive(Clone)]
pub struct AuthorizationService {
    repository: Arc<dyn AuthorizationRepository>,
}

impl AuthorizationService {
    /// Creates a new authorization service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn AuthorizationRepository>) -> Self {
        Self { repository }
    }

    /// Returns whether the membership currently holds the permission.
    pub async fn has_permission(
        &self,
        membership: &MembershipContext,
        permission: Permission,
    ) -> AppResult<bool> {
        let permissions = self
            .repository
            .list_permissions_for_membership(membership.company_id, membership.membership_id)
            .await?;

        Ok(permissions.contains(&permission))
    }

    /// Ensures the membership holds the permission, failing the operation otherwise.
    pub async fn require_permission(
        &self,
        membership: &MembershipContext,
        permission: Permission,
    ) -> AppResult<()> {
        if self.has_permission(membership, permission).await? {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "Missing permission: {}",
            permission.as_str()
        )))
    }

    /// Returns every permission the membership currently holds.
    pub async fn effective_permissions(
        &self,
        membership: &MembershipContext,
    ) -> AppResult<Vec<Permission>> {
        self.repository
            .list_permissions_for_membership(membership.company_id, membership.membership_id)
            .await
    }
}
