use std::sync::Arc;

use ventra_core::{AppError, AppResult, CompanyId, UserIdentity};
use ventra_domain::Permission;

use crate::access_ports::{AccessRepository, PermissionCatalogEntry};
use crate::audit::AuditRepository;
use crate::authorization_service::{AuthorizationService, MembershipContext};

mod roles;
mod team;


/// Application service for role management and team administration.
#[derive(Clone)]
pub struct AccessService {
    authorization_service: AuthorizationService,
    repository: Arc<dyn AccessRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl AccessService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repository: Arc<dyn AccessRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            authorization_service,
            repository,
            audit_repository,
        }
    }

    /// Resolves the caller's active membership in the company.
    ///
    /// A missing company and a missing membership are indistinguishable
    /// to the caller, which keeps company ids unprobeable.
    pub async fn resolve_membership(
        &self,
        identity: &UserIdentity,
        company_id: CompanyId,
    ) -> AppResult<MembershipContext> {
        let membership = self
            .repository
            .find_active_membership(company_id, identity.subject())
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "no active membership for subject in company '{company_id}'"
                ))
            })?;

        Ok(MembershipContext {
            membership_id: membership.membership_id,
            company_id,
            subject: membership.subject,
        })
    }

    /// Returns the caller's effective permission keys. Every active
    /// member may read their own permissions.
    pub async fn my_permissions(
        &self,
        identity: &UserIdentity,
        company_id: CompanyId,
    ) -> AppResult<Vec<Permission>> {
        let membership = self.resolve_membership(identity, company_id).await?;
        self.authorization_service
            .effective_permissions(&membership)
            .await
    }

    /// Returns the seeded permission catalog for role editors.
    pub async fn list_permission_catalog(
        &self,
        identity: &UserIdentity,
        company_id: CompanyId,
    ) -> AppResult<Vec<PermissionCatalogEntry>> {
        let membership = self.resolve_membership(identity, company_id).await?;
        self.authorization_service
            .require_permission(&membership, Permission::RoleView)
            .await?;

        self.repository.list_permission_catalog().await
    }
}
