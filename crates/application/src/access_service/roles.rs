use super::*;

use uuid::Uuid;
use ventra_core::NonEmptyString;
use ventra_domain::AuditAction;

use crate::access_ports::{CreateRoleInput, RoleDefinition, UpdateRoleInput};
use crate::audit::AuditEvent;

impl AccessService {
    /// Returns all company roles with their grant sets.
    pub async fn list_roles(
        &self,
        identity: &UserIdentity,
        company_id: CompanyId,
    ) -> AppResult<Vec<RoleDefinition>> {
        let membership = self.resolve_membership(identity, company_id).await?;
        self.authorization_service
            .require_permission(&membership, Permission::RoleView)
            .await?;

        self.repository.list_roles(company_id).await
    }

    /// Returns one company role with its grant set.
    pub async fn get_role(
        &self,
        identity: &UserIdentity,
        company_id: CompanyId,
        role_id: Uuid,
    ) -> AppResult<RoleDefinition> {
        let membership = self.resolve_membership(identity, company_id).await?;
        self.authorization_service
            .require_permission(&membership, Permission::RoleView)
            .await?;

        self.repository
            .find_role(company_id, role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))
    }

    /// Creates a custom role and emits an audit event.
    ///
    /// The repository uniqueness constraint is the authoritative guard
    /// against duplicate names; no advisory pre-check is made here.
    pub async fn create_role(
        &self,
        identity: &UserIdentity,
        company_id: CompanyId,
        input: CreateRoleInput,
    ) -> AppResult<RoleDefinition> {
        let membership = self.resolve_membership(identity, company_id).await?;
        self.authorization_service
            .require_permission(&membership, Permission::RoleCreate)
            .await?;

        let name = NonEmptyString::new(input.name)
            .map_err(|_| AppError::Validation("role name is required".to_owned()))?;

        let role = self
            .repository
            .create_role(
                company_id,
                CreateRoleInput {
                    name: name.into(),
                    description: input.description.trim().to_owned(),
                    permissions: input.permissions,
                },
            )
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                company_id,
                subject: membership.subject,
                action: AuditAction::RoleCreated,
                resource_type: "role".to_owned(),
                resource_id: role.role_id.to_string(),
                detail: Some(format!("created role '{}'", role.name)),
            })
            .await?;

        Ok(role)
    }

    /// Applies a partial update to a custom role and emits an audit event.
    pub async fn update_role(
        &self,
        identity: &UserIdentity,
        company_id: CompanyId,
        role_id: Uuid,
        input: UpdateRoleInput,
    ) -> AppResult<RoleDefinition> {
        let membership = self.resolve_membership(identity, company_id).await?;
        self.authorization_service
            .require_permission(&membership, Permission::RoleEdit)
            .await?;

        let existing = self
            .repository
            .find_role(company_id, role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))?;

        if existing.is_system {
            return Err(AppError::InvalidOperation(
                "system roles cannot be edited".to_owned(),
            ));
        }

        let name = input
            .name
            .map(|value| {
                NonEmptyString::new(value)
                    .map_err(|_| AppError::Validation("role name must not be empty".to_owned()))
                    .map(String::from)
            })
            .transpose()?;

        let role = self
            .repository
            .update_role(
                company_id,
                role_id,
                UpdateRoleInput {
                    name,
                    description: input.description.map(|value| value.trim().to_owned()),
                    permissions: input.permissions,
                },
            )
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                company_id,
                subject: membership.subject,
                action: AuditAction::RoleUpdated,
                resource_type: "role".to_owned(),
                resource_id: role.role_id.to_string(),
                detail: Some(format!("updated role '{}'", role.name)),
            })
            .await?;

        Ok(role)
    }

    /// Hard-deletes a custom role and emits an audit event. Members
    /// whose only role this was become role-less, not membership-less.
    pub async fn delete_role(
        &self,
        identity: &UserIdentity,
        company_id: CompanyId,
        role_id: Uuid,
    ) -> AppResult<()> {
        let membership = self.resolve_membership(identity, company_id).await?;
        self.authorization_service
            .require_permission(&membership, Permission::RoleDelete)
            .await?;

        let existing = self
            .repository
            .find_role(company_id, role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))?;

        if existing.is_system {
            return Err(AppError::InvalidOperation(
                "system roles cannot be deleted".to_owned(),
            ));
        }

        self.repository.delete_role(company_id, role_id).await?;

        self.audit_repository
            .append_event(AuditEvent {
                company_id,
                subject: membership.subject,
                action: AuditAction::RoleDeleted,
                resource_type: "role".to_owned(),
                resource_id: role_id.to_string(),
                detail: Some(format!("deleted role '{}'", existing.name)),
            })
            .await
    }
}
