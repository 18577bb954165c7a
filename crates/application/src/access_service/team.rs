use super::*;

use uuid::Uuid;
use ventra_domain::AuditAction;

use crate::access_ports::TeamMember;
use crate::audit::AuditEvent;

impl AccessService {
    /// Returns active company members with their current role.
    pub async fn list_team_members(
        &self,
        identity: &UserIdentity,
        company_id: CompanyId,
    ) -> AppResult<Vec<TeamMember>> {
        let membership = self.resolve_membership(identity, company_id).await?;
        self.authorization_service
            .require_permission(&membership, Permission::MemberView)
            .await?;

        self.repository.list_team_members(company_id).await
    }

    /// Replaces a member's role with exactly one new role.
    ///
    /// The Owner system role is excluded from this path in both
    /// directions: it can neither be assigned here, nor taken away from
    /// its holder, and callers cannot retarget themselves.
    pub async fn change_member_role(
        &self,
        identity: &UserIdentity,
        company_id: CompanyId,
        target_membership_id: Uuid,
        role_id: Uuid,
    ) -> AppResult<TeamMember> {
        let membership = self.resolve_membership(identity, company_id).await?;
        self.authorization_service
            .require_permission(&membership, Permission::RoleAssign)
            .await?;

        let target = self
            .repository
            .find_team_member(company_id, target_membership_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("member '{target_membership_id}' was not found"))
            })?;

        if target.subject == identity.subject() {
            return Err(AppError::InvalidOperation(
                "you cannot change your own role".to_owned(),
            ));
        }

        if target.is_owner() {
            return Err(AppError::InvalidOperation(
                "the Owner role cannot be reassigned".to_owned(),
            ));
        }

        let role = self
            .repository
            .find_role(company_id, role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))?;

        if role.is_system && role.name == "Owner" {
            return Err(AppError::InvalidOperation(
                "the Owner role cannot be assigned".to_owned(),
            ));
        }

        self.repository
            .assign_role_to_membership(company_id, target_membership_id, role_id)
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                company_id,
                subject: membership.subject,
                action: AuditAction::RoleAssigned,
                resource_type: "membership_role".to_owned(),
                resource_id: format!("{target_membership_id}:{role_id}"),
                detail: Some(format!(
                    "assigned role '{}' to member '{}'",
                    role.name, target.subject
                )),
            })
            .await?;

        self.repository
            .find_team_member(company_id, target_membership_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "member '{target_membership_id}' disappeared during role change"
                ))
            })
    }

    /// Soft-suspends a member and emits an audit event. The membership
    /// row stays behind for audit history.
    pub async fn remove_member(
        &self,
        identity: &UserIdentity,
        company_id: CompanyId,
        target_membership_id: Uuid,
    ) -> AppResult<()> {
        let membership = self.resolve_membership(identity, company_id).await?;
        self.authorization_service
            .require_permission(&membership, Permission::MemberRemove)
            .await?;

        let target = self
            .repository
            .find_team_member(company_id, target_membership_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("member '{target_membership_id}' was not found"))
            })?;

        if target.subject == identity.subject() {
            return Err(AppError::InvalidOperation(
                "you cannot remove yourself from the company".to_owned(),
            ));
        }

        if target.is_owner() {
            return Err(AppError::InvalidOperation(
                "the company Owner cannot be removed".to_owned(),
            ));
        }

        self.repository
            .deactivate_membership(company_id, target_membership_id)
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                company_id,
                subject: membership.subject,
                action: AuditAction::MemberRemoved,
                resource_type: "membership".to_owned(),
                resource_id: target_membership_id.to_string(),
                detail: Some(format!("deactivated member '{}'", target.subject)),
            })
            .await
    }
}
