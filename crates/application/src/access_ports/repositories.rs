use async_trait::async_trait;
use uuid::Uuid;
use ventra_core::{AppResult, CompanyId};

use super::catalog::PermissionCatalogEntry;
use super::roles::{CreateRoleInput, RoleDefinition, UpdateRoleInput};
use super::team::{MembershipRecord, TeamMember};

/// Repository port over the authorization graph: memberships, roles,
/// grants, and role assignments.
///
/// All lookups are scoped by company id together with the target id so
/// a guessable identifier from another tenant resolves to not-found.
#[async_trait]
pub trait AccessRepository: Send + Sync {
    /// Finds the active membership for a subject in a company.
    async fn find_active_membership(
        &self,
        company_id: CompanyId,
        subject: &str,
    ) -> AppResult<Option<MembershipRecord>>;

    /// Finds the active membership for an email address in a company.
    async fn find_active_membership_by_email(
        &self,
        company_id: CompanyId,
        email: &str,
    ) -> AppResult<Option<MembershipRecord>>;

    /// Lists all company roles with effective grants.
    async fn list_roles(&self, company_id: CompanyId) -> AppResult<Vec<RoleDefinition>>;

    /// Finds one company role with effective grants.
    async fn find_role(
        &self,
        company_id: CompanyId,
        role_id: Uuid,
    ) -> AppResult<Option<RoleDefinition>>;

    /// Creates a role and attaches its initial grants in one atomic unit.
    /// A duplicate (company, name) pair surfaces as a conflict.
    async fn create_role(
        &self,
        company_id: CompanyId,
        input: CreateRoleInput,
    ) -> AppResult<RoleDefinition>;

    /// Applies a partial role update; a provided grant list replaces the
    /// whole grant set within the same atomic unit.
    async fn update_role(
        &self,
        company_id: CompanyId,
        role_id: Uuid,
        input: UpdateRoleInput,
    ) -> AppResult<RoleDefinition>;

    /// Hard-deletes a role, cascading to its grants and assignments.
    async fn delete_role(&self, company_id: CompanyId, role_id: Uuid) -> AppResult<()>;

    /// Lists the seeded permission catalog.
    async fn list_permission_catalog(&self) -> AppResult<Vec<PermissionCatalogEntry>>;

    /// Lists active company members with their current role.
    async fn list_team_members(&self, company_id: CompanyId) -> AppResult<Vec<TeamMember>>;

    /// Finds one active company member with their current role.
    async fn find_team_member(
        &self,
        company_id: CompanyId,
        membership_id: Uuid,
    ) -> AppResult<Option<TeamMember>>;

    /// Replaces the member's role assignments with exactly the given
    /// role: clears prior assignments, then inserts one, atomically.
    async fn assign_role_to_membership(
        &self,
        company_id: CompanyId,
        membership_id: Uuid,
        role_id: Uuid,
    ) -> AppResult<()>;

    /// Soft-suspends a membership by clearing its active flag.
    async fn deactivate_membership(
        &self,
        company_id: CompanyId,
        membership_id: Uuid,
    ) -> AppResult<()>;
}
