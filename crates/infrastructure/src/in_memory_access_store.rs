use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use ventra_application::{
    AcceptedInvite, AccessRepository, AuditEvent, AuditRepository, AuthorizationRepository,
    CompanyRepository, CompanySummary, CreateRoleInput, InviteRecord, InviteRepository,
    MembershipRecord, PermissionCatalogEntry, RoleDefinition, RoleSummary, TeamMember,
    UpdateRoleInput,
};
use ventra_core::{AppError, AppResult, CompanyId, UserIdentity};
use ventra_domain::{InviteStatus, Permission};

#[cfg(test)]
mod tests;

#[derive(Debug, Clone)]
struct StoredRole {
    company_id: CompanyId,
    name: String,
    description: String,
    is_system: bool,
    permissions: Vec<Permission>,
}

#[derive(Debug, Clone)]
struct StoredInvite {
    company_id: CompanyId,
    inviter_subject: String,
    invitee_email: String,
    invitee_subject: Option<String>,
    role_id: Uuid,
    status: InviteStatus,
    message: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    responded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct StoreState {
    companies: HashMap<CompanyId, CompanySummary>,
    memberships: HashMap<Uuid, MembershipRecord>,
    roles: HashMap<Uuid, StoredRole>,
    membership_roles: HashMap<Uuid, Uuid>,
    invites: HashMap<Uuid, StoredInvite>,
    audit_events: Vec<AuditEvent>,
}

/// In-memory authorization graph store.
///
/// Implements every persistence port over one shared state so
/// multi-step transitions observe a consistent snapshot, mirroring
/// the transactional behavior of the PostgreSQL adapters.
#[derive(Debug, Default)]
pub struct InMemoryAccessStore {
    state: RwLock<StoreState>,
}

impl InMemoryAccessStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoreState {
    fn role_definition(&self, role_id: Uuid, role: &StoredRole) -> RoleDefinition {
        RoleDefinition {
            role_id,
            name: role.name.clone(),
            description: role.description.clone(),
            is_system: role.is_system,
            permissions: role.permissions.clone(),
        }
    }

    fn team_member(&self, membership: &MembershipRecord) -> TeamMember {
        let role = self
            .membership_roles
            .get(&membership.membership_id)
            .and_then(|role_id| {
                self.roles.get(role_id).map(|role| RoleSummary {
                    role_id: *role_id,
                    name: role.name.clone(),
                    is_system: role.is_system,
                })
            });

        TeamMember {
            membership_id: membership.membership_id,
            subject: membership.subject.clone(),
            display_name: membership.display_name.clone(),
            email: membership.email.clone(),
            joined_at: membership.joined_at,
            role,
        }
    }

    fn invite_record(&self, invite_id: Uuid, invite: &StoredInvite) -> AppResult<InviteRecord> {
        let company_name = self
            .companies
            .get(&invite.company_id)
            .map(|company| company.name.clone())
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "invite '{invite_id}' references missing company '{}'",
                    invite.company_id
                ))
            })?;
        let role_name = self
            .roles
            .get(&invite.role_id)
            .map(|role| role.name.clone())
            .unwrap_or_default();

        Ok(InviteRecord {
            invite_id,
            company_id: invite.company_id,
            company_name,
            inviter_subject: invite.inviter_subject.clone(),
            invitee_email: invite.invitee_email.clone(),
            invitee_subject: invite.invitee_subject.clone(),
            role_id: invite.role_id,
            role_name,
            status: invite.status,
            message: invite.message.clone(),
            created_at: invite.created_at,
            expires_at: invite.expires_at,
            responded_at: invite.responded_at,
        })
    }

    fn upsert_membership(&mut self, company_id: CompanyId, identity: &UserIdentity) -> Uuid {
        let existing = self
            .memberships
            .values()
            .find(|m| m.company_id == company_id && m.subject == identity.subject())
            .map(|m| m.membership_id);

        if let Some(membership_id) = existing {
            if let Some(membership) = self.memberships.get_mut(&membership_id) {
                membership.is_active = true;
                membership.display_name = identity.display_name().to_owned();
                membership.email = identity.email().trim().to_lowercase();
            }
            return membership_id;
        }

        let membership_id = Uuid::new_v4();
        self.memberships.insert(
            membership_id,
            MembershipRecord {
                membership_id,
                company_id,
                subject: identity.subject().to_owned(),
                display_name: identity.display_name().to_owned(),
                email: identity.email().trim().to_lowercase(),
                is_active: true,
                joined_at: Utc::now(),
            },
        );
        membership_id
    }

    fn grant_owner_access(&mut self, company_id: CompanyId, membership_id: Uuid) {
        let existing_role = self
            .roles
            .iter()
            .find(|(_, role)| role.company_id == company_id && role.name == "Owner")
            .map(|(role_id, _)| *role_id);

        let role_id = match existing_role {
            Some(role_id) => role_id,
            None => {
                let role_id = Uuid::new_v4();
                self.roles.insert(
                    role_id,
                    StoredRole {
                        company_id,
                        name: "Owner".to_owned(),
                        description: "Full access to the company".to_owned(),
                        is_system: true,
                        permissions: Permission::all().to_vec(),
                    },
                );
                role_id
            }
        };

        if let Some(role) = self.roles.get_mut(&role_id) {
            for permission in Permission::all() {
                if !role.permissions.contains(permission) {
                    role.permissions.push(*permission);
                }
            }
        }

        self.membership_roles.insert(membership_id, role_id);
    }
}

#[async_trait]
impl CompanyRepository for InMemoryAccessStore {
    async fn create_company_with_owner(
        &self,
        company_id: CompanyId,
        name: &str,
        description: &str,
        creator: &UserIdentity,
    ) -> AppResult<CompanySummary> {
        let mut state = self.state.write().await;

        if state.companies.values().any(|company| company.name == name) {
            return Err(AppError::Conflict(format!(
                "company '{name}' already exists"
            )));
        }

        let company = CompanySummary {
            company_id,
            name: name.to_owned(),
            description: description.to_owned(),
            created_at: Utc::now(),
        };
        state.companies.insert(company_id, company.clone());

        let membership_id = state.upsert_membership(company_id, creator);
        state.grant_owner_access(company_id, membership_id);

        Ok(company)
    }

    async fn list_companies_for_subject(&self, subject: &str) -> AppResult<Vec<CompanySummary>> {
        let state = self.state.read().await;
        let mut companies: Vec<CompanySummary> = state
            .memberships
            .values()
            .filter(|m| m.subject == subject && m.is_active)
            .filter_map(|m| state.companies.get(&m.company_id).cloned())
            .collect();
        companies.sort_by(|left, right| left.created_at.cmp(&right.created_at));
        Ok(companies)
    }
}

#[async_trait]
impl AccessRepository for InMemoryAccessStore {
    async fn find_active_membership(
        &self,
        company_id: CompanyId,
        subject: &str,
    ) -> AppResult<Option<MembershipRecord>> {
        let state = self.state.read().await;
        Ok(state
            .memberships
            .values()
            .find(|m| m.company_id == company_id && m.subject == subject && m.is_active)
            .cloned())
    }

    async fn find_active_membership_by_email(
        &self,
        company_id: CompanyId,
        email: &str,
    ) -> AppResult<Option<MembershipRecord>> {
        let state = self.state.read().await;
        Ok(state
            .memberships
            .values()
            .find(|m| m.company_id == company_id && m.email == email && m.is_active)
            .cloned())
    }

    async fn list_roles(&self, company_id: CompanyId) -> AppResult<Vec<RoleDefinition>> {
        let state = self.state.read().await;
        let mut roles: Vec<RoleDefinition> = state
            .roles
            .iter()
            .filter(|(_, role)| role.company_id == company_id)
            .map(|(role_id, role)| state.role_definition(*role_id, role))
            .collect();
        roles.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(roles)
    }

    async fn find_role(
        &self,
        company_id: CompanyId,
        role_id: Uuid,
    ) -> AppResult<Option<RoleDefinition>> {
        let state = self.state.read().await;
        Ok(state
            .roles
            .get(&role_id)
            .filter(|role| role.company_id == company_id)
            .map(|role| state.role_definition(role_id, role)))
    }

    async fn create_role(
        &self,
        company_id: CompanyId,
        input: CreateRoleInput,
    ) -> AppResult<RoleDefinition> {
        let mut state = self.state.write().await;

        if state
            .roles
            .values()
            .any(|role| role.company_id == company_id && role.name == input.name)
        {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists",
                input.name
            )));
        }

        let permissions = dedupe_permissions(input.permissions);
        let role_id = Uuid::new_v4();
        state.roles.insert(
            role_id,
            StoredRole {
                company_id,
                name: input.name.clone(),
                description: input.description.clone(),
                is_system: false,
                permissions: permissions.clone(),
            },
        );

        Ok(RoleDefinition {
            role_id,
            name: input.name,
            description: input.description,
            is_system: false,
            permissions,
        })
    }

    async fn update_role(
        &self,
        company_id: CompanyId,
        role_id: Uuid,
        input: UpdateRoleInput,
    ) -> AppResult<RoleDefinition> {
        let mut state = self.state.write().await;

        if let Some(new_name) = &input.name
            && state.roles.iter().any(|(other_id, role)| {
                *other_id != role_id && role.company_id == company_id && role.name == *new_name
            })
        {
            return Err(AppError::Conflict(format!(
                "role '{new_name}' already exists"
            )));
        }

        let role = state
            .roles
            .get_mut(&role_id)
            .filter(|role| role.company_id == company_id)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))?;

        if let Some(name) = input.name {
            role.name = name;
        }
        if let Some(description) = input.description {
            role.description = description;
        }
        if let Some(permissions) = input.permissions {
            role.permissions = dedupe_permissions(permissions);
        }

        let updated = role.clone();
        Ok(state.role_definition(role_id, &updated))
    }

    async fn delete_role(&self, company_id: CompanyId, role_id: Uuid) -> AppResult<()> {
        let mut state = self.state.write().await;

        let known = state
            .roles
            .get(&role_id)
            .is_some_and(|role| role.company_id == company_id);
        if !known {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        }

        state.roles.remove(&role_id);
        state
            .membership_roles
            .retain(|_, assigned| *assigned != role_id);
        Ok(())
    }

    async fn list_permission_catalog(&self) -> AppResult<Vec<PermissionCatalogEntry>> {
        let mut entries: Vec<PermissionCatalogEntry> = Permission::all()
            .iter()
            .map(|permission| PermissionCatalogEntry {
                key: permission.as_str().to_owned(),
                description: permission.description().to_owned(),
                module_label: permission.module_label().to_owned(),
            })
            .collect();
        entries.sort_by(|left, right| {
            (left.module_label.as_str(), left.key.as_str())
                .cmp(&(right.module_label.as_str(), right.key.as_str()))
        });
        Ok(entries)
    }

    async fn list_team_members(&self, company_id: CompanyId) -> AppResult<Vec<TeamMember>> {
        let state = self.state.read().await;
        let mut members: Vec<TeamMember> = state
            .memberships
            .values()
            .filter(|m| m.company_id == company_id && m.is_active)
            .map(|m| state.team_member(m))
            .collect();
        members.sort_by(|left, right| left.joined_at.cmp(&right.joined_at));
        Ok(members)
    }

    async fn find_team_member(
        &self,
        company_id: CompanyId,
        membership_id: Uuid,
    ) -> AppResult<Option<TeamMember>> {
        let state = self.state.read().await;
        Ok(state
            .memberships
            .get(&membership_id)
            .filter(|m| m.company_id == company_id && m.is_active)
            .map(|m| state.team_member(m)))
    }

    async fn assign_role_to_membership(
        &self,
        company_id: CompanyId,
        membership_id: Uuid,
        role_id: Uuid,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;

        let member_known = state
            .memberships
            .get(&membership_id)
            .is_some_and(|m| m.company_id == company_id && m.is_active);
        if !member_known {
            return Err(AppError::NotFound(format!(
                "member '{membership_id}' was not found"
            )));
        }

        let role_known = state
            .roles
            .get(&role_id)
            .is_some_and(|role| role.company_id == company_id);
        if !role_known {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        }

        // Members hold exactly one role.
        state.membership_roles.insert(membership_id, role_id);
        Ok(())
    }

    async fn deactivate_membership(
        &self,
        company_id: CompanyId,
        membership_id: Uuid,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        let membership = state
            .memberships
            .get_mut(&membership_id)
            .filter(|m| m.company_id == company_id)
            .ok_or_else(|| {
                AppError::NotFound(format!("member '{membership_id}' was not found"))
            })?;

        membership.is_active = false;
        Ok(())
    }
}

#[async_trait]
impl AuthorizationRepository for InMemoryAccessStore {
    async fn list_permissions_for_membership(
        &self,
        company_id: CompanyId,
        membership_id: Uuid,
    ) -> AppResult<Vec<Permission>> {
        let state = self.state.read().await;

        let active = state
            .memberships
            .get(&membership_id)
            .is_some_and(|m| m.company_id == company_id && m.is_active);
        if !active {
            return Ok(Vec::new());
        }

        Ok(state
            .membership_roles
            .get(&membership_id)
            .and_then(|role_id| state.roles.get(role_id))
            .map(|role| role.permissions.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl InviteRepository for InMemoryAccessStore {
    async fn create_invite(
        &self,
        company_id: CompanyId,
        inviter_subject: &str,
        invitee_email: &str,
        role_id: Uuid,
        message: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<InviteRecord> {
        let mut state = self.state.write().await;

        if state.invites.values().any(|invite| {
            invite.company_id == company_id
                && invite.invitee_email == invitee_email
                && invite.status == InviteStatus::Pending
        }) {
            return Err(AppError::Conflict(format!(
                "a pending invite for '{invitee_email}' already exists"
            )));
        }

        let invite_id = Uuid::new_v4();
        let invite = StoredInvite {
            company_id,
            inviter_subject: inviter_subject.to_owned(),
            invitee_email: invitee_email.to_owned(),
            invitee_subject: None,
            role_id,
            status: InviteStatus::Pending,
            message: message.to_owned(),
            created_at: Utc::now(),
            expires_at,
            responded_at: None,
        };
        let record = state.invite_record(invite_id, &invite)?;
        state.invites.insert(invite_id, invite);
        Ok(record)
    }

    async fn find_invite(&self, invite_id: Uuid) -> AppResult<Option<InviteRecord>> {
        let state = self.state.read().await;
        state
            .invites
            .get(&invite_id)
            .map(|invite| state.invite_record(invite_id, invite))
            .transpose()
    }

    async fn list_company_invites(&self, company_id: CompanyId) -> AppResult<Vec<InviteRecord>> {
        let state = self.state.read().await;
        let mut records = state
            .invites
            .iter()
            .filter(|(_, invite)| invite.company_id == company_id)
            .map(|(invite_id, invite)| state.invite_record(*invite_id, invite))
            .collect::<AppResult<Vec<_>>>()?;
        records.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(records)
    }

    async fn list_pending_invites_for_email(
        &self,
        email: &str,
    ) -> AppResult<Vec<InviteRecord>> {
        let state = self.state.read().await;
        let mut records = state
            .invites
            .iter()
            .filter(|(_, invite)| {
                invite.invitee_email == email && invite.status == InviteStatus::Pending
            })
            .map(|(invite_id, invite)| state.invite_record(*invite_id, invite))
            .collect::<AppResult<Vec<_>>>()?;
        records.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(records)
    }

    async fn accept_invite(
        &self,
        invite_id: Uuid,
        identity: &UserIdentity,
        now: DateTime<Utc>,
    ) -> AppResult<AcceptedInvite> {
        let mut state = self.state.write().await;

        let (company_id, role_id) =
            check_pending_invite(&mut state, invite_id, identity, now, true, "accepted")?;

        let already_member = state.memberships.values().any(|m| {
            m.company_id == company_id && m.subject == identity.subject() && m.is_active
        });
        if already_member {
            return Err(AppError::Conflict(
                "you are already a member of this company".to_owned(),
            ));
        }

        let membership_id = state.upsert_membership(company_id, identity);
        state.membership_roles.insert(membership_id, role_id);

        if let Some(invite) = state.invites.get_mut(&invite_id) {
            invite.status = InviteStatus::Accepted;
            invite.invitee_subject = Some(identity.subject().to_owned());
            invite.responded_at = Some(now);
        }

        let company_name = state
            .companies
            .get(&company_id)
            .map(|company| company.name.clone())
            .unwrap_or_default();

        Ok(AcceptedInvite {
            company_id,
            company_name,
            membership_id,
        })
    }

    async fn decline_invite(
        &self,
        invite_id: Uuid,
        identity: &UserIdentity,
        now: DateTime<Utc>,
    ) -> AppResult<InviteRecord> {
        let mut state = self.state.write().await;

        check_pending_invite(&mut state, invite_id, identity, now, false, "declined")?;

        if let Some(invite) = state.invites.get_mut(&invite_id) {
            invite.status = InviteStatus::Declined;
            invite.invitee_subject = Some(identity.subject().to_owned());
            invite.responded_at = Some(now);
        }

        let invite = state.invites.get(&invite_id).ok_or_else(|| {
            AppError::Internal(format!("invite '{invite_id}' disappeared during decline"))
        })?;
        state.invite_record(invite_id, invite)
    }

    async fn cancel_invite(&self, invite_id: Uuid) -> AppResult<InviteRecord> {
        let mut state = self.state.write().await;

        let invite = state
            .invites
            .get_mut(&invite_id)
            .ok_or_else(|| AppError::NotFound(format!("invite '{invite_id}' was not found")))?;

        if invite.status != InviteStatus::Pending {
            return Err(AppError::InvalidOperation(
                "only pending invites can be cancelled".to_owned(),
            ));
        }

        invite.status = InviteStatus::Cancelled;
        let snapshot = invite.clone();
        state.invite_record(invite_id, &snapshot)
    }
}

fn dedupe_permissions(permissions: Vec<Permission>) -> Vec<Permission> {
    let mut deduped = Vec::with_capacity(permissions.len());
    for permission in permissions {
        if !deduped.contains(&permission) {
            deduped.push(permission);
        }
    }

    deduped
}

fn check_pending_invite(
    state: &mut StoreState,
    invite_id: Uuid,
    identity: &UserIdentity,
    now: DateTime<Utc>,
    enforce_expiry: bool,
    verb: &str,
) -> AppResult<(CompanyId, Uuid)> {
    let invite = state
        .invites
        .get_mut(&invite_id)
        .ok_or_else(|| AppError::NotFound(format!("invite '{invite_id}' was not found")))?;

    if invite.invitee_email != identity.email().trim().to_lowercase() {
        return Err(AppError::NotFound(format!(
            "invite '{invite_id}' was not found"
        )));
    }

    if invite.status != InviteStatus::Pending {
        return Err(AppError::InvalidOperation(format!(
            "this invite has already been resolved and cannot be {verb}"
        )));
    }

    if enforce_expiry && now > invite.expires_at {
        invite.status = InviteStatus::Expired;
        return Err(AppError::InvalidOperation(
            "this invite has expired".to_owned(),
        ));
    }

    Ok((invite.company_id, invite.role_id))
}

#[async_trait]
impl AuditRepository for InMemoryAccessStore {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.state.write().await.audit_events.push(event);
        Ok(())
    }
}
