use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;
use ventra_core::{AppError, AppResult, CompanyId, UserIdentity};
use ventra_domain::{InviteStatus, Permission};

use crate::access_ports::{
    AccessRepository, CreateRoleInput, MembershipRecord, PermissionCatalogEntry, RoleDefinition,
    TeamMember, UpdateRoleInput,
};
use crate::audit::{AuditEvent, AuditRepository};
use crate::authorization_service::{AuthorizationRepository, AuthorizationService};
use crate::email::EmailService;
use crate::invite_ports::{AcceptedInvite, CreateInviteInput, InviteRecord, InviteRepository};

use super::InviteService;

fn must<T>(result: AppResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(error) => panic!("unexpected error: {error}"),
    }
}

#[derive(Default)]
struct AccessState {
    memberships: Vec<MembershipRecord>,
    roles: Vec<RoleDefinition>,
    permissions: HashMap<Uuid, Vec<Permission>>,
}

#[derive(Default)]
struct FakeAccessRepository {
    state: Mutex<AccessState>,
}

impl FakeAccessRepository {
    async fn add_member(
        &self,
        company_id: CompanyId,
        subject: &str,
        email: &str,
        permissions: Vec<Permission>,
    ) -> Uuid {
        let membership_id = Uuid::new_v4();
        let mut state = self.state.lock().await;
        state.memberships.push(MembershipRecord {
            membership_id,
            company_id,
            subject: subject.to_owned(),
            display_name: subject.to_owned(),
            email: email.to_owned(),
            is_active: true,
            joined_at: Utc::now(),
        });
        state.permissions.insert(membership_id, permissions);
        membership_id
    }

    async fn add_role(&self, name: &str) -> Uuid {
        let role_id = Uuid::new_v4();
        self.state.lock().await.roles.push(RoleDefinition {
            role_id,
            name: name.to_owned(),
            description: String::new(),
            is_system: false,
            permissions: vec![],
        });
        role_id
    }
}

#[async_trait]
impl AccessRepository for FakeAccessRepository {
    async fn find_active_membership(
        &self,
        company_id: CompanyId,
        subject: &str,
    ) -> AppResult<Option<MembershipRecord>> {
        Ok(self
            .state
            .lock()
            .await
            .memberships
            .iter()
            .find(|m| m.company_id == company_id && m.subject == subject && m.is_active)
            .cloned())
    }

    async fn find_active_membership_by_email(
        &self,
        company_id: CompanyId,
        email: &str,
    ) -> AppResult<Option<MembershipRecord>> {
        Ok(self
            .state
            .lock()
            .await
            .memberships
            .iter()
            .find(|m| m.company_id == company_id && m.email == email && m.is_active)
            .cloned())
    }

    async fn list_roles(&self, _company_id: CompanyId) -> AppResult<Vec<RoleDefinition>> {
        Ok(self.state.lock().await.roles.clone())
    }

    async fn find_role(
        &self,
        _company_id: CompanyId,
        role_id: Uuid,
    ) -> AppResult<Option<RoleDefinition>> {
        Ok(self
            .state
            .lock()
            .await
            .roles
            .iter()
            .find(|role| role.role_id == role_id)
            .cloned())
    }

    async fn create_role(
        &self,
        _company_id: CompanyId,
        _input: CreateRoleInput,
    ) -> AppResult<RoleDefinition> {
        Err(AppError::Internal("not used in these tests".to_owned()))
    }

    async fn update_role(
        &self,
        _company_id: CompanyId,
        _role_id: Uuid,
        _input: UpdateRoleInput,
    ) -> AppResult<RoleDefinition> {
        Err(AppError::Internal("not used in these tests".to_owned()))
    }

    async fn delete_role(&self, _company_id: CompanyId, _role_id: Uuid) -> AppResult<()> {
        Err(AppError::Internal("not used in these tests".to_owned()))
    }

    async fn list_permission_catalog(&self) -> AppResult<Vec<PermissionCatalogEntry>> {
        Ok(vec![])
    }

    async fn list_team_members(&self, _company_id: CompanyId) -> AppResult<Vec<TeamMember>> {
        Ok(vec![])
    }

    async fn find_team_member(
        &self,
        _company_id: CompanyId,
        _membership_id: Uuid,
    ) -> AppResult<Option<TeamMember>> {
        Ok(None)
    }

    async fn assign_role_to_membership(
        &self,
        _company_id: CompanyId,
        _membership_id: Uuid,
        _role_id: Uuid,
    ) -> AppResult<()> {
        Ok(())
    }

    async fn deactivate_membership(
        &self,
        _company_id: CompanyId,
        _membership_id: Uuid,
    ) -> AppResult<()> {
        Ok(())
    }
}

struct GrantMapAuthorization {
    repository: Arc<FakeAccessRepository>,
}

#[async_trait]
impl AuthorizationRepository for GrantMapAuthorization {
    async fn list_permissions_for_membership(
        &self,
        _company_id: CompanyId,
        membership_id: Uuid,
    ) -> AppResult<Vec<Permission>> {
        Ok(self
            .repository
            .state
            .lock()
            .await
            .permissions
            .get(&membership_id)
            .cloned()
            .unwrap_or_default())
    }
}

struct FakeInviteRepository {
    company_name: String,
    access: Arc<FakeAccessRepository>,
    invites: Mutex<Vec<InviteRecord>>,
}

impl FakeInviteRepository {
    fn new(company_name: &str, access: Arc<FakeAccessRepository>) -> Self {
        Self {
            company_name: company_name.to_owned(),
            access,
            invites: Mutex::new(Vec::new()),
        }
    }

    async fn status_of(&self, invite_id: Uuid) -> Option<InviteStatus> {
        self.invites
            .lock()
            .await
            .iter()
            .find(|invite| invite.invite_id == invite_id)
            .map(|invite| invite.status)
    }
}

#[async_trait]
impl InviteRepository for FakeInviteRepository {
    async fn create_invite(
        &self,
        company_id: CompanyId,
        inviter_subject: &str,
        invitee_email: &str,
        role_id: Uuid,
        message: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<InviteRecord> {
        let mut invites = self.invites.lock().await;
        if invites.iter().any(|invite| {
            invite.company_id == company_id
                && invite.invitee_email == invitee_email
                && invite.status == InviteStatus::Pending
        }) {
            return Err(AppError::Conflict(
                "a pending invite for this email already exists".to_owned(),
            ));
        }

        let role_name = self
            .access
            .state
            .lock()
            .await
            .roles
            .iter()
            .find(|role| role.role_id == role_id)
            .map(|role| role.name.clone())
            .unwrap_or_default();

        let invite = InviteRecord {
            invite_id: Uuid::new_v4(),
            company_id,
            company_name: self.company_name.clone(),
            inviter_subject: inviter_subject.to_owned(),
            invitee_email: invitee_email.to_owned(),
            invitee_subject: None,
            role_id,
            role_name,
            status: InviteStatus::Pending,
            message: message.to_owned(),
            created_at: Utc::now(),
            expires_at,
            responded_at: None,
        };
        invites.push(invite.clone());
        Ok(invite)
    }

    async fn find_invite(&self, invite_id: Uuid) -> AppResult<Option<InviteRecord>> {
        Ok(self
            .invites
            .lock()
            .await
            .iter()
            .find(|invite| invite.invite_id == invite_id)
            .cloned())
    }

    async fn list_company_invites(&self, company_id: CompanyId) -> AppResult<Vec<InviteRecord>> {
        Ok(self
            .invites
            .lock()
            .await
            .iter()
            .filter(|invite| invite.company_id == company_id)
            .cloned()
            .collect())
    }

    async fn list_pending_invites_for_email(
        &self,
        email: &str,
    ) -> AppResult<Vec<InviteRecord>> {
        Ok(self
            .invites
            .lock()
            .await
            .iter()
            .filter(|invite| invite.invitee_email == email && invite.status == InviteStatus::Pending)
            .cloned()
            .collect())
    }

    async fn accept_invite(
        &self,
        invite_id: Uuid,
        identity: &UserIdentity,
        now: DateTime<Utc>,
    ) -> AppResult<AcceptedInvite> {
        let mut invites = self.invites.lock().await;
        let invite = invites
            .iter_mut()
            .find(|invite| invite.invite_id == invite_id)
            .ok_or_else(|| AppError::NotFound(format!("invite '{invite_id}' was not found")))?;

        if invite.invitee_email != identity.email().to_lowercase() {
            return Err(AppError::NotFound(format!(
                "invite '{invite_id}' was not found"
            )));
        }
        if invite.status != InviteStatus::Pending {
            return Err(AppError::InvalidOperation(
                "this invite has already been resolved".to_owned(),
            ));
        }
        if now > invite.expires_at {
            invite.status = InviteStatus::Expired;
            return Err(AppError::InvalidOperation(
                "this invite has expired".to_owned(),
            ));
        }

        invite.status = InviteStatus::Accepted;
        invite.invitee_subject = Some(identity.subject().to_owned());
        invite.responded_at = Some(now);

        Ok(AcceptedInvite {
            company_id: invite.company_id,
            company_name: invite.company_name.clone(),
            membership_id: Uuid::new_v4(),
        })
    }

    async fn decline_invite(
        &self,
        invite_id: Uuid,
        identity: &UserIdentity,
        now: DateTime<Utc>,
    ) -> AppResult<InviteRecord> {
        let mut invites = self.invites.lock().await;
        let invite = invites
            .iter_mut()
            .find(|invite| invite.invite_id == invite_id)
            .ok_or_else(|| AppError::NotFound(format!("invite '{invite_id}' was not found")))?;

        if invite.invitee_email != identity.email().to_lowercase() {
            return Err(AppError::NotFound(format!(
                "invite '{invite_id}' was not found"
            )));
        }
        if invite.status != InviteStatus::Pending {
            return Err(AppError::InvalidOperation(
                "this invite has already been resolved".to_owned(),
            ));
        }

        invite.status = InviteStatus::Declined;
        invite.invitee_subject = Some(identity.subject().to_owned());
        invite.responded_at = Some(now);
        Ok(invite.clone())
    }

    async fn cancel_invite(&self, invite_id: Uuid) -> AppResult<InviteRecord> {
        let mut invites = self.invites.lock().await;
        let invite = invites
            .iter_mut()
            .find(|invite| invite.invite_id == invite_id)
            .ok_or_else(|| AppError::NotFound(format!("invite '{invite_id}' was not found")))?;

        if invite.status != InviteStatus::Pending {
            return Err(AppError::InvalidOperation(
                "only pending invites can be cancelled".to_owned(),
            ));
        }

        invite.status = InviteStatus::Cancelled;
        Ok(invite.clone())
    }
}

#[derive(Default)]
struct RecordingEmailService {
    sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl EmailService for RecordingEmailService {
    async fn send_email(
        &self,
        to: &str,
        subject: &str,
        _text_body: &str,
        _html_body: Option<&str>,
    ) -> AppResult<()> {
        self.sent
            .lock()
            .await
            .push((to.to_owned(), subject.to_owned()));
        Ok(())
    }
}

#[derive(Default)]
struct FakeAuditRepository {
    events: Mutex<Vec<AuditEvent>>,
}

#[async_trait]
impl AuditRepository for FakeAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.lock().await.push(event);
        Ok(())
    }
}

struct Harness {
    service: InviteService,
    access: Arc<FakeAccessRepository>,
    invites: Arc<FakeInviteRepository>,
    email: Arc<RecordingEmailService>,
    audit: Arc<FakeAuditRepository>,
    company_id: CompanyId,
}

async fn harness() -> Harness {
    let access = Arc::new(FakeAccessRepository::default());
    let invites = Arc::new(FakeInviteRepository::new("Acme Supplies", access.clone()));
    let email = Arc::new(RecordingEmailService::default());
    let audit = Arc::new(FakeAuditRepository::default());
    let authorization = AuthorizationService::new(Arc::new(GrantMapAuthorization {
        repository: access.clone(),
    }));
    let service = InviteService::new(
        authorization,
        invites.clone(),
        access.clone(),
        audit.clone(),
        email.clone(),
        "https://app.ventra.test".to_owned(),
    );

    Harness {
        service,
        access,
        invites,
        email,
        audit,
        company_id: CompanyId::new(),
    }
}

fn identity(subject: &str, email: &str) -> UserIdentity {
    UserIdentity::new(subject, subject, email)
}

fn invite_input(role_id: Uuid, email: &str) -> CreateInviteInput {
    CreateInviteInput {
        invitee_email: email.to_owned(),
        role_id,
        message: "welcome aboard".to_owned(),
        expires_at: None,
    }
}

#[tokio::test]
async fn create_invite_requires_invite_permission() {
    let harness = harness().await;
    harness
        .access
        .add_member(
            harness.company_id,
            "bob",
            "bob@example.com",
            vec![Permission::ItemView],
        )
        .await;
    let role_id = harness.access.add_role("Clerk").await;

    let result = harness
        .service
        .create_invite(
            &identity("bob", "bob@example.com"),
            harness.company_id,
            invite_input(role_id, "dana@example.com"),
        )
        .await;

    match result {
        Err(AppError::Forbidden(message)) => {
            assert_eq!(message, "Missing permission: members.invite");
        }
        other => panic!("expected forbidden error, got {other:?}"),
    }
}

#[tokio::test]
async fn create_invite_rejects_malformed_email() {
    let harness = harness().await;
    harness
        .access
        .add_member(
            harness.company_id,
            "alice",
            "alice@example.com",
            vec![Permission::MemberInvite],
        )
        .await;
    let role_id = harness.access.add_role("Clerk").await;

    let result = harness
        .service
        .create_invite(
            &identity("alice", "alice@example.com"),
            harness.company_id,
            invite_input(role_id, "not-an-email"),
        )
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn create_invite_rejects_oversized_message() {
    let harness = harness().await;
    harness
        .access
        .add_member(
            harness.company_id,
            "alice",
            "alice@example.com",
            vec![Permission::MemberInvite],
        )
        .await;
    let role_id = harness.access.add_role("Clerk").await;

    let result = harness
        .service
        .create_invite(
            &identity("alice", "alice@example.com"),
            harness.company_id,
            CreateInviteInput {
                message: "x".repeat(501),
                ..invite_input(role_id, "dana@example.com")
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn create_invite_requires_role_in_company() {
    let harness = harness().await;
    harness
        .access
        .add_member(
            harness.company_id,
            "alice",
            "alice@example.com",
            vec![Permission::MemberInvite],
        )
        .await;

    let result = harness
        .service
        .create_invite(
            &identity("alice", "alice@example.com"),
            harness.company_id,
            invite_input(Uuid::new_v4(), "dana@example.com"),
        )
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn create_invite_rejects_existing_active_member() {
    let harness = harness().await;
    harness
        .access
        .add_member(
            harness.company_id,
            "alice",
            "alice@example.com",
            vec![Permission::MemberInvite],
        )
        .await;
    harness
        .access
        .add_member(harness.company_id, "dana", "dana@example.com", vec![])
        .await;
    let role_id = harness.access.add_role("Clerk").await;

    let result = harness
        .service
        .create_invite(
            &identity("alice", "alice@example.com"),
            harness.company_id,
            invite_input(role_id, "dana@example.com"),
        )
        .await;

    assert!(matches!(result, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn create_invite_canonicalizes_email_and_defaults_expiry() {
    let harness = harness().await;
    harness
        .access
        .add_member(
            harness.company_id,
            "alice",
            "alice@example.com",
            vec![Permission::MemberInvite],
        )
        .await;
    let role_id = harness.access.add_role("Clerk").await;

    let before = Utc::now();
    let invite = must(
        harness
            .service
            .create_invite(
                &identity("alice", "alice@example.com"),
                harness.company_id,
                invite_input(role_id, "  Dana@Example.COM "),
            )
            .await,
    );

    assert_eq!(invite.invitee_email, "dana@example.com");
    assert!(invite.expires_at >= before + Duration::days(7));
    assert!(invite.expires_at <= Utc::now() + Duration::days(7));

    let sent = harness.email.sent.lock().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "dana@example.com");
    drop(sent);
    assert_eq!(harness.audit.events.lock().await.len(), 1);
}

#[tokio::test]
async fn create_invite_rejects_past_expiry() {
    let harness = harness().await;
    harness
        .access
        .add_member(
            harness.company_id,
            "alice",
            "alice@example.com",
            vec![Permission::MemberInvite],
        )
        .await;
    let role_id = harness.access.add_role("Clerk").await;

    let result = harness
        .service
        .create_invite(
            &identity("alice", "alice@example.com"),
            harness.company_id,
            CreateInviteInput {
                expires_at: Some(Utc::now() - Duration::hours(1)),
                ..invite_input(role_id, "dana@example.com")
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn second_pending_invite_for_same_email_conflicts() {
    let harness = harness().await;
    harness
        .access
        .add_member(
            harness.company_id,
            "alice",
            "alice@example.com",
            vec![Permission::MemberInvite],
        )
        .await;
    let role_id = harness.access.add_role("Clerk").await;
    let inviter = identity("alice", "alice@example.com");

    must(
        harness
            .service
            .create_invite(
                &inviter,
                harness.company_id,
                invite_input(role_id, "dana@example.com"),
            )
            .await,
    );

    let second = harness
        .service
        .create_invite(
            &inviter,
            harness.company_id,
            invite_input(role_id, "dana@example.com"),
        )
        .await;

    assert!(matches!(second, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn received_invites_match_caller_email_case_insensitively() {
    let harness = harness().await;
    harness
        .access
        .add_member(
            harness.company_id,
            "alice",
            "alice@example.com",
            vec![Permission::MemberInvite],
        )
        .await;
    let role_id = harness.access.add_role("Clerk").await;

    must(
        harness
            .service
            .create_invite(
                &identity("alice", "alice@example.com"),
                harness.company_id,
                invite_input(role_id, "dana@example.com"),
            )
            .await,
    );

    let received = must(
        harness
            .service
            .list_received_invites(&identity("dana", "Dana@Example.COM"))
            .await,
    );

    assert_eq!(received.len(), 1);
}

#[tokio::test]
async fn accept_invite_emits_audit_event() {
    let harness = harness().await;
    harness
        .access
        .add_member(
            harness.company_id,
            "alice",
            "alice@example.com",
            vec![Permission::MemberInvite],
        )
        .await;
    let role_id = harness.access.add_role("Clerk").await;
    let invite = must(
        harness
            .service
            .create_invite(
                &identity("alice", "alice@example.com"),
                harness.company_id,
                invite_input(role_id, "dana@example.com"),
            )
            .await,
    );

    let accepted = must(
        harness
            .service
            .accept_invite(&identity("dana", "dana@example.com"), invite.invite_id)
            .await,
    );

    assert_eq!(accepted.company_id, harness.company_id);
    assert_eq!(
        harness.invites.status_of(invite.invite_id).await,
        Some(InviteStatus::Accepted)
    );
    // One event for creation, one for acceptance.
    assert_eq!(harness.audit.events.lock().await.len(), 2);
}

#[tokio::test]
async fn decline_invite_records_response() {
    let harness = harness().await;
    harness
        .access
        .add_member(
            harness.company_id,
            "alice",
            "alice@example.com",
            vec![Permission::MemberInvite],
        )
        .await;
    let role_id = harness.access.add_role("Clerk").await;
    let invite = must(
        harness
            .service
            .create_invite(
                &identity("alice", "alice@example.com"),
                harness.company_id,
                invite_input(role_id, "dana@example.com"),
            )
            .await,
    );

    let declined = must(
        harness
            .service
            .decline_invite(&identity("dana", "dana@example.com"), invite.invite_id)
            .await,
    );

    assert_eq!(declined.status, InviteStatus::Declined);
    assert!(declined.responded_at.is_some());
}

#[tokio::test]
async fn cancel_invite_allows_inviter() {
    let harness = harness().await;
    harness
        .access
        .add_member(
            harness.company_id,
            "alice",
            "alice@example.com",
            vec![Permission::MemberInvite],
        )
        .await;
    let role_id = harness.access.add_role("Clerk").await;
    let inviter = identity("alice", "alice@example.com");
    let invite = must(
        harness
            .service
            .create_invite(
                &inviter,
                harness.company_id,
                invite_input(role_id, "dana@example.com"),
            )
            .await,
    );

    let cancelled = must(harness.service.cancel_invite(&inviter, invite.invite_id).await);

    assert_eq!(cancelled.status, InviteStatus::Cancelled);
}

#[tokio::test]
async fn cancel_invite_requires_invite_permission_for_others() {
    let harness = harness().await;
    harness
        .access
        .add_member(
            harness.company_id,
            "alice",
            "alice@example.com",
            vec![Permission::MemberInvite],
        )
        .await;
    harness
        .access
        .add_member(
            harness.company_id,
            "bob",
            "bob@example.com",
            vec![Permission::ItemView],
        )
        .await;
    let role_id = harness.access.add_role("Clerk").await;
    let invite = must(
        harness
            .service
            .create_invite(
                &identity("alice", "alice@example.com"),
                harness.company_id,
                invite_input(role_id, "dana@example.com"),
            )
            .await,
    );

    let result = harness
        .service
        .cancel_invite(&identity("bob", "bob@example.com"), invite.invite_id)
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn cancel_invite_refuses_resolved_invites() {
    let harness = harness().await;
    harness
        .access
        .add_member(
            harness.company_id,
            "alice",
            "alice@example.com",
            vec![Permission::MemberInvite],
        )
        .await;
    let role_id = harness.access.add_role("Clerk").await;
    let inviter = identity("alice", "alice@example.com");
    let invite = must(
        harness
            .service
            .create_invite(
                &inviter,
                harness.company_id,
                invite_input(role_id, "dana@example.com"),
            )
            .await,
    );

    must(
        harness
            .service
            .decline_invite(&identity("dana", "dana@example.com"), invite.invite_id)
            .await,
    );

    let result = harness.service.cancel_invite(&inviter, invite.invite_id).await;
    assert!(matches!(result, Err(AppError::InvalidOperation(_))));
}
