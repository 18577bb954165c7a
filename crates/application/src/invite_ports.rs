//! Port types and repository contract for the invitation lifecycle.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use ventra_core::{AppResult, CompanyId, UserIdentity};
use ventra_domain::InviteStatus;

/// Invitation row with company and role names resolved for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteRecord {
    /// Stable invite identifier.
    pub invite_id: Uuid,
    /// Company the invitee is being invited to.
    pub company_id: CompanyId,
    /// Company name for display.
    pub company_name: String,
    /// Subject that sent the invitation.
    pub inviter_subject: String,
    /// Canonical invitee email address.
    pub invitee_email: String,
    /// Subject that responded, once known.
    pub invitee_subject: Option<String>,
    /// Role assigned upon acceptance.
    pub role_id: Uuid,
    /// Role name for display.
    pub role_name: String,
    /// Lifecycle status.
    pub status: InviteStatus,
    /// Optional personal message from the inviter.
    pub message: String,
    /// When the invitation was created.
    pub created_at: DateTime<Utc>,
    /// When the invitation lapses.
    pub expires_at: DateTime<Utc>,
    /// When the invitee responded, if ever.
    pub responded_at: Option<DateTime<Utc>>,
}

impl InviteRecord {
    /// Returns whether the invite is pending but past its expiry.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == InviteStatus::Pending && now > self.expires_at
    }
}

/// Outcome of a successful invite acceptance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedInvite {
    /// Company joined.
    pub company_id: CompanyId,
    /// Company name for display.
    pub company_name: String,
    /// Membership created or reactivated for the invitee.
    pub membership_id: Uuid,
}

/// Input payload for invite creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateInviteInput {
    /// Invitee email address.
    pub invitee_email: String,
    /// Role assigned upon acceptance.
    pub role_id: Uuid,
    /// Optional personal message.
    pub message: String,
    /// Explicit expiry; defaults to seven days after creation.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Repository port for invitation persistence and transitions.
///
/// Every transition couples its status check and status update inside
/// one atomically scoped read-modify-write, so a racing second caller
/// observes the terminal state instead of double-applying effects.
#[async_trait]
pub trait InviteRepository: Send + Sync {
    /// Persists a pending invite. A second pending invite for the same
    /// (company, email) pair surfaces as a conflict.
    async fn create_invite(
        &self,
        company_id: CompanyId,
        inviter_subject: &str,
        invitee_email: &str,
        role_id: Uuid,
        message: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<InviteRecord>;

    /// Finds an invite by id.
    async fn find_invite(&self, invite_id: Uuid) -> AppResult<Option<InviteRecord>>;

    /// Lists all invites sent by a company, newest first.
    async fn list_company_invites(&self, company_id: CompanyId) -> AppResult<Vec<InviteRecord>>;

    /// Lists pending invites addressed to an email, newest first.
    async fn list_pending_invites_for_email(&self, email: &str)
    -> AppResult<Vec<InviteRecord>>;

    /// Accepts a pending invite addressed to the identity's email:
    /// creates or reactivates the membership, assigns the invite role,
    /// and records the response, all in one atomic unit. A pending
    /// invite past its expiry is persisted as expired and reported as
    /// an invalid operation.
    async fn accept_invite(
        &self,
        invite_id: Uuid,
        identity: &UserIdentity,
        now: DateTime<Utc>,
    ) -> AppResult<AcceptedInvite>;

    /// Declines a pending invite addressed to the identity's email and
    /// returns the updated record. A lapsed expiry does not block the
    /// decline; only membership-granting transitions enforce it.
    async fn decline_invite(
        &self,
        invite_id: Uuid,
        identity: &UserIdentity,
        now: DateTime<Utc>,
    ) -> AppResult<InviteRecord>;

    /// Cancels a pending invite and returns the updated record.
    /// Authorization is the caller's concern.
    async fn cancel_invite(&self, invite_id: Uuid) -> AppResult<InviteRecord>;
}
