use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;
use ventra_core::{AppError, AppResult, CompanyId, UserIdentity};
use ventra_domain::{AuditAction, EmailAddress, Permission};

use crate::access_ports::AccessRepository;
use crate::audit::{AuditEvent, AuditRepository};
use crate::authorization_service::{AuthorizationService, MembershipContext};
use crate::email::EmailService;
use crate::invite_ports::{AcceptedInvite, CreateInviteInput, InviteRecord, InviteRepository};

#[cfg(test)]
mod tests;

/// Invitations expire this many days after creation unless the inviter
/// picks an explicit expiry.
const DEFAULT_EXPIRY_DAYS: i64 = 7;

/// Upper bound on the optional personal message.
const MAX_MESSAGE_LENGTH: usize = 500;

/// Application service for the invitation lifecycle.
#[derive(Clone)]
pub struct InviteService {
    authorization_service: AuthorizationService,
    repository: Arc<dyn InviteRepository>,
    access_repository: Arc<dyn AccessRepository>,
    audit_repository: Arc<dyn AuditRepository>,
    email_service: Arc<dyn EmailService>,
    frontend_url: String,
}

impl InviteService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repository: Arc<dyn InviteRepository>,
        access_repository: Arc<dyn AccessRepository>,
        audit_repository: Arc<dyn AuditRepository>,
        email_service: Arc<dyn EmailService>,
        frontend_url: String,
    ) -> Self {
        Self {
            authorization_service,
            repository,
            access_repository,
            audit_repository,
            email_service,
            frontend_url,
        }
    }

    /// Creates a pending invitation and sends the invitation email.
    pub async fn create_invite(
        &self,
        identity: &UserIdentity,
        company_id: CompanyId,
        input: CreateInviteInput,
    ) -> AppResult<InviteRecord> {
        let membership = self.resolve_membership(identity, company_id).await?;
        self.authorization_service
            .require_permission(&membership, Permission::MemberInvite)
            .await?;

        let invitee_email = EmailAddress::new(input.invitee_email)?;

        if input.message.chars().count() > MAX_MESSAGE_LENGTH {
            return Err(AppError::Validation(format!(
                "message must be at most {MAX_MESSAGE_LENGTH} characters"
            )));
        }

        let role = self
            .access_repository
            .find_role(company_id, input.role_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("role '{}' was not found", input.role_id))
            })?;

        if self
            .access_repository
            .find_active_membership_by_email(company_id, invitee_email.as_str())
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "this user is already a member of the company".to_owned(),
            ));
        }

        let now = Utc::now();
        let expires_at = input
            .expires_at
            .unwrap_or_else(|| now + Duration::days(DEFAULT_EXPIRY_DAYS));
        if expires_at <= now {
            return Err(AppError::Validation(
                "expiry must be in the future".to_owned(),
            ));
        }

        let invite = self
            .repository
            .create_invite(
                company_id,
                identity.subject(),
                invitee_email.as_str(),
                role.role_id,
                input.message.trim(),
                expires_at,
            )
            .await?;

        self.send_invite_email(identity, &invite).await?;

        self.audit_repository
            .append_event(AuditEvent {
                company_id,
                subject: membership.subject,
                action: AuditAction::InviteCreated,
                resource_type: "invite".to_owned(),
                resource_id: invite.invite_id.to_string(),
                detail: Some(format!(
                    "invited '{}' with role '{}'",
                    invite.invitee_email, invite.role_name
                )),
            })
            .await?;

        Ok(invite)
    }

    /// Lists every invitation sent by the company, newest first.
    pub async fn list_sent_invites(
        &self,
        identity: &UserIdentity,
        company_id: CompanyId,
    ) -> AppResult<Vec<InviteRecord>> {
        let membership = self.resolve_membership(identity, company_id).await?;
        self.authorization_service
            .require_permission(&membership, Permission::MemberView)
            .await?;

        self.repository.list_company_invites(company_id).await
    }

    /// Lists pending invitations addressed to the caller's email.
    pub async fn list_received_invites(
        &self,
        identity: &UserIdentity,
    ) -> AppResult<Vec<InviteRecord>> {
        let email = EmailAddress::new(identity.email())?;
        self.repository
            .list_pending_invites_for_email(email.as_str())
            .await
    }

    /// Accepts a pending invitation addressed to the caller.
    pub async fn accept_invite(
        &self,
        identity: &UserIdentity,
        invite_id: Uuid,
    ) -> AppResult<AcceptedInvite> {
        let accepted = self
            .repository
            .accept_invite(invite_id, identity, Utc::now())
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                company_id: accepted.company_id,
                subject: identity.subject().to_owned(),
                action: AuditAction::InviteAccepted,
                resource_type: "invite".to_owned(),
                resource_id: invite_id.to_string(),
                detail: Some(format!("joined company '{}'", accepted.company_name)),
            })
            .await?;

        Ok(accepted)
    }

    /// Declines a pending invitation addressed to the caller.
    pub async fn decline_invite(
        &self,
        identity: &UserIdentity,
        invite_id: Uuid,
    ) -> AppResult<InviteRecord> {
        let invite = self
            .repository
            .decline_invite(invite_id, identity, Utc::now())
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                company_id: invite.company_id,
                subject: identity.subject().to_owned(),
                action: AuditAction::InviteDeclined,
                resource_type: "invite".to_owned(),
                resource_id: invite_id.to_string(),
                detail: None,
            })
            .await?;

        Ok(invite)
    }

    /// Cancels a pending invitation. Allowed for the original inviter,
    /// or for any member holding the invite permission in the company.
    pub async fn cancel_invite(
        &self,
        identity: &UserIdentity,
        invite_id: Uuid,
    ) -> AppResult<InviteRecord> {
        let invite = self
            .repository
            .find_invite(invite_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("invite '{invite_id}' was not found")))?;

        let membership = self
            .resolve_membership(identity, invite.company_id)
            .await?;

        if invite.inviter_subject != identity.subject() {
            self.authorization_service
                .require_permission(&membership, Permission::MemberInvite)
                .await?;
        }

        let cancelled = self.repository.cancel_invite(invite_id).await?;

        self.audit_repository
            .append_event(AuditEvent {
                company_id: cancelled.company_id,
                subject: membership.subject,
                action: AuditAction::InviteCancelled,
                resource_type: "invite".to_owned(),
                resource_id: invite_id.to_string(),
                detail: Some(format!(
                    "cancelled invite for '{}'",
                    cancelled.invitee_email
                )),
            })
            .await?;

        Ok(cancelled)
    }

    async fn resolve_membership(
        &self,
        identity: &UserIdentity,
        company_id: CompanyId,
    ) -> AppResult<MembershipContext> {
        let membership = self
            .access_repository
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

    async fn send_invite_email(
        &self,
        inviter: &UserIdentity,
        invite: &InviteRecord,
    ) -> AppResult<()> {
        let subject = format!(
            "{} invited you to {} on Ventra",
            inviter.display_name(),
            invite.company_name
        );
        let invite_url = format!("{}/invites", self.frontend_url);
        let text_body = format!(
            "{} has invited you to join {} as {}.\n\n\
             Review the invitation here:\n{}\n\n\
             This invitation expires on {}.",
            inviter.display_name(),
            invite.company_name,
            invite.role_name,
            invite_url,
            invite.expires_at.format("%Y-%m-%d"),
        );

        self.email_service
            .send_email(invite.invitee_email.as_str(), &subject, &text_body, None)
            .await
    }

    /// Returns when an invite created now would expire by default.
    #[must_use]
    pub fn default_expiry(now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::days(DEFAULT_EXPIRY_DAYS)
    }
}
