use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use ventra_application::{AcceptedInvite, InviteRecord};

/// Incoming payload for invite creation.
#[derive(Debug, Deserialize)]
pub struct CreateInviteRequest {
    pub invitee_email: String,
    pub role_id: Uuid,
    #[serde(default)]
    pub message: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// API representation of an invitation.
#[derive(Debug, Serialize)]
pub struct InviteResponse {
    pub invite_id: String,
    pub company_id: String,
    pub company_name: String,
    pub inviter_subject: String,
    pub invitee_email: String,
    pub role_id: String,
    pub role_name: String,
    pub status: String,
    pub message: String,
    pub created_at: String,
    pub expires_at: String,
    pub responded_at: Option<String>,
    pub is_expired: bool,
}

/// API representation of a successful invite acceptance.
#[derive(Debug, Serialize)]
pub struct AcceptedInviteResponse {
    pub company_id: String,
    pub company_name: String,
    pub membership_id: String,
}

impl From<InviteRecord> for InviteResponse {
    fn from(value: InviteRecord) -> Self {
        let is_expired = value.is_expired(Utc::now());
        Self {
            invite_id: value.invite_id.to_string(),
            company_id: value.company_id.to_string(),
            company_name: value.company_name,
            inviter_subject: value.inviter_subject,
            invitee_email: value.invitee_email,
            role_id: value.role_id.to_string(),
            role_name: value.role_name,
            status: value.status.as_str().to_owned(),
            message: value.message,
            created_at: value.created_at.to_rfc3339(),
            expires_at: value.expires_at.to_rfc3339(),
            responded_at: value.responded_at.map(|at| at.to_rfc3339()),
            is_expired,
        }
    }
}

impl From<AcceptedInvite> for AcceptedInviteResponse {
    fn from(value: AcceptedInvite) -> Self {
        Self {
            company_id: value.company_id.to_string(),
            company_name: value.company_name,
            membership_id: value.membership_id.to_string(),
        }
    }
}
