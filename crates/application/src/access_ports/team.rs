use chrono::{DateTime, Utc};
use uuid::Uuid;
use ventra_core::CompanyId;

/// Persisted membership row linking a subject to a company.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipRecord {
    /// Stable membership identifier.
    pub membership_id: Uuid,
    /// Company the membership belongs to.
    pub company_id: CompanyId,
    /// Authenticated subject holding the membership.
    pub subject: String,
    /// Display name captured at join time.
    pub display_name: String,
    /// Email address captured at join time.
    pub email: String,
    /// Soft-suspend flag; memberships are never hard-deleted.
    pub is_active: bool,
    /// When the subject joined the company.
    pub joined_at: DateTime<Utc>,
}

/// Compact role projection attached to team listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSummary {
    /// Stable role identifier.
    pub role_id: Uuid,
    /// Role name.
    pub name: String,
    /// Indicates a protected system-managed role.
    pub is_system: bool,
}

/// Active member projection for team views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamMember {
    /// Stable membership identifier.
    pub membership_id: Uuid,
    /// Authenticated subject holding the membership.
    pub subject: String,
    /// Display name captured at join time.
    pub display_name: String,
    /// Email address captured at join time.
    pub email: String,
    /// When the subject joined the company.
    pub joined_at: DateTime<Utc>,
    /// Currently assigned role, if any.
    pub role: Option<RoleSummary>,
}

impl TeamMember {
    /// Returns whether this member holds the protected Owner role.
    #[must_use]
    pub fn is_owner(&self) -> bool {
        self.role
            .as_ref()
            .is_some_and(|role| role.is_system && role.name == "Owner")
    }
}
