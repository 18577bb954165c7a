use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ventra_core::AppError;

/// Lifecycle state of a company invitation.
///
/// The machine is one-way: a pending invite moves into exactly one of
/// the terminal states and never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InviteStatus {
    /// Awaiting a response from the invitee.
    Pending,
    /// Invitee joined the company.
    Accepted,
    /// Invitee turned the invitation down.
    Declined,
    /// Invitation lapsed past its expiry timestamp.
    Expired,
    /// Inviter or an administrator withdrew the invitation.
    Cancelled,
}

impl InviteStatus {
    /// Returns a stable storage value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns whether the status admits no further transitions.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl FromStr for InviteStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "declined" => Ok(Self::Declined),
            "expired" => Ok(Self::Expired),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(AppError::Validation(format!(
                "unknown invite status '{value}'"
            ))),
        }
    }
}
