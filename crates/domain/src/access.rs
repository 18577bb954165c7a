use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ventra_core::AppError;

/// System-defined capabilities enforced by application policy checks.
///
/// The enum is the single source of truth for valid permission keys.
/// The database copy is seeded from [`Permission::all`] and exists only
/// to back catalog listings and role editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Allows viewing company details.
    CompanyView,
    /// Allows editing company details.
    CompanyEdit,
    /// Allows viewing company members.
    MemberView,
    /// Allows inviting new members.
    MemberInvite,
    /// Allows removing members.
    MemberRemove,
    /// Allows viewing roles.
    RoleView,
    /// Allows creating roles.
    RoleCreate,
    /// Allows editing roles.
    RoleEdit,
    /// Allows deleting roles.
    RoleDelete,
    /// Allows assigning roles to members.
    RoleAssign,
    /// Allows viewing items.
    ItemView,
    /// Allows creating items.
    ItemCreate,
    /// Allows editing items.
    ItemEdit,
    /// Allows deleting items.
    ItemDelete,
    /// Allows viewing procurements.
    ProcurementView,
    /// Allows viewing suppliers.
    SupplierView,
    /// Allows creating suppliers.
    SupplierCreate,
    /// Allows editing suppliers.
    SupplierEdit,
    /// Allows deleting suppliers.
    SupplierDelete,
}

impl Permission {
    /// Returns the stable `<module>.<action>` storage key for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CompanyView => "companies.view",
            Self::CompanyEdit => "companies.edit",
            Self::MemberView => "members.view",
            Self::MemberInvite => "members.invite",
            Self::MemberRemove => "members.remove",
            Self::RoleView => "roles.view",
            Self::RoleCreate => "roles.create",
            Self::RoleEdit => "roles.edit",
            Self::RoleDelete => "roles.delete",
            Self::RoleAssign => "roles.assign",
            Self::ItemView => "items.view",
            Self::ItemCreate => "items.create",
            Self::ItemEdit => "items.edit",
            Self::ItemDelete => "items.delete",
            Self::ProcurementView => "procurements.view",
            Self::SupplierView => "suppliers.view",
            Self::SupplierCreate => "suppliers.create",
            Self::SupplierEdit => "suppliers.edit",
            Self::SupplierDelete => "suppliers.delete",
        }
    }

    /// Returns the human-readable capability description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::CompanyView => "View company details",
            Self::CompanyEdit => "Edit company details",
            Self::MemberView => "View company members",
            Self::MemberInvite => "Invite new members",
            Self::MemberRemove => "Remove members",
            Self::RoleView => "View roles",
            Self::RoleCreate => "Create roles",
            Self::RoleEdit => "Edit roles",
            Self::RoleDelete => "Delete roles",
            Self::RoleAssign => "Assign roles to members",
            Self::ItemView => "View items",
            Self::ItemCreate => "Create items",
            Self::ItemEdit => "Edit items",
            Self::ItemDelete => "Delete items",
            Self::ProcurementView => "View procurements",
            Self::SupplierView => "View suppliers",
            Self::SupplierCreate => "Create suppliers",
            Self::SupplierEdit => "Edit suppliers",
            Self::SupplierDelete => "Delete suppliers",
        }
    }

    /// Returns the catalog group label shown in role editors.
    #[must_use]
    pub fn module_label(&self) -> &'static str {
        match self {
            Self::CompanyView | Self::CompanyEdit => "Company Management",
            Self::MemberView | Self::MemberInvite | Self::MemberRemove => "Member Management",
            Self::RoleView
            | Self::RoleCreate
            | Self::RoleEdit
            | Self::RoleDelete
            | Self::RoleAssign => "Role & Access Control",
            Self::ItemView | Self::ItemCreate | Self::ItemEdit | Self::ItemDelete => {
                "Items Registration"
            }
            Self::ProcurementView => "Procurements Operations",
            Self::SupplierView | Self::SupplierCreate | Self::SupplierEdit | Self::SupplierDelete => {
                "Suppliers Registration"
            }
        }
    }

    /// Returns every permission in the catalog.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Permission] = &[
            Permission::CompanyView,
            Permission::CompanyEdit,
            Permission::MemberView,
            Permission::MemberInvite,
            Permission::MemberRemove,
            Permission::RoleView,
            Permission::RoleCreate,
            Permission::RoleEdit,
            Permission::RoleDelete,
            Permission::RoleAssign,
            Permission::ItemView,
            Permission::ItemCreate,
            Permission::ItemEdit,
            Permission::ItemDelete,
            Permission::ProcurementView,
            Permission::SupplierView,
            Permission::SupplierCreate,
            Permission::SupplierEdit,
            Permission::SupplierDelete,
        ];

        ALL
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .find(|permission| permission.as_str() == value)
            .copied()
            .ok_or_else(|| AppError::Validation(format!("unknown permission key '{value}'")))
    }
}

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when a company is created and bootstrapped.
    CompanyCreated,
    /// Emitted when a custom role is created.
    RoleCreated,
    /// Emitted when a custom role is updated.
    RoleUpdated,
    /// Emitted when a custom role is deleted.
    RoleDeleted,
    /// Emitted when a member's role assignment changes.
    RoleAssigned,
    /// Emitted when a member is deactivated.
    MemberRemoved,
    /// Emitted when an invitation is created.
    InviteCreated,
    /// Emitted when an invitation is accepted.
    InviteAccepted,
    /// Emitted when an invitation is declined.
    InviteDeclined,
    /// Emitted when an invitation is cancelled.
    InviteCancelled,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CompanyCreated => "company.created",
            Self::RoleCreated => "role.created",
            Self::RoleUpdated => "role.updated",
            Self::RoleDeleted => "role.deleted",
            Self::RoleAssigned => "role.assigned",
            Self::MemberRemoved => "member.removed",
            Self::InviteCreated => "invite.created",
            Self::InviteAccepted => "invite.accepted",
            Self::InviteDeclined => "invite.declined",
            Self::InviteCancelled => "invite.cancelled",
        }
    }
}
