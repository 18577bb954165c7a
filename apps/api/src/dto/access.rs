use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use ventra_application::{PermissionCatalogEntry, RoleDefinition, RoleSummary, TeamMember};
use ventra_domain::Permission;

/// Incoming payload for custom role creation.
#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Incoming payload for partial role updates.
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub permissions: Option<Vec<String>>,
}

/// Incoming payload for role reassignment.
#[derive(Debug, Deserialize)]
pub struct ChangeMemberRoleRequest {
    pub role_id: Uuid,
}

/// API representation of a role with its grant set.
#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub role_id: String,
    pub name: String,
    pub description: String,
    pub is_system: bool,
    pub permissions: Vec<String>,
}

/// API representation of a permission catalog entry.
#[derive(Debug, Serialize)]
pub struct PermissionCatalogEntryResponse {
    pub key: String,
    pub description: String,
    pub module_label: String,
}

/// API representation of the caller's effective permissions.
#[derive(Debug, Serialize)]
pub struct MyPermissionsResponse {
    pub permissions: Vec<String>,
}

/// Compact role projection attached to team members.
#[derive(Debug, Serialize)]
pub struct RoleSummaryResponse {
    pub role_id: String,
    pub name: String,
    pub is_system: bool,
}

/// API representation of an active team member.
#[derive(Debug, Serialize)]
pub struct TeamMemberResponse {
    pub membership_id: String,
    pub subject: String,
    pub display_name: String,
    pub email: String,
    pub joined_at: String,
    pub role: Option<RoleSummaryResponse>,
}

/// Decodes permission keys from transport, dropping unknown keys.
///
/// Leniency here lets clients built against a newer catalog keep
/// working against an older server.
pub fn parse_permission_keys(keys: &[String]) -> Vec<Permission> {
    keys.iter()
        .filter_map(|key| Permission::from_str(key).ok())
        .collect()
}

fn permission_keys(permissions: Vec<Permission>) -> Vec<String> {
    permissions
        .into_iter()
        .map(|permission| permission.as_str().to_owned())
        .collect()
}

impl From<RoleDefinition> for RoleResponse {
    fn from(value: RoleDefinition) -> Self {
        Self {
            role_id: value.role_id.to_string(),
            name: value.name,
            description: value.description,
            is_system: value.is_system,
            permissions: permission_keys(value.permissions),
        }
    }
}

impl From<PermissionCatalogEntry> for PermissionCatalogEntryResponse {
    fn from(value: PermissionCatalogEntry) -> Self {
        Self {
            key: value.key,
            description: value.description,
            module_label: value.module_label,
        }
    }
}

impl From<Vec<Permission>> for MyPermissionsResponse {
    fn from(value: Vec<Permission>) -> Self {
        Self {
            permissions: permission_keys(value),
        }
    }
}

impl From<RoleSummary> for RoleSummaryResponse {
    fn from(value: RoleSummary) -> Self {
        Self {
            role_id: value.role_id.to_string(),
            name: value.name,
            is_system: value.is_system,
        }
    }
}

impl From<TeamMember> for TeamMemberResponse {
    fn from(value: TeamMember) -> Self {
        Self {
            membership_id: value.membership_id.to_string(),
            subject: value.subject,
            display_name: value.display_name,
            email: value.email,
            joined_at: value.joined_at.to_rfc3339(),
            role: value.role.map(RoleSummaryResponse::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use ventra_domain::Permission;

    use super::parse_permission_keys;

    #[test]
    fn unknown_permission_keys_are_dropped() {
        let keys = vec![
            "items.view".to_owned(),
            "spaceships.launch".to_owned(),
            "roles.edit".to_owned(),
        ];

        let parsed = parse_permission_keys(&keys);
        assert_eq!(parsed, vec![Permission::ItemView, Permission::RoleEdit]);
    }
}
