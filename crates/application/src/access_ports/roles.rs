use uuid::Uuid;
use ventra_domain::Permission;

/// Role definition with its resolved grant set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDefinition {
    /// Stable role identifier.
    pub role_id: Uuid,
    /// Unique role name in company scope.
    pub name: String,
    /// Free-text role description.
    pub description: String,
    /// Indicates a protected system-managed role.
    pub is_system: bool,
    /// Effective role grants.
    pub permissions: Vec<Permission>,
}

/// Input payload for creating custom roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    /// Unique role name in company scope.
    pub name: String,
    /// Free-text role description.
    pub description: String,
    /// Grants to attach to the role.
    pub permissions: Vec<Permission>,
}

/// Partial update payload for custom roles.
///
/// `permissions: Some(..)` fully replaces the grant set, including
/// `Some(vec![])` which removes every grant; `None` leaves grants
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateRoleInput {
    /// New role name, if renaming.
    pub name: Option<String>,
    /// New description, if changing.
    pub description: Option<String>,
    /// Replacement grant set, if provided.
    pub permissions: Option<Vec<Permission>>,
}
