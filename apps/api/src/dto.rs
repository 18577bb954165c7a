mod access;
mod common;
mod companies;
mod invites;

pub use access::{
    ChangeMemberRoleRequest, CreateRoleRequest, MyPermissionsResponse,
    PermissionCatalogEntryResponse, RoleResponse, TeamMemberResponse,
    UpdateRoleRequest, parse_permission_keys,
};
pub use common::HealthResponse;
pub use companies::{CompanyResponse, CreateCompanyRequest};
pub use invites::{AcceptedInviteResponse, CreateInviteRequest, InviteResponse};
