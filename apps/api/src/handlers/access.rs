use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use uuid::Uuid;
use ventra_core::{CompanyId, UserIdentity};

use crate::dto::{
    ChangeMemberRoleRequest, CreateRoleRequest, MyPermissionsResponse,
    PermissionCatalogEntryResponse, RoleResponse, TeamMemberResponse, UpdateRoleRequest,
    parse_permission_keys,
};
use crate::error::ApiResult;
use crate::state::AppState;

mod permissions;
mod roles;
mod team;

pub use permissions::{my_permissions_handler, permission_catalog_handler};
pub use roles::{
    create_role_handler, delete_role_handler, get_role_handler, list_roles_handler,
    update_role_handler,
};
pub use team::{change_member_role_handler, list_team_handler, remove_member_handler};
