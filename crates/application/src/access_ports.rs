//! Port types and repository contract for role and team administration.

mod catalog;
mod repositories;
mod roles;
mod team;

pub use catalog::PermissionCatalogEntry;
pub use repositories::AccessRepository;
pub use roles::{CreateRoleInput, RoleDefinition, UpdateRoleInput};
pub use team::{MembershipRecord, RoleSummary, TeamMember};
