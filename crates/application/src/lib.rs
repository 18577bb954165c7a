//! Application services and ports for the Ventra access-control core.

#![forbid(unsafe_code)]

mod access_ports;
mod access_service;
mod audit;
mod authorization_service;
mod company_service;
mod email;
mod invite_ports;
mod invite_service;

pub use access_ports::{
    AccessRepository, CreateRoleInput, MembershipRecord, PermissionCatalogEntry, RoleDefinition,
    RoleSummary, TeamMember, UpdateRoleInput,
};
pub use access_service::AccessService;
pub use audit::{AuditEvent, AuditRepository};
pub use authorization_service::{
    AuthorizationRepository, AuthorizationService, MembershipContext,
};
pub use company_service::{
    CompanyRepository, CompanyService, CompanySummary, CreateCompanyInput,
};
pub use email::EmailService;
pub use invite_ports::{AcceptedInvite, CreateInviteInput, InviteRecord, InviteRepository};
pub use invite_service::InviteService;
