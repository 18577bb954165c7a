//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod console_email_service;
mod in_memory_access_store;
mod postgres_access_repository;
mod postgres_audit_repository;
mod postgres_authorization_repository;
mod postgres_company_repository;
mod postgres_invite_repository;
mod smtp_email_service;

pub use console_email_service::ConsoleEmailService;
pub use in_memory_access_store::InMemoryAccessStore;
pub use postgres_access_repository::{PostgresAccessRepository, seed_permission_catalog};
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_authorization_repository::PostgresAuthorizationRepository;
pub use postgres_company_repository::PostgresCompanyRepository;
pub use postgres_invite_repository::PostgresInviteRepository;
pub use smtp_email_service::{SmtpEmailConfig, SmtpEmailService};
