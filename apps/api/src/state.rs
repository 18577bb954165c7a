use ventra_application::{AccessService, CompanyService, InviteService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub company_service: CompanyService,
    pub access_service: AccessService,
    pub invite_service: InviteService,
}
