use serde::{Deserialize, Serialize};
use ventra_application::CompanySummary;

/// Incoming payload for company creation.
#[derive(Debug, Deserialize)]
pub struct CreateCompanyRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// API representation of a company.
#[derive(Debug, Serialize)]
pub struct CompanyResponse {
    pub company_id: String,
    pub name: String,
    pub description: String,
    pub created_at: String,
}

impl From<CompanySummary> for CompanyResponse {
    fn from(value: CompanySummary) -> Self {
        Self {
            company_id: value.company_id.to_string(),
            name: value.name,
            description: value.description,
            created_at: value.created_at.to_rfc3339(),
        }
    }
}
