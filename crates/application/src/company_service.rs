use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ventra_core::{AppError, AppResult, CompanyId, NonEmptyString, UserIdentity};
use ventra_domain::AuditAction;

use crate::audit::{AuditEvent, AuditRepository};

/// Company projection returned to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanySummary {
    /// Stable company identifier.
    pub company_id: CompanyId,
    /// Unique company name.
    pub name: String,
    /// Free-text company description.
    pub description: String,
    /// When the company record was created.
    pub created_at: DateTime<Utc>,
}

/// Input payload for company creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateCompanyInput {
    /// Unique company name.
    pub name: String,
    /// Free-text company description.
    pub description: String,
}

/// Repository port for company records and the bootstrap protocol.
#[async_trait]
pub trait CompanyRepository: Send + Sync {
    /// Creates the company and provisions the creator's access in one
    /// atomic unit: company record, active membership, Owner system
    /// role with every catalog permission granted, and the Owner role
    /// assignment. Nothing is visible to readers until all five steps
    /// commit. A duplicate company name surfaces as a conflict.
    async fn create_company_with_owner(
        &self,
        company_id: CompanyId,
        name: &str,
        description: &str,
        creator: &UserIdentity,
    ) -> AppResult<CompanySummary>;

    /// Lists companies where the subject holds an active membership.
    async fn list_companies_for_subject(&self, subject: &str) -> AppResult<Vec<CompanySummary>>;
}

/// Application service for company creation and listing.
#[derive(Clone)]
pub struct CompanyService {
    repository: Arc<dyn CompanyRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl CompanyService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        repository: Arc<dyn CompanyRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            repository,
            audit_repository,
        }
    }

    /// Creates a company and bootstraps access control for the creator.
    pub async fn create_company(
        &self,
        identity: &UserIdentity,
        input: CreateCompanyInput,
    ) -> AppResult<CompanySummary> {
        let name = NonEmptyString::new(input.name)
            .map_err(|_| AppError::Validation("company name is required".to_owned()))?;

        if !is_valid_company_name(name.as_str()) {
            return Err(AppError::Validation(
                "company name contains invalid characters".to_owned(),
            ));
        }

        let company = self
            .repository
            .create_company_with_owner(
                CompanyId::new(),
                name.as_str(),
                input.description.trim(),
                identity,
            )
            .await?;

        self.audit_repository
            .append_event(AuditEvent {
                company_id: company.company_id,
                subject: identity.subject().to_owned(),
                action: AuditAction::CompanyCreated,
                resource_type: "company".to_owned(),
                resource_id: company.company_id.to_string(),
                detail: Some(format!("created company '{}'", company.name)),
            })
            .await?;

        Ok(company)
    }

    /// Lists companies where the caller holds an active membership.
    pub async fn list_my_companies(
        &self,
        identity: &UserIdentity,
    ) -> AppResult<Vec<CompanySummary>> {
        self.repository
            .list_companies_for_subject(identity.subject())
            .await
    }
}

/// Legal-name character set: word characters, whitespace, and the
/// punctuation that shows up in registered company names.
fn is_valid_company_name(name: &str) -> bool {
    name.chars().all(|character| {
        character.is_alphanumeric()
            || character.is_whitespace()
            || matches!(
                character,
                '_' | '&' | '.' | ',' | '\'' | '(' | ')' | '+' | '-' | '/'
            )
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::sync::Mutex;
    use ventra_core::{AppError, AppResult, CompanyId, UserIdentity};

    use crate::audit::{AuditEvent, AuditRepository};

    use super::{
        CompanyRepository, CompanyService, CompanySummary, CreateCompanyInput,
        is_valid_company_name,
    };

    #[derive(Default)]
    struct FakeCompanyRepository {
        companies: Mutex<Vec<CompanySummary>>,
    }

    #[async_trait]
    impl CompanyRepository for FakeCompanyRepository {
        async fn create_company_with_owner(
            &self,
            company_id: CompanyId,
            name: &str,
            description: &str,
            _creator: &UserIdentity,
        ) -> AppResult<CompanySummary> {
            let mut companies = self.companies.lock().await;
            if companies.iter().any(|company| company.name == name) {
                return Err(AppError::Conflict(format!(
                    "company '{name}' already exists"
                )));
            }

            let company = CompanySummary {
                company_id,
                name: name.to_owned(),
                description: description.to_owned(),
                created_at: chrono::Utc::now(),
            };
            companies.push(company.clone());
            Ok(company)
        }

        async fn list_companies_for_subject(
            &self,
            _subject: &str,
        ) -> AppResult<Vec<CompanySummary>> {
            Ok(self.companies.lock().await.clone())
        }
    }

    #[derive(Default)]
    struct FakeAuditRepository {
        events: Mutex<Vec<AuditEvent>>,
    }

    #[async_trait]
    impl AuditRepository for FakeAuditRepository {
        async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
            self.events.lock().await.push(event);
            Ok(())
        }
    }

    fn identity() -> UserIdentity {
        UserIdentity::new("alice", "Alice", "alice@example.com")
    }

    #[tokio::test]
    async fn create_company_rejects_empty_name() {
        let service = CompanyService::new(
            Arc::new(FakeCompanyRepository::default()),
            Arc::new(FakeAuditRepository::default()),
        );

        let result = service
            .create_company(
                &identity(),
                CreateCompanyInput {
                    name: "   ".to_owned(),
                    description: String::new(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn create_company_rejects_invalid_characters() {
        let service = CompanyService::new(
            Arc::new(FakeCompanyRepository::default()),
            Arc::new(FakeAuditRepository::default()),
        );

        let result = service
            .create_company(
                &identity(),
                CreateCompanyInput {
                    name: "Acme <script>".to_owned(),
                    description: String::new(),
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn create_company_emits_audit_event() {
        let audit_repository = Arc::new(FakeAuditRepository::default());
        let service = CompanyService::new(
            Arc::new(FakeCompanyRepository::default()),
            audit_repository.clone(),
        );

        let result = service
            .create_company(
                &identity(),
                CreateCompanyInput {
                    name: "Acme & Sons Ltd.".to_owned(),
                    description: "restaurant supplies".to_owned(),
                },
            )
            .await;

        assert!(result.is_ok());
        assert_eq!(audit_repository.events.lock().await.len(), 1);
    }

    #[test]
    fn company_name_character_set() {
        assert!(is_valid_company_name("Smith & Wesson Co. (UK), a/b+c-d'e"));
        assert!(!is_valid_company_name("acme;drop"));
        assert!(!is_valid_company_name("<acme>"));
    }
}
