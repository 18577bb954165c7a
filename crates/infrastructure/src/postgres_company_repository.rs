use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use ventra_application::{CompanyRepository, CompanySummary};
use ventra_core::{AppError, AppResult, CompanyId, UserIdentity};

use crate::postgres_access_repository::grant_owner_access;


/// PostgreSQL-backed company repository.
#[derive(Clone)]
pub struct PostgresCompanyRepository {
    pool: PgPool,
}

impl PostgresCompanyRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct CompanyRow {
    id: Uuid,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
}

impl From<CompanyRow> for CompanySummary {
    fn from(row: CompanyRow) -> Self {
        Self {
            company_id: CompanyId::from_uuid(row.id),
            name: row.name,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl CompanyRepository for PostgresCompanyRepository {
    async fn create_company_with_owner(
        &self,
        company_id: CompanyId,
        name: &str,
        description: &str,
        creator: &UserIdentity,
    ) -> AppResult<CompanySummary> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        let row = sqlx::query_as::<_, CompanyRow>(
            r#"
            INSERT INTO companies (id, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, created_at
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(name)
        .bind(description)
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| map_company_conflict(error, name))?;

        let membership_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO memberships (company_id, subject, display_name, email)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (company_id, subject) DO UPDATE
            SET is_active = true
            RETURNING id
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(creator.subject())
        .bind(creator.display_name())
        .bind(creator.email())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to create owner membership: {error}"))
        })?;

        grant_owner_access(&mut transaction, company_id, membership_id).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(CompanySummary::from(row))
    }

    async fn list_companies_for_subject(&self, subject: &str) -> AppResult<Vec<CompanySummary>> {
        let rows = sqlx::query_as::<_, CompanyRow>(
            r#"
            SELECT companies.id, companies.name, companies.description, companies.created_at
            FROM companies
            INNER JOIN memberships
                ON memberships.company_id = companies.id
            WHERE memberships.subject = $1
                AND memberships.is_active
            ORDER BY companies.created_at
            "#,
        )
        .bind(subject)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list companies: {error}")))?;

        Ok(rows.into_iter().map(CompanySummary::from).collect())
    }
}

fn map_company_conflict(error: sqlx::Error, name: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!("company '{name}' already exists"));
    }

    AppError::Internal(format!("failed to create company: {error}"))
}
