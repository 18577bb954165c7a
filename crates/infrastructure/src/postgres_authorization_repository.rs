use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use ventra_application::AuthorizationRepository;
use ventra_core::{AppError, AppResult, CompanyId};
use ventra_domain::Permission;

/// PostgreSQL-backed repository for membership permission lookups.
#[derive(Clone)]
pub struct PostgresAuthorizationRepository {
    pool: PgPool,
}

impl PostgresAuthorizationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PermissionRow {
    permission: String,
}

#[async_trait]
impl AuthorizationRepository for PostgresAuthorizationRepository {
    async fn list_permissions_for_membership(
        &self,
        company_id: CompanyId,
        membership_id: Uuid,
    ) -> AppResult<Vec<Permission>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT DISTINCT grants.permission
            FROM memberships
            INNER JOIN membership_roles
                ON membership_roles.membership_id = memberships.id
            INNER JOIN role_grants AS grants
                ON grants.role_id = membership_roles.role_id
            WHERE memberships.company_id = $1
                AND memberships.id = $2
                AND memberships.is_active
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(membership_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load permissions: {error}")))?;

        rows.into_iter()
            .map(|row| {
                Permission::from_str(row.permission.as_str()).map_err(|error| {
                    AppError::Internal(format!(
                        "failed to decode permission '{}' for company '{}': {error}",
                        row.permission, company_id
                    ))
                })
            })
            .collect()
    }
}
