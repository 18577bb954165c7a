use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use ventra_application::{
    AccessRepository, CreateRoleInput, MembershipRecord, PermissionCatalogEntry, RoleDefinition,
    RoleSummary, TeamMember, UpdateRoleInput,
};
use ventra_core::{AppError, AppResult, CompanyId};
use ventra_domain::Permission;


/// PostgreSQL-backed repository for the authorization graph.
#[derive(Clone)]
pub struct PostgresAccessRepository {
    pool: PgPool,
}

impl PostgresAccessRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct MembershipRow {
    id: Uuid,
    company_id: Uuid,
    subject: String,
    display_name: String,
    email: String,
    is_active: bool,
    joined_at: DateTime<Utc>,
}

impl From<MembershipRow> for MembershipRecord {
    fn from(row: MembershipRow) -> Self {
        Self {
            membership_id: row.id,
            company_id: CompanyId::from_uuid(row.company_id),
            subject: row.subject,
            display_name: row.display_name,
            email: row.email,
            is_active: row.is_active,
            joined_at: row.joined_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    role_id: Uuid,
    role_name: String,
    description: String,
    is_system: bool,
    permission: Option<String>,
}

#[derive(Debug, FromRow)]
struct TeamMemberRow {
    membership_id: Uuid,
    subject: String,
    display_name: String,
    email: String,
    joined_at: DateTime<Utc>,
    role_id: Option<Uuid>,
    role_name: Option<String>,
    role_is_system: Option<bool>,
}

impl From<TeamMemberRow> for TeamMember {
    fn from(row: TeamMemberRow) -> Self {
        let role = match (row.role_id, row.role_name, row.role_is_system) {
            (Some(role_id), Some(name), Some(is_system)) => Some(RoleSummary {
                role_id,
                name,
                is_system,
            }),
            _ => None,
        };

        Self {
            membership_id: row.membership_id,
            subject: row.subject,
            display_name: row.display_name,
            email: row.email,
            joined_at: row.joined_at,
            role,
        }
    }
}

#[async_trait]
impl AccessRepository for PostgresAccessRepository {
    async fn find_active_membership(
        &self,
        company_id: CompanyId,
        subject: &str,
    ) -> AppResult<Option<MembershipRecord>> {
        let row = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT id, company_id, subject, display_name, email, is_active, joined_at
            FROM memberships
            WHERE company_id = $1
                AND subject = $2
                AND is_active
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(subject)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve membership: {error}")))?;

        Ok(row.map(MembershipRecord::from))
    }

    async fn find_active_membership_by_email(
        &self,
        company_id: CompanyId,
        email: &str,
    ) -> AppResult<Option<MembershipRecord>> {
        let row = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT id, company_id, subject, display_name, email, is_active, joined_at
            FROM memberships
            WHERE company_id = $1
                AND email = $2
                AND is_active
            LIMIT 1
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to resolve membership by email: {error}"))
        })?;

        Ok(row.map(MembershipRecord::from))
    }

    async fn list_roles(&self, company_id: CompanyId) -> AppResult<Vec<RoleDefinition>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT
                roles.id AS role_id,
                roles.name AS role_name,
                roles.description,
                roles.is_system,
                grants.permission
            FROM roles
            LEFT JOIN role_grants AS grants
                ON grants.role_id = roles.id
            WHERE roles.company_id = $1
            ORDER BY roles.name, grants.permission
            "#,
        )
        .bind(company_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        aggregate_roles(rows, company_id)
    }

    async fn find_role(
        &self,
        company_id: CompanyId,
        role_id: Uuid,
    ) -> AppResult<Option<RoleDefinition>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT
                roles.id AS role_id,
                roles.name AS role_name,
                roles.description,
                roles.is_system,
                grants.permission
            FROM roles
            LEFT JOIN role_grants AS grants
                ON grants.role_id = roles.id
            WHERE roles.company_id = $1
                AND roles.id = $2
            ORDER BY grants.permission
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(role_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role: {error}")))?;

        Ok(aggregate_roles(rows, company_id)?.into_iter().next())
    }

    async fn create_role(
        &self,
        company_id: CompanyId,
        input: CreateRoleInput,
    ) -> AppResult<RoleDefinition> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        let role_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO roles (company_id, name, description, is_system)
            VALUES ($1, $2, $3, false)
            RETURNING id
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(input.name.as_str())
        .bind(input.description.as_str())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| map_role_conflict(error, input.name.as_str()))?;

        // ON CONFLICT collapses repeated keys in storage; collapse the
        // echoed grant set to match what a re-read would return.
        let permissions = dedupe_permissions(input.permissions);
        replace_role_grants(&mut transaction, role_id, &permissions).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(RoleDefinition {
            role_id,
            name: input.name,
            description: input.description,
            is_system: false,
            permissions,
        })
    }

    async fn update_role(
        &self,
        company_id: CompanyId,
        role_id: Uuid,
        input: UpdateRoleInput,
    ) -> AppResult<RoleDefinition> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        let updated = sqlx::query_scalar::<_, Uuid>(
            r#"
            UPDATE roles
            SET name = COALESCE($3, name),
                description = COALESCE($4, description)
            WHERE company_id = $1
                AND id = $2
            RETURNING id
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(role_id)
        .bind(input.name.as_deref())
        .bind(input.description.as_deref())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| {
            map_role_conflict(error, input.name.as_deref().unwrap_or("role"))
        })?;

        if updated.is_none() {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        }

        if let Some(permissions) = &input.permissions {
            sqlx::query("DELETE FROM role_grants WHERE role_id = $1")
                .bind(role_id)
                .execute(&mut *transaction)
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to clear role grants: {error}"))
                })?;

            replace_role_grants(&mut transaction, role_id, permissions).await?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        self.find_role(company_id, role_id).await?.ok_or_else(|| {
            AppError::Internal(format!("role '{role_id}' disappeared during update"))
        })
    }

    async fn delete_role(&self, company_id: CompanyId, role_id: Uuid) -> AppResult<()> {
        let rows_affected = sqlx::query(
            r#"
            DELETE FROM roles
            WHERE company_id = $1
                AND id = $2
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(role_id)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete role: {error}")))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        }

        Ok(())
    }

    async fn list_permission_catalog(&self) -> AppResult<Vec<PermissionCatalogEntry>> {
        let rows = sqlx::query_as::<_, (String, String, String)>(
            r#"
            SELECT key, description, module_label
            FROM permissions
            ORDER BY module_label, key
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list permission catalog: {error}"))
        })?;

        Ok(rows
            .into_iter()
            .map(|(key, description, module_label)| PermissionCatalogEntry {
                key,
                description,
                module_label,
            })
            .collect())
    }

    async fn list_team_members(&self, company_id: CompanyId) -> AppResult<Vec<TeamMember>> {
        let rows = sqlx::query_as::<_, TeamMemberRow>(
            r#"
            SELECT
                memberships.id AS membership_id,
                memberships.subject,
                memberships.display_name,
                memberships.email,
                memberships.joined_at,
                roles.id AS role_id,
                roles.name AS role_name,
                roles.is_system AS role_is_system
            FROM memberships
            LEFT JOIN membership_roles
                ON membership_roles.membership_id = memberships.id
            LEFT JOIN roles
                ON roles.id = membership_roles.role_id
            WHERE memberships.company_id = $1
                AND memberships.is_active
            ORDER BY memberships.joined_at
            "#,
        )
        .bind(company_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list team members: {error}")))?;

        Ok(rows.into_iter().map(TeamMember::from).collect())
    }

    async fn find_team_member(
        &self,
        company_id: CompanyId,
        membership_id: Uuid,
    ) -> AppResult<Option<TeamMember>> {
        let row = sqlx::query_as::<_, TeamMemberRow>(
            r#"
            SELECT
                memberships.id AS membership_id,
                memberships.subject,
                memberships.display_name,
                memberships.email,
                memberships.joined_at,
                roles.id AS role_id,
                roles.name AS role_name,
                roles.is_system AS role_is_system
            FROM memberships
            LEFT JOIN membership_roles
                ON membership_roles.membership_id = memberships.id
            LEFT JOIN roles
                ON roles.id = membership_roles.role_id
            WHERE memberships.company_id = $1
                AND memberships.id = $2
                AND memberships.is_active
            LIMIT 1
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(membership_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load team member: {error}")))?;

        Ok(row.map(TeamMember::from))
    }

    async fn assign_role_to_membership(
        &self,
        company_id: CompanyId,
        membership_id: Uuid,
        role_id: Uuid,
    ) -> AppResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        let membership_exists = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM memberships
            WHERE company_id = $1
                AND id = $2
                AND is_active
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(membership_id)
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve membership: {error}")))?;

        if membership_exists == 0 {
            return Err(AppError::NotFound(format!(
                "member '{membership_id}' was not found"
            )));
        }

        let role_exists = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM roles
            WHERE company_id = $1
                AND id = $2
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(role_id)
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve role: {error}")))?;

        if role_exists == 0 {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        }

        // Members hold exactly one role; clear before inserting.
        sqlx::query("DELETE FROM membership_roles WHERE membership_id = $1")
            .bind(membership_id)
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to clear role assignments: {error}"))
            })?;

        sqlx::query(
            r#"
            INSERT INTO membership_roles (membership_id, role_id)
            VALUES ($1, $2)
            ON CONFLICT (membership_id, role_id) DO NOTHING
            "#,
        )
        .bind(membership_id)
        .bind(role_id)
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to assign role: {error}")))?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }

    async fn deactivate_membership(
        &self,
        company_id: CompanyId,
        membership_id: Uuid,
    ) -> AppResult<()> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE memberships
            SET is_active = false
            WHERE company_id = $1
                AND id = $2
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(membership_id)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to deactivate membership: {error}"))
        })?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "member '{membership_id}' was not found"
            )));
        }

        Ok(())
    }
}

fn aggregate_roles(rows: Vec<RoleRow>, company_id: CompanyId) -> AppResult<Vec<RoleDefinition>> {
    let mut by_id: HashMap<Uuid, RoleDefinition> = HashMap::new();

    for row in rows {
        let role = by_id.entry(row.role_id).or_insert_with(|| RoleDefinition {
            role_id: row.role_id,
            name: row.role_name.clone(),
            description: row.description.clone(),
            is_system: row.is_system,
            permissions: Vec::new(),
        });

        if let Some(permission_value) = row.permission {
            let permission = Permission::from_str(permission_value.as_str()).map_err(|error| {
                AppError::Internal(format!(
                    "invalid stored permission '{}' for company '{}': {error}",
                    permission_value, company_id
                ))
            })?;

            role.permissions.push(permission);
        }
    }

    let mut roles = by_id.into_values().collect::<Vec<_>>();
    roles.sort_by(|left, right| left.name.cmp(&right.name));
    Ok(roles)
}

async fn replace_role_grants(
    transaction: &mut Transaction<'_, Postgres>,
    role_id: Uuid,
    permissions: &[Permission],
) -> AppResult<()> {
    for permission in permissions {
        sqlx::query(
            r#"
            INSERT INTO role_grants (role_id, permission)
            VALUES ($1, $2)
            ON CONFLICT (role_id, permission) DO NOTHING
            "#,
        )
        .bind(role_id)
        .bind(permission.as_str())
        .execute(&mut **transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to persist role grants: {error}")))?;
    }

    Ok(())
}

fn dedupe_permissions(permissions: Vec<Permission>) -> Vec<Permission> {
    let mut deduped = Vec::with_capacity(permissions.len());
    for permission in permissions {
        if !deduped.contains(&permission) {
            deduped.push(permission);
        }
    }

    deduped
}

fn map_role_conflict(error: sqlx::Error, role_name: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!("role '{role_name}' already exists"));
    }

    AppError::Internal(format!("failed to persist role: {error}"))
}

/// Ensures the company's system owner role exists with full baseline
/// grants and is assigned to the membership.
pub(crate) async fn grant_owner_access(
    transaction: &mut Transaction<'_, Postgres>,
    company_id: CompanyId,
    membership_id: Uuid,
) -> AppResult<()> {
    let role_id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO roles (company_id, name, description, is_system)
        VALUES ($1, 'Owner', 'Full access to the company', true)
        ON CONFLICT (company_id, name) DO UPDATE
        SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(company_id.as_uuid())
    .fetch_one(&mut **transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to ensure owner role: {error}")))?;

    for permission in Permission::all() {
        sqlx::query(
            r#"
            INSERT INTO role_grants (role_id, permission)
            VALUES ($1, $2)
            ON CONFLICT (role_id, permission) DO NOTHING
            "#,
        )
        .bind(role_id)
        .bind(permission.as_str())
        .execute(&mut **transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to ensure owner grant: {error}")))?;
    }

    sqlx::query(
        r#"
        INSERT INTO membership_roles (membership_id, role_id)
        VALUES ($1, $2)
        ON CONFLICT (membership_id, role_id) DO NOTHING
        "#,
    )
    .bind(membership_id)
    .bind(role_id)
    .execute(&mut **transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to assign owner role: {error}")))?;

    Ok(())
}

/// Seeds the permission catalog table from the compiled-in permission
/// set. Safe to re-run on every startup.
pub async fn seed_permission_catalog(pool: &PgPool) -> AppResult<()> {
    for permission in Permission::all() {
        sqlx::query(
            r#"
            INSERT INTO permissions (key, description, module_label)
            VALUES ($1, $2, $3)
            ON CONFLICT (key) DO NOTHING
            "#,
        )
        .bind(permission.as_str())
        .bind(permission.description())
        .bind(permission.module_label())
        .execute(pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to seed permission catalog: {error}"))
        })?;
    }

    Ok(())
}
