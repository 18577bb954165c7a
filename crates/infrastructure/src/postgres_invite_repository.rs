use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use ventra_application::{AcceptedInvite, InviteRecord, InviteRepository};
use ventra_core::{AppError, AppResult, CompanyId, UserIdentity};
use ventra_domain::InviteStatus;


/// PostgreSQL-backed invitation repository.
///
/// Lifecycle transitions lock the invite row with `SELECT ... FOR
/// UPDATE` so concurrent responders serialize on the status check.
#[derive(Clone)]
pub struct PostgresInviteRepository {
    pool: PgPool,
}

impl PostgresInviteRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct InviteRow {
    id: Uuid,
    company_id: Uuid,
    company_name: String,
    inviter_subject: String,
    invitee_email: String,
    invitee_subject: Option<String>,
    role_id: Uuid,
    role_name: String,
    status: String,
    message: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    responded_at: Option<DateTime<Utc>>,
}

impl TryFrom<InviteRow> for InviteRecord {
    type Error = AppError;

    fn try_from(row: InviteRow) -> Result<Self, Self::Error> {
        let status = InviteStatus::from_str(row.status.as_str()).map_err(|error| {
            AppError::Internal(format!(
                "invalid stored invite status '{}': {error}",
                row.status
            ))
        })?;

        Ok(Self {
            invite_id: row.id,
            company_id: CompanyId::from_uuid(row.company_id),
            company_name: row.company_name,
            inviter_subject: row.inviter_subject,
            invitee_email: row.invitee_email,
            invitee_subject: row.invitee_subject,
            role_id: row.role_id,
            role_name: row.role_name,
            status,
            message: row.message,
            created_at: row.created_at,
            expires_at: row.expires_at,
            responded_at: row.responded_at,
        })
    }
}

const INVITE_SELECT: &str = r#"
    SELECT
        invites.id,
        invites.company_id,
        companies.name AS company_name,
        invites.inviter_subject,
        invites.invitee_email,
        invites.invitee_subject,
        invites.role_id,
        roles.name AS role_name,
        invites.status,
        invites.message,
        invites.created_at,
        invites.expires_at,
        invites.responded_at
    FROM invites
    INNER JOIN companies
        ON companies.id = invites.company_id
    INNER JOIN roles
        ON roles.id = invites.role_id
"#;

#[derive(Debug, FromRow)]
struct LockedInviteRow {
    company_id: Uuid,
    invitee_email: String,
    role_id: Uuid,
    status: String,
    expires_at: DateTime<Utc>,
}

#[async_trait]
impl InviteRepository for PostgresInviteRepository {
    async fn create_invite(
        &self,
        company_id: CompanyId,
        inviter_subject: &str,
        invitee_email: &str,
        role_id: Uuid,
        message: &str,
        expires_at: DateTime<Utc>,
    ) -> AppResult<InviteRecord> {
        let invite_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO invites (
                company_id,
                inviter_subject,
                invitee_email,
                role_id,
                status,
                message,
                expires_at
            )
            VALUES ($1, $2, $3, $4, 'pending', $5, $6)
            RETURNING id
            "#,
        )
        .bind(company_id.as_uuid())
        .bind(inviter_subject)
        .bind(invitee_email)
        .bind(role_id)
        .bind(message)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| map_invite_conflict(error, invitee_email))?;

        let invite = self.find_invite(invite_id).await?;
        invite.ok_or_else(|| {
            AppError::Internal(format!("invite '{invite_id}' disappeared after insert"))
        })
    }

    async fn find_invite(&self, invite_id: Uuid) -> AppResult<Option<InviteRecord>> {
        let query = format!("{INVITE_SELECT} WHERE invites.id = $1");
        let row = sqlx::query_as::<_, InviteRow>(query.as_str())
            .bind(invite_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to load invite: {error}")))?;

        row.map(InviteRecord::try_from).transpose()
    }

    async fn list_company_invites(&self, company_id: CompanyId) -> AppResult<Vec<InviteRecord>> {
        let query = format!(
            "{INVITE_SELECT} WHERE invites.company_id = $1 ORDER BY invites.created_at DESC"
        );
        let rows = sqlx::query_as::<_, InviteRow>(query.as_str())
            .bind(company_id.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to list company invites: {error}"))
            })?;

        rows.into_iter().map(InviteRecord::try_from).collect()
    }

    async fn list_pending_invites_for_email(
        &self,
        email: &str,
    ) -> AppResult<Vec<InviteRecord>> {
        let query = format!(
            "{INVITE_SELECT} WHERE invites.invitee_email = $1 AND invites.status = 'pending' \
             ORDER BY invites.created_at DESC"
        );
        let rows = sqlx::query_as::<_, InviteRow>(query.as_str())
            .bind(email)
            .fetch_all(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to list received invites: {error}"))
            })?;

        rows.into_iter().map(InviteRecord::try_from).collect()
    }

    async fn accept_invite(
        &self,
        invite_id: Uuid,
        identity: &UserIdentity,
        now: DateTime<Utc>,
    ) -> AppResult<AcceptedInvite> {
        let transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        let (mut transaction, invite) =
            lock_pending_invite(transaction, invite_id, identity, now, true, "accepted").await?;
        let company_id = CompanyId::from_uuid(invite.company_id);

        let already_member = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM memberships
            WHERE company_id = $1
                AND subject = $2
                AND is_active
            "#,
        )
        .bind(invite.company_id)
        .bind(identity.subject())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve membership: {error}")))?;

        if already_member > 0 {
            return Err(AppError::Conflict(
                "you are already a member of this company".to_owned(),
            ));
        }

        let membership_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO memberships (company_id, subject, display_name, email)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (company_id, subject) DO UPDATE
            SET is_active = true,
                display_name = EXCLUDED.display_name,
                email = EXCLUDED.email
            RETURNING id
            "#,
        )
        .bind(invite.company_id)
        .bind(identity.subject())
        .bind(identity.display_name())
        .bind(invite.invitee_email.as_str())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create membership: {error}")))?;

        // A reactivated membership may carry a stale assignment.
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
        .bind(invite.role_id)
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to assign invite role: {error}")))?;

        sqlx::query(
            r#"
            UPDATE invites
            SET status = 'accepted',
                invitee_subject = $2,
                responded_at = $3
            WHERE id = $1
            "#,
        )
        .bind(invite_id)
        .bind(identity.subject())
        .bind(now)
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to record acceptance: {error}")))?;

        let company_name = sqlx::query_scalar::<_, String>(
            r#"
            SELECT name
            FROM companies
            WHERE id = $1
            "#,
        )
        .bind(invite.company_id)
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load company name: {error}")))?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(AcceptedInvite {
            company_id,
            company_name,
            membership_id,
        })
    }

    async fn decline_invite(
        &self,
        invite_id: Uuid,
        identity: &UserIdentity,
        now: DateTime<Utc>,
    ) -> AppResult<InviteRecord> {
        let transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        let (mut transaction, _invite) =
            lock_pending_invite(transaction, invite_id, identity, now, false, "declined").await?;

        sqlx::query(
            r#"
            UPDATE invites
            SET status = 'declined',
                invitee_subject = $2,
                responded_at = $3
            WHERE id = $1
            "#,
        )
        .bind(invite_id)
        .bind(identity.subject())
        .bind(now)
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to record decline: {error}")))?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        self.find_invite(invite_id).await?.ok_or_else(|| {
            AppError::Internal(format!("invite '{invite_id}' disappeared during decline"))
        })
    }

    async fn cancel_invite(&self, invite_id: Uuid) -> AppResult<InviteRecord> {
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to begin transaction: {error}"))
        })?;

        let status = sqlx::query_scalar::<_, String>(
            r#"
            SELECT status
            FROM invites
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(invite_id)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to lock invite: {error}")))?
        .ok_or_else(|| AppError::NotFound(format!("invite '{invite_id}' was not found")))?;

        if status != "pending" {
            return Err(AppError::InvalidOperation(
                "only pending invites can be cancelled".to_owned(),
            ));
        }

        sqlx::query(
            r#"
            UPDATE invites
            SET status = 'cancelled'
            WHERE id = $1
            "#,
        )
        .bind(invite_id)
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to cancel invite: {error}")))?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        self.find_invite(invite_id).await?.ok_or_else(|| {
            AppError::Internal(format!("invite '{invite_id}' disappeared during cancel"))
        })
    }
}

/// Locks the invite row and verifies the caller may respond to it:
/// the invite must be addressed to the caller's email and still be
/// pending. Expiry gates only membership-granting transitions, so a
/// decline of a lapsed invite still goes through; when expiry is
/// enforced, a pending invite past its expiry is persisted as expired
/// in its own committed transaction before the error surfaces. On any
/// other error the transaction rolls back.
async fn lock_pending_invite(
    mut transaction: Transaction<'static, Postgres>,
    invite_id: Uuid,
    identity: &UserIdentity,
    now: DateTime<Utc>,
    enforce_expiry: bool,
    verb: &str,
) -> AppResult<(Transaction<'static, Postgres>, LockedInviteRow)> {
    let invite = sqlx::query_as::<_, LockedInviteRow>(
        r#"
        SELECT company_id, invitee_email, role_id, status, expires_at
        FROM invites
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(invite_id)
    .fetch_optional(&mut *transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to lock invite: {error}")))?
    .ok_or_else(|| AppError::NotFound(format!("invite '{invite_id}' was not found")))?;

    if invite.invitee_email != identity.email().trim().to_lowercase() {
        return Err(AppError::NotFound(format!(
            "invite '{invite_id}' was not found"
        )));
    }

    if invite.status != "pending" {
        return Err(AppError::InvalidOperation(format!(
            "this invite has already been resolved and cannot be {verb}"
        )));
    }

    if enforce_expiry && now > invite.expires_at {
        sqlx::query(
            r#"
            UPDATE invites
            SET status = 'expired'
            WHERE id = $1
            "#,
        )
        .bind(invite_id)
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to expire invite: {error}")))?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        return Err(AppError::InvalidOperation(
            "this invite has expired".to_owned(),
        ));
    }

    Ok((transaction, invite))
}

fn map_invite_conflict(error: sqlx::Error, invitee_email: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict(format!(
            "a pending invite for '{invitee_email}' already exists"
        ));
    }

    AppError::Internal(format!("failed to create invite: {error}"))
}
