use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use uuid::Uuid;
use ventra_application::CreateInviteInput;
use ventra_core::{CompanyId, UserIdentity};

use crate::dto::{AcceptedInviteResponse, CreateInviteRequest, InviteResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn create_invite_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(company_id): Path<Uuid>,
    Json(payload): Json<CreateInviteRequest>,
) -> ApiResult<(StatusCode, Json<InviteResponse>)> {
    let invite = state
        .invite_service
        .create_invite(
            &user,
            CompanyId::from_uuid(company_id),
            CreateInviteInput {
                invitee_email: payload.invitee_email,
                role_id: payload.role_id,
                message: payload.message,
                expires_at: payload.expires_at,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(InviteResponse::from(invite))))
}

pub async fn list_sent_invites_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(company_id): Path<Uuid>,
) -> ApiResult<Json<Vec<InviteResponse>>> {
    let invites = state
        .invite_service
        .list_sent_invites(&user, CompanyId::from_uuid(company_id))
        .await?
        .into_iter()
        .map(InviteResponse::from)
        .collect();

    Ok(Json(invites))
}

pub async fn list_received_invites_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<InviteResponse>>> {
    let invites = state
        .invite_service
        .list_received_invites(&user)
        .await?
        .into_iter()
        .map(InviteResponse::from)
        .collect();

    Ok(Json(invites))
}

pub async fn accept_invite_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(invite_id): Path<Uuid>,
) -> ApiResult<Json<AcceptedInviteResponse>> {
    let accepted = state.invite_service.accept_invite(&user, invite_id).await?;

    Ok(Json(AcceptedInviteResponse::from(accepted)))
}

pub async fn decline_invite_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(invite_id): Path<Uuid>,
) -> ApiResult<Json<InviteResponse>> {
    let invite = state.invite_service.decline_invite(&user, invite_id).await?;

    Ok(Json(InviteResponse::from(invite)))
}

pub async fn cancel_invite_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(invite_id): Path<Uuid>,
) -> ApiResult<Json<InviteResponse>> {
    let invite = state.invite_service.cancel_invite(&user, invite_id).await?;

    Ok(Json(InviteResponse::from(invite)))
}
