use super::*;

pub async fn list_team_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(company_id): Path<Uuid>,
) -> ApiResult<Json<Vec<TeamMemberResponse>>> {
    let members = state
        .access_service
        .list_team_members(&user, CompanyId::from_uuid(company_id))
        .await?
        .into_iter()
        .map(TeamMemberResponse::from)
        .collect();

    Ok(Json(members))
}

pub async fn change_member_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((company_id, membership_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ChangeMemberRoleRequest>,
) -> ApiResult<Json<TeamMemberResponse>> {
    let member = state
        .access_service
        .change_member_role(
            &user,
            CompanyId::from_uuid(company_id),
            membership_id,
            payload.role_id,
        )
        .await?;

    Ok(Json(TeamMemberResponse::from(member)))
}

pub async fn remove_member_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((company_id, membership_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state
        .access_service
        .remove_member(&user, CompanyId::from_uuid(company_id), membership_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
