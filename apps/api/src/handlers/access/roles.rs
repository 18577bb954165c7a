use super::*;

use ventra_application::{CreateRoleInput, UpdateRoleInput};

pub async fn list_roles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(company_id): Path<Uuid>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .access_service
        .list_roles(&user, CompanyId::from_uuid(company_id))
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(company_id): Path<Uuid>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let role = state
        .access_service
        .create_role(
            &user,
            CompanyId::from_uuid(company_id),
            CreateRoleInput {
                name: payload.name,
                description: payload.description,
                permissions: parse_permission_keys(&payload.permissions),
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}

pub async fn get_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((company_id, role_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<RoleResponse>> {
    let role = state
        .access_service
        .get_role(&user, CompanyId::from_uuid(company_id), role_id)
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn update_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((company_id, role_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateRoleRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let role = state
        .access_service
        .update_role(
            &user,
            CompanyId::from_uuid(company_id),
            role_id,
            UpdateRoleInput {
                name: payload.name,
                description: payload.description,
                permissions: payload
                    .permissions
                    .as_deref()
                    .map(parse_permission_keys),
            },
        )
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn delete_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path((company_id, role_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state
        .access_service
        .delete_role(&user, CompanyId::from_uuid(company_id), role_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
