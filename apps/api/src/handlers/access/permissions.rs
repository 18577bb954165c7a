use super::*;

pub async fn permission_catalog_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(company_id): Path<Uuid>,
) -> ApiResult<Json<Vec<PermissionCatalogEntryResponse>>> {
    let catalog = state
        .access_service
        .list_permission_catalog(&user, CompanyId::from_uuid(company_id))
        .await?
        .into_iter()
        .map(PermissionCatalogEntryResponse::from)
        .collect();

    Ok(Json(catalog))
}

pub async fn my_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(company_id): Path<Uuid>,
) -> ApiResult<Json<MyPermissionsResponse>> {
    let permissions = state
        .access_service
        .my_permissions(&user, CompanyId::from_uuid(company_id))
        .await?;

    Ok(Json(MyPermissionsResponse::from(permissions)))
}
