use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use ventra_application::CreateCompanyInput;
use ventra_core::UserIdentity;

use crate::dto::{CompanyResponse, CreateCompanyRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn create_company_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreateCompanyRequest>,
) -> ApiResult<(StatusCode, Json<CompanyResponse>)> {
    let company = state
        .company_service
        .create_company(
            &user,
            CreateCompanyInput {
                name: payload.name,
                description: payload.description,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(CompanyResponse::from(company))))
}

pub async fn list_my_companies_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<CompanyResponse>>> {
    let companies = state
        .company_service
        .list_my_companies(&user)
        .await?
        .into_iter()
        .map(CompanyResponse::from)
        .collect();

    Ok(Json(companies))
}
