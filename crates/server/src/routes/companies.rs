use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use models::company;
use service::auth::domain::Claims;
use service::company::domain::{NewCompany, UpdateCompany};
use uuid::Uuid;

use super::{parse_query, PageBody};
use crate::errors::{ApiJson, ApiPath, JsonApiError};
use crate::state::ServerState;

#[utoipa::path(get, path = "/api/companies", tag = "companies", params(crate::openapi::ODataParams),
    responses((status = 200, description = "Page of companies"), (status = 400, description = "Invalid query")))]
pub async fn list(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<PageBody, JsonApiError> {
    let query = parse_query(&state, pairs)?;
    Ok(PageBody(state.companies.list(&query, claims.uid).await?))
}

#[utoipa::path(get, path = "/api/companies/{id}", tag = "companies", params(("id" = Uuid, Path, description = "Company id")),
    responses((status = 200, description = "Company"), (status = 404, description = "Not Found")))]
pub async fn get(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<company::Model>, JsonApiError> {
    Ok(Json(state.companies.get(id).await?))
}

#[utoipa::path(post, path = "/api/companies", tag = "companies", request_body = crate::openapi::CompanyDoc,
    responses((status = 201, description = "Created"), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")))]
pub async fn create(
    State(state): State<ServerState>,
    ApiJson(input): ApiJson<NewCompany>,
) -> Result<(StatusCode, Json<company::Model>), JsonApiError> {
    Ok((StatusCode::CREATED, Json(state.companies.create(input).await?)))
}

#[utoipa::path(put, path = "/api/companies/{id}", tag = "companies", params(("id" = Uuid, Path, description = "Company id")),
    request_body = crate::openapi::CompanyDoc,
    responses((status = 200, description = "Updated"), (status = 404, description = "Not Found"), (status = 409, description = "Conflict")))]
pub async fn update(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<UpdateCompany>,
) -> Result<Json<company::Model>, JsonApiError> {
    Ok(Json(state.companies.update(id, input).await?))
}

#[utoipa::path(delete, path = "/api/companies/{id}", tag = "companies", params(("id" = Uuid, Path, description = "Company id")),
    responses((status = 204, description = "Deleted"), (status = 409, description = "Still referenced by products")))]
pub async fn delete(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<StatusCode, JsonApiError> {
    state.companies.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(post, path = "/api/companies/{id}/restore", tag = "companies", params(("id" = Uuid, Path, description = "Company id")),
    responses((status = 200, description = "Restored"), (status = 409, description = "Not deleted")))]
pub async fn restore(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<company::Model>, JsonApiError> {
    Ok(Json(state.companies.restore(id).await?))
}
