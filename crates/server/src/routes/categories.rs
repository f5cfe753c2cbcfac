use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use models::category;
use service::auth::domain::Claims;
use service::category::domain::{NewCategory, UpdateCategory};
use uuid::Uuid;

use super::{parse_query, PageBody};
use crate::errors::{ApiJson, ApiPath, JsonApiError};
use crate::state::ServerState;

#[utoipa::path(get, path = "/api/categories", tag = "categories", params(crate::openapi::ODataParams),
    responses((status = 200, description = "Page of categories"), (status = 400, description = "Invalid query")))]
pub async fn list(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<PageBody, JsonApiError> {
    let query = parse_query(&state, pairs)?;
    Ok(PageBody(state.categories.list(&query, claims.uid).await?))
}

#[utoipa::path(get, path = "/api/categories/{id}", tag = "categories", params(("id" = Uuid, Path, description = "Category id")),
    responses((status = 200, description = "Category"), (status = 404, description = "Not Found")))]
pub async fn get(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<category::Model>, JsonApiError> {
    Ok(Json(state.categories.get(id).await?))
}

#[utoipa::path(post, path = "/api/categories", tag = "categories", request_body = crate::openapi::CategoryDoc,
    responses((status = 201, description = "Created"), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")))]
pub async fn create(
    State(state): State<ServerState>,
    ApiJson(input): ApiJson<NewCategory>,
) -> Result<(StatusCode, Json<category::Model>), JsonApiError> {
    Ok((StatusCode::CREATED, Json(state.categories.create(input).await?)))
}

#[utoipa::path(put, path = "/api/categories/{id}", tag = "categories", params(("id" = Uuid, Path, description = "Category id")),
    request_body = crate::openapi::CategoryDoc,
    responses((status = 200, description = "Updated"), (status = 404, description = "Not Found"), (status = 409, description = "Conflict")))]
pub async fn update(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<UpdateCategory>,
) -> Result<Json<category::Model>, JsonApiError> {
    Ok(Json(state.categories.update(id, input).await?))
}

#[utoipa::path(delete, path = "/api/categories/{id}", tag = "categories", params(("id" = Uuid, Path, description = "Category id")),
    responses((status = 204, description = "Deleted"), (status = 409, description = "Still referenced by products")))]
pub async fn delete(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<StatusCode, JsonApiError> {
    state.categories.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(post, path = "/api/categories/{id}/restore", tag = "categories", params(("id" = Uuid, Path, description = "Category id")),
    responses((status = 200, description = "Restored"), (status = 409, description = "Not deleted")))]
pub async fn restore(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<category::Model>, JsonApiError> {
    Ok(Json(state.categories.restore(id).await?))
}
