use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use models::tax;
use service::auth::domain::Claims;
use service::tax::domain::{NewTax, UpdateTax};
use uuid::Uuid;

use super::{parse_query, PageBody};
use crate::errors::{ApiJson, ApiPath, JsonApiError};
use crate::state::ServerState;

#[utoipa::path(get, path = "/api/taxes", tag = "taxes", params(crate::openapi::ODataParams),
    responses((status = 200, description = "Page of taxes"), (status = 400, description = "Invalid query")))]
pub async fn list(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<PageBody, JsonApiError> {
    let query = parse_query(&state, pairs)?;
    Ok(PageBody(state.taxes.list(&query, claims.uid).await?))
}

#[utoipa::path(get, path = "/api/taxes/{id}", tag = "taxes", params(("id" = Uuid, Path, description = "Tax id")),
    responses((status = 200, description = "Tax"), (status = 404, description = "Not Found")))]
pub async fn get(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<tax::Model>, JsonApiError> {
    Ok(Json(state.taxes.get(id).await?))
}

#[utoipa::path(post, path = "/api/taxes", tag = "taxes", request_body = crate::openapi::TaxDoc,
    responses((status = 201, description = "Created"), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")))]
pub async fn create(
    State(state): State<ServerState>,
    ApiJson(input): ApiJson<NewTax>,
) -> Result<(StatusCode, Json<tax::Model>), JsonApiError> {
    Ok((StatusCode::CREATED, Json(state.taxes.create(input).await?)))
}

#[utoipa::path(put, path = "/api/taxes/{id}", tag = "taxes", params(("id" = Uuid, Path, description = "Tax id")),
    request_body = crate::openapi::TaxDoc,
    responses((status = 200, description = "Updated"), (status = 404, description = "Not Found"), (status = 409, description = "Conflict")))]
pub async fn update(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<UpdateTax>,
) -> Result<Json<tax::Model>, JsonApiError> {
    Ok(Json(state.taxes.update(id, input).await?))
}

#[utoipa::path(delete, path = "/api/taxes/{id}", tag = "taxes", params(("id" = Uuid, Path, description = "Tax id")),
    responses((status = 204, description = "Deleted"), (status = 409, description = "Still referenced by products")))]
pub async fn delete(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<StatusCode, JsonApiError> {
    state.taxes.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(post, path = "/api/taxes/{id}/restore", tag = "taxes", params(("id" = Uuid, Path, description = "Tax id")),
    responses((status = 200, description = "Restored"), (status = 409, description = "Not deleted")))]
pub async fn restore(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<tax::Model>, JsonApiError> {
    Ok(Json(state.taxes.restore(id).await?))
}
