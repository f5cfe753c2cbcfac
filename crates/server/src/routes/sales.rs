use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use models::{sale, sale_item};
use service::auth::domain::Claims;
use service::sale::domain::{CancelInput, NewSaleInput, SaleDetail};
use uuid::Uuid;

use super::{parse_query, PageBody};
use crate::errors::{ApiJson, ApiPath, JsonApiError};
use crate::state::ServerState;

#[utoipa::path(get, path = "/api/sales", tag = "sales", params(crate::openapi::ODataParams),
    responses((status = 200, description = "Page of sales"), (status = 400, description = "Invalid query")))]
pub async fn list(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<PageBody, JsonApiError> {
    let query = parse_query(&state, pairs)?;
    Ok(PageBody(state.sales.list(&query, claims.uid).await?))
}

#[utoipa::path(get, path = "/api/sales/{id}", tag = "sales", params(("id" = Uuid, Path, description = "Sale id")),
    responses((status = 200, description = "Sale with items"), (status = 404, description = "Not Found")))]
pub async fn get(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<SaleDetail>, JsonApiError> {
    Ok(Json(state.sales.get(id).await?))
}

#[utoipa::path(get, path = "/api/sales/{id}/items", tag = "sales", params(("id" = Uuid, Path, description = "Sale id")),
    responses((status = 200, description = "Sale items"), (status = 404, description = "Not Found")))]
pub async fn items(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Vec<sale_item::Model>>, JsonApiError> {
    Ok(Json(state.sales.items(id).await?))
}

#[utoipa::path(post, path = "/api/sales", tag = "sales", request_body = crate::openapi::SaleDoc,
    responses((status = 201, description = "Created as pending, stock reserved"), (status = 400, description = "Bad Request"), (status = 409, description = "Insufficient stock")))]
pub async fn create(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    ApiJson(input): ApiJson<NewSaleInput>,
) -> Result<(StatusCode, Json<SaleDetail>), JsonApiError> {
    Ok((StatusCode::CREATED, Json(state.sales.create(input, claims.uid).await?)))
}

#[utoipa::path(post, path = "/api/sales/{id}/confirm", tag = "sales", params(("id" = Uuid, Path, description = "Sale id")),
    responses((status = 200, description = "Confirmed"), (status = 409, description = "Invalid status transition")))]
pub async fn confirm(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<SaleDetail>, JsonApiError> {
    Ok(Json(state.sales.confirm(id).await?))
}

#[utoipa::path(post, path = "/api/sales/{id}/complete", tag = "sales", params(("id" = Uuid, Path, description = "Sale id")),
    responses((status = 200, description = "Completed, stock committed"), (status = 409, description = "Invalid status transition")))]
pub async fn complete(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<SaleDetail>, JsonApiError> {
    Ok(Json(state.sales.complete(id).await?))
}

/// The body is optional; `{"reason": "..."}` records why.
#[utoipa::path(post, path = "/api/sales/{id}/cancel", tag = "sales", params(("id" = Uuid, Path, description = "Sale id")),
    request_body(content = crate::openapi::CancelDoc, description = "Optional reason"),
    responses((status = 200, description = "Cancelled, stock released"), (status = 409, description = "Invalid status transition")))]
pub async fn cancel(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    input: Option<ApiJson<CancelInput>>,
) -> Result<Json<SaleDetail>, JsonApiError> {
    let input = input.map(|ApiJson(i)| i).unwrap_or_default();
    Ok(Json(state.sales.cancel(id, input).await?))
}

#[utoipa::path(delete, path = "/api/sales/{id}", tag = "sales", params(("id" = Uuid, Path, description = "Sale id")),
    responses((status = 204, description = "Deleted"), (status = 409, description = "Sale is still open")))]
pub async fn delete(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<StatusCode, JsonApiError> {
    state.sales.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(post, path = "/api/sales/{id}/restore", tag = "sales", params(("id" = Uuid, Path, description = "Sale id")),
    responses((status = 200, description = "Restored"), (status = 409, description = "Not deleted")))]
pub async fn restore(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<sale::Model>, JsonApiError> {
    Ok(Json(state.sales.restore(id).await?))
}
