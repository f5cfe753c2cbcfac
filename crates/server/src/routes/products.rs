use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use models::product;
use service::auth::domain::Claims;
use service::product::domain::{NewProduct, StockAdjustment, StockQuantity, UpdateProduct};
use uuid::Uuid;

use super::{parse_query, PageBody};
use crate::errors::{ApiJson, ApiPath, JsonApiError};
use crate::state::ServerState;

#[utoipa::path(get, path = "/api/products", tag = "products", params(crate::openapi::ODataParams),
    responses((status = 200, description = "Page of products"), (status = 400, description = "Invalid query")))]
pub async fn list(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<PageBody, JsonApiError> {
    let query = parse_query(&state, pairs)?;
    Ok(PageBody(state.products.list(&query, claims.uid).await?))
}

#[utoipa::path(get, path = "/api/products/{id}", tag = "products", params(("id" = Uuid, Path, description = "Product id")),
    responses((status = 200, description = "Product"), (status = 404, description = "Not Found")))]
pub async fn get(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<product::Model>, JsonApiError> {
    Ok(Json(state.products.get(id).await?))
}

#[utoipa::path(post, path = "/api/products", tag = "products", request_body = crate::openapi::ProductDoc,
    responses((status = 201, description = "Created"), (status = 400, description = "Bad Request"), (status = 409, description = "Duplicate SKU")))]
pub async fn create(
    State(state): State<ServerState>,
    ApiJson(input): ApiJson<NewProduct>,
) -> Result<(StatusCode, Json<product::Model>), JsonApiError> {
    Ok((StatusCode::CREATED, Json(state.products.create(input).await?)))
}

#[utoipa::path(put, path = "/api/products/{id}", tag = "products", params(("id" = Uuid, Path, description = "Product id")),
    request_body = crate::openapi::ProductDoc,
    responses((status = 200, description = "Updated"), (status = 404, description = "Not Found"), (status = 409, description = "Conflict")))]
pub async fn update(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<UpdateProduct>,
) -> Result<Json<product::Model>, JsonApiError> {
    Ok(Json(state.products.update(id, input).await?))
}

#[utoipa::path(delete, path = "/api/products/{id}", tag = "products", params(("id" = Uuid, Path, description = "Product id")),
    responses((status = 204, description = "Deleted"), (status = 409, description = "Stock is reserved")))]
pub async fn delete(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<StatusCode, JsonApiError> {
    state.products.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(post, path = "/api/products/{id}/restore", tag = "products", params(("id" = Uuid, Path, description = "Product id")),
    responses((status = 200, description = "Restored"), (status = 400, description = "References are gone"), (status = 409, description = "Not deleted")))]
pub async fn restore(State(state): State<ServerState>, ApiPath(id): ApiPath<Uuid>) -> Result<Json<product::Model>, JsonApiError> {
    Ok(Json(state.products.restore(id).await?))
}

#[utoipa::path(post, path = "/api/products/{id}/stock", tag = "products", params(("id" = Uuid, Path, description = "Product id")),
    request_body = crate::openapi::StockAdjustmentDoc,
    responses((status = 200, description = "Stock adjusted"), (status = 409, description = "Would drop below reserved stock")))]
pub async fn adjust_stock(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<StockAdjustment>,
) -> Result<Json<product::Model>, JsonApiError> {
    Ok(Json(state.products.adjust_stock(id, input.delta).await?))
}

#[utoipa::path(post, path = "/api/products/{id}/reserve", tag = "products", params(("id" = Uuid, Path, description = "Product id")),
    request_body = crate::openapi::StockQuantityDoc,
    responses((status = 200, description = "Reserved"), (status = 409, description = "Insufficient stock or inactive product")))]
pub async fn reserve(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<StockQuantity>,
) -> Result<Json<product::Model>, JsonApiError> {
    Ok(Json(state.products.reserve(id, input.quantity).await?))
}

#[utoipa::path(post, path = "/api/products/{id}/release", tag = "products", params(("id" = Uuid, Path, description = "Product id")),
    request_body = crate::openapi::StockQuantityDoc,
    responses((status = 200, description = "Released"), (status = 409, description = "More than reserved")))]
pub async fn release(
    State(state): State<ServerState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<StockQuantity>,
) -> Result<Json<product::Model>, JsonApiError> {
    Ok(Json(state.products.release(id, input.quantity).await?))
}
