use axum::extract::State;
use axum::{Extension, Json};
use service::auth::domain::{AuthUser, ChangeRoleInput, Claims};
use uuid::Uuid;

use crate::errors::{ApiJson, ApiPath, JsonApiError};
use crate::state::ServerState;

#[utoipa::path(get, path = "/api/users", tag = "users",
    responses((status = 200, description = "All users"), (status = 403, description = "Forbidden")))]
pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<AuthUser>>, JsonApiError> {
    Ok(Json(state.auth.list_users().await?))
}

#[utoipa::path(put, path = "/api/users/{id}/role", tag = "users", params(("id" = Uuid, Path, description = "User id")),
    request_body = crate::openapi::ChangeRoleDoc,
    responses((status = 200, description = "Role changed"), (status = 403, description = "Forbidden"), (status = 404, description = "Not Found")))]
pub async fn change_role(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(input): ApiJson<ChangeRoleInput>,
) -> Result<Json<AuthUser>, JsonApiError> {
    Ok(Json(state.auth.change_role(claims.uid, id, input.role).await?))
}
