//! Authentication and authorization middleware.

use axum::extract::{MatchedPath, Request, State};
use axum::http::{header, Method};
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;
use service::auth::domain::Claims;
use service::authz::{self, Action, Resource};
use service::odata::EntitySet;

use crate::errors::JsonApiError;
use crate::state::ServerState;

pub const AUTH_COOKIE: &str = "auth_token";

/// Bearer header first, `auth_token` cookie as fallback.
fn extract_token(req: &Request) -> Result<String, JsonApiError> {
    if let Some(h) = req.headers().get(header::AUTHORIZATION) {
        let h = h.to_str().map_err(|_| JsonApiError::unauthorized("malformed Authorization header"))?;
        return match h.strip_prefix("Bearer ") {
            Some(t) if !t.trim().is_empty() => Ok(t.trim().to_string()),
            _ => {
                tracing::warn!(path = %req.uri().path(), "invalid Authorization format (expect Bearer)");
                Err(JsonApiError::unauthorized("expected a Bearer token"))
            }
        };
    }
    match CookieJar::from_headers(req.headers()).get(AUTH_COOKIE) {
        Some(c) if !c.value().is_empty() => Ok(c.value().to_string()),
        _ => {
            tracing::warn!(path = %req.uri().path(), "missing Authorization header and auth_token cookie");
            Err(JsonApiError::unauthorized("authentication required"))
        }
    }
}

/// Verify the JWT and expose its claims to later layers and handlers.
pub async fn require_bearer_token_state(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, JsonApiError> {
    if req.method() == Method::OPTIONS {
        return Ok(next.run(req).await);
    }
    let token = extract_token(&req)?;
    let claims = state.auth.verify_token(&token).map_err(|e| {
        tracing::warn!(path = %req.uri().path(), err = %e, "token validation failed");
        JsonApiError::unauthorized("invalid or expired token")
    })?;
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Map a matched route onto the protected resource and action.
/// `None` means any authenticated user may call it.
pub fn classify(method: &Method, route: &str, path: &str) -> Option<(Resource, Action)> {
    let segments: Vec<&str> = route.trim_matches('/').split('/').collect();
    match segments.as_slice() {
        ["odata", _] => {
            let set = path.rsplit('/').next().and_then(EntitySet::from_name)?;
            Some((resource_of(set), Action::Read))
        }
        ["api", "users"] => Some((Resource::Users, Action::Read)),
        ["api", "users", _, "role"] => Some((Resource::Users, Action::ChangeRole)),
        ["api", entity, rest @ ..] => {
            let resource = EntitySet::from_name(entity).map(resource_of)?;
            let action = match (rest, method.as_str()) {
                ([], "GET") | ([_], "GET") | ([_, "items"], _) => Action::Read,
                ([], "POST") => Action::Create,
                ([_], "PUT") => Action::Update,
                ([_], "DELETE") => Action::Delete,
                ([_, "restore"], _) => Action::Restore,
                ([_, "stock"], _) => Action::AdjustStock,
                ([_, "reserve" | "release"], _) => Action::Reserve,
                ([_, "confirm"], _) => Action::Confirm,
                ([_, "complete"], _) => Action::Complete,
                ([_, "cancel"], _) => Action::Cancel,
                _ => return None,
            };
            Some((resource, action))
        }
        _ => None,
    }
}

fn resource_of(set: EntitySet) -> Resource {
    match set {
        EntitySet::Categories => Resource::Categories,
        EntitySet::Companies => Resource::Companies,
        EntitySet::Taxes => Resource::Taxes,
        EntitySet::Products => Resource::Products,
        EntitySet::Sales => Resource::Sales,
    }
}

/// Apply the role policy to the route; runs after `require_bearer_token_state`.
pub async fn authorize(req: Request, next: Next) -> Result<Response, JsonApiError> {
    if req.method() == Method::OPTIONS {
        return Ok(next.run(req).await);
    }
    let claims = req
        .extensions()
        .get::<Claims>()
        .cloned()
        .ok_or_else(|| JsonApiError::unauthorized("authentication required"))?;
    let route = req.extensions().get::<MatchedPath>().map(|m| m.as_str().to_string());
    let path = req.uri().path().to_string();
    let target = route.as_deref().and_then(|r| classify(req.method(), r, &path));
    if let Some((resource, action)) = target {
        if !authz::is_allowed(claims.role, resource, action) {
            tracing::warn!(user_id = %claims.uid, role = %claims.role, ?resource, ?action, "access_denied");
            return Err(JsonApiError::forbidden(format!("role {} may not perform this action", claims.role)));
        }
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_crud_routes() {
        assert_eq!(classify(&Method::GET, "/api/products", "/api/products"), Some((Resource::Products, Action::Read)));
        assert_eq!(classify(&Method::POST, "/api/sales", "/api/sales"), Some((Resource::Sales, Action::Create)));
        assert_eq!(classify(&Method::PUT, "/api/taxes/:id", "/api/taxes/x"), Some((Resource::Taxes, Action::Update)));
        assert_eq!(
            classify(&Method::DELETE, "/api/companies/:id", "/api/companies/x"),
            Some((Resource::Companies, Action::Delete))
        );
        assert_eq!(
            classify(&Method::POST, "/api/categories/:id/restore", "/api/categories/x/restore"),
            Some((Resource::Categories, Action::Restore))
        );
    }

    #[test]
    fn classifies_operations() {
        let post = Method::POST;
        assert_eq!(classify(&post, "/api/products/:id/stock", ""), Some((Resource::Products, Action::AdjustStock)));
        assert_eq!(classify(&post, "/api/products/:id/release", ""), Some((Resource::Products, Action::Reserve)));
        assert_eq!(classify(&post, "/api/sales/:id/cancel", ""), Some((Resource::Sales, Action::Cancel)));
        assert_eq!(classify(&Method::GET, "/api/sales/:id/items", ""), Some((Resource::Sales, Action::Read)));
        assert_eq!(classify(&Method::PUT, "/api/users/:id/role", ""), Some((Resource::Users, Action::ChangeRole)));
        assert_eq!(classify(&Method::GET, "/auth/me", "/auth/me"), None);
    }

    #[test]
    fn odata_routes_use_the_entity_set_from_the_path() {
        assert_eq!(
            classify(&Method::GET, "/odata/:set", "/odata/Products"),
            Some((Resource::Products, Action::Read))
        );
        assert_eq!(classify(&Method::GET, "/odata/:set", "/odata/Unknown"), None);
    }
}
