pub mod auth;
pub mod categories;
pub mod companies;
pub mod odata;
pub mod products;
pub mod sales;
pub mod taxes;
pub mod users;

use axum::{
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::types::Health;
use service::errors::ServiceError;
use service::odata::cache::CachedPage;
use service::odata::ODataQuery;

use crate::errors::JsonApiError;
use crate::openapi::ApiDoc;
use crate::state::ServerState;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health::ok(env!("CARGO_PKG_VERSION")))
}

/// Prometheus text exposition of the default registry.
pub async fn metrics() -> Result<Response, JsonApiError> {
    let body = service::metrics::encode_metrics()
        .map_err(|e| JsonApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Metrics Unavailable", Some(e)))?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body).into_response())
}

/// Parse raw query pairs with the configured limits.
pub(crate) fn parse_query(state: &ServerState, pairs: Vec<(String, String)>) -> Result<ODataQuery, JsonApiError> {
    ODataQuery::parse(pairs, &state.odata).map_err(|e| ServiceError::Query(e).into())
}

/// A shared cached page rendered as the `/api` list envelope.
pub struct PageBody(pub CachedPage);

impl IntoResponse for PageBody {
    fn into_response(self) -> Response {
        Json(&*self.0).into_response()
    }
}

fn protected_routes() -> Router<ServerState> {
    Router::new()
        .route("/auth/me", get(auth::me))
        .route("/api/categories", get(categories::list).post(categories::create))
        .route(
            "/api/categories/:id",
            get(categories::get).put(categories::update).delete(categories::delete),
        )
        .route("/api/categories/:id/restore", post(categories::restore))
        .route("/api/companies", get(companies::list).post(companies::create))
        .route(
            "/api/companies/:id",
            get(companies::get).put(companies::update).delete(companies::delete),
        )
        .route("/api/companies/:id/restore", post(companies::restore))
        .route("/api/taxes", get(taxes::list).post(taxes::create))
        .route("/api/taxes/:id", get(taxes::get).put(taxes::update).delete(taxes::delete))
        .route("/api/taxes/:id/restore", post(taxes::restore))
        .route("/api/products", get(products::list).post(products::create))
        .route(
            "/api/products/:id",
            get(products::get).put(products::update).delete(products::delete),
        )
        .route("/api/products/:id/restore", post(products::restore))
        .route("/api/products/:id/stock", post(products::adjust_stock))
        .route("/api/products/:id/reserve", post(products::reserve))
        .route("/api/products/:id/release", post(products::release))
        .route("/api/sales", get(sales::list).post(sales::create))
        .route("/api/sales/:id", get(sales::get).delete(sales::delete))
        .route("/api/sales/:id/items", get(sales::items))
        .route("/api/sales/:id/confirm", post(sales::confirm))
        .route("/api/sales/:id/complete", post(sales::complete))
        .route("/api/sales/:id/cancel", post(sales::cancel))
        .route("/api/sales/:id/restore", post(sales::restore))
        .route("/api/users", get(users::list))
        .route("/api/users/:id/role", put(users::change_role))
        .route("/odata/:set", get(odata::collection))
}

/// Build the full application router, including public and protected routes
pub fn build_router(state: ServerState, cors: CorsLayer) -> Router {
    // Public routes (health, metrics, login, docs)
    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // Layers run bottom-up: authentication, then authorization
    let protected = protected_routes()
        .route_layer(middleware::from_fn(crate::auth::authorize))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            crate::auth::require_bearer_token_state,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // one span per request with method and path
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // status and latency
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
