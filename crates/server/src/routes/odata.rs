use axum::extract::{Path, Query, State};
use axum::Extension;
use axum::Json;
use serde_json::{Map, Value};
use service::auth::domain::Claims;
use service::odata::cache::CachedPage;
use service::odata::{EntitySet, ODataQuery};

use super::parse_query;
use crate::errors::JsonApiError;
use crate::state::ServerState;

/// Wrap a page in the OData response envelope.
pub fn envelope(set: EntitySet, query: &ODataQuery, page: &CachedPage) -> Value {
    let mut body = Map::new();
    body.insert("@odata.context".into(), Value::String(format!("$metadata#{}", set.name())));
    if query.count {
        body.insert("@odata.count".into(), Value::from(page.total));
    }
    body.insert("value".into(), Value::Array(page.items.clone()));
    if let Some(next) = page.next_skip() {
        body.insert("@odata.nextLink".into(), Value::String(query.next_link(set, next)));
    }
    Value::Object(body)
}

#[utoipa::path(get, path = "/odata/{set}", tag = "odata",
    params(("set" = String, Path, description = "Categories, Companies, Taxes, Products or Sales"), crate::openapi::ODataParams),
    responses((status = 200, description = "OData collection"), (status = 400, description = "Invalid query"), (status = 404, description = "Unknown entity set")))]
pub async fn collection(
    State(state): State<ServerState>,
    Extension(claims): Extension<Claims>,
    Path(name): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Value>, JsonApiError> {
    let set = EntitySet::from_name(&name)
        .ok_or_else(|| JsonApiError::not_found(format!("unknown entity set {name}")))?;
    let query = parse_query(&state, pairs)?;
    let user = claims.uid;
    let page = match set {
        EntitySet::Categories => state.categories.list(&query, user).await?,
        EntitySet::Companies => state.companies.list(&query, user).await?,
        EntitySet::Taxes => state.taxes.list(&query, user).await?,
        EntitySet::Products => state.products.list(&query, user).await?,
        EntitySet::Sales => state.sales.list(&query, user).await?,
    };
    Ok(Json(envelope(set, &query, &page)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use configs::ODataConfig;
    use service::pagination::Page;
    use std::sync::Arc;

    #[test]
    fn envelope_links_the_next_page() {
        let q = ODataQuery::parse([("$top", "2"), ("$count", "true")], &ODataConfig::default()).unwrap();
        let page = Arc::new(Page::new(vec![Value::from(1), Value::from(2)], 5, 2, 0));
        let body = envelope(EntitySet::Products, &q, &page);
        assert_eq!(body["@odata.context"], "$metadata#Products");
        assert_eq!(body["@odata.count"], 5);
        assert_eq!(body["value"].as_array().unwrap().len(), 2);
        let next = body["@odata.nextLink"].as_str().unwrap();
        assert!(next.starts_with("Products?"), "{next}");
        assert!(next.contains("$skip=2"), "{next}");
    }

    #[test]
    fn last_page_has_no_link_and_count_is_opt_in() {
        let q = ODataQuery::parse([("$top", "5")], &ODataConfig::default()).unwrap();
        let page = Arc::new(Page::new(vec![Value::from(1)], 1, 5, 0));
        let body = envelope(EntitySet::Sales, &q, &page);
        assert!(body.get("@odata.nextLink").is_none());
        assert!(body.get("@odata.count").is_none());
    }
}
