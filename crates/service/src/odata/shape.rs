//! `$expand` / `$select` applied to fetched rows.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::pagination::Page;

/// Related JSON for one navigation property, keyed by the owning row id.
pub type Expansion = (String, HashMap<Uuid, Value>);

/// Keep only `selected` keys (already lower-case, including `id`) and the `expanded` navigations.
pub fn project(value: Value, selected: &[String], expanded: &[Expansion]) -> Value {
    match value {
        Value::Object(map) => {
            let projected: Map<String, Value> = map
                .into_iter()
                .filter(|(k, _)| {
                    selected.iter().any(|s| s.eq_ignore_ascii_case(k))
                        || expanded.iter().any(|(nav, _)| nav.eq_ignore_ascii_case(k))
                })
                .collect();
            Value::Object(projected)
        }
        other => other,
    }
}

/// Serialize rows, attach expansions under their navigation names, then project.
/// Rows without an expansion entry get `null`.
pub fn shape_items<T: Serialize>(
    items: Vec<T>,
    id_of: impl Fn(&T) -> Uuid,
    expansions: &[Expansion],
    select: Option<&[String]>,
) -> Vec<Value> {
    items.into_iter().map(|item| shape_one(item, &id_of, expansions, select)).collect()
}

/// [`shape_items`] over a page, keeping its counters.
pub fn shape_page<T: Serialize>(
    page: Page<T>,
    id_of: impl Fn(&T) -> Uuid,
    expansions: &[Expansion],
    select: Option<&[String]>,
) -> Page<Value> {
    let Page { items, total, top, skip, page, total_pages, has_next } = page;
    Page { items: shape_items(items, id_of, expansions, select), total, top, skip, page, total_pages, has_next }
}

fn shape_one<T: Serialize>(
    item: T,
    id_of: &impl Fn(&T) -> Uuid,
    expansions: &[Expansion],
    select: Option<&[String]>,
) -> Value {
    let id = id_of(&item);
    let mut value = serde_json::to_value(item).unwrap_or_else(|_| json!({}));
    if let Value::Object(map) = &mut value {
        for (nav, related) in expansions {
            map.insert(nav.clone(), related.get(&id).cloned().unwrap_or(Value::Null));
        }
    }
    match select {
        Some(fields) => project(value, fields, expansions),
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Row {
        id: Uuid,
        name: String,
        price: u32,
    }

    #[test]
    fn select_projects_and_keeps_expansions_when_selected() {
        let id = Uuid::new_v4();
        let rows = vec![Row { id, name: "Mug".into(), price: 3 }];
        let mut related = HashMap::new();
        related.insert(id, json!({"name": "Kitchen"}));
        let out = shape_items(
            rows,
            |r| r.id,
            &[("category".into(), related)],
            Some(&["id".into(), "name".into(), "category".into()]),
        );
        assert_eq!(out[0], json!({"id": id, "name": "Mug", "category": {"name": "Kitchen"}}));
    }

    #[test]
    fn expansions_survive_a_select_that_omits_them() {
        let id = Uuid::new_v4();
        let rows = vec![Row { id, name: "Mug".into(), price: 3 }];
        let related = HashMap::from([(id, json!({"name": "Kitchen"}))]);
        let out = shape_items(rows, |r| r.id, &[("category".into(), related)], Some(&["id".into(), "name".into()]));
        assert_eq!(out[0], json!({"id": id, "name": "Mug", "category": {"name": "Kitchen"}}));
    }

    #[test]
    fn missing_expansion_is_null_and_no_select_keeps_all() {
        let id = Uuid::new_v4();
        let out = shape_items(vec![Row { id, name: "Mug".into(), price: 3 }], |r| r.id, &[("tax".into(), HashMap::new())], None);
        assert_eq!(out[0]["tax"], Value::Null);
        assert_eq!(out[0]["price"], json!(3));
    }

    #[test]
    fn shaped_page_keeps_counters() {
        let id = Uuid::new_v4();
        let page = Page::new(vec![Row { id, name: "Mug".into(), price: 3 }], 7, 1, 2);
        let out = shape_page(page, |r| r.id, &[], Some(&["id".into()]));
        assert_eq!(out.total, 7);
        assert_eq!(out.page, 3);
        assert_eq!(out.items[0], json!({"id": id}));
    }
}
