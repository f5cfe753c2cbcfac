//! Filter AST and ordering → SeaORM `Select` translation.

use std::collections::HashMap;

use bigdecimal::{BigDecimal, ToPrimitive};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, Order},
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
};

use super::ast::{self, CompareOperator as Op};
use super::query::{ODataQuery, OrderKey, SortDir};
use super::ODataError;
use crate::errors::ServiceError;
use crate::pagination::Page;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Decimal,
    Bool,
    Uuid,
    DateTime,
}

#[derive(Clone)]
pub struct Field<E: EntityTrait> {
    pub col: E::Column,
    pub kind: FieldKind,
}

/// API field name (case-insensitive) → column and literal type.
#[derive(Clone)]
pub struct FieldMap<E: EntityTrait> {
    map: HashMap<String, Field<E>>,
}

impl<E: EntityTrait> Default for FieldMap<E> {
    fn default() -> Self { Self::new() }
}

impl<E: EntityTrait> FieldMap<E> {
    pub fn new() -> Self { Self { map: HashMap::new() } }

    pub fn insert(mut self, api_name: impl Into<String>, col: E::Column, kind: FieldKind) -> Self {
        self.map.insert(api_name.into().to_lowercase(), Field { col, kind });
        self
    }

    pub fn get(&self, name: &str) -> Option<&Field<E>> { self.map.get(&name.to_lowercase()) }

    pub fn contains(&self, name: &str) -> bool { self.map.contains_key(&name.to_lowercase()) }

    fn resolve(&self, name: &str) -> Result<&Field<E>, ODataError> {
        self.get(name).ok_or_else(|| ODataError::UnknownField(name.to_string()))
    }
}

fn mismatch(field: &str, expected: FieldKind, got: &ast::Value) -> ODataError {
    ODataError::TypeMismatch { field: field.to_string(), expected, got: got.kind_name() }
}

fn bigdecimal_to_decimal(field: &str, bd: &BigDecimal) -> Result<Decimal, ODataError> {
    let s = bd.normalized().to_string();
    Decimal::from_str_exact(&s)
        .or_else(|_| Decimal::from_scientific(&s))
        .map_err(|_| ODataError::TypeMismatch { field: field.to_string(), expected: FieldKind::Decimal, got: "number" })
}

fn coerce(field: &str, kind: FieldKind, v: &ast::Value) -> Result<sea_orm::Value, ODataError> {
    use ast::Value as V;
    Ok(match (kind, v) {
        (FieldKind::String, V::String(s)) => s.clone().into(),
        (FieldKind::Integer, V::Number(n)) if n.is_integer() => {
            let i = n.to_i64().ok_or_else(|| mismatch(field, kind, v))?;
            i.into()
        }
        (FieldKind::Decimal, V::Number(n)) => bigdecimal_to_decimal(field, n)?.into(),
        (FieldKind::Bool, V::Bool(b)) => (*b).into(),
        (FieldKind::Uuid, V::Uuid(u)) => (*u).into(),
        (FieldKind::DateTime, V::DateTime(dt)) => (*dt).into(),
        // a bare date means midnight UTC
        (FieldKind::DateTime, V::Date(d)) => {
            let dt = d.and_hms_opt(0, 0, 0).ok_or_else(|| mismatch(field, kind, v))?.and_utc();
            dt.into()
        }
        (expected, other) => return Err(mismatch(field, expected, other)),
    })
}

fn coerce_many(field: &str, kind: FieldKind, items: &[ast::Expr]) -> Result<Vec<sea_orm::Value>, ODataError> {
    items
        .iter()
        .map(|e| match e {
            ast::Expr::Value(ast::Value::Null) => Err(ODataError::Unsupported("null inside in()".into())),
            ast::Expr::Value(v) => coerce(field, kind, v),
            _ => Err(ODataError::Unsupported("in() list supports only literals".into())),
        })
        .collect()
}

fn like_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '%' | '_' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            c => out.push(c),
        }
    }
    out
}

pub fn expr_to_condition<E>(expr: &ast::Expr, fmap: &FieldMap<E>) -> Result<Condition, ODataError>
where
    E: EntityTrait,
    E::Column: ColumnTrait + Copy,
{
    use ast::Expr as X;

    Ok(match expr {
        X::And(a, b) => Condition::all().add(expr_to_condition(a, fmap)?).add(expr_to_condition(b, fmap)?),
        X::Or(a, b) => Condition::any().add(expr_to_condition(a, fmap)?).add(expr_to_condition(b, fmap)?),
        X::Not(x) => Condition::all().add(expr_to_condition(x, fmap)?).not(),

        X::Compare(lhs, op, rhs) => {
            let (name, value) = match (&**lhs, &**rhs) {
                (X::Identifier(name), X::Value(val)) => (name, val),
                (X::Identifier(_), X::Identifier(_)) => {
                    return Err(ODataError::Unsupported("field-to-field comparison".into()))
                }
                _ => return Err(ODataError::Unsupported("comparison must be `field op literal`".into())),
            };
            let field = fmap.resolve(name)?;
            let col = field.col;

            if matches!(value, ast::Value::Null) {
                return Ok(match op {
                    Op::Eq => Condition::all().add(Expr::col(col).is_null()),
                    Op::Ne => Condition::all().add(Expr::col(col).is_not_null()),
                    _ => return Err(ODataError::Unsupported(format!("{op} null"))),
                });
            }

            let v = coerce(name, field.kind, value)?;
            let e = match op {
                Op::Eq => Expr::col(col).eq(v),
                Op::Ne => Expr::col(col).ne(v),
                Op::Gt => Expr::col(col).gt(v),
                Op::Ge => Expr::col(col).gte(v),
                Op::Lt => Expr::col(col).lt(v),
                Op::Le => Expr::col(col).lte(v),
            };
            Condition::all().add(e)
        }

        X::In(lhs, list) => {
            let X::Identifier(name) = &**lhs else {
                return Err(ODataError::Unsupported("left side of in() must be a field".into()));
            };
            let field = fmap.resolve(name)?;
            let vals = coerce_many(name, field.kind, list)?;
            if vals.is_empty() {
                Condition::all().add(Expr::cust("1=0"))
            } else {
                Condition::all().add(Expr::col(field.col).is_in(vals))
            }
        }

        X::Function(fname, args) => {
            let n = fname.to_ascii_lowercase();
            let (name, text) = match args.as_slice() {
                [X::Identifier(name), X::Value(ast::Value::String(s))] => (name, s),
                _ => return Err(ODataError::UnsupportedFn(fname.clone())),
            };
            let pattern = match n.as_str() {
                "contains" => format!("%{}%", like_escape(text)),
                "startswith" => format!("{}%", like_escape(text)),
                "endswith" => format!("%{}", like_escape(text)),
                _ => return Err(ODataError::UnsupportedFn(fname.clone())),
            };
            let field = fmap.resolve(name)?;
            if field.kind != FieldKind::String {
                return Err(ODataError::TypeMismatch { field: name.clone(), expected: FieldKind::String, got: "non-string field" });
            }
            Condition::all().add(Expr::col(field.col).like(pattern))
        }

        X::Identifier(name) => return Err(ODataError::Unsupported(format!("bare identifier {name}"))),
        X::Value(_) => return Err(ODataError::Unsupported("bare literal".into())),
    })
}

/// Apply `$orderby`, falling back to `created_at desc`; `id asc` always breaks ties.
pub fn apply_order<E>(mut select: Select<E>, keys: &[OrderKey], fmap: &FieldMap<E>) -> Result<Select<E>, ODataError>
where
    E: EntityTrait,
    E::Column: ColumnTrait + Copy,
{
    let defaults = [OrderKey { field: "created_at".into(), dir: SortDir::Desc }];
    let keys = if keys.is_empty() { &defaults[..] } else { keys };
    for key in keys {
        let field = fmap.resolve(&key.field)?;
        let order = match key.dir {
            SortDir::Asc => Order::Asc,
            SortDir::Desc => Order::Desc,
        };
        select = select.order_by(field.col, order);
    }
    if !keys.iter().any(|k| k.field == "id") {
        select = select.order_by(fmap.resolve("id")?.col, Order::Asc);
    }
    Ok(select)
}

/// Filter, count, order and slice `base` according to `query`.
pub async fn fetch_page<E, C>(
    db: &C,
    base: Select<E>,
    query: &ODataQuery,
    fmap: &FieldMap<E>,
) -> Result<Page<E::Model>, ServiceError>
where
    E: EntityTrait,
    E::Column: ColumnTrait + Copy,
    E::Model: Sync,
    C: ConnectionTrait,
{
    let mut select = base;
    if let Some(filter) = &query.filter {
        select = select.filter(expr_to_condition(filter, fmap)?);
    }
    let total = PaginatorTrait::count(select.clone(), db).await?;
    let items = apply_order(select, &query.orderby, fmap)?
        .offset(query.skip)
        .limit(query.top)
        .all(db)
        .await?;
    Ok(Page::new(items, total, query.top, query.skip))
}

#[cfg(test)]
mod tests {
    use super::*;
    use configs::ODataConfig;
    use models::product;
    use sea_orm::{DbBackend, QueryTrait};

    fn fields() -> FieldMap<product::Entity> {
        FieldMap::new()
            .insert("id", product::Column::Id, FieldKind::Uuid)
            .insert("name", product::Column::Name, FieldKind::String)
            .insert("price", product::Column::Price, FieldKind::Decimal)
            .insert("stock", product::Column::Stock, FieldKind::Integer)
            .insert("is_active", product::Column::IsActive, FieldKind::Bool)
            .insert("tax_id", product::Column::TaxId, FieldKind::Uuid)
            .insert("created_at", product::Column::CreatedAt, FieldKind::DateTime)
    }

    fn sql(pairs: &[(&str, &str)]) -> Result<String, ODataError> {
        let q = ODataQuery::parse(pairs.iter().copied(), &ODataConfig::default())?;
        let fm = fields();
        let mut select = product::Entity::find();
        if let Some(f) = &q.filter {
            select = select.filter(expr_to_condition(f, &fm)?);
        }
        let select = apply_order(select, &q.orderby, &fm)?;
        Ok(select.build(DbBackend::Postgres).to_string())
    }

    #[test]
    fn comparison_and_logic() {
        let s = sql(&[("$filter", "stock gt 5 and (name eq 'Mug' or is_active eq false)")]).unwrap();
        assert!(s.contains(r#""stock" > 5"#), "{s}");
        assert!(s.contains(r#""name" = 'Mug'"#), "{s}");
        assert!(s.contains(r#""is_active" = FALSE"#), "{s}");
        assert!(s.contains(" OR "), "{s}");
    }

    #[test]
    fn null_comparisons_become_is_null() {
        let s = sql(&[("$filter", "tax_id eq null")]).unwrap();
        assert!(s.contains(r#""tax_id" IS NULL"#), "{s}");
        let s = sql(&[("$filter", "tax_id ne null")]).unwrap();
        assert!(s.contains(r#""tax_id" IS NOT NULL"#), "{s}");
        assert!(matches!(sql(&[("$filter", "stock gt null")]), Err(ODataError::Unsupported(_))));
    }

    #[test]
    fn not_wraps_condition() {
        let s = sql(&[("$filter", "not (stock eq 0)")]).unwrap();
        assert!(s.contains("NOT"), "{s}");
    }

    #[test]
    fn in_list() {
        let s = sql(&[("$filter", "stock in (1, 2, 3)")]).unwrap();
        assert!(s.contains(r#""stock" IN (1, 2, 3)"#), "{s}");
    }

    #[test]
    fn empty_in_list_matches_nothing() {
        let s = sql(&[("$filter", "stock in ()")]).unwrap();
        assert!(s.contains("WHERE 1=0"), "{s}");
    }

    #[test]
    fn datetime_literals_bind_to_timestamp_fields() {
        let s = sql(&[("$filter", "created_at gt 2024-01-01T00:00:00Z")]).unwrap();
        assert!(s.contains(r#""created_at" > '2024-01-01 00:00:00"#), "{s}");
        assert!(matches!(
            sql(&[("$filter", "stock gt 2024-01-01T00:00:00Z")]),
            Err(ODataError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn string_functions_escape_like_wildcards() {
        let s = sql(&[("$filter", "contains(name,'50%_off')")]).unwrap();
        assert!(s.contains(r#"LIKE '%50\\%\\_off%'"#) || s.contains(r#"LIKE E'%50\\%\\_off%'"#), "{s}");
        let s = sql(&[("$filter", "startswith(name,'Mu')")]).unwrap();
        assert!(s.contains("LIKE 'Mu%'"), "{s}");
        assert!(matches!(sql(&[("$filter", "contains(stock,'1')")]), Err(ODataError::TypeMismatch { .. })));
        assert!(matches!(sql(&[("$filter", "tolower(name) eq 'x'")]), Err(ODataError::Unsupported(_))));
        assert!(matches!(sql(&[("$filter", "length(name,'x')")]), Err(ODataError::UnsupportedFn(_))));
    }

    #[test]
    fn type_mismatches_and_unknown_fields() {
        assert!(matches!(sql(&[("$filter", "stock eq 'ten'")]), Err(ODataError::TypeMismatch { .. })));
        assert!(matches!(sql(&[("$filter", "stock eq 1.5")]), Err(ODataError::TypeMismatch { .. })));
        assert!(matches!(sql(&[("$filter", "colour eq 'red'")]), Err(ODataError::UnknownField(_))));
        assert!(matches!(sql(&[("$filter", "stock eq price")]), Err(ODataError::Unsupported(_))));
    }

    #[test]
    fn decimal_literals_are_exact() {
        let s = sql(&[("$filter", "price le 19.90")]).unwrap();
        assert!(s.contains(r#""price" <= 19.9"#), "{s}");
    }

    #[test]
    fn default_order_and_tiebreaker() {
        let s = sql(&[]).unwrap();
        assert!(s.ends_with(r#"ORDER BY "product"."created_at" DESC, "product"."id" ASC"#), "{s}");
        let s = sql(&[("$orderby", "price desc")]).unwrap();
        assert!(s.ends_with(r#"ORDER BY "product"."price" DESC, "product"."id" ASC"#), "{s}");
        let s = sql(&[("$orderby", "id desc")]).unwrap();
        assert!(s.ends_with(r#"ORDER BY "product"."id" DESC"#), "{s}");
    }
}
