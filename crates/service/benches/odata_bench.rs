use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sea_orm::{DbBackend, EntityTrait, QueryFilter, QueryTrait};

use configs::ODataConfig;
use service::odata::translate::expr_to_condition;
use service::odata::ODataQuery;
use service::product::repository::FIELDS;

const FILTER: &str = "price gt 10.5 and (contains(name,'mug') or startswith(sku,'CUP')) and is_active eq true";

fn bench_parse(c: &mut Criterion) {
    let limits = ODataConfig::default();
    c.bench_function("odata_parse_query", |b| {
        b.iter(|| {
            let q = ODataQuery::parse(
                [("$filter", FILTER), ("$orderby", "price desc,name"), ("$top", "20"), ("$select", "id,sku,price")],
                &limits,
            )
            .unwrap();
            black_box(q.canonical());
        });
    });
}

fn bench_translate(c: &mut Criterion) {
    let q = ODataQuery::parse([("$filter", FILTER)], &ODataConfig::default()).unwrap();
    let Some(expr) = q.filter.clone() else { return };

    c.bench_function("odata_filter_to_sql", |b| {
        b.iter(|| {
            let cond = expr_to_condition(&expr, &FIELDS).unwrap();
            let sql = models::product::Entity::find().filter(cond).build(DbBackend::Postgres).to_string();
            black_box(sql);
        });
    });
}

criterion_group!(benches, bench_parse, bench_translate);
criterion_main!(benches);
