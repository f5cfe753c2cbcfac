use once_cell::sync::Lazy;
use prometheus::{register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec, TextEncoder};

// Prometheus metrics (default registry)
pub static QUERY_CACHE_HITS: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "backoffice_query_cache_hits_total",
        "List queries answered from the query cache"
    )
    .expect("register query_cache_hits_total")
});

pub static QUERY_CACHE_MISSES: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "backoffice_query_cache_misses_total",
        "List queries that went to the database"
    )
    .expect("register query_cache_misses_total")
});

pub static SALE_TRANSITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "backoffice_sale_transitions_total",
        "Sale status transitions by target status",
        &["to"]
    )
    .expect("register sale_transitions_total")
});

pub static STOCK_OPERATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "backoffice_stock_operations_total",
        "Applied stock operations by kind",
        &["op"]
    )
    .expect("register stock_operations_total")
});

/// Text exposition of the default registry.
pub fn encode_metrics() -> Result<String, String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| format!("metrics encode error: {e}"))?;
    String::from_utf8(buffer).map_err(|e| format!("metrics encode error: {e}"))
}
