//! Products: catalog items with on-hand and reserved stock.

pub mod domain;
pub mod repository;
pub mod service;

pub use service::ProductService;
