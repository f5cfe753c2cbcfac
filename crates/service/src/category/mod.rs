//! Categories: catalog grouping for products.

pub mod domain;
pub mod repository;
pub mod service;

pub use service::CategoryService;
