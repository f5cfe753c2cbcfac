//! Sales: priced items, stock reservation and the status lifecycle.

pub mod domain;
pub mod repository;
pub mod service;

pub use service::SaleService;
