//! Taxes: percentage rates attached to products and snapshotted into sale items.

pub mod domain;
pub mod repository;
pub mod service;

pub use service::TaxService;
