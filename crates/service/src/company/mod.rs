//! Companies: sellers that own products and issue sales.

pub mod domain;
pub mod repository;
pub mod service;

pub use service::CompanyService;
