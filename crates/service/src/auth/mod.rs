//! Auth module: three-layer architecture (domain, repository, service).
//!
//! Registration, login, JWT issue/verify and role management for back-office users.

pub mod domain;
pub mod errors;
pub mod repository;
pub mod service;
pub mod repo;

pub use service::{AuthConfig, AuthService};
