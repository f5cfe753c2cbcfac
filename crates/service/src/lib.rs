//! Service layer for the back-office: business rules on top of `models`.
//! - Repositories abstract persistence; every domain ships a SeaORM and an in-memory implementation.
//! - List endpoints go through the OData translator and the shared query cache.
//! - Errors are reported as `ServiceError`, which the HTTP layer maps to status codes.

pub mod errors;
pub mod pagination;
pub mod metrics;
pub mod authz;
pub mod refs;
pub mod odata;
pub mod auth;
pub mod category;
pub mod company;
pub mod tax;
pub mod product;
pub mod sale;
