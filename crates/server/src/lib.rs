//! HTTP surface of the back-office: axum routes, auth middleware and API docs.

pub mod auth;
pub mod errors;
pub mod openapi;
pub mod routes;
pub mod startup;
pub mod state;

pub use startup::{app, run};
pub use state::ServerState;
