//! TaskMaster client - HTTP transport
//!
//! This crate implements the transport seams of `tm-core` against the REST
//! API: token authentication, identity lookup and task CRUD.

mod api;
mod auth;
mod error;
mod tasks;

#[cfg(test)]
mod stub;

pub use api::ApiClient;
pub use auth::HttpAuthApi;
pub use error::{ApiError, Result};
pub use tasks::HttpTaskTransport;
