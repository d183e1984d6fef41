//! Core library for the TaskMaster client
//!
//! This crate contains everything that does not talk HTTP:
//! - Task model, filtering and the task-list view-model
//! - Session store and token persistence
//! - Client-side validation rules
//! - The transport seams implemented by `tm-client`

pub mod error;
pub mod notify;
pub mod session;
pub mod task;
pub mod validation;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;
