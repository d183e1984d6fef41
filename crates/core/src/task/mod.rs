//! Task module
//!
//! This module contains task types, filtering, the transport seam and the
//! task-list view-model.

mod filter;
mod model;
mod transport;
mod view_model;

pub use filter::{filtered_view, PriorityFilter, StatusFilter, TaskFilter};
pub use model::*;
pub use transport::TaskTransport;
pub use view_model::{LoadState, TaskViewModel};
