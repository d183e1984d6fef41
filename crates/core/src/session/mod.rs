//! Session module
//!
//! The authenticated identity, its persisted token, and the operations that
//! establish or end it.

mod handle;
mod model;
mod store;
mod token_store;

pub use handle::{Credentials, SessionEvent, SessionHandle};
pub use model::*;
pub use store::{AuthApi, SessionStore};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
