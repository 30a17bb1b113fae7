//! Session state for Photomesh: uploaded images and an append-only history.

/// Session records and read views.
pub mod session;
/// Storage trait and the in-memory implementation.
pub mod store;

pub use session::{Session, SessionView};
pub use store::{InMemorySessionStore, SessionStore};
