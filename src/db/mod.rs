//! Persistence layer: pooled SQLite with ownership-scoped queries.

pub mod store;

pub use store::{Note, NoteStatus, Store, User, DEFAULT_CATEGORY};
