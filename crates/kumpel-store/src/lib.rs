//! Kumpel story library
//!
//! Persists generated stories in SQLite so they can be practiced again.

pub mod error;
pub mod store;

pub use error::{Result, StoreError};
pub use store::{StoryStore, StorySummary};
