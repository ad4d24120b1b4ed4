//! Persistent contacts cache.
//!
//! This module provides the local copy of the remote contact list:
//! - Stores `(email, name)` pairs per contact id in a single YAML file
//! - Tracks the last modification time used as the incremental sync watermark
//! - Decides staleness from a configurable lifespan in days
//! - Answers case-insensitive searches over email and name

mod contacts;
mod storage;
mod traits;

pub use contacts::{ContactsCache, SearchMode};
pub use storage::format_timestamp;
pub use traits::{Address, ContactStore};
