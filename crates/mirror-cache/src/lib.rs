//! # mirror-cache
//!
//! The client-side entity cache: the sole authority on last-known remote
//! state. Entries are created on first observation (initial snapshot,
//! create event, or lazy fetch) and destroyed only by explicit delete
//! events; deletes remove the key entirely, leaving no tombstone.

mod cache;

pub use cache::{CacheResult, EntityCache};
