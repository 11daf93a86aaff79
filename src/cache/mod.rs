//! Durable response cache
//!
//! Raw API envelopes are stored on disk keyed by account, region and topic,
//! so repeated runs are cheap and prior runs can be replayed offline.

pub mod key;
pub mod store;

pub use key::{CacheKey, Topic};
pub use store::{CacheEntryInfo, DiskCache};
