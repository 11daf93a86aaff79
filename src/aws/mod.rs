//! AWS access: the remote query seam, typed models and cache-aside fetchers

pub mod client;
pub mod fetch;
pub mod model;

pub use client::{filter, AwsCli, Filters, QueryHandle, ResourceClient};
pub use fetch::{resolve_account_id, Fetcher, Scope};
