//! awsmap - AWS network topology diagrams
//!
//! Fetches VPCs, peering connections, subnets, gateways and route tables
//! through the AWS CLI, caches every response on disk, resolves them into a
//! [`topology::TopologyGraph`] and renders it with Graphviz. Docker-compose
//! files can be mapped the same way.

pub mod aws;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod render;
pub mod topology;
pub mod ui;

pub use error::{AwsmapError, AwsmapResult};
