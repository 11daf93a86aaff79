//! Graph resolution
//!
//! Pure functions from fetched collections (or a compose manifest) to a
//! [`TopologyGraph`]. Nothing here touches the network or the disk cache.

pub mod compose;
pub mod graph;
pub mod subnet;
pub mod vpc;

pub use compose::{resolve_compose, ComposeManifest, ServiceSpec};
pub use graph::{Edge, EdgeKind, Group, GroupId, Node, NodeId, NodeKind, TopologyGraph};
pub use subnet::resolve_subnets;
pub use vpc::resolve_vpcs;
