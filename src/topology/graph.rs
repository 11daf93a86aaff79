//! Resolved topology graph
//!
//! Nodes and edges live in a `petgraph` [`DiGraph`]; groups form a separate
//! forest next to it. Node and group handles are only minted here, so every
//! edge endpoint and group parent refers to something already in the graph.
//! A node joins at most one group when it is first added.

use petgraph::graph::{DiGraph, EdgeReference, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Handle to a node in a [`TopologyGraph`]
pub type NodeId = NodeIndex;

/// Handle to a group (visual cluster) in a [`TopologyGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Vpc,
    Subnet,
    InternetGateway,
    NatGateway,
    VpnGateway,
    TransitGateway,
    Service,
    Volume,
    Host,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    Peering,
    Route,
    PublishedPort,
    VolumeMount,
    DependsOn,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    /// Stable identifier from the source (resource id, service name)
    pub external_id: String,
    pub label: String,
    pub tags: BTreeMap<String, String>,
    pub group: Option<GroupId>,
}

impl Node {
    pub fn new(kind: NodeKind, external_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            kind,
            external_id: external_id.into(),
            label: label.into(),
            tags: BTreeMap::new(),
            group: None,
        }
    }

    pub fn with_tags(mut self, tags: BTreeMap<String, String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn in_group(mut self, group: GroupId) -> Self {
        self.group = Some(group);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Group {
    pub label: String,
    pub parent: Option<GroupId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub kind: EdgeKind,
    pub label: Option<String>,
}

/// Nodes, directed edges and a grouping forest, in insertion order
#[derive(Debug, Default)]
pub struct TopologyGraph {
    inner: DiGraph<Node, Edge>,
    by_external_id: HashMap<(NodeKind, String), NodeId>,
    groups: Vec<Group>,
}

impl TopologyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a group, optionally nested under an existing one
    pub fn add_group(&mut self, label: impl Into<String>, parent: Option<GroupId>) -> GroupId {
        let id = GroupId(self.groups.len());
        self.groups.push(Group {
            label: label.into(),
            parent,
        });
        id
    }

    /// Add a node. If a node of the same kind and external id exists, its
    /// handle is returned unchanged and the new node is dropped.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let key = (node.kind, node.external_id.clone());
        if let Some(existing) = self.by_external_id.get(&key) {
            return *existing;
        }

        let id = self.inner.add_node(node);
        self.by_external_id.insert(key, id);
        id
    }

    /// Add a directed edge; returns false if an identical edge exists
    pub fn add_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        kind: EdgeKind,
        label: Option<String>,
    ) -> bool {
        let edge = Edge { kind, label };
        if self
            .inner
            .edges_connecting(source, target)
            .any(|existing| *existing.weight() == edge)
        {
            return false;
        }

        self.inner.add_edge(source, target, edge);
        true
    }

    pub fn node_id(&self, kind: NodeKind, external_id: &str) -> Option<NodeId> {
        self.by_external_id
            .get(&(kind, external_id.to_string()))
            .copied()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.inner[id]
    }

    pub fn group(&self, id: GroupId) -> &Group {
        &self.groups[id.0]
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.inner.node_indices().map(move |i| (i, &self.inner[i]))
    }

    pub fn groups(&self) -> impl Iterator<Item = (GroupId, &Group)> {
        self.groups.iter().enumerate().map(|(i, g)| (GroupId(i), g))
    }

    /// Edges in insertion order
    pub fn edges(&self) -> impl Iterator<Item = EdgeReference<'_, Edge>> {
        self.inner.edge_references()
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn count_kind(&self, kind: NodeKind) -> usize {
        self.inner.node_weights().filter(|n| n.kind == kind).count()
    }

    /// Edges as `(source external id, target external id)` pairs
    pub fn edge_pairs(&self) -> Vec<(&str, &str)> {
        self.edges()
            .map(|e| {
                (
                    self.node(e.source()).external_id.as_str(),
                    self.node(e.target()).external_id.as_str(),
                )
            })
            .collect()
    }

    /// Label of the group a node sits in
    pub fn group_label_of(&self, kind: NodeKind, external_id: &str) -> Option<&str> {
        let id = self.node_id(kind, external_id)?;
        let group = self.node(id).group?;
        Some(self.group(group).label.as_str())
    }
}

impl fmt::Display for TopologyGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} nodes, {} edges, {} groups",
            self.node_count(),
            self.edge_count(),
            self.group_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_node_is_idempotent_by_external_id() {
        let mut graph = TopologyGraph::new();
        let g1 = graph.add_group("first", None);
        let g2 = graph.add_group("second", None);

        let a = graph.add_node(Node::new(NodeKind::Vpc, "vpc-1", "10.0.0.0/16").in_group(g1));
        let b = graph.add_node(Node::new(NodeKind::Vpc, "vpc-1", "other").in_group(g2));

        assert_eq!(a, b);
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.node(a).label, "10.0.0.0/16");
        assert_eq!(graph.group_label_of(NodeKind::Vpc, "vpc-1"), Some("first"));
    }

    #[test]
    fn duplicate_edges_are_collapsed() {
        let mut graph = TopologyGraph::new();
        let a = graph.add_node(Node::new(NodeKind::Subnet, "subnet-a", "a"));
        let n = graph.add_node(Node::new(NodeKind::NatGateway, "nat-1", "nat-1"));

        assert!(graph.add_edge(a, n, EdgeKind::Route, None));
        assert!(!graph.add_edge(a, n, EdgeKind::Route, None));
        assert!(graph.add_edge(a, n, EdgeKind::Route, Some("0.0.0.0/0".to_string())));
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn same_id_of_different_kinds_stays_distinct() {
        let mut graph = TopologyGraph::new();
        let igw = graph.add_node(Node::new(NodeKind::InternetGateway, "gw-1", "igw"));
        let vgw = graph.add_node(Node::new(NodeKind::VpnGateway, "gw-1", "vgw"));

        assert_ne!(igw, vgw);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.node_id(NodeKind::VpnGateway, "gw-1"), Some(vgw));
        assert_eq!(graph.node_id(NodeKind::NatGateway, "gw-1"), None);
    }

    #[test]
    fn edges_keep_insertion_order() {
        let mut graph = TopologyGraph::new();
        let a = graph.add_node(Node::new(NodeKind::Vpc, "a", "a"));
        let b = graph.add_node(Node::new(NodeKind::Vpc, "b", "b"));
        let c = graph.add_node(Node::new(NodeKind::Vpc, "c", "c"));
        graph.add_edge(c, a, EdgeKind::Peering, None);
        graph.add_edge(b, a, EdgeKind::Peering, None);

        assert_eq!(graph.edge_pairs(), vec![("c", "a"), ("b", "a")]);
        assert!(graph.edges().all(|e| e.weight().kind == EdgeKind::Peering));
    }

    #[test]
    fn groups_nest() {
        let mut graph = TopologyGraph::new();
        let vpc = graph.add_group("vpc-1", None);
        let subnet = graph.add_group("private-a", Some(vpc));

        assert_eq!(graph.group(subnet).parent, Some(vpc));
        assert_eq!(graph.group(vpc).parent, None);
        assert_eq!(graph.group_count(), 2);
    }

    #[test]
    fn display_summarizes() {
        let mut graph = TopologyGraph::new();
        graph.add_node(Node::new(NodeKind::Host, "host:localhost", "localhost"));
        assert_eq!(graph.to_string(), "1 nodes, 0 edges, 0 groups");
    }
}
