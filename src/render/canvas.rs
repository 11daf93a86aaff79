//! Scoped DOT drawing context

use crate::topology::{EdgeKind, GroupId, NodeId, NodeKind, TopologyGraph};
use petgraph::visit::EdgeRef;
use std::collections::{BTreeMap, HashMap};

/// Graph-level Graphviz attributes
#[derive(Debug, Clone, Default)]
pub struct GraphStyle {
    pub graph_attrs: BTreeMap<String, String>,
}

/// Handle to a node drawn on a [`Canvas`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHandle(usize);

/// Optional edge decoration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeStyle {
    pub color: Option<&'static str>,
    pub line: Option<&'static str>,
}

/// Accumulates a DOT document; clusters nest through [`Canvas::add_cluster`]
#[derive(Debug)]
pub struct Canvas {
    title: String,
    style: GraphStyle,
    body: String,
    edges: Vec<String>,
    depth: usize,
    nodes: usize,
    clusters: usize,
}

impl Canvas {
    pub fn new(title: impl Into<String>, style: GraphStyle) -> Self {
        Self {
            title: title.into(),
            style,
            body: String::new(),
            edges: Vec::new(),
            depth: 1,
            nodes: 0,
            clusters: 0,
        }
    }

    fn line(&mut self, text: &str) {
        let indent = "  ".repeat(self.depth);
        self.body.push_str(&format!("{}{}\n", indent, text));
    }

    pub fn add_node(&mut self, kind: NodeKind, label: &str) -> NodeHandle {
        let handle = NodeHandle(self.nodes);
        self.nodes += 1;

        let (shape, extra) = node_shape(kind);
        let line = format!("n{} [label=\"{}\", shape={}{}];", handle.0, escape(label), shape, extra);
        self.line(&line);
        handle
    }

    /// Open a cluster; nodes and clusters added inside `draw` nest in it
    pub fn add_cluster(&mut self, label: &str, draw: impl FnOnce(&mut Canvas)) {
        let id = self.clusters;
        self.clusters += 1;

        self.line(&format!("subgraph cluster_{} {{", id));
        self.depth += 1;
        self.line(&format!("label=\"{}\";", escape(label)));
        draw(self);
        self.depth -= 1;
        self.line("}");
    }

    pub fn add_edge(&mut self, source: NodeHandle, target: NodeHandle, label: Option<&str>, style: EdgeStyle) {
        let mut attrs = Vec::new();
        if let Some(label) = label {
            attrs.push(format!("label=\"{}\"", escape(label)));
        }
        if let Some(color) = style.color {
            attrs.push(format!("color=\"{}\"", color));
        }
        if let Some(line) = style.line {
            attrs.push(format!("style=\"{}\"", line));
        }

        let attrs = if attrs.is_empty() {
            String::new()
        } else {
            format!(" [{}]", attrs.join(", "))
        };
        self.edges.push(format!("n{} -> n{}{};", source.0, target.0, attrs));
    }

    /// Render the finished DOT document
    pub fn into_dot(self) -> String {
        let mut out = format!("digraph \"{}\" {{\n", escape(&self.title));

        let mut graph_attrs = vec![
            format!("label=\"{}\"", escape(&self.title)),
            "labelloc=\"t\"".to_string(),
        ];
        for (key, value) in &self.style.graph_attrs {
            graph_attrs.push(format!("{}=\"{}\"", key, escape(value)));
        }
        out.push_str(&format!("  graph [{}];\n", graph_attrs.join(", ")));
        out.push_str("  node [fontname=\"Helvetica\", fontsize=\"10\"];\n");

        out.push_str(&self.body);
        for edge in &self.edges {
            out.push_str(&format!("  {}\n", edge));
        }
        out.push_str("}\n");
        out
    }
}

fn node_shape(kind: NodeKind) -> (&'static str, &'static str) {
    match kind {
        NodeKind::Vpc => ("box", ", style=\"rounded,bold\""),
        NodeKind::Subnet => ("box", ", style=\"rounded\""),
        NodeKind::InternetGateway => ("house", ""),
        NodeKind::NatGateway => ("invhouse", ""),
        NodeKind::VpnGateway => ("diamond", ""),
        NodeKind::TransitGateway => ("hexagon", ""),
        NodeKind::Service => ("component", ""),
        NodeKind::Volume => ("cylinder", ""),
        NodeKind::Host => ("ellipse", ""),
    }
}

fn edge_style(kind: EdgeKind) -> EdgeStyle {
    match kind {
        EdgeKind::DependsOn => EdgeStyle {
            color: Some("red"),
            line: Some("dashed"),
        },
        EdgeKind::Peering => EdgeStyle {
            color: None,
            line: Some("bold"),
        },
        EdgeKind::Route | EdgeKind::PublishedPort | EdgeKind::VolumeMount => EdgeStyle::default(),
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Draw a resolved graph onto a canvas: groups become nested clusters
pub fn draw(graph: &TopologyGraph, canvas: &mut Canvas) {
    let mut layout = Layout {
        graph,
        child_groups: HashMap::new(),
        group_nodes: HashMap::new(),
    };
    for (id, group) in graph.groups() {
        layout.child_groups.entry(group.parent).or_default().push(id);
    }
    for (id, node) in graph.nodes() {
        layout.group_nodes.entry(node.group).or_default().push(id);
    }

    let mut handles = HashMap::new();
    layout.emit(None, canvas, &mut handles);

    for edge in graph.edges() {
        let (Some(source), Some(target)) = (handles.get(&edge.source()), handles.get(&edge.target()))
        else {
            continue;
        };
        let weight = edge.weight();
        canvas.add_edge(*source, *target, weight.label.as_deref(), edge_style(weight.kind));
    }
}

struct Layout<'g> {
    graph: &'g TopologyGraph,
    child_groups: HashMap<Option<GroupId>, Vec<GroupId>>,
    group_nodes: HashMap<Option<GroupId>, Vec<NodeId>>,
}

impl Layout<'_> {
    fn emit(&self, group: Option<GroupId>, canvas: &mut Canvas, handles: &mut HashMap<NodeId, NodeHandle>) {
        for id in self.group_nodes.get(&group).into_iter().flatten() {
            let node = self.graph.node(*id);
            handles.insert(*id, canvas.add_node(node.kind, &node.label));
        }

        for child in self.child_groups.get(&group).into_iter().flatten() {
            canvas.add_cluster(&self.graph.group(*child).label, |inner| {
                self.emit(Some(*child), inner, handles);
            });
        }
    }
}
