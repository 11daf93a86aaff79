//! docker-compose manifests as topology graphs
//!
//! Services become grouped nodes with their volume mounts; published ports
//! point at a shared `localhost` node and `depends_on` entries become
//! dependency edges.

use crate::error::{AwsmapError, AwsmapResult};
use crate::topology::graph::{EdgeKind, Node, NodeKind, TopologyGraph};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One service entry of a compose manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceSpec {
    pub name: String,
    /// Mount specs in short form (`source:target[:mode]`)
    pub volumes: Vec<String>,
    /// Port specs in short form (`published:target`)
    pub ports: Vec<String>,
    pub depends_on: Vec<String>,
}

/// Parsed manifest; services keep file order
#[derive(Debug, Clone)]
pub struct ComposeManifest {
    path: PathBuf,
    services: Vec<ServiceSpec>,
}

impl ComposeManifest {
    /// Read and parse a manifest from disk
    pub async fn load(path: &Path) -> AwsmapResult<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AwsmapError::io(format!("reading {}", path.display()), e))?;
        Self::parse(path, &text)
    }

    /// Parse manifest text; `path` is only used in error messages
    pub fn parse(path: impl Into<PathBuf>, text: &str) -> AwsmapResult<Self> {
        let path = path.into();
        let malformed = |reason: String| AwsmapError::malformed_manifest(&path, reason);

        let doc: Value = serde_yaml::from_str(text).map_err(|e| malformed(e.to_string()))?;
        let services = doc
            .get("services")
            .and_then(Value::as_mapping)
            .ok_or_else(|| malformed("missing top-level 'services' mapping".to_string()))?;

        let mut specs = Vec::with_capacity(services.len());
        for (name, body) in services {
            let name = name
                .as_str()
                .ok_or_else(|| malformed(format!("service name {:?} is not a string", name)))?;

            let spec = match body {
                Value::Null => ServiceSpec {
                    name: name.to_string(),
                    ..ServiceSpec::default()
                },
                Value::Mapping(body) => parse_service(name, body).map_err(malformed)?,
                _ => return Err(malformed(format!("service '{}' is not a mapping", name))),
            };
            specs.push(spec);
        }

        Ok(Self {
            path,
            services: specs,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn services(&self) -> &[ServiceSpec] {
        &self.services
    }
}

fn parse_service(name: &str, body: &Mapping) -> Result<ServiceSpec, String> {
    let mut spec = ServiceSpec {
        name: name.to_string(),
        ..ServiceSpec::default()
    };

    for item in sequence(body, "volumes", name)? {
        spec.volumes.push(match item {
            Value::String(s) => s.clone(),
            Value::Mapping(m) => {
                let parts: Vec<&str> = ["source", "target"]
                    .iter()
                    .filter_map(|k| m.get(*k).and_then(Value::as_str))
                    .collect();
                if parts.is_empty() {
                    return Err(format!("service '{}' has a volume without source or target", name));
                }
                parts.join(":")
            }
            other => return Err(format!("service '{}' has an invalid volume {:?}", name, other)),
        });
    }

    for item in sequence(body, "ports", name)? {
        spec.ports.push(match item {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Mapping(m) => {
                let target = m.get("target").map(scalar_string);
                let published = m.get("published").map(scalar_string);
                match (published, target) {
                    (Some(p), Some(t)) => format!("{}:{}", p, t),
                    (None, Some(t)) => t,
                    _ => return Err(format!("service '{}' has a port without target", name)),
                }
            }
            other => return Err(format!("service '{}' has an invalid port {:?}", name, other)),
        });
    }

    match body.get("depends_on") {
        None | Some(Value::Null) => {}
        Some(Value::Sequence(items)) => {
            for item in items {
                let dep = item
                    .as_str()
                    .ok_or_else(|| format!("service '{}' has a non-string dependency", name))?;
                spec.depends_on.push(dep.to_string());
            }
        }
        // Long syntax: `depends_on: {db: {condition: service_healthy}}`
        Some(Value::Mapping(deps)) => {
            for (dep, _) in deps {
                let dep = dep
                    .as_str()
                    .ok_or_else(|| format!("service '{}' has a non-string dependency", name))?;
                spec.depends_on.push(dep.to_string());
            }
        }
        Some(_) => return Err(format!("service '{}' has an invalid depends_on", name)),
    }

    Ok(spec)
}

/// Optional sequence under `key`; absent or null means empty
fn sequence<'m>(body: &'m Mapping, key: &str, service: &str) -> Result<&'m [Value], String> {
    match body.get(key) {
        None | Some(Value::Null) => Ok(&[]),
        Some(Value::Sequence(items)) => Ok(items.as_slice()),
        Some(_) => Err(format!("service '{}' has a non-list '{}'", service, key)),
    }
}

fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => format!("{:?}", other),
    }
}

fn service_node_id(name: &str) -> String {
    format!("service:{}", name)
}

/// Build the service graph for a manifest.
///
/// Fails with `MalformedManifest` if a service depends on one that is not
/// declared.
pub fn resolve_compose(manifest: &ComposeManifest) -> AwsmapResult<TopologyGraph> {
    let mut graph = TopologyGraph::new();

    for service in manifest.services() {
        debug!("Service: {}", service.name);
        let group = graph.add_group(&service.name, None);
        let node = graph.add_node(
            Node::new(NodeKind::Service, service_node_id(&service.name), &service.name)
                .in_group(group),
        );

        for (i, volume) in service.volumes.iter().enumerate() {
            let label = volume.split(':').collect::<Vec<_>>().join("\n");
            let mount = graph.add_node(
                Node::new(NodeKind::Volume, format!("volume:{}:{}", service.name, i), label)
                    .in_group(group),
            );
            graph.add_edge(mount, node, EdgeKind::VolumeMount, None);
        }

        for port in &service.ports {
            let host = graph.add_node(Node::new(NodeKind::Host, "host:localhost", "localhost"));
            graph.add_edge(node, host, EdgeKind::PublishedPort, Some(port.clone()));
        }
    }

    for service in manifest.services() {
        let Some(dependent) = graph.node_id(NodeKind::Service, &service_node_id(&service.name))
        else {
            continue;
        };

        for dep in &service.depends_on {
            let dependency = graph
                .node_id(NodeKind::Service, &service_node_id(dep))
                .ok_or_else(|| {
                    AwsmapError::malformed_manifest(
                        manifest.path(),
                        format!("service '{}' depends on undeclared service '{}'", service.name, dep),
                    )
                })?;
            graph.add_edge(dependency, dependent, EdgeKind::DependsOn, None);
        }
    }

    Ok(graph)
}
