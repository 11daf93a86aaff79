//! VPC-level resolution: VPCs and the peers flowing into them

use crate::aws::model::{name_tag, tag_map, PeeringConnection, VpcInventory};
use crate::topology::graph::{EdgeKind, Node, NodeKind, TopologyGraph};
use tracing::debug;

/// Build the VPC graph.
///
/// VPCs are placed first so a peer that is itself an inventoried VPC reuses
/// that node. Peering edges point from requester to accepter. Input order
/// is preserved throughout.
pub fn resolve_vpcs(inventory: &[VpcInventory]) -> TopologyGraph {
    let mut graph = TopologyGraph::new();

    for entry in inventory {
        let vpc = &entry.vpc;
        let label = name_tag(&vpc.tags).unwrap_or(&vpc.vpc_id);
        let group = graph.add_group(label, None);
        graph.add_node(
            Node::new(NodeKind::Vpc, &vpc.vpc_id, &vpc.cidr_block)
                .with_tags(tag_map(&vpc.tags))
                .in_group(group),
        );
    }

    for entry in inventory {
        let Some(accepter) = graph.node_id(NodeKind::Vpc, &entry.vpc.vpc_id) else {
            continue;
        };

        for connection in &entry.peering_connections {
            let requester = &connection.requester_vpc_info;
            let peer = match graph.node_id(NodeKind::Vpc, &requester.vpc_id) {
                Some(existing) => existing,
                None => {
                    let group = graph.add_group(&requester.vpc_id, None);
                    graph.add_node(
                        Node::new(NodeKind::Vpc, &requester.vpc_id, peer_label(connection))
                            .with_tags(tag_map(&connection.tags))
                            .in_group(group),
                    )
                }
            };

            debug!(
                "Peering {}: {} -> {}",
                connection.vpc_peering_connection_id, requester.vpc_id, entry.vpc.vpc_id
            );
            graph.add_edge(peer, accepter, EdgeKind::Peering, None);
        }
    }

    graph
}

/// Requester CIDR, followed by the connection's Name tag one word per line
fn peer_label(connection: &PeeringConnection) -> String {
    let requester = &connection.requester_vpc_info;
    let cidr = requester
        .cidr_block
        .as_deref()
        .unwrap_or(&requester.vpc_id);

    match name_tag(&connection.tags) {
        Some(name) => {
            let words: Vec<&str> = name.split_whitespace().collect();
            format!("{}\n{}", cidr, words.join("\n"))
        }
        None => cidr.to_string(),
    }
}
