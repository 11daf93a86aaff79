//! Subnet-level resolution: which gateways each subnet routes to

use crate::aws::model::{name_tag, tag_map, Route, SubnetInventory};
use crate::topology::graph::{EdgeKind, Node, NodeId, NodeKind, TopologyGraph};
use std::collections::HashMap;
use tracing::debug;

/// Gateway id to node, one map per gateway kind.
///
/// Route tables reuse `GatewayId` for both VPN and Internet gateways, so the
/// two maps are probed separately rather than merged.
#[derive(Default)]
struct GatewayIndex {
    nat: HashMap<String, NodeId>,
    internet: HashMap<String, NodeId>,
    vpn: HashMap<String, NodeId>,
    transit: HashMap<String, NodeId>,
}

impl GatewayIndex {
    /// First resolvable target in precedence order: NAT, then the generic
    /// gateway id against VPN and Internet, then transit.
    fn resolve(&self, route: &Route) -> Option<(NodeId, &'static str)> {
        let probes: [(Option<&String>, &HashMap<String, NodeId>, &'static str); 4] = [
            (route.nat_gateway_id.as_ref(), &self.nat, "NAT gateway"),
            (route.gateway_id.as_ref(), &self.vpn, "VPN gateway"),
            (route.gateway_id.as_ref(), &self.internet, "Internet gateway"),
            (route.transit_gateway_id.as_ref(), &self.transit, "Transit gateway"),
        ];

        probes.into_iter().find_map(|(id, index, kind)| {
            id.and_then(|id| index.get(id)).map(|node| (*node, kind))
        })
    }
}

/// Build the subnet graph for one VPC
pub fn resolve_subnets(inventory: &SubnetInventory) -> TopologyGraph {
    let mut graph = TopologyGraph::new();
    let mut index = GatewayIndex::default();

    for igw in &inventory.internet_gateways {
        let node = graph.add_node(
            Node::new(NodeKind::InternetGateway, &igw.internet_gateway_id, &igw.internet_gateway_id)
                .with_tags(tag_map(&igw.tags)),
        );
        index.internet.insert(igw.internet_gateway_id.clone(), node);
    }

    for nat in &inventory.nat_gateways {
        let node = graph.add_node(
            Node::new(NodeKind::NatGateway, &nat.nat_gateway_id, &nat.nat_gateway_id)
                .with_tags(tag_map(&nat.tags)),
        );
        index.nat.insert(nat.nat_gateway_id.clone(), node);
    }

    for vgw in &inventory.vpn_gateways {
        let node = graph.add_node(
            Node::new(NodeKind::VpnGateway, &vgw.vpn_gateway_id, &vgw.vpn_gateway_id)
                .with_tags(tag_map(&vgw.tags)),
        );
        index.vpn.insert(vgw.vpn_gateway_id.clone(), node);
    }

    // Several attachments may share one transit gateway
    for attachment in &inventory.transit_attachments {
        let tgw = &attachment.transit_gateway_id;
        let node = graph.add_node(Node::new(NodeKind::TransitGateway, tgw, tgw));
        index.transit.insert(tgw.clone(), node);
    }

    let vpc_group = graph.add_group(&inventory.vpc_id, None);

    for subnet in &inventory.subnets {
        let label = name_tag(&subnet.tags).unwrap_or(&subnet.subnet_id);
        let group = graph.add_group(label, Some(vpc_group));
        let node = graph.add_node(
            Node::new(
                NodeKind::Subnet,
                &subnet.subnet_id,
                format!("{}\n{}", subnet.display_cidr(), subnet.availability_zone),
            )
            .with_tags(tag_map(&subnet.tags))
            .in_group(group),
        );

        for table in &inventory.route_tables {
            if !table.is_associated_with(&subnet.subnet_id) {
                continue;
            }
            debug!("{} uses route table {}", subnet.subnet_id, table.route_table_id);

            for route in &table.routes {
                match index.resolve(route) {
                    Some((target, kind)) => {
                        debug!(
                            "{} routes via {} {}",
                            subnet.subnet_id,
                            kind,
                            graph.node(target).external_id
                        );
                        graph.add_edge(node, target, EdgeKind::Route, None);
                    }
                    None => debug!(
                        "{}: route to {:?} has no known gateway target",
                        table.route_table_id, route.destination_cidr_block
                    ),
                }
            }
        }
    }

    graph
}
