//! Typed views of EC2 describe responses
//!
//! Field names follow the AWS JSON envelopes. Unknown fields are ignored and
//! missing `Tags` decode as empty, so sparse responses still parse.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A resource tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

/// Look up the `Name` tag
pub fn name_tag(tags: &[Tag]) -> Option<&str> {
    tags.iter()
        .find(|t| t.key == "Name")
        .map(|t| t.value.as_str())
}

/// Collapse a tag list into a map; later duplicates win
pub fn tag_map(tags: &[Tag]) -> BTreeMap<String, String> {
    tags.iter()
        .map(|t| (t.key.clone(), t.value.clone()))
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Vpc {
    pub vpc_id: String,
    pub cidr_block: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// One side of a peering connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VpcInfo {
    pub vpc_id: String,
    #[serde(default)]
    pub cidr_block: Option<String>,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PeeringConnection {
    pub vpc_peering_connection_id: String,
    pub accepter_vpc_info: VpcInfo,
    pub requester_vpc_info: VpcInfo,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Subnet {
    pub subnet_id: String,
    pub vpc_id: String,
    /// Absent on IPv6-only subnets
    #[serde(default)]
    pub cidr_block: Option<String>,
    #[serde(default)]
    pub ipv6_cidr_block_association_set: Vec<Ipv6CidrAssociation>,
    pub availability_zone: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Subnet {
    /// IPv4 CIDR, else the first IPv6 CIDR, else the subnet id
    pub fn display_cidr(&self) -> &str {
        self.cidr_block
            .as_deref()
            .or_else(|| {
                self.ipv6_cidr_block_association_set
                    .first()
                    .map(|a| a.ipv6_cidr_block.as_str())
            })
            .unwrap_or(&self.subnet_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Ipv6CidrAssociation {
    pub ipv6_cidr_block: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InternetGateway {
    pub internet_gateway_id: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NatGateway {
    pub nat_gateway_id: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VpnGateway {
    pub vpn_gateway_id: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TransitGatewayAttachment {
    pub transit_gateway_attachment_id: String,
    pub transit_gateway_id: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RouteTable {
    pub route_table_id: String,
    #[serde(default)]
    pub associations: Vec<Association>,
    #[serde(default)]
    pub routes: Vec<Route>,
}

impl RouteTable {
    /// Whether any association of this table points at the subnet
    pub fn is_associated_with(&self, subnet_id: &str) -> bool {
        self.associations
            .iter()
            .any(|a| a.subnet_id.as_deref() == Some(subnet_id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Association {
    #[serde(default)]
    pub subnet_id: Option<String>,
    #[serde(default)]
    pub main: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Route {
    #[serde(default)]
    pub destination_cidr_block: Option<String>,
    #[serde(default)]
    pub nat_gateway_id: Option<String>,
    #[serde(default)]
    pub gateway_id: Option<String>,
    #[serde(default)]
    pub transit_gateway_id: Option<String>,
}

/// A VPC paired with the peering connections it accepts
#[derive(Debug, Clone)]
pub struct VpcInventory {
    pub vpc: Vpc,
    pub peering_connections: Vec<PeeringConnection>,
}

/// Everything fetched for one VPC's subnet diagram
#[derive(Debug, Clone, Default)]
pub struct SubnetInventory {
    pub vpc_id: String,
    pub internet_gateways: Vec<InternetGateway>,
    pub nat_gateways: Vec<NatGateway>,
    pub vpn_gateways: Vec<VpnGateway>,
    pub transit_attachments: Vec<TransitGatewayAttachment>,
    pub subnets: Vec<Subnet>,
    pub route_tables: Vec<RouteTable>,
}
