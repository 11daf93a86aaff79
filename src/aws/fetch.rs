//! Cache-aside topology fetchers
//!
//! Every fetcher builds a structured [`CacheKey`], serves the stored
//! envelope on a hit, and otherwise queries the client and stores the full
//! response before extracting the collection it needs.

use crate::aws::client::{filter, Filters, ResourceClient};
use crate::aws::model::{
    InternetGateway, NatGateway, PeeringConnection, RouteTable, Subnet, SubnetInventory,
    TransitGatewayAttachment, Vpc, VpcInventory, VpnGateway,
};
use crate::cache::{CacheKey, DiskCache, Topic};
use crate::error::{AwsmapError, AwsmapResult};
use futures_util::future::try_join_all;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info};

/// Remote queries allowed in flight when no limit is configured
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Account, region and credential profile a fetch runs under
#[derive(Debug, Clone)]
pub struct Scope {
    pub profile: String,
    pub region: String,
    pub account_id: String,
}

/// Cache-aside fetchers for one scope
pub struct Fetcher<'a> {
    cache: &'a DiskCache,
    client: &'a dyn ResourceClient,
    scope: Scope,
    limit: Arc<Semaphore>,
}

/// One cacheable remote query
struct Request<'r> {
    key: CacheKey,
    service: &'r str,
    operation: &'r str,
    filters: Filters,
    /// Top-level field every valid response carries
    field: &'r str,
}

/// Serve a request from the cache, or query and store the full envelope.
///
/// Remote calls hold a permit from `limit` when one is given. An envelope
/// without `request.field` is rejected before it reaches the cache.
async fn cached_envelope(
    cache: &DiskCache,
    client: &dyn ResourceClient,
    profile: &str,
    region: &str,
    request: Request<'_>,
    limit: Option<&Semaphore>,
) -> AwsmapResult<Value> {
    if let Some(envelope) = cache.get(&request.key).await? {
        return Ok(envelope);
    }

    let _permit = match limit {
        Some(limit) => Some(limit.acquire().await.map_err(|_| {
            AwsmapError::remote_call(request.operation, "query limiter closed")
        })?),
        None => None,
    };

    info!("Querying {} {} ({})", request.service, request.operation, request.key);
    let handle = client.query(request.service, profile, region);
    let raw = handle.describe(request.operation, &request.filters).await?;

    if raw.get(request.field).is_none() {
        return Err(AwsmapError::MalformedResponse {
            operation: format!("{} {}", request.service, request.operation),
            field: request.field.to_string(),
        });
    }

    cache.put(&request.key, &raw).await
}

/// Pull a named collection out of a response envelope
fn extract<T: DeserializeOwned>(envelope: &Value, field: &str, operation: &str) -> AwsmapResult<Vec<T>> {
    let collection = envelope
        .get(field)
        .ok_or_else(|| AwsmapError::MalformedResponse {
            operation: operation.to_string(),
            field: field.to_string(),
        })?;

    Ok(serde_json::from_value(collection.clone())?)
}

/// Resolve the account id behind a credential profile via caller identity
pub async fn resolve_account_id(
    cache: &DiskCache,
    client: &dyn ResourceClient,
    profile: &str,
    region: &str,
) -> AwsmapResult<String> {
    let request = Request {
        key: CacheKey::caller_identity(profile)?,
        service: "sts",
        operation: "get-caller-identity",
        filters: Filters::new(),
        field: "Account",
    };
    let envelope = cached_envelope(cache, client, profile, region, request, None).await?;

    let account = envelope
        .get("Account")
        .and_then(Value::as_str)
        .ok_or_else(|| AwsmapError::MalformedResponse {
            operation: "sts get-caller-identity".to_string(),
            field: "Account".to_string(),
        })?;

    debug!("Profile {} resolves to account {}", profile, account);
    Ok(account.to_string())
}

impl<'a> Fetcher<'a> {
    pub fn new(cache: &'a DiskCache, client: &'a dyn ResourceClient, scope: Scope) -> Self {
        Self {
            cache,
            client,
            scope,
            limit: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENCY)),
        }
    }

    /// Bound the remote queries this fetcher keeps in flight
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.limit = Arc::new(Semaphore::new(max.max(1)));
        self
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    fn key(&self, topic: Topic) -> AwsmapResult<CacheKey> {
        CacheKey::new(&self.scope.account_id, &self.scope.region, topic)
    }

    async fn collection<T: DeserializeOwned>(
        &self,
        topic: Topic,
        operation: &str,
        filters: Filters,
        field: &str,
    ) -> AwsmapResult<Vec<T>> {
        let request = Request {
            key: self.key(topic)?,
            service: "ec2",
            operation,
            filters,
            field,
        };
        let envelope = cached_envelope(
            self.cache,
            self.client,
            &self.scope.profile,
            &self.scope.region,
            request,
            Some(&self.limit),
        )
        .await?;

        extract(&envelope, field, operation)
    }

    pub async fn vpcs(&self) -> AwsmapResult<Vec<Vpc>> {
        self.collection(Topic::Vpcs, "describe-vpcs", Filters::new(), "Vpcs")
            .await
    }

    /// Peering connections in which `vpc_id` is the accepter
    pub async fn peering_connections(&self, vpc_id: &str) -> AwsmapResult<Vec<PeeringConnection>> {
        self.collection(
            Topic::PeeringConnections {
                vpc_id: vpc_id.to_string(),
            },
            "describe-vpc-peering-connections",
            filter("accepter-vpc-info.vpc-id", vpc_id),
            "VpcPeeringConnections",
        )
        .await
    }

    pub async fn internet_gateways(&self, vpc_id: &str) -> AwsmapResult<Vec<InternetGateway>> {
        self.collection(
            Topic::InternetGateways {
                vpc_id: vpc_id.to_string(),
            },
            "describe-internet-gateways",
            filter("attachment.vpc-id", vpc_id),
            "InternetGateways",
        )
        .await
    }

    pub async fn nat_gateways(&self, vpc_id: &str) -> AwsmapResult<Vec<NatGateway>> {
        self.collection(
            Topic::NatGateways {
                vpc_id: vpc_id.to_string(),
            },
            "describe-nat-gateways",
            filter("vpc-id", vpc_id),
            "NatGateways",
        )
        .await
    }

    pub async fn vpn_gateways(&self, vpc_id: &str) -> AwsmapResult<Vec<VpnGateway>> {
        self.collection(
            Topic::VpnGateways {
                vpc_id: vpc_id.to_string(),
            },
            "describe-vpn-gateways",
            filter("attachment.vpc-id", vpc_id),
            "VpnGateways",
        )
        .await
    }

    pub async fn transit_gateway_attachments(
        &self,
        vpc_id: &str,
    ) -> AwsmapResult<Vec<TransitGatewayAttachment>> {
        self.collection(
            Topic::TransitGatewayAttachments {
                vpc_id: vpc_id.to_string(),
            },
            "describe-transit-gateway-vpc-attachments",
            filter("vpc-id", vpc_id),
            "TransitGatewayVpcAttachments",
        )
        .await
    }

    pub async fn subnets(&self, vpc_id: &str) -> AwsmapResult<Vec<Subnet>> {
        self.collection(
            Topic::Subnets {
                vpc_id: vpc_id.to_string(),
            },
            "describe-subnets",
            filter("vpc-id", vpc_id),
            "Subnets",
        )
        .await
    }

    pub async fn route_tables(&self, vpc_id: &str) -> AwsmapResult<Vec<RouteTable>> {
        self.collection(
            Topic::RouteTables {
                vpc_id: vpc_id.to_string(),
            },
            "describe-route-tables",
            filter("vpc-id", vpc_id),
            "RouteTables",
        )
        .await
    }

    /// Human-readable account name: the first IAM alias, or the account id
    pub async fn account_name(&self) -> AwsmapResult<String> {
        let request = Request {
            key: CacheKey::account_aliases(&self.scope.account_id)?,
            service: "iam",
            operation: "list-account-aliases",
            filters: Filters::new(),
            field: "AccountAliases",
        };
        let envelope = cached_envelope(
            self.cache,
            self.client,
            &self.scope.profile,
            &self.scope.region,
            request,
            Some(&self.limit),
        )
        .await?;

        let aliases: Vec<String> = extract(&envelope, "AccountAliases", "list-account-aliases")?;
        Ok(aliases
            .into_iter()
            .next()
            .unwrap_or_else(|| self.scope.account_id.clone()))
    }

    /// All VPCs with their accepted peering connections, in API order
    pub async fn vpc_inventory(&self) -> AwsmapResult<Vec<VpcInventory>> {
        let vpcs = self.vpcs().await?;
        let peerings = try_join_all(vpcs.iter().map(|v| self.peering_connections(&v.vpc_id))).await?;

        Ok(vpcs
            .into_iter()
            .zip(peerings)
            .map(|(vpc, peering_connections)| VpcInventory {
                vpc,
                peering_connections,
            })
            .collect())
    }

    /// Fetch everything a subnet diagram needs; the six queries run concurrently
    pub async fn subnet_inventory(&self, vpc_id: &str) -> AwsmapResult<SubnetInventory> {
        let (internet_gateways, nat_gateways, vpn_gateways, transit_attachments, subnets, route_tables) = tokio::try_join!(
            self.internet_gateways(vpc_id),
            self.nat_gateways(vpc_id),
            self.vpn_gateways(vpc_id),
            self.transit_gateway_attachments(vpc_id),
            self.subnets(vpc_id),
            self.route_tables(vpc_id),
        )?;

        Ok(SubnetInventory {
            vpc_id: vpc_id.to_string(),
            internet_gateways,
            nat_gateways,
            vpn_gateways,
            transit_attachments,
            subnets,
            route_tables,
        })
    }
}
