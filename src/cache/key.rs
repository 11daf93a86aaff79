//! Structured cache keys
//!
//! A key is `{namespace, region, topic}`. Its canonical encoding is
//! `<namespace>/<region>_<topic>`, where the namespace (normally the account
//! id) doubles as the on-disk subdirectory.

use crate::error::{AwsmapError, AwsmapResult};
use std::fmt;
use std::path::PathBuf;

/// Namespace holding per-profile caller identity lookups
const PROFILES_NAMESPACE: &str = "profiles";

/// Region segment for global (non-regional) services
const GLOBAL_REGION: &str = "global";

/// The resource collection a cache entry holds
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    Vpcs,
    PeeringConnections { vpc_id: String },
    InternetGateways { vpc_id: String },
    NatGateways { vpc_id: String },
    VpnGateways { vpc_id: String },
    TransitGatewayAttachments { vpc_id: String },
    Subnets { vpc_id: String },
    RouteTables { vpc_id: String },
    AccountAliases,
    CallerIdentity { profile: String },
}

impl Topic {
    /// The scoping id embedded in the topic, if any
    fn scope(&self) -> Option<&str> {
        match self {
            Self::Vpcs | Self::AccountAliases => None,
            Self::CallerIdentity { profile } => Some(profile),
            Self::PeeringConnections { vpc_id }
            | Self::InternetGateways { vpc_id }
            | Self::NatGateways { vpc_id }
            | Self::VpnGateways { vpc_id }
            | Self::TransitGatewayAttachments { vpc_id }
            | Self::Subnets { vpc_id }
            | Self::RouteTables { vpc_id } => Some(vpc_id),
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vpcs => write!(f, "vpcs"),
            Self::PeeringConnections { vpc_id } => write!(f, "vpc_peer_connections_{}", vpc_id),
            Self::InternetGateways { vpc_id } => write!(f, "{}_igws", vpc_id),
            Self::NatGateways { vpc_id } => write!(f, "{}_nat_gws", vpc_id),
            Self::VpnGateways { vpc_id } => write!(f, "{}_vpn_gateways", vpc_id),
            Self::TransitGatewayAttachments { vpc_id } => write!(f, "{}_transit_gateways", vpc_id),
            Self::Subnets { vpc_id } => write!(f, "{}_subnets", vpc_id),
            Self::RouteTables { vpc_id } => write!(f, "{}_route_tables", vpc_id),
            Self::AccountAliases => write!(f, "account_aliases"),
            Self::CallerIdentity { profile } => write!(f, "{}_caller_identity", profile),
        }
    }
}

/// Key addressing one cached response envelope
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    namespace: String,
    region: String,
    topic: Topic,
}

impl CacheKey {
    /// Build a key, rejecting segments that could escape the cache root or
    /// make two distinct keys encode to the same path.
    pub fn new(
        namespace: impl Into<String>,
        region: impl Into<String>,
        topic: Topic,
    ) -> AwsmapResult<Self> {
        let namespace = namespace.into();
        let region = region.into();

        validate_segment(&namespace, true)?;
        validate_segment(&region, true)?;
        if let Some(scope) = topic.scope() {
            // Profile names may carry underscores; the fixed suffix keeps them unambiguous
            let strict = !matches!(topic, Topic::CallerIdentity { .. });
            validate_segment(scope, strict)?;
        }

        Ok(Self {
            namespace,
            region,
            topic,
        })
    }

    /// Key for the account id behind a credential profile
    pub fn caller_identity(profile: &str) -> AwsmapResult<Self> {
        Self::new(
            PROFILES_NAMESPACE,
            GLOBAL_REGION,
            Topic::CallerIdentity {
                profile: profile.to_string(),
            },
        )
    }

    /// Key for the IAM account aliases of an account
    pub fn account_aliases(account_id: &str) -> AwsmapResult<Self> {
        Self::new(account_id, GLOBAL_REGION, Topic::AccountAliases)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// File name of the entry inside its namespace directory
    pub fn file_name(&self) -> String {
        format!("{}_{}.json", self.region, self.topic)
    }

    /// Entry path relative to the cache root
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(&self.namespace).join(self.file_name())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}_{}", self.namespace, self.region, self.topic)
    }
}

fn validate_segment(segment: &str, forbid_underscore: bool) -> AwsmapResult<()> {
    let reason = if segment.is_empty() {
        Some("must not be empty")
    } else if segment == "." || segment == ".." {
        Some("must not be a relative path component")
    } else if segment.contains(['/', '\\', '\0']) {
        Some("must not contain path separators")
    } else if forbid_underscore && segment.contains('_') {
        Some("must not contain '_'")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(AwsmapError::CacheKeyInvalid {
            segment: segment.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}
