//! Configuration schema for awsmap
//!
//! Configuration is stored at `~/.config/awsmap/config.toml`

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// AWS access settings
    pub aws: AwsConfig,

    /// Response cache settings
    pub cache: CacheConfig,

    /// Diagram output settings
    pub render: RenderConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// AWS access settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    /// Named profile from ~/.aws/config
    pub profile: String,

    /// Region to inventory
    pub region: String,

    /// Path or name of the AWS CLI binary
    pub cli_path: String,

    /// Items requested per page (--max-items)
    pub page_size: u32,

    /// Upper bound on remote queries in flight at once
    pub max_concurrency: usize,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            profile: "default".to_string(),
            region: "us-east-1".to_string(),
            cli_path: "aws".to_string(),
            page_size: 1000,
            max_concurrency: 8,
        }
    }
}

/// Response cache settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root (defaults to the platform cache dir)
    pub dir: Option<PathBuf>,
}

/// Diagram output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Directory that receives rendered diagrams
    pub output_dir: PathBuf,

    /// Output format: png, svg, pdf or dot
    pub format: String,

    /// Graphviz binary used to rasterize DOT files
    pub graphviz_path: String,

    /// Extra graph attributes passed through to Graphviz
    pub graph_attrs: BTreeMap<String, String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let mut graph_attrs = BTreeMap::new();
        graph_attrs.insert("fontsize".to_string(), "12".to_string());
        graph_attrs.insert("rankdir".to_string(), "LR".to_string());
        graph_attrs.insert("splines".to_string(), "spline".to_string());

        Self {
            output_dir: PathBuf::from("images"),
            format: "png".to_string(),
            graphviz_path: "dot".to_string(),
            graph_attrs,
        }
    }
}
