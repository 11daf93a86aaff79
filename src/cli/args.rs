//! CLI argument definitions using clap derive

use crate::config::Config;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// awsmap - AWS network topology diagrams
///
/// Maps VPCs, peering, subnets and their route targets (and docker-compose
/// files) into Graphviz diagrams. Remote responses are cached on disk.
#[derive(Parser, Debug)]
#[command(name = "awsmap")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Resolve graphs without writing any diagram
    #[arg(short = 'd', long = "dryrun", global = true)]
    pub dry_run: bool,

    /// AWS credential profile
    #[arg(short, long, global = true, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    /// AWS region
    #[arg(short, long, global = true, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Configuration file path
    #[arg(short, long, global = true, env = "AWSMAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Response cache directory
    #[arg(long, global = true, env = "AWSMAP_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Directory diagrams are written under
    #[arg(short, long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Diagram format
    #[arg(long, global = true, value_enum)]
    pub format: Option<DiagramFormat>,
}

impl Cli {
    /// Fold command-line overrides into a loaded configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(ref profile) = self.profile {
            config.aws.profile = profile.clone();
        }
        if let Some(ref region) = self.region {
            config.aws.region = region.clone();
        }
        if let Some(ref dir) = self.cache_dir {
            config.cache.dir = Some(dir.clone());
        }
        if let Some(ref dir) = self.output_dir {
            config.render.output_dir = dir.clone();
        }
        if let Some(format) = self.format {
            config.render.format = format.as_str().to_string();
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Map VPCs and their peering connections
    Vpcs,

    /// Map subnets and route targets, one diagram per VPC
    Subnets(SubnetsArgs),

    /// Map VPCs, then subnets for every VPC
    Network,

    /// Map services, volumes and ports of a docker-compose file
    DockerCompose(DockerComposeArgs),

    /// Delete every cached response
    ClearCache(ClearCacheArgs),

    /// Inspect the response cache
    Cache(CacheArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

#[derive(Parser, Debug)]
pub struct SubnetsArgs {
    /// Only map this VPC
    #[arg(long)]
    pub vpc_id: Option<String>,
}

#[derive(Parser, Debug)]
pub struct DockerComposeArgs {
    /// Path to the compose file
    pub file: PathBuf,
}

#[derive(Parser, Debug)]
pub struct ClearCacheArgs {
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(Parser, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List cached responses
    List {
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Print the cache directory
    Path,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Print the configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

/// Diagram output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DiagramFormat {
    Png,
    Svg,
    Pdf,
    Dot,
}

impl DiagramFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
            Self::Pdf => "pdf",
            Self::Dot => "dot",
        }
    }
}

/// Listing format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Plain,
}
