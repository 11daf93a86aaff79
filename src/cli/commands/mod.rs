//! CLI command implementations

pub mod cache;
pub mod clear_cache;
pub mod config;
pub mod docker_compose;
pub mod network;
pub mod subnets;
pub mod vpcs;

pub use cache::execute as cache;
pub use clear_cache::execute as clear_cache;
pub use config::execute as config;
pub use docker_compose::execute as docker_compose;
pub use network::execute as network;
pub use subnets::execute as subnets;
pub use vpcs::execute as vpcs;

use crate::aws::{resolve_account_id, AwsCli, Fetcher, ResourceClient, Scope};
use crate::cache::DiskCache;
use crate::config::{Config, ConfigManager};
use crate::error::AwsmapResult;
use crate::render::{create_renderer, Renderer};
use crate::ui::{self, UiContext};
use std::path::{Path, PathBuf};

/// Collaborators shared by the mapping commands
pub struct MapSession {
    cache: DiskCache,
    client: Box<dyn ResourceClient>,
    renderer: Box<dyn Renderer>,
    output_dir: PathBuf,
    profile: String,
    region: String,
    max_concurrency: usize,
    ui: UiContext,
}

impl MapSession {
    /// Wire the AWS CLI, disk cache and renderer from configuration
    pub fn from_config(config: &Config, dry_run: bool) -> AwsmapResult<Self> {
        Ok(Self::new(
            config,
            Box::new(AwsCli::from_config(&config.aws)),
            create_renderer(&config.render, dry_run)?,
            UiContext::detect().with_dry_run(dry_run),
        ))
    }

    pub fn new(
        config: &Config,
        client: Box<dyn ResourceClient>,
        renderer: Box<dyn Renderer>,
        ui: UiContext,
    ) -> Self {
        Self {
            cache: DiskCache::new(ConfigManager::cache_dir(config)),
            client,
            renderer,
            output_dir: config.render.output_dir.clone(),
            profile: config.aws.profile.clone(),
            region: config.aws.region.clone(),
            max_concurrency: config.aws.max_concurrency,
            ui,
        }
    }

    pub fn ui(&self) -> &UiContext {
        &self.ui
    }

    pub fn renderer(&self) -> &dyn Renderer {
        self.renderer.as_ref()
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// VPCs compiled at once; also bounds remote queries in flight
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency.max(1)
    }

    /// Resolve the account behind the profile and open fetchers for it
    pub async fn fetcher(&self) -> AwsmapResult<Fetcher<'_>> {
        let account_id =
            resolve_account_id(&self.cache, self.client.as_ref(), &self.profile, &self.region)
                .await?;

        Ok(Fetcher::new(
            &self.cache,
            self.client.as_ref(),
            Scope {
                profile: self.profile.clone(),
                region: self.region.clone(),
                account_id,
            },
        )
        .with_max_concurrency(self.max_concurrency()))
    }

    /// `<output_dir>/<account_id>`
    pub fn account_dir(&self, account_id: &str) -> PathBuf {
        self.output_dir.join(account_id)
    }

    /// Report a rendered artifact (nothing to report on a dry run)
    fn report(&self, what: &str, written: Option<PathBuf>) {
        if let Some(path) = written {
            ui::step_ok_detail(&self.ui, what, &path.display().to_string());
        }
    }
}
