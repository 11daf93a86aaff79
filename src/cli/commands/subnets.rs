//! Subnets command - one subnet diagram per VPC

use super::MapSession;
use crate::aws::Fetcher;
use crate::cli::args::SubnetsArgs;
use crate::error::{AwsmapError, AwsmapResult};
use crate::topology::resolve_subnets;
use crate::ui::{self, MapProgress};
use futures_util::stream::{self, StreamExt, TryStreamExt};
use std::path::PathBuf;
use tracing::debug;

/// Execute the subnets command
pub async fn execute(args: SubnetsArgs, session: &MapSession) -> AwsmapResult<()> {
    ui::intro(session.ui(), "awsmap subnets");
    let fetcher = session.fetcher().await?;
    let written = map_subnets(session, &fetcher, args.vpc_id.as_deref()).await?;
    ui::outro_success(
        session.ui(),
        &format!("Subnet map complete ({} diagram(s))", written.len()),
    );
    Ok(())
}

/// Render `<output>/<account>/subnets_<vpc>` for every VPC, or only `only`.
///
/// Up to `aws.max_concurrency` VPCs compile at once, in VPC order; the first
/// failure aborts the run.
pub(crate) async fn map_subnets(
    session: &MapSession,
    fetcher: &Fetcher<'_>,
    only: Option<&str>,
) -> AwsmapResult<Vec<PathBuf>> {
    let vpcs = fetcher.vpcs().await?;
    let vpc_ids: Vec<&str> = vpcs
        .iter()
        .map(|v| v.vpc_id.as_str())
        .filter(|id| only.map_or(true, |wanted| wanted == *id))
        .collect();

    if let Some(wanted) = only {
        if vpc_ids.is_empty() {
            return Err(AwsmapError::User(format!(
                "VPC {} not found in account {} ({})",
                wanted,
                fetcher.scope().account_id,
                fetcher.scope().region
            )));
        }
    }

    if vpc_ids.is_empty() {
        ui::step_warn_hint(session.ui(), "No VPCs found", "nothing to map");
        return Ok(Vec::new());
    }

    let dir = session.account_dir(&fetcher.scope().account_id);
    let progress = MapProgress::new(session.ui(), vpc_ids.len());

    let compiled: AwsmapResult<Vec<Option<PathBuf>>> = stream::iter(vpc_ids.iter().map(|vpc_id| {
        let output = dir.join(format!("subnets_{}", vpc_id));
        let progress = &progress;
        async move {
            let inventory = fetcher.subnet_inventory(vpc_id).await?;
            let graph = resolve_subnets(&inventory);
            debug!("{}: {}", vpc_id, graph);
            let written = session.renderer().render(&graph, vpc_id, &output).await?;
            progress.vpc_done(vpc_id);
            Ok::<_, AwsmapError>(written)
        }
    }))
    .buffered(session.max_concurrency())
    .try_collect()
    .await;
    progress.finish();

    let written: Vec<PathBuf> = compiled?.into_iter().flatten().collect();
    for path in &written {
        session.report("Subnet diagram", Some(path.clone()));
    }
    Ok(written)
}
