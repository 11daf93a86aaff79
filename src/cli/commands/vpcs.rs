//! Vpcs command - map VPCs and their peering connections

use super::MapSession;
use crate::aws::Fetcher;
use crate::error::AwsmapResult;
use crate::topology::{resolve_vpcs, NodeKind};
use crate::ui::{self, TaskSpinner};
use std::path::PathBuf;

/// Execute the vpcs command
pub async fn execute(session: &MapSession) -> AwsmapResult<()> {
    ui::intro(session.ui(), "awsmap vpcs");
    let fetcher = session.fetcher().await?;
    map_vpcs(session, &fetcher).await?;
    ui::outro_success(session.ui(), "VPC map complete");
    Ok(())
}

/// Fetch, resolve and render `<output>/<account>/vpcs`
pub(crate) async fn map_vpcs(
    session: &MapSession,
    fetcher: &Fetcher<'_>,
) -> AwsmapResult<Option<PathBuf>> {
    let account_id = &fetcher.scope().account_id;
    let mut spinner = TaskSpinner::new(session.ui());
    spinner.start(&format!("Fetching VPCs for account {}...", account_id));

    let fetched = tokio::try_join!(fetcher.vpc_inventory(), fetcher.account_name());
    let (inventory, account_name) = match fetched {
        Ok(found) => found,
        Err(e) => {
            spinner.stop_error("Failed to fetch VPCs");
            return Err(e);
        }
    };

    let graph = resolve_vpcs(&inventory);
    spinner.stop(&format!(
        "{} VPC(s) in {}, {} peered",
        graph.count_kind(NodeKind::Vpc),
        account_name,
        graph.edge_count()
    ));

    let output = session.account_dir(account_id).join("vpcs");
    let written = session.renderer().render(&graph, &account_name, &output).await?;
    session.report("VPC diagram", written.clone());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::testing;
    use tempfile::TempDir;

    #[tokio::test]
    async fn renders_account_vpc_diagram() {
        let temp = TempDir::new().unwrap();
        let client = testing::account();
        let session = testing::session(&temp, &client);
        let fetcher = session.fetcher().await.unwrap();

        let written = map_vpcs(&session, &fetcher).await.unwrap().unwrap();

        assert_eq!(
            written,
            temp.path().join("images/123456789012/vpcs.dot")
        );
        let dot = std::fs::read_to_string(&written).unwrap();
        assert!(dot.contains("digraph \"acme-prod\""));
        assert!(dot.contains("label=\"core\";"));
        assert!(dot.contains("10.1.0.0/16"));
    }

    #[tokio::test]
    async fn second_run_is_served_from_cache() {
        let temp = TempDir::new().unwrap();
        let client = testing::account();
        let session = testing::session(&temp, &client);

        let fetcher = session.fetcher().await.unwrap();
        map_vpcs(&session, &fetcher).await.unwrap();
        let first = client.calls().len();

        let fetcher = session.fetcher().await.unwrap();
        map_vpcs(&session, &fetcher).await.unwrap();
        assert_eq!(client.calls().len(), first);
    }
}
