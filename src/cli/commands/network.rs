//! Network command - VPC diagram followed by every subnet diagram

use super::subnets::map_subnets;
use super::vpcs::map_vpcs;
use super::MapSession;
use crate::error::AwsmapResult;
use crate::ui;

/// Execute the network command
pub async fn execute(session: &MapSession) -> AwsmapResult<()> {
    ui::intro(session.ui(), "awsmap network");
    let fetcher = session.fetcher().await?;

    map_vpcs(session, &fetcher).await?;
    ui::section(session.ui(), "Subnets");
    let subnets = map_subnets(session, &fetcher, None).await?;

    ui::outro_success(
        session.ui(),
        &format!("Network map complete ({} subnet diagram(s))", subnets.len()),
    );
    Ok(())
}
