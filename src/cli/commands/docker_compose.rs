//! Docker-compose command - map services, volumes and published ports

use super::MapSession;
use crate::cli::args::DockerComposeArgs;
use crate::error::AwsmapResult;
use crate::topology::{resolve_compose, ComposeManifest, NodeKind};
use crate::ui;
use std::path::{Path, PathBuf};

/// Execute the docker-compose command
pub async fn execute(args: DockerComposeArgs, session: &MapSession) -> AwsmapResult<()> {
    ui::intro(session.ui(), "awsmap docker-compose");
    map_compose(session, &args.file).await?;
    ui::outro_success(session.ui(), "Compose map complete");
    Ok(())
}

/// Render `<output>/dc/<file stem>`, titled with the file name
pub(crate) async fn map_compose(session: &MapSession, file: &Path) -> AwsmapResult<Option<PathBuf>> {
    let manifest = ComposeManifest::load(file).await?;
    let graph = resolve_compose(&manifest)?;

    ui::step_info(
        session.ui(),
        &format!(
            "{} service(s), {} volume(s)",
            graph.count_kind(NodeKind::Service),
            graph.count_kind(NodeKind::Volume)
        ),
    );

    let title = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string());
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "docker-compose".to_string());

    let output = session.output_dir().join("dc").join(stem);
    let written = session.renderer().render(&graph, &title, &output).await?;
    session.report("Compose diagram", written.clone());
    Ok(written)
}
