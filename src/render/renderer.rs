//! Diagram renderers
//!
//! The Graphviz renderer writes `<output>.dot` and, unless the format is
//! `dot`, rasterizes it with the `dot` binary. A SHA-256 fingerprint of the
//! DOT text is kept next to the image so unchanged diagrams are not redrawn.

use crate::config::schema::RenderConfig;
use crate::error::{AwsmapError, AwsmapResult};
use crate::render::canvas::{draw, Canvas, GraphStyle};
use crate::topology::TopologyGraph;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info};

/// Image format produced by a renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Svg,
    Pdf,
    Dot,
}

impl ImageFormat {
    pub fn parse(value: &str) -> AwsmapResult<Self> {
        match value.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "svg" => Ok(Self::Svg),
            "pdf" => Ok(Self::Pdf),
            "dot" => Ok(Self::Dot),
            other => Err(AwsmapError::User(format!(
                "Unsupported output format '{}' (expected png, svg, pdf or dot)",
                other
            ))),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
            Self::Pdf => "pdf",
            Self::Dot => "dot",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Draws a resolved graph to an artifact
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Render `graph` under `title` to `output` (extension is appended).
    ///
    /// Returns the written artifact, or `None` when nothing was written.
    async fn render(
        &self,
        graph: &TopologyGraph,
        title: &str,
        output: &Path,
    ) -> AwsmapResult<Option<PathBuf>>;
}

/// Renderer backed by Graphviz
#[derive(Debug, Clone)]
pub struct GraphvizRenderer {
    binary: String,
    format: ImageFormat,
    style: GraphStyle,
}

impl GraphvizRenderer {
    pub fn new(binary: impl Into<String>, format: ImageFormat, style: GraphStyle) -> Self {
        Self {
            binary: binary.into(),
            format,
            style,
        }
    }

    /// Open a drawing context for one diagram
    pub fn canvas(&self, title: &str) -> Canvas {
        Canvas::new(title, self.style.clone())
    }

    /// Write a finished canvas to disk, invoking Graphviz when needed
    pub async fn finish(&self, canvas: Canvas, output: &Path) -> AwsmapResult<PathBuf> {
        let dot = canvas.into_dot();
        let fingerprint = hex::encode(Sha256::digest(dot.as_bytes()));

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AwsmapError::io(format!("creating {}", parent.display()), e))?;
        }

        let dot_path = with_suffix(output, "dot");
        fs::write(&dot_path, &dot)
            .await
            .map_err(|e| AwsmapError::io(format!("writing {}", dot_path.display()), e))?;

        if self.format == ImageFormat::Dot {
            return Ok(dot_path);
        }

        let image = with_suffix(output, self.format.extension());
        let stamp = with_suffix(output, "sha256");
        let previous = fs::read_to_string(&stamp).await.ok();
        if image.exists() && previous.as_deref().map(str::trim) == Some(fingerprint.as_str()) {
            debug!("{} unchanged, skipping graphviz", image.display());
            return Ok(image);
        }

        self.rasterize(&dot_path, &image).await?;

        fs::write(&stamp, &fingerprint)
            .await
            .map_err(|e| AwsmapError::io(format!("writing {}", stamp.display()), e))?;

        Ok(image)
    }

    async fn rasterize(&self, dot_path: &Path, image: &Path) -> AwsmapResult<()> {
        let format_arg = format!("-T{}", self.format);
        debug!("Executing: {} {} {}", self.binary, format_arg, dot_path.display());

        let output = Command::new(&self.binary)
            .arg(&format_arg)
            .arg("-o")
            .arg(image)
            .arg(dot_path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    AwsmapError::GraphvizNotFound {
                        binary: self.binary.clone(),
                    }
                } else {
                    AwsmapError::command_failed(&self.binary, e)
                }
            })?;

        if !output.status.success() {
            return Err(AwsmapError::RenderFailed {
                command: format!("{} {} {}", self.binary, format_arg, dot_path.display()),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl Renderer for GraphvizRenderer {
    async fn render(
        &self,
        graph: &TopologyGraph,
        title: &str,
        output: &Path,
    ) -> AwsmapResult<Option<PathBuf>> {
        let mut canvas = self.canvas(title);
        draw(graph, &mut canvas);
        let written = self.finish(canvas, output).await?;
        info!("Rendered {} ({})", written.display(), graph);
        Ok(Some(written))
    }
}

/// Renderer that only reports what would be drawn
#[derive(Debug, Clone, Default)]
pub struct DryRunRenderer;

#[async_trait]
impl Renderer for DryRunRenderer {
    async fn render(
        &self,
        graph: &TopologyGraph,
        title: &str,
        output: &Path,
    ) -> AwsmapResult<Option<PathBuf>> {
        println!("[dry-run] {}: {} -> {}", title, graph, output.display());
        Ok(None)
    }
}

/// Create the renderer for the current run
pub fn create_renderer(config: &RenderConfig, dry_run: bool) -> AwsmapResult<Box<dyn Renderer>> {
    if dry_run {
        return Ok(Box::new(DryRunRenderer));
    }

    let format = ImageFormat::parse(&config.format)?;
    let style = GraphStyle {
        graph_attrs: config.graph_attrs.clone(),
    };
    Ok(Box::new(GraphvizRenderer::new(
        config.graphviz_path.clone(),
        format,
        style,
    )))
}

/// `path` with `.ext` appended (existing dots in the file name are kept)
fn with_suffix(path: &Path, ext: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}
