//! Diagram rendering
//!
//! A [`Canvas`] is the scoped drawing context (nodes, nested clusters,
//! edges); a [`Renderer`] turns a resolved graph into an artifact.

pub mod canvas;
pub mod renderer;

pub use canvas::{draw, Canvas, EdgeStyle, GraphStyle, NodeHandle};
pub use renderer::{create_renderer, DryRunRenderer, GraphvizRenderer, ImageFormat, Renderer};
