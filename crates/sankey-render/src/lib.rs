#![forbid(unsafe_code)]

//! Layout + retained-scene rendering for the Sankey visual.
//!
//! - [`layout`]: derives padding and the drawing extent from the viewport and settings, and
//!   runs a [`sankey_layout::LayeredLayout`] over a built graph
//! - [`scene`]: the persistent element tree (root, icon, tooltip, svg with three layers)
//! - [`reconcile`]: the generic keyed enter/update/exit join
//! - [`reconciler`]: applies a positioned graph to the scene every cycle
//! - [`interaction`]: pointer-driven tooltip
//! - [`svg`]: markup serialization of the scene

pub mod interaction;
pub mod layout;
pub mod reconcile;
pub mod reconciler;
pub mod scene;
pub mod svg;
mod util;

pub use interaction::{HoverTarget, PointerEvent};
pub use layout::{Padding, PositionedGraph, PositionedLink, PositionedNode, layout_graph};
pub use reconcile::{JoinStats, keyed_join};
pub use reconciler::{RenderContext, RenderStats, SceneReconciler};
pub use scene::{Element, ElementId, Layer, Scene, Tooltip};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Layout(#[from] sankey_layout::Error),
    #[error("invalid layout result: {message}")]
    InvalidLayout { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
