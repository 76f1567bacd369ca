#![forbid(unsafe_code)]

//! `sankey` is a headless Sankey visual.
//!
//! A [`Visual`] owns one retained scene. Each [`Visual::update`] turns a categorical data view
//! (two category columns and a value column) into a flow graph, lays it out and reconciles
//! the scene with keyed enter/update/exit joins; pointer events drive a tooltip. The scene can
//! be serialized with [`Visual::to_svg`] / [`Visual::to_html`].
//!
//! The pieces are usable on their own:
//! - [`sankey_core`] (re-exported at the root): data view model, settings, graph builder,
//!   color and format services
//! - [`layout`]: the layered layout seam and its d3-sankey implementation
//! - [`render`]: layout adapter, scene graph, reconciler and serializer

pub use sankey_core::*;
pub use sankey_layout as layout;
pub use sankey_render as render;

pub use sankey_render::{HoverTarget, PointerEvent, Scene};

mod visual;

pub use visual::{ClearReason, UpdateOutcome, Visual};
