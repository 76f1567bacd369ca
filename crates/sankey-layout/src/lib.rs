#![forbid(unsafe_code)]

//! Layered Sankey layout.
//!
//! [`LayeredLayout`] is the narrow seam renderers depend on: nodes identified by id, links
//! referencing those ids, a node thickness, an inter-node gap and an extent rectangle in;
//! node rectangles and link thickness/endpoints out. [`SankeyLayout`] is a port of
//! `d3-sankey`'s algorithm and is the default implementation.

mod error;
pub mod path;
mod sankey;

pub use error::{Error, Result};
pub use path::link_horizontal;
pub use sankey::SankeyLayout;

use serde::{Deserialize, Serialize};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub trait LayeredLayout {
    fn layout(&self, input: &LayoutInput, options: &LayoutOptions) -> Result<LayoutOutput>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutInput {
    pub nodes: Vec<LayoutNodeInput>,
    pub links: Vec<LayoutLinkInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutNodeInput {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutLinkInput {
    pub source: String,
    pub target: String,
    pub value: f64,
}

/// Drawing rectangle `[x0, y0] .. [x1, y1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Extent {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeAlign {
    Left,
    Right,
    #[default]
    Justify,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutOptions {
    /// Horizontal thickness of every node rectangle.
    pub node_width: f64,
    /// Vertical gap between nodes in the same column.
    pub node_padding: f64,
    pub extent: Extent,
    pub align: NodeAlign,
    pub iterations: usize,
}

impl Default for LayoutOptions {
    /// d3-sankey defaults.
    fn default() -> Self {
        Self {
            node_width: 24.0,
            node_padding: 8.0,
            extent: Extent::new(0.0, 0.0, 1.0, 1.0),
            align: NodeAlign::Justify,
            iterations: 6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeLayout {
    pub id: String,
    pub index: usize,
    pub depth: usize,
    pub height: usize,
    pub layer: usize,
    pub value: f64,
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkLayout {
    pub index: usize,
    pub source: String,
    pub target: String,
    pub value: f64,
    /// Stroke thickness.
    pub width: f64,
    /// Vertical center at the source node.
    pub y0: f64,
    /// Vertical center at the target node.
    pub y1: f64,
    /// Right edge of the source node.
    pub source_x: f64,
    /// Left edge of the target node.
    pub target_x: f64,
}

/// Positioned nodes and links, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutOutput {
    pub nodes: Vec<NodeLayout>,
    pub links: Vec<LinkLayout>,
}
