//! Layout Adapter: viewport + settings → padding, extent and engine options; graph →
//! positioned graph.

use crate::{Error, Result};
use rustc_hash::FxHashMap;
use sankey_core::{SankeyGraph, SankeyLink, SankeyNode, SankeySettings};
use sankey_layout::{
    Extent, LayeredLayout, LayoutInput, LayoutLinkInput, LayoutNodeInput, LayoutOptions,
    LinkLayout, NodeAlign,
};
use serde::Serialize;

pub const NODE_WIDTH: f64 = 20.0;
pub const NODE_PADDING: f64 = 16.0;
pub const EDGE_PADDING: f64 = 20.0;
/// Gap kept above the drawing area, below the icon when one is shown.
pub const TOP_GAP: f64 = 16.0;
pub const ITERATIONS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Padding {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Padding {
    pub fn for_settings(settings: &SankeySettings) -> Self {
        let top = match settings.icon.url() {
            Some(_) => settings.icon.size + TOP_GAP,
            None => TOP_GAP,
        };
        Self {
            top,
            right: EDGE_PADDING,
            bottom: EDGE_PADDING,
            left: EDGE_PADDING,
        }
    }

    /// The drawing rectangle inside a `width × height` viewport; never narrower or shorter
    /// than one unit, however small the viewport.
    pub fn extent(&self, width: f64, height: f64) -> Extent {
        Extent::new(
            self.left,
            self.top,
            (width - self.right).max(self.left + 1.0),
            (height - self.bottom).max(self.top + 1.0),
        )
    }
}

pub fn layout_options(extent: Extent) -> LayoutOptions {
    LayoutOptions {
        node_width: NODE_WIDTH,
        node_padding: NODE_PADDING,
        extent,
        align: NodeAlign::Justify,
        iterations: ITERATIONS,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedNode {
    #[serde(flatten)]
    pub node: SankeyNode,
    pub layer: usize,
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
}

impl PositionedNode {
    pub fn name(&self) -> &str {
        &self.node.name
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedLink {
    #[serde(flatten)]
    pub link: SankeyLink,
    pub source_name: String,
    pub target_name: String,
    pub width: f64,
    pub y0: f64,
    pub y1: f64,
    pub source_x: f64,
    pub target_x: f64,
}

impl PositionedLink {
    pub fn key(&self) -> &str {
        &self.link.key
    }

    /// Geometry in the shape [`sankey_layout::link_horizontal`] consumes.
    pub fn geometry(&self) -> LinkLayout {
        LinkLayout {
            index: 0,
            source: self.source_name.clone(),
            target: self.target_name.clone(),
            value: self.link.value,
            width: self.width,
            y0: self.y0,
            y1: self.y1,
            source_x: self.source_x,
            target_x: self.target_x,
        }
    }

    pub fn path(&self) -> String {
        sankey_layout::link_horizontal(&self.geometry())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedGraph {
    pub nodes: Vec<PositionedNode>,
    pub links: Vec<PositionedLink>,
    pub padding: Padding,
    pub extent: Extent,
    pub format_string: Option<String>,
    pub max_value: f64,
    pub total_value: f64,
}

impl PositionedGraph {
    pub fn node(&self, name: &str) -> Option<&PositionedNode> {
        self.nodes.iter().find(|n| n.node.name == name)
    }

    pub fn link(&self, key: &str) -> Option<&PositionedLink> {
        self.links.iter().find(|l| l.link.key == key)
    }
}

/// Runs `engine` over `graph` inside the viewport and pairs every node and link with its
/// geometry.
pub fn layout_graph(
    graph: &SankeyGraph,
    width: f64,
    height: f64,
    settings: &SankeySettings,
    engine: &dyn LayeredLayout,
) -> Result<PositionedGraph> {
    let padding = Padding::for_settings(settings);
    let extent = padding.extent(width, height);

    let input = LayoutInput {
        nodes: graph
            .nodes
            .iter()
            .map(|n| LayoutNodeInput { id: n.name.clone() })
            .collect(),
        links: graph
            .links
            .iter()
            .map(|l| {
                let (source, target) = endpoint_names(graph, l)?;
                Ok(LayoutLinkInput {
                    source: source.to_string(),
                    target: target.to_string(),
                    value: l.value,
                })
            })
            .collect::<Result<_>>()?,
    };
    let output = engine.layout(&input, &layout_options(extent))?;

    let node_geometry: FxHashMap<&str, _> =
        output.nodes.iter().map(|n| (n.id.as_str(), n)).collect();
    let mut nodes = Vec::with_capacity(graph.nodes.len());
    for node in &graph.nodes {
        let Some(geom) = node_geometry.get(node.name.as_str()) else {
            return Err(Error::InvalidLayout {
                message: format!("no geometry for node {}", node.name),
            });
        };
        nodes.push(PositionedNode {
            node: node.clone(),
            layer: geom.layer,
            x0: geom.x0,
            x1: geom.x1,
            y0: geom.y0,
            y1: geom.y1,
        });
    }

    let mut link_geometry: Vec<Option<&LinkLayout>> = vec![None; graph.links.len()];
    for l in &output.links {
        if let Some(slot) = link_geometry.get_mut(l.index) {
            *slot = Some(l);
        }
    }
    let mut links = Vec::with_capacity(graph.links.len());
    for (link, geom) in graph.links.iter().zip(link_geometry) {
        let Some(geom) = geom else {
            return Err(Error::InvalidLayout {
                message: format!("no geometry for link {}", link.key),
            });
        };
        let (source_name, target_name) = endpoint_names(graph, link)?;
        links.push(PositionedLink {
            link: link.clone(),
            source_name: source_name.to_string(),
            target_name: target_name.to_string(),
            width: geom.width,
            y0: geom.y0,
            y1: geom.y1,
            source_x: geom.source_x,
            target_x: geom.target_x,
        });
    }

    tracing::debug!(
        nodes = nodes.len(),
        links = links.len(),
        x0 = extent.x0,
        y0 = extent.y0,
        x1 = extent.x1,
        y1 = extent.y1,
        "sankey layout"
    );

    Ok(PositionedGraph {
        nodes,
        links,
        padding,
        extent,
        format_string: graph.format_string.clone(),
        max_value: graph.max_value,
        total_value: graph.total_value,
    })
}

fn endpoint_names<'g>(graph: &'g SankeyGraph, link: &SankeyLink) -> Result<(&'g str, &'g str)> {
    match (graph.source_name(link), graph.target_name(link)) {
        (Some(source), Some(target)) => Ok((source, target)),
        _ => Err(Error::InvalidLayout {
            message: format!("link {} references a missing node", link.key),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_icon(url: &str, size: f64) -> SankeySettings {
        let mut settings = SankeySettings::default();
        settings.icon.image_url = url.to_string();
        settings.icon.size = size;
        settings
    }

    #[test]
    fn padding_reserves_room_for_the_icon() {
        assert_eq!(Padding::for_settings(&SankeySettings::default()).top, 16.0);
        assert_eq!(Padding::for_settings(&with_icon("logo.png", 48.0)).top, 64.0);
        assert_eq!(Padding::for_settings(&with_icon("", 48.0)).top, 16.0);
    }

    #[test]
    fn extent_is_at_least_one_unit() {
        let padding = Padding::for_settings(&with_icon("logo.png", 48.0));
        let extent = padding.extent(0.0, 0.0);
        assert_eq!(extent, Extent::new(20.0, 64.0, 21.0, 65.0));

        let extent = Padding::for_settings(&SankeySettings::default()).extent(800.0, 600.0);
        assert_eq!(extent, Extent::new(20.0, 16.0, 780.0, 580.0));
    }
}
