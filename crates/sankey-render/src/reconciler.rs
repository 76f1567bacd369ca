//! Applies a positioned graph to the retained [`Scene`].
//!
//! Every cycle joins links, then nodes, then labels, then updates the icon. Update callbacks
//! reset every mutable attribute so retained elements never show stale geometry.

use crate::layout::{EDGE_PADDING, PositionedGraph, PositionedLink, PositionedNode};
use crate::reconcile::{JoinStats, keyed_join};
use crate::scene::{Element, Scene};
use crate::util::{fmt, fmt_px};
use rustc_hash::FxHashMap;
use sankey_core::{SankeySettings, ValueFormatter, format_fallback};

/// Horizontal gap between a node and its label.
pub const LABEL_OFFSET: f64 = 6.0;
pub const NODE_STROKE: &str = "#333333";
/// Vertical offset of the icon inside the top padding.
pub const ICON_TOP: f64 = 8.0;

/// Per-cycle inputs besides the graph itself.
pub struct RenderContext<'a> {
    pub settings: &'a SankeySettings,
    pub viewport_width: f64,
    /// Formatter derived from the value column; `None` uses the `,.2f` fallback.
    pub formatter: Option<&'a dyn ValueFormatter>,
}

impl RenderContext<'_> {
    pub fn format_value(&self, value: f64) -> String {
        format_value(self.formatter, value)
    }
}

pub fn format_value(formatter: Option<&dyn ValueFormatter>, value: f64) -> String {
    match formatter {
        Some(f) => f.format(value),
        None => format_fallback(value),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub links: JoinStats,
    pub nodes: JoinStats,
    pub labels: JoinStats,
}

/// What a tooltip needs about a link, captured when the link was last drawn.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LinkHover {
    pub(crate) source: String,
    pub(crate) target: String,
    pub(crate) formatted_value: String,
    pub(crate) percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NodeHover {
    pub(crate) total: f64,
    pub(crate) percent_of_total: f64,
}

#[derive(Debug, Default)]
pub struct SceneReconciler {
    scene: Scene,
    pub(crate) link_hover: FxHashMap<String, LinkHover>,
    pub(crate) node_hover: FxHashMap<String, NodeHover>,
}

impl SceneReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub(crate) fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.scene.svg.set_attr("width", fmt(width));
        self.scene.svg.set_attr("height", fmt(height));
    }

    pub fn render(&mut self, graph: &PositionedGraph, ctx: &RenderContext<'_>) -> RenderStats {
        let stats = RenderStats {
            links: self.render_links(&graph.links, ctx),
            nodes: self.render_nodes(&graph.nodes),
            labels: self.render_labels(&graph.nodes, ctx),
        };
        self.configure_icon(ctx.settings);

        tracing::trace!(
            links_entered = stats.links.entered,
            links_updated = stats.links.updated,
            links_exited = stats.links.exited,
            nodes_entered = stats.nodes.entered,
            nodes_updated = stats.nodes.updated,
            nodes_exited = stats.nodes.exited,
            "sankey reconcile"
        );
        stats
    }

    fn render_links(&mut self, links: &[PositionedLink], ctx: &RenderContext<'_>) -> JoinStats {
        let opacity = fmt(ctx.settings.links.opacity);
        let stats = keyed_join(
            &mut self.scene.links.items,
            links,
            link_key,
            |l| {
                Element::new("path")
                    .with_attr("data-key", l.key())
                    .with_style("fill", "none")
                    .with_style("cursor", "pointer")
            },
            |el, l| {
                el.set_attr("d", l.path());
                el.set_attr("stroke", l.link.color.as_str());
                el.set_attr("stroke-width", fmt(l.width.max(1.0)));
                el.set_attr("stroke-opacity", opacity.as_str());
            },
        );

        self.link_hover = links
            .iter()
            .map(|l| {
                let hover = LinkHover {
                    source: l.source_name.clone(),
                    target: l.target_name.clone(),
                    formatted_value: l.link.formatted_value.clone(),
                    percent: l.link.percent,
                };
                (l.link.key.clone(), hover)
            })
            .collect();
        stats
    }

    fn render_nodes(&mut self, nodes: &[PositionedNode]) -> JoinStats {
        let stats = keyed_join(
            &mut self.scene.nodes.items,
            nodes,
            node_key,
            |n| {
                Element::new("g")
                    .with_class("node")
                    .with_attr("data-key", n.name())
                    .with_child(Element::new("rect"))
            },
            |group, n| {
                let Some(rect) = group.first_child_mut() else {
                    return;
                };
                rect.set_attr("x", fmt(n.x0));
                rect.set_attr("y", fmt(n.y0));
                rect.set_attr("height", fmt(n.height().max(1.0)));
                rect.set_attr("width", fmt(n.width().max(1.0)));
                rect.set_attr("fill", n.node.color.as_str());
                rect.set_attr("stroke", NODE_STROKE);
                rect.set_attr("stroke-width", "1");
            },
        );

        self.node_hover = nodes
            .iter()
            .map(|n| {
                let hover = NodeHover {
                    total: n.node.total,
                    percent_of_total: n.node.percent_of_total,
                };
                (n.node.name.clone(), hover)
            })
            .collect();
        stats
    }

    fn render_labels(&mut self, nodes: &[PositionedNode], ctx: &RenderContext<'_>) -> JoinStats {
        let font_size = fmt_px(ctx.settings.node.label_font_size);
        let midline = ctx.viewport_width / 2.0;
        keyed_join(
            &mut self.scene.labels.items,
            nodes,
            node_key,
            |_| Element::new("text").with_class("visual-sankey__label"),
            |el, n| {
                let (x, anchor) = if n.x0 < midline {
                    (n.x0 - LABEL_OFFSET, "end")
                } else {
                    (n.x1 + LABEL_OFFSET, "start")
                };
                el.set_attr("x", fmt(x));
                el.set_attr("y", fmt(n.y0 + n.height() / 2.0));
                el.set_attr("dy", "0.35em");
                el.set_attr("text-anchor", anchor);
                el.set_style("font-size", font_size.as_str());
                el.set_text(label_text(n, ctx));
            },
        )
    }

    /// Shows the icon only when a URL is configured.
    pub fn configure_icon(&mut self, settings: &SankeySettings) {
        let icon = &mut self.scene.icon;
        let Some(url) = settings.icon.url() else {
            icon.set_style("display", "none");
            icon.remove_attr("src");
            return;
        };
        let size = fmt(settings.icon.size);
        icon.set_style("display", "block");
        icon.set_attr("src", url);
        icon.set_attr("width", size.as_str());
        icon.set_attr("height", size);
        icon.set_style("left", fmt_px(EDGE_PADDING));
        icon.set_style("top", fmt_px(ICON_TOP));
    }

    /// Removes every link, node and label, forgets hover data and hides the tooltip. The
    /// containers and the icon stay.
    pub fn clear(&mut self) {
        self.scene.links.items.clear();
        self.scene.nodes.items.clear();
        self.scene.labels.items.clear();
        self.link_hover.clear();
        self.node_hover.clear();
        self.scene.tooltip.hide();
    }
}

fn link_key(link: &PositionedLink) -> &str {
    link.key()
}

fn node_key(node: &PositionedNode) -> &str {
    node.name()
}

fn label_text(node: &PositionedNode, ctx: &RenderContext<'_>) -> String {
    if !ctx.settings.node.show_values {
        return node.node.name.clone();
    }
    format!(
        "{} \u{2013} {} ({:.1}%)",
        node.node.name,
        ctx.format_value(node.node.total),
        node.node.percent_of_total
    )
}
