//! Pointer-driven tooltip over links and nodes.

use crate::reconciler::{SceneReconciler, format_value};
use sankey_core::ValueFormatter;

/// Tooltip distance from the pointer, on both axes.
pub const TOOLTIP_OFFSET: f64 = 12.0;

/// The drawn element under the pointer, identified by its join key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HoverTarget {
    /// A link, by link key.
    Link(String),
    /// A node rectangle, by node name.
    Node(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub page_x: f64,
    pub page_y: f64,
}

impl PointerEvent {
    pub fn new(page_x: f64, page_y: f64) -> Self {
        Self { page_x, page_y }
    }
}

impl SceneReconciler {
    /// Replaces the tooltip content for `target` and moves it next to the pointer. Targets
    /// that are not currently drawn hide the tooltip.
    pub fn pointer_move(
        &mut self,
        target: &HoverTarget,
        event: PointerEvent,
        formatter: Option<&dyn ValueFormatter>,
    ) {
        let lines = match target {
            HoverTarget::Link(key) => self.link_hover.get(key).map(|h| {
                vec![
                    format!("{} \u{2192} {}", h.source, h.target),
                    format!("{} ({:.1}%)", h.formatted_value, h.percent),
                ]
            }),
            HoverTarget::Node(name) => self.node_hover.get(name).map(|h| {
                vec![
                    name.clone(),
                    format!(
                        "{} ({:.1}%)",
                        format_value(formatter, h.total),
                        h.percent_of_total
                    ),
                ]
            }),
        };

        let tooltip = &mut self.scene_mut().tooltip;
        match lines {
            Some(lines) => tooltip.show(
                lines,
                event.page_x + TOOLTIP_OFFSET,
                event.page_y + TOOLTIP_OFFSET,
            ),
            None => tooltip.hide(),
        }
    }

    pub fn pointer_out(&mut self) {
        self.scene_mut().tooltip.hide();
    }
}
