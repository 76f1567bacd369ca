//! Retained element tree for one visual instance.
//!
//! The structural elements are created once by [`Scene::new`]; only the keyed layers gain
//! and lose children across update cycles.

use indexmap::IndexMap;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ELEMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique element identity. Two handles with the same id are the same element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

impl ElementId {
    fn next() -> Self {
        Self(NEXT_ELEMENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    id: ElementId,
    tag: &'static str,
    classes: Vec<String>,
    attrs: IndexMap<String, String>,
    styles: IndexMap<String, String>,
    text: Option<String>,
    children: Vec<Element>,
}

impl Element {
    pub fn new(tag: &'static str) -> Self {
        Self {
            id: ElementId::next(),
            tag,
            classes: Vec::new(),
            attrs: IndexMap::new(),
            styles: IndexMap::new(),
            text: None,
            children: Vec::new(),
        }
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.classed(class, true);
        self
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_style(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_style(name, value);
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Adds or removes `class`; a class is never listed twice.
    pub fn classed(&mut self, class: &str, on: bool) {
        let present = self.has_class(class);
        if on && !present {
            self.classes.push(class.to_string());
        } else if !on && present {
            self.classes.retain(|c| c != class);
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.get_mut(name) {
            Some(slot) => *slot = value,
            None => {
                self.attrs.insert(name.to_string(), value);
            }
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.shift_remove(name);
    }

    pub fn style(&self, name: &str) -> Option<&str> {
        self.styles.get(name).map(String::as_str)
    }

    pub fn styles(&self) -> impl Iterator<Item = (&str, &str)> {
        self.styles.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn set_style(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.styles.get_mut(name) {
            Some(slot) => *slot = value,
            None => {
                self.styles.insert(name.to_string(), value);
            }
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn first_child_mut(&mut self) -> Option<&mut Element> {
        self.children.first_mut()
    }
}

/// A group element whose children are keyed by datum identity.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub group: Element,
    pub items: IndexMap<String, Element>,
}

impl Layer {
    fn new(class: &str) -> Self {
        Self {
            group: Element::new("g").with_class(class),
            items: IndexMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Element> {
        self.items.get(key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.keys().map(String::as_str)
    }
}

pub const HIDDEN_CLASS: &str = "hidden";

/// Floating tooltip. Content is kept as plain lines and escaped when serialized.
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub element: Element,
    lines: Vec<String>,
}

impl Tooltip {
    fn new() -> Self {
        Self {
            element: Element::new("div")
                .with_class("visual-sankey__tooltip")
                .with_class(HIDDEN_CLASS),
            lines: Vec::new(),
        }
    }

    pub fn is_visible(&self) -> bool {
        !self.element.has_class(HIDDEN_CLASS)
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// `(left, top)` in pixels, as last positioned.
    pub fn position(&self) -> Option<(f64, f64)> {
        let parse = |name: &str| {
            self.element
                .style(name)
                .and_then(|v| v.trim_end_matches("px").parse::<f64>().ok())
        };
        Some((parse("left")?, parse("top")?))
    }

    pub fn show(&mut self, lines: Vec<String>, left: f64, top: f64) {
        self.lines = lines;
        self.element.set_style("left", crate::util::fmt_px(left));
        self.element.set_style("top", crate::util::fmt_px(top));
        self.element.classed(HIDDEN_CLASS, false);
    }

    pub fn hide(&mut self) {
        self.element.classed(HIDDEN_CLASS, true);
    }
}

/// `div.visual-sankey` > (`img` icon, tooltip, `svg` > `g` > links/nodes/labels layers).
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub root: Element,
    pub icon: Element,
    pub tooltip: Tooltip,
    pub svg: Element,
    pub container: Element,
    pub links: Layer,
    pub nodes: Layer,
    pub labels: Layer,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            root: Element::new("div").with_class("visual-sankey"),
            icon: Element::new("img")
                .with_class("visual-sankey__icon")
                .with_style("display", "none"),
            tooltip: Tooltip::new(),
            svg: Element::new("svg")
                .with_attr("xmlns", "http://www.w3.org/2000/svg")
                .with_attr("role", "img")
                .with_attr("aria-label", "Sankey chart"),
            container: Element::new("g"),
            links: Layer::new("links"),
            nodes: Layer::new("nodes"),
            labels: Layer::new("labels"),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty() && self.nodes.is_empty() && self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_ids_are_unique() {
        let a = Element::new("g");
        let b = Element::new("g");
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }

    #[test]
    fn attributes_keep_insertion_order() {
        let mut el = Element::new("rect").with_attr("x", "1").with_attr("y", "2");
        el.set_attr("x", "3");
        let attrs: Vec<_> = el.attrs().collect();
        assert_eq!(attrs, [("x", "3"), ("y", "2")]);
    }

    #[test]
    fn classed_toggles_once() {
        let mut el = Element::new("div").with_class("a");
        el.classed("a", true);
        assert_eq!(el.classes(), ["a"]);
        el.classed("a", false);
        assert!(el.classes().is_empty());
    }

    #[test]
    fn tooltip_starts_hidden_and_tracks_position() {
        let mut scene = Scene::new();
        assert!(!scene.tooltip.is_visible());
        assert_eq!(scene.icon.style("display"), Some("none"));

        scene.tooltip.show(vec!["A".into()], 112.0, 62.5);
        assert!(scene.tooltip.is_visible());
        assert_eq!(scene.tooltip.position(), Some((112.0, 62.5)));
        scene.tooltip.hide();
        assert!(!scene.tooltip.is_visible());
        assert_eq!(scene.tooltip.lines(), ["A"]);
    }
}
