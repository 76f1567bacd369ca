//! Markup serialization of a [`Scene`].

use crate::scene::{Element, Layer, Scene};
use crate::util::escape_xml_into;

/// The `<svg>` subtree: container group with the links, nodes and labels layers.
pub fn render_svg(scene: &Scene) -> String {
    let mut out = String::new();
    write_svg(&mut out, scene);
    out
}

/// The whole visual root: icon, tooltip and svg.
pub fn render_html(scene: &Scene) -> String {
    let mut out = String::new();
    open_tag(&mut out, &scene.root);

    write_element(&mut out, &scene.icon);

    let tooltip = &scene.tooltip;
    open_tag(&mut out, &tooltip.element);
    for (i, line) in tooltip.lines().iter().enumerate() {
        if i > 0 {
            out.push_str("<br>");
        }
        escape_xml_into(&mut out, line);
    }
    close_tag(&mut out, &tooltip.element);

    write_svg(&mut out, scene);
    close_tag(&mut out, &scene.root);
    out
}

fn write_svg(out: &mut String, scene: &Scene) {
    open_tag(out, &scene.svg);
    open_tag(out, &scene.container);
    write_layer(out, &scene.links);
    write_layer(out, &scene.nodes);
    write_layer(out, &scene.labels);
    close_tag(out, &scene.container);
    close_tag(out, &scene.svg);
}

fn write_layer(out: &mut String, layer: &Layer) {
    open_tag(out, &layer.group);
    for el in layer.items.values() {
        write_element(out, el);
    }
    close_tag(out, &layer.group);
}

fn write_element(out: &mut String, el: &Element) {
    if el.text().is_none() && el.children().is_empty() {
        write_start(out, el);
        out.push_str("/>");
        return;
    }
    open_tag(out, el);
    if let Some(text) = el.text() {
        escape_xml_into(out, text);
    }
    for child in el.children() {
        write_element(out, child);
    }
    close_tag(out, el);
}

fn open_tag(out: &mut String, el: &Element) {
    write_start(out, el);
    out.push('>');
}

fn close_tag(out: &mut String, el: &Element) {
    out.push_str("</");
    out.push_str(el.tag());
    out.push('>');
}

fn write_start(out: &mut String, el: &Element) {
    out.push('<');
    out.push_str(el.tag());

    if !el.classes().is_empty() {
        out.push_str(r#" class=""#);
        for (i, class) in el.classes().iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            escape_xml_into(out, class);
        }
        out.push('"');
    }

    for (name, value) in el.attrs() {
        out.push(' ');
        out.push_str(name);
        out.push_str(r#"=""#);
        escape_xml_into(out, value);
        out.push('"');
    }

    let mut styles = el.styles().peekable();
    if styles.peek().is_some() {
        out.push_str(r#" style=""#);
        for (i, (name, value)) in styles.enumerate() {
            if i > 0 {
                out.push_str("; ");
            }
            out.push_str(name);
            out.push_str(": ");
            escape_xml_into(out, value);
        }
        out.push('"');
    }
}
