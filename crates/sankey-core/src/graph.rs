//! Graph Builder: categorical rows → Sankey nodes and links.
//!
//! One pass over the rows creates nodes (first occurrence order), one link per surviving
//! row, and running per-name totals; a second pass derives link percentages, formatted
//! values and node totals.
//!
//! Rows sharing a (source, target) pair are *not* merged: each row is its own link, keyed
//! by `source|target|row`.

use crate::color::ColorPalette;
use crate::data_view::{CategoryColumn, DataView};
use crate::format::FormatterFactory;
use crate::settings::{SankeySettings, solid_color};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SankeyNode {
    pub name: String,
    pub color: String,
    /// `max(outgoing, incoming)`: a pass-through node is not counted twice.
    pub total: f64,
    pub percent_of_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SankeyLink {
    /// Index into [`SankeyGraph::nodes`].
    pub source: usize,
    /// Index into [`SankeyGraph::nodes`].
    pub target: usize,
    pub value: f64,
    pub formatted_value: String,
    /// Share of the source node's outgoing total, in percent.
    pub percent: f64,
    pub key: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SankeyGraph {
    pub nodes: Vec<SankeyNode>,
    pub links: Vec<SankeyLink>,
    pub format_string: Option<String>,
    pub max_value: f64,
    /// Grand total: the sum of all surviving row values.
    pub total_value: f64,
}

impl SankeyGraph {
    pub fn node(&self, name: &str) -> Option<&SankeyNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// `None` when the link does not belong to this graph.
    pub fn source_name(&self, link: &SankeyLink) -> Option<&str> {
        self.nodes.get(link.source).map(|n| n.name.as_str())
    }

    pub fn target_name(&self, link: &SankeyLink) -> Option<&str> {
        self.nodes.get(link.target).map(|n| n.name.as_str())
    }
}

/// Builds the graph for one update cycle.
///
/// Returns `None` when the view lacks a categorical section with at least two category
/// columns and one value column, or when no row survives filtering.
pub fn build_graph(
    data_view: &DataView,
    settings: &SankeySettings,
    palette: &mut dyn ColorPalette,
    formatters: &dyn FormatterFactory,
) -> Option<SankeyGraph> {
    let categorical = data_view.categorical.as_ref()?;
    if categorical.categories.len() < 2 {
        return None;
    }
    let source_column = &categorical.categories[0];
    let target_column = &categorical.categories[1];
    let value_column = categorical.values.first()?;

    let mut builder = GraphBuilder::new(settings.data_point.default_color.as_deref(), palette);

    for (row, raw) in value_column.values.iter().enumerate() {
        let Some(value) = cell_to_number(raw) else {
            tracing::debug!(row, "dropping sankey row: missing or non-finite value");
            continue;
        };

        let source_name = category_to_string(source_column.value(row));
        let target_name = category_to_string(target_column.value(row));
        if source_name.is_empty() || target_name.is_empty() {
            tracing::debug!(row, "dropping sankey row: empty category");
            continue;
        }

        builder.push_row(
            row,
            value,
            (source_column, source_name),
            (target_column, target_name),
        );
    }

    builder.finish(value_column.format(), formatters)
}

struct GraphBuilder<'a> {
    default_color: Option<&'a str>,
    palette: &'a mut dyn ColorPalette,
    nodes: IndexMap<String, SankeyNode>,
    links: Vec<SankeyLink>,
    outgoing: FxHashMap<String, f64>,
    incoming: FxHashMap<String, f64>,
    source_totals: FxHashMap<String, f64>,
    colors: FxHashMap<String, String>,
    max_value: f64,
    total_value: f64,
}

impl<'a> GraphBuilder<'a> {
    fn new(default_color: Option<&'a str>, palette: &'a mut dyn ColorPalette) -> Self {
        Self {
            default_color,
            palette,
            nodes: IndexMap::new(),
            links: Vec::new(),
            outgoing: FxHashMap::default(),
            incoming: FxHashMap::default(),
            source_totals: FxHashMap::default(),
            colors: FxHashMap::default(),
            max_value: 0.0,
            total_value: 0.0,
        }
    }

    fn push_row(
        &mut self,
        row: usize,
        value: f64,
        (source_column, source_name): (&CategoryColumn, String),
        (target_column, target_name): (&CategoryColumn, String),
    ) {
        let source_color = self.resolve_color(source_column, row, &source_name);
        let target_color = self.resolve_color(target_column, row, &target_name);

        let source = self.ensure_node(&source_name, &source_color);
        let target = self.ensure_node(&target_name, &target_color);

        *self.outgoing.entry(source_name.clone()).or_insert(0.0) += value;
        *self.incoming.entry(target_name.clone()).or_insert(0.0) += value;
        *self.source_totals.entry(source_name.clone()).or_insert(0.0) += value;

        self.links.push(SankeyLink {
            source,
            target,
            value,
            formatted_value: String::new(),
            percent: 0.0,
            key: format!("{source_name}|{target_name}|{row}"),
            color: source_color,
        });

        self.max_value = self.max_value.max(value);
        self.total_value += value;
    }

    /// First resolution per category value wins for the rest of the build.
    fn resolve_color(&mut self, column: &CategoryColumn, row: usize, name: &str) -> String {
        if let Some(color) = self.colors.get(name) {
            return color.clone();
        }

        let color = column
            .row_object(row)
            .and_then(|o| o.get("dataPoint"))
            .and_then(|dp| dp.get("fill"))
            .and_then(solid_color)
            .or_else(|| {
                self.default_color
                    .filter(|c| !c.is_empty())
                    .map(|c| c.to_string())
            })
            .unwrap_or_else(|| self.palette.get_color(name));

        self.colors.insert(name.to_string(), color.clone());
        color
    }

    fn ensure_node(&mut self, name: &str, color: &str) -> usize {
        if let Some((idx, _, node)) = self.nodes.get_full_mut(name) {
            if node.color.is_empty() && !color.is_empty() {
                node.color = color.to_string();
            }
            return idx;
        }

        let (idx, _) = self.nodes.insert_full(
            name.to_string(),
            SankeyNode {
                name: name.to_string(),
                color: color.to_string(),
                total: 0.0,
                percent_of_total: 0.0,
            },
        );
        idx
    }

    fn finish(
        self,
        format_string: Option<&str>,
        formatters: &dyn FormatterFactory,
    ) -> Option<SankeyGraph> {
        let GraphBuilder {
            palette,
            nodes,
            mut links,
            outgoing,
            incoming,
            source_totals,
            max_value,
            total_value,
            ..
        } = self;

        if links.is_empty() {
            return None;
        }

        let formatter = formatters.create(format_string, max_value);
        for link in &mut links {
            let source_name = nodes
                .get_index(link.source)
                .map(|(name, _)| name.as_str())
                .unwrap_or_default();
            let total = source_totals.get(source_name).copied().unwrap_or(0.0);
            link.percent = if total > 0.0 {
                link.value / total * 100.0
            } else {
                0.0
            };
            link.formatted_value = formatter.format(link.value);
        }

        let nodes: Vec<SankeyNode> = nodes
            .into_values()
            .map(|mut node| {
                let out = outgoing.get(&node.name).copied().unwrap_or(0.0);
                let inc = incoming.get(&node.name).copied().unwrap_or(0.0);
                node.total = out.max(inc);
                node.percent_of_total = if total_value > 0.0 {
                    node.total / total_value * 100.0
                } else {
                    0.0
                };
                if node.color.is_empty() {
                    node.color = palette.get_color(&node.name);
                }
                node
            })
            .collect();

        tracing::debug!(
            nodes = nodes.len(),
            links = links.len(),
            total_value,
            "built sankey graph"
        );

        Some(SankeyGraph {
            nodes,
            links,
            format_string: format_string.map(|s| s.to_string()),
            max_value,
            total_value,
        })
    }
}

/// Stringifies a category cell. `null` and missing cells become the empty string.
pub fn category_to_string(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => {
            if n.is_i64() || n.is_u64() {
                n.to_string()
            } else {
                let v = n.as_f64().unwrap_or(f64::NAN);
                let mut b = ryu_js::Buffer::new();
                b.format(v).to_string()
            }
        }
        Some(other) => other.to_string(),
    }
}

/// Converts a value cell to a finite number, or `None` when the row must be dropped.
pub fn cell_to_number(value: &Value) -> Option<f64> {
    let v = match value {
        Value::Null => return None,
        Value::Number(n) => n.as_f64()?,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::String(s) => {
            let t = s.trim();
            if t.is_empty() {
                0.0
            } else if let Some((radix, digits)) = radix_prefixed(t) {
                parse_radix(digits, radix)?
            } else {
                t.parse::<f64>().ok()?
            }
        }
        Value::Array(_) | Value::Object(_) => return None,
    };
    v.is_finite().then_some(v)
}

fn radix_prefixed(s: &str) -> Option<(u32, &str)> {
    let rest = s.strip_prefix('0')?;
    let mut chars = rest.chars();
    let radix = match chars.next()? {
        'x' | 'X' => 16,
        'o' | 'O' => 8,
        'b' | 'B' => 2,
        _ => return None,
    };
    Some((radix, chars.as_str()))
}

/// Unsigned digits only; the sign is not allowed after a radix prefix.
fn parse_radix(digits: &str, radix: u32) -> Option<f64> {
    if digits.is_empty() {
        return None;
    }
    digits.chars().try_fold(0.0, |acc: f64, c| {
        c.to_digit(radix)
            .map(|d| acc * f64::from(radix) + f64::from(d))
    })
}
