//! d3-sankey's layered layout.
//!
//! Steps: node values (max of in/out), depths and heights by breadth-first sweeps (which
//! also detect cycles), column assignment by alignment, initial breadths scaled to the
//! tightest column, then alternating right-to-left / left-to-right relaxation with collision
//! resolution, and finally link endpoint offsets.

use crate::{
    Error, Extent, LayeredLayout, LayoutInput, LayoutOptions, LayoutOutput, LinkLayout, NodeAlign,
    NodeLayout, Result,
};
use rustc_hash::FxHashMap;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, Default)]
pub struct SankeyLayout;

impl LayeredLayout for SankeyLayout {
    fn layout(&self, input: &LayoutInput, options: &LayoutOptions) -> Result<LayoutOutput> {
        layout_sankey(input, options)
    }
}

#[derive(Debug, Clone)]
struct Node {
    id: String,
    index: usize,
    source_links: Vec<usize>,
    target_links: Vec<usize>,
    value: f64,
    depth: usize,
    height: usize,
    layer: usize,
    x0: f64,
    x1: f64,
    y0: f64,
    y1: f64,
}

#[derive(Debug, Clone)]
struct Link {
    index: usize,
    source: usize,
    target: usize,
    value: f64,
    width: f64,
    y0: f64,
    y1: f64,
}

fn f64_cmp(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

fn layout_sankey(input: &LayoutInput, options: &LayoutOptions) -> Result<LayoutOutput> {
    let extent = options.extent;
    let dx = options.node_width;
    let dy = options.node_padding;

    let mut nodes: Vec<Node> = input
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| Node {
            id: n.id.clone(),
            index: i,
            source_links: Vec::new(),
            target_links: Vec::new(),
            value: 0.0,
            depth: 0,
            height: 0,
            layer: 0,
            x0: 0.0,
            x1: 0.0,
            y0: 0.0,
            y1: 0.0,
        })
        .collect();

    let mut node_by_id: FxHashMap<&str, usize> = FxHashMap::default();
    for (i, n) in input.nodes.iter().enumerate() {
        node_by_id.insert(n.id.as_str(), i);
    }

    let mut links: Vec<Link> = Vec::with_capacity(input.links.len());
    for (i, l) in input.links.iter().enumerate() {
        let lookup = |id: &str| {
            node_by_id
                .get(id)
                .copied()
                .ok_or_else(|| Error::MissingNode { id: id.to_string() })
        };
        let source = lookup(&l.source)?;
        let target = lookup(&l.target)?;

        links.push(Link {
            index: i,
            source,
            target,
            value: l.value,
            width: 0.0,
            y0: 0.0,
            y1: 0.0,
        });

        nodes[source].source_links.push(i);
        nodes[target].target_links.push(i);
    }

    for n in &mut nodes {
        let out_sum: f64 = n.source_links.iter().map(|&li| links[li].value).sum();
        let in_sum: f64 = n.target_links.iter().map(|&li| links[li].value).sum();
        n.value = out_sum.max(in_sum);
    }

    compute_node_depths(&mut nodes, &links)?;
    compute_node_heights(&mut nodes, &links)?;

    let mut columns = compute_node_layers(&mut nodes, &links, options.align, extent, dx);
    let py = node_padding_for(&columns, dy, extent);

    initialize_node_breadths(&mut nodes, &mut links, &columns, py, extent);

    for i in 0..options.iterations {
        let alpha = 0.99_f64.powi(i as i32);
        let beta = (1.0 - alpha).max((i as f64 + 1.0) / options.iterations as f64);
        relax_right_to_left(&mut nodes, &links, &mut columns, py, alpha, beta, extent);
        relax_left_to_right(&mut nodes, &links, &mut columns, py, alpha, beta, extent);
    }

    compute_link_breadths(&nodes, &mut links);

    tracing::trace!(
        nodes = nodes.len(),
        links = links.len(),
        columns = columns.len(),
        "sankey layout complete"
    );

    let layout_links = links
        .iter()
        .map(|l| LinkLayout {
            index: l.index,
            source: nodes[l.source].id.clone(),
            target: nodes[l.target].id.clone(),
            value: l.value,
            width: l.width,
            y0: l.y0,
            y1: l.y1,
            source_x: nodes[l.source].x1,
            target_x: nodes[l.target].x0,
        })
        .collect();

    let layout_nodes = nodes
        .into_iter()
        .map(|n| NodeLayout {
            id: n.id,
            index: n.index,
            depth: n.depth,
            height: n.height,
            layer: n.layer,
            value: n.value,
            x0: n.x0,
            x1: n.x1,
            y0: n.y0,
            y1: n.y1,
        })
        .collect();

    Ok(LayoutOutput {
        nodes: layout_nodes,
        links: layout_links,
    })
}

/// Breadth-first sweep from every node along `next_of`; a sweep longer than the node count
/// means the graph has a cycle.
fn sweep(
    nodes: &mut [Node],
    links: &[Link],
    assign: fn(&mut Node, usize),
    next_of: fn(&Node, &[Link]) -> Vec<usize>,
) -> Result<()> {
    let n = nodes.len();
    let mut current: Vec<usize> = (0..n).collect();
    let mut next: Vec<usize> = Vec::new();
    let mut next_seen = vec![false; n];
    let mut x: usize = 0;
    while !current.is_empty() {
        for &node_idx in &current {
            assign(&mut nodes[node_idx], x);
            for t in next_of(&nodes[node_idx], links) {
                if !next_seen[t] {
                    next_seen[t] = true;
                    next.push(t);
                }
            }
        }
        x += 1;
        if x > n {
            return Err(Error::CircularLink);
        }
        current = std::mem::take(&mut next);
        next_seen.fill(false);
    }
    Ok(())
}

fn compute_node_depths(nodes: &mut [Node], links: &[Link]) -> Result<()> {
    sweep(
        nodes,
        links,
        |node, x| node.depth = x,
        |node, links| node.source_links.iter().map(|&li| links[li].target).collect(),
    )
}

fn compute_node_heights(nodes: &mut [Node], links: &[Link]) -> Result<()> {
    sweep(
        nodes,
        links,
        |node, x| node.height = x,
        |node, links| node.target_links.iter().map(|&li| links[li].source).collect(),
    )
}

fn compute_node_layers(
    nodes: &mut [Node],
    links: &[Link],
    align: NodeAlign,
    extent: Extent,
    dx: f64,
) -> Vec<Vec<usize>> {
    let max_depth = nodes.iter().map(|n| n.depth).max().unwrap_or(0);
    let column_count = max_depth + 1;
    let kx = if column_count <= 1 {
        0.0
    } else {
        (extent.width() - dx) / (column_count as f64 - 1.0)
    };

    let mut columns: Vec<Vec<usize>> = vec![Vec::new(); column_count];
    for i in 0..nodes.len() {
        let x = column_count as i64;
        let raw_layer = match align {
            NodeAlign::Left => nodes[i].depth as i64,
            NodeAlign::Right => x - 1 - nodes[i].height as i64,
            NodeAlign::Justify => {
                if nodes[i].source_links.is_empty() {
                    x - 1
                } else {
                    nodes[i].depth as i64
                }
            }
            NodeAlign::Center => {
                if !nodes[i].target_links.is_empty() {
                    nodes[i].depth as i64
                } else if !nodes[i].source_links.is_empty() {
                    let min_target_depth = nodes[i]
                        .source_links
                        .iter()
                        .map(|&li| nodes[links[li].target].depth)
                        .min()
                        .unwrap_or(0);
                    min_target_depth as i64 - 1
                } else {
                    0
                }
            }
        };
        let layer = raw_layer.clamp(0, x - 1) as usize;
        nodes[i].layer = layer;
        nodes[i].x0 = extent.x0 + layer as f64 * kx;
        nodes[i].x1 = nodes[i].x0 + dx;
        columns[layer].push(i);
    }
    columns
}

fn node_padding_for(columns: &[Vec<usize>], dy: f64, extent: Extent) -> f64 {
    let max_len = columns.iter().map(|c| c.len()).max().unwrap_or(0);
    if max_len <= 1 {
        dy
    } else {
        dy.min(extent.height() / (max_len as f64 - 1.0))
    }
}

fn initialize_node_breadths(
    nodes: &mut [Node],
    links: &mut [Link],
    columns: &[Vec<usize>],
    py: f64,
    extent: Extent,
) {
    let mut ky = f64::INFINITY;
    for col in columns {
        let sum_values: f64 = col.iter().map(|&ni| nodes[ni].value).sum();
        if col.is_empty() || sum_values <= 0.0 {
            continue;
        }
        let denom = extent.height() - (col.len() as f64 - 1.0) * py;
        ky = ky.min(denom / sum_values);
    }
    if !ky.is_finite() {
        ky = 0.0;
    }

    for col in columns {
        let mut y = extent.y0;
        for &ni in col {
            nodes[ni].y0 = y;
            nodes[ni].y1 = y + nodes[ni].value * ky;
            y = nodes[ni].y1 + py;
            for &li in &nodes[ni].source_links {
                links[li].width = links[li].value * ky;
            }
        }
        let n = col.len();
        if n > 0 {
            let offset = (extent.y1 - y + py) / (n as f64 + 1.0);
            for (i, &ni) in col.iter().enumerate() {
                let adj = offset * (i as f64 + 1.0);
                nodes[ni].y0 += adj;
                nodes[ni].y1 += adj;
            }
            reorder_links(nodes, links, col);
        }
    }
}

fn sort_source_links_by_target_y0(node_y0: &[f64], links: &[Link], link_indices: &mut [usize]) {
    link_indices.sort_by(|&a, &b| {
        let ta = node_y0[links[a].target];
        let tb = node_y0[links[b].target];
        f64_cmp(ta, tb).then_with(|| links[a].index.cmp(&links[b].index))
    });
}

fn sort_target_links_by_source_y0(node_y0: &[f64], links: &[Link], link_indices: &mut [usize]) {
    link_indices.sort_by(|&a, &b| {
        let sa = node_y0[links[a].source];
        let sb = node_y0[links[b].source];
        f64_cmp(sa, sb).then_with(|| links[a].index.cmp(&links[b].index))
    });
}

fn reorder_links(nodes: &mut [Node], links: &[Link], column: &[usize]) {
    let node_y0 = nodes.iter().map(|n| n.y0).collect::<Vec<_>>();
    for &ni in column {
        sort_source_links_by_target_y0(&node_y0, links, &mut nodes[ni].source_links);
        sort_target_links_by_source_y0(&node_y0, links, &mut nodes[ni].target_links);
    }
}

fn reorder_node_links(nodes: &mut [Node], links: &[Link], node_idx: usize) {
    let node_y0 = nodes.iter().map(|n| n.y0).collect::<Vec<_>>();

    let target_links = nodes[node_idx].target_links.clone();
    for li in target_links {
        let source = links[li].source;
        sort_source_links_by_target_y0(&node_y0, links, &mut nodes[source].source_links);
    }

    let source_links = nodes[node_idx].source_links.clone();
    for li in source_links {
        let target = links[li].target;
        sort_target_links_by_source_y0(&node_y0, links, &mut nodes[target].target_links);
    }
}

/// Where a link from `source` should enter `target` if `target` were aligned to `source`.
fn target_top(nodes: &[Node], links: &[Link], py: f64, source: usize, target: usize) -> f64 {
    let source_link_count = nodes[source].source_links.len() as f64;
    let mut y = nodes[source].y0 - (source_link_count - 1.0) * py / 2.0;
    for &li in &nodes[source].source_links {
        if links[li].target == target {
            break;
        }
        y += links[li].width + py;
    }
    for &li in &nodes[target].target_links {
        if links[li].source == source {
            break;
        }
        y -= links[li].width;
    }
    y
}

/// Where a link to `target` should leave `source` if `source` were aligned to `target`.
fn source_top(nodes: &[Node], links: &[Link], py: f64, source: usize, target: usize) -> f64 {
    let target_link_count = nodes[target].target_links.len() as f64;
    let mut y = nodes[target].y0 - (target_link_count - 1.0) * py / 2.0;
    for &li in &nodes[target].target_links {
        if links[li].source == source {
            break;
        }
        y += links[li].width + py;
    }
    for &li in &nodes[source].source_links {
        if links[li].target == target {
            break;
        }
        y -= links[li].width;
    }
    y
}

fn resolve_collisions_top_to_bottom(
    nodes: &mut [Node],
    column: &[usize],
    py: f64,
    mut y: f64,
    mut i: isize,
    alpha: f64,
) {
    while i < column.len() as isize {
        let ni = column[i as usize];
        let dy = (y - nodes[ni].y0) * alpha;
        if dy > 1e-6 {
            nodes[ni].y0 += dy;
            nodes[ni].y1 += dy;
        }
        y = nodes[ni].y1 + py;
        i += 1;
    }
}

fn resolve_collisions_bottom_to_top(
    nodes: &mut [Node],
    column: &[usize],
    py: f64,
    mut y: f64,
    mut i: isize,
    alpha: f64,
) {
    while i >= 0 {
        let ni = column[i as usize];
        let dy = (nodes[ni].y1 - y) * alpha;
        if dy > 1e-6 {
            nodes[ni].y0 -= dy;
            nodes[ni].y1 -= dy;
        }
        y = nodes[ni].y0 - py;
        i -= 1;
    }
}

fn resolve_collisions(nodes: &mut [Node], column: &[usize], py: f64, extent: Extent, alpha: f64) {
    if column.is_empty() {
        return;
    }
    let i = column.len() >> 1;
    let subject = column[i];
    let (subject_y0, subject_y1) = (nodes[subject].y0, nodes[subject].y1);
    resolve_collisions_bottom_to_top(nodes, column, py, subject_y0 - py, i as isize - 1, alpha);
    resolve_collisions_top_to_bottom(nodes, column, py, subject_y1 + py, i as isize + 1, alpha);
    resolve_collisions_bottom_to_top(
        nodes,
        column,
        py,
        extent.y1,
        column.len() as isize - 1,
        alpha,
    );
    resolve_collisions_top_to_bottom(nodes, column, py, extent.y0, 0, alpha);
}

fn relax_left_to_right(
    nodes: &mut [Node],
    links: &[Link],
    columns: &mut [Vec<usize>],
    py: f64,
    alpha: f64,
    beta: f64,
    extent: Extent,
) {
    for column in columns.iter_mut().skip(1) {
        for &target in column.iter() {
            let mut y = 0.0;
            let mut w = 0.0;
            for &li in &nodes[target].target_links {
                let source = links[li].source;
                let v = links[li].value * (nodes[target].layer as f64 - nodes[source].layer as f64);
                y += target_top(nodes, links, py, source, target) * v;
                w += v;
            }
            if !(w > 0.0) {
                continue;
            }
            let dy = (y / w - nodes[target].y0) * alpha;
            nodes[target].y0 += dy;
            nodes[target].y1 += dy;
            reorder_node_links(nodes, links, target);
        }
        column.sort_by(|&a, &b| f64_cmp(nodes[a].y0, nodes[b].y0).then_with(|| a.cmp(&b)));
        resolve_collisions(nodes, column, py, extent, beta);
    }
}

fn relax_right_to_left(
    nodes: &mut [Node],
    links: &[Link],
    columns: &mut [Vec<usize>],
    py: f64,
    alpha: f64,
    beta: f64,
    extent: Extent,
) {
    if columns.len() < 2 {
        return;
    }
    let last = columns.len() - 1;
    for column in columns[..last].iter_mut().rev() {
        for &source in column.iter() {
            let mut y = 0.0;
            let mut w = 0.0;
            for &li in &nodes[source].source_links {
                let target = links[li].target;
                let v = links[li].value * (nodes[target].layer as f64 - nodes[source].layer as f64);
                y += source_top(nodes, links, py, source, target) * v;
                w += v;
            }
            if !(w > 0.0) {
                continue;
            }
            let dy = (y / w - nodes[source].y0) * alpha;
            nodes[source].y0 += dy;
            nodes[source].y1 += dy;
            reorder_node_links(nodes, links, source);
        }
        column.sort_by(|&a, &b| f64_cmp(nodes[a].y0, nodes[b].y0).then_with(|| a.cmp(&b)));
        resolve_collisions(nodes, column, py, extent, beta);
    }
}

fn compute_link_breadths(nodes: &[Node], links: &mut [Link]) {
    for node in nodes {
        let mut y0 = node.y0;
        let mut y1 = node.y0;
        for &li in &node.source_links {
            links[li].y0 = y0 + links[li].width / 2.0;
            y0 += links[li].width;
        }
        for &li in &node.target_links {
            links[li].y1 = y1 + links[li].width / 2.0;
            y1 += links[li].width;
        }
    }
}
