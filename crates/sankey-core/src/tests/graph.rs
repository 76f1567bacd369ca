use crate::*;
use serde_json::{Value, json};

fn data_view(rows: &[(Value, Value, Value)]) -> DataView {
    DataView {
        metadata: DataViewMetadata::default(),
        categorical: Some(CategoricalData {
            categories: vec![
                CategoryColumn::new("From", rows.iter().map(|r| r.0.clone()).collect()),
                CategoryColumn::new("To", rows.iter().map(|r| r.1.clone()).collect()),
            ],
            values: vec![ValueColumn::new(
                "Amount",
                None,
                rows.iter().map(|r| r.2.clone()).collect(),
            )],
        }),
    }
}

fn build(view: &DataView) -> Option<SankeyGraph> {
    let settings = SankeySettings::from_data_view(view);
    let mut palette = DefaultColorPalette::default();
    build_graph(view, &settings, &mut palette, &DefaultFormatterFactory)
}

fn link<'a>(graph: &'a SankeyGraph, source: &str, target: &str) -> &'a SankeyLink {
    graph
        .links
        .iter()
        .find(|l| {
            graph.source_name(l) == Some(source) && graph.target_name(l) == Some(target)
        })
        .unwrap()
}

#[test]
fn worked_example_totals_and_percentages() {
    let view = data_view(&[
        (json!("A"), json!("B"), json!(10)),
        (json!("A"), json!("C"), json!(30)),
        (json!("B"), json!("C"), json!(5)),
    ]);
    let graph = build(&view).unwrap();

    let names: Vec<&str> = graph.nodes.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, ["A", "B", "C"]);

    assert_eq!(graph.node("A").unwrap().total, 40.0);
    assert_eq!(graph.node("B").unwrap().total, 10.0);
    assert_eq!(graph.node("C").unwrap().total, 35.0);
    assert_eq!(graph.total_value, 45.0);
    assert_eq!(graph.max_value, 30.0);

    let a = graph.node("A").unwrap();
    assert!((a.percent_of_total - 40.0 / 45.0 * 100.0).abs() < 1e-9);

    assert_eq!(link(&graph, "A", "B").percent, 25.0);
    assert_eq!(link(&graph, "A", "C").percent, 75.0);
    assert_eq!(link(&graph, "B", "C").percent, 100.0);

    assert_eq!(link(&graph, "A", "B").key, "A|B|0");
    assert_eq!(link(&graph, "B", "C").key, "B|C|2");
    assert_eq!(link(&graph, "A", "C").formatted_value, "30");
}

#[test]
fn link_color_is_inherited_from_source_node() {
    let view = data_view(&[
        (json!("A"), json!("B"), json!(1)),
        (json!("B"), json!("C"), json!(1)),
    ]);
    let graph = build(&view).unwrap();
    for l in &graph.links {
        assert_eq!(l.color, graph.nodes[l.source].color);
    }
    assert_ne!(graph.nodes[0].color, graph.nodes[1].color);
}

#[test]
fn zero_values_are_kept() {
    let view = data_view(&[
        (json!("A"), json!("B"), json!(0)),
        (json!("A"), json!("C"), json!(0)),
    ]);
    let graph = build(&view).unwrap();
    assert_eq!(graph.links.len(), 2);
    assert_eq!(graph.nodes.len(), 3);
    assert_eq!(graph.total_value, 0.0);
    for n in &graph.nodes {
        assert_eq!(n.total, 0.0);
        assert_eq!(n.percent_of_total, 0.0);
    }
    for l in &graph.links {
        assert_eq!(l.percent, 0.0);
    }
}

#[test]
fn malformed_rows_never_produce_nodes_or_links() {
    let view = data_view(&[
        (json!("A"), json!("B"), Value::Null),
        (json!("A"), json!("B"), json!("not a number")),
        (json!("A"), json!("B"), json!("inf")),
        (json!("A"), json!("B"), json!([1])),
        (Value::Null, json!("B"), json!(1)),
        (json!(""), json!("B"), json!(1)),
        (json!("A"), json!(""), json!(1)),
        (json!("Keep"), json!("Me"), json!(2)),
    ]);
    let graph = build(&view).unwrap();
    let names: Vec<&str> = graph.nodes.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, ["Keep", "Me"]);
    assert_eq!(graph.links.len(), 1);
    assert_eq!(graph.links[0].key, "Keep|Me|7");
}

#[test]
fn missing_category_cells_drop_the_row() {
    let mut view = data_view(&[
        (json!("A"), json!("B"), json!(1)),
        (json!("A"), json!("C"), json!(2)),
    ]);
    view.categorical.as_mut().unwrap().categories[1].values.truncate(1);
    let graph = build(&view).unwrap();
    assert_eq!(graph.links.len(), 1);
    assert!(graph.node("C").is_none());
}

#[test]
fn every_row_dropped_yields_none() {
    let view = data_view(&[
        (json!("A"), json!("B"), Value::Null),
        (Value::Null, json!("B"), json!(1)),
    ]);
    assert!(build(&view).is_none());
}

#[test]
fn insufficient_columns_yield_none() {
    assert!(build(&DataView::default()).is_none());

    let mut view = data_view(&[(json!("A"), json!("B"), json!(1))]);
    view.categorical.as_mut().unwrap().categories.pop();
    assert!(build(&view).is_none());

    let mut view = data_view(&[(json!("A"), json!("B"), json!(1))]);
    view.categorical.as_mut().unwrap().values.clear();
    assert!(build(&view).is_none());
}

#[test]
fn duplicate_pairs_are_not_merged() {
    let view = data_view(&[
        (json!("A"), json!("B"), json!(4)),
        (json!("A"), json!("B"), json!(6)),
    ]);
    let graph = build(&view).unwrap();
    assert_eq!(graph.links.len(), 2);
    assert_eq!(graph.links[0].key, "A|B|0");
    assert_eq!(graph.links[1].key, "A|B|1");
    assert_eq!(graph.links[0].percent, 40.0);
    assert_eq!(graph.links[1].percent, 60.0);
    assert_eq!(graph.node("B").unwrap().total, 10.0);
}

#[test]
fn outgoing_percentages_sum_to_one_hundred() {
    let view = data_view(&[
        (json!("S"), json!("X"), json!(1.5)),
        (json!("S"), json!("Y"), json!(2.25)),
        (json!("S"), json!("Z"), json!(7)),
        (json!("X"), json!("Z"), json!(0.3)),
    ]);
    let graph = build(&view).unwrap();
    let sum: f64 = graph
        .links
        .iter()
        .filter(|l| graph.source_name(l) == Some("S"))
        .map(|l| l.percent)
        .sum();
    assert!((sum - 100.0).abs() < 1e-9);
}

#[test]
fn pass_through_node_total_is_max_of_in_and_out() {
    let view = data_view(&[
        (json!("A"), json!("B"), json!(10)),
        (json!("B"), json!("C"), json!(4)),
        (json!("B"), json!("D"), json!(3)),
    ]);
    let graph = build(&view).unwrap();
    assert_eq!(graph.node("B").unwrap().total, 10.0);
    assert_eq!(graph.node("C").unwrap().total, 4.0);
    assert_eq!(graph.total_value, 17.0);
}

#[test]
fn builds_are_deterministic() {
    let view = data_view(&[
        (json!("b"), json!("a"), json!(3)),
        (json!("c"), json!("a"), json!(1)),
        (json!("a"), json!("d"), json!(2)),
    ]);
    assert_eq!(build(&view).unwrap(), build(&view).unwrap());
}

#[test]
fn first_row_override_color_wins() {
    let mut view = data_view(&[
        (json!("A"), json!("B"), json!(1)),
        (json!("A"), json!("C"), json!(1)),
    ]);
    view.categorical.as_mut().unwrap().categories[0].objects = Some(vec![
        json!({ "dataPoint": { "fill": { "solid": { "color": "#ff0000" } } } }),
        json!({ "dataPoint": { "fill": { "solid": { "color": "#00ff00" } } } }),
    ]);
    let graph = build(&view).unwrap();
    assert_eq!(graph.node("A").unwrap().color, "#ff0000");
    assert!(graph.links.iter().all(|l| l.color == "#ff0000"));
}

#[test]
fn memoized_color_is_shared_between_source_and_destination_columns() {
    let mut view = data_view(&[
        (json!("A"), json!("B"), json!(1)),
        (json!("B"), json!("C"), json!(1)),
    ]);
    view.categorical.as_mut().unwrap().categories[0].objects = Some(vec![
        Value::Null,
        json!({ "dataPoint": { "fill": { "solid": { "color": "#123456" } } } }),
    ]);
    let graph = build(&view).unwrap();
    // "B" was first resolved as a destination in row 0, before its override in row 1.
    assert_ne!(graph.node("B").unwrap().color, "#123456");
    assert_eq!(graph.links[1].color, graph.node("B").unwrap().color);
}

#[test]
fn default_color_applies_when_no_override() {
    let mut view = data_view(&[
        (json!("A"), json!("B"), json!(1)),
        (json!("C"), json!("B"), json!(1)),
    ]);
    view.metadata.objects = Some(json!({
        "dataPoint": { "defaultColor": { "solid": { "color": "#abcdef" } } }
    }));
    view.categorical.as_mut().unwrap().categories[0].objects = Some(vec![
        Value::Null,
        json!({ "dataPoint": { "fill": { "solid": { "color": "#000000" } } } }),
    ]);
    let graph = build(&view).unwrap();
    assert_eq!(graph.node("A").unwrap().color, "#abcdef");
    assert_eq!(graph.node("B").unwrap().color, "#abcdef");
    assert_eq!(graph.node("C").unwrap().color, "#000000");
}

#[test]
fn palette_is_keyed_by_category_value() {
    let view = data_view(&[(json!("A"), json!("B"), json!(1))]);
    let settings = SankeySettings::default();
    let mut palette = DefaultColorPalette::default();
    let expected_b = {
        let mut p = DefaultColorPalette::default();
        p.get_color("A");
        p.get_color("B")
    };
    let graph = build_graph(&view, &settings, &mut palette, &DefaultFormatterFactory).unwrap();
    assert_eq!(graph.node("B").unwrap().color, expected_b);
    assert_eq!(palette.get_color("A"), graph.node("A").unwrap().color);
}

#[test]
fn non_string_categories_are_stringified() {
    let view = data_view(&[
        (json!(2024), json!(1.5), json!("12")),
        (json!(true), json!(2024), json!(" 3 ")),
    ]);
    let graph = build(&view).unwrap();
    let names: Vec<&str> = graph.nodes.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, ["2024", "1.5", "true"]);
    assert_eq!(graph.links[0].value, 12.0);
    assert_eq!(graph.links[1].value, 3.0);
}

#[test]
fn formatted_values_follow_the_column_format() {
    let mut view = data_view(&[
        (json!("A"), json!("B"), json!(1234.5)),
        (json!("A"), json!("C"), json!(0.25)),
    ]);
    view.categorical.as_mut().unwrap().values[0].source.format = Some("#,0.00".to_string());
    let graph = build(&view).unwrap();
    assert_eq!(graph.format_string.as_deref(), Some("#,0.00"));
    assert_eq!(graph.links[0].formatted_value, "1,234.50");
    assert_eq!(graph.links[1].formatted_value, "0.25");
}

#[test]
fn radix_prefixed_strings_convert() {
    assert_eq!(graph::cell_to_number(&json!("0x10")), Some(16.0));
    assert_eq!(graph::cell_to_number(&json!(" 0X1f ")), Some(31.0));
    assert_eq!(graph::cell_to_number(&json!("0b101")), Some(5.0));
    assert_eq!(graph::cell_to_number(&json!("0o7")), Some(7.0));
    assert_eq!(graph::cell_to_number(&json!("0x")), None);
    assert_eq!(graph::cell_to_number(&json!("-0x10")), None);
    assert_eq!(graph::cell_to_number(&json!("0b102")), None);
    assert_eq!(graph::cell_to_number(&json!("010")), Some(10.0));
}

#[test]
fn hex_value_cells_feed_the_graph() {
    let graph = build(&data_view(&[(json!("A"), json!("B"), json!("0x20"))])).unwrap();
    assert_eq!(link(&graph, "A", "B").value, 32.0);
}

#[test]
fn endpoint_names_are_none_for_foreign_links() {
    let graph = build(&data_view(&[(json!("A"), json!("B"), json!(1))])).unwrap();
    let mut foreign = graph.links[0].clone();
    foreign.source = 7;
    assert_eq!(graph.source_name(&foreign), None);
    assert_eq!(graph.target_name(&foreign), Some("B"));
}
