use assert_cmd::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

fn repo_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("expected crates/<name> layout")
        .to_path_buf()
}

fn fixture(name: &str) -> PathBuf {
    let path = repo_root().join("fixtures").join(name);
    assert!(path.exists(), "fixture missing: {}", path.display());
    path
}

fn stdout_of(args: &[&str]) -> String {
    let exe = assert_cmd::cargo_bin!("sankey-cli");
    let output = Command::new(exe)
        .args(args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    String::from_utf8(output).expect("utf8 stdout")
}

#[test]
fn cli_renders_csv_to_svg() {
    let input = fixture("energy.csv");
    let svg = stdout_of(&["render", input.to_string_lossy().as_ref()]);
    assert!(svg.starts_with("<svg "));
    assert!(svg.contains(r#"width="800" height="600""#));
    assert_eq!(svg.matches("<path ").count(), 5);
    assert_eq!(svg.matches(r#"<g class="node""#).count(), 6);
}

#[test]
fn cli_writes_html_to_out_path() {
    let input = fixture("energy.json");
    let tmp = tempfile::tempdir().expect("tempdir");
    let out = tmp.path().join("energy.html");

    let exe = assert_cmd::cargo_bin!("sankey-cli");
    Command::new(exe)
        .args([
            "render",
            "--format",
            "html",
            "--width",
            "1000",
            "--out",
            out.to_string_lossy().as_ref(),
            input.to_string_lossy().as_ref(),
        ])
        .assert()
        .success();

    let html = fs::read_to_string(&out).expect("read html");
    assert!(html.starts_with(r#"<div class="visual-sankey">"#));
    assert!(html.contains(r#"width="1000" height="480""#));
    assert!(html.contains(r##"stroke="#222222""##));
    assert!(html.contains(r#"stroke-opacity="0.5""#));
    assert!(html.contains("font-size: 14px"));
}

#[test]
fn cli_build_emits_graph_json() {
    let input = fixture("energy.json");
    let json = stdout_of(&["build", input.to_string_lossy().as_ref()]);
    let graph: serde_json::Value = serde_json::from_str(&json).expect("graph json");

    assert_eq!(graph["nodes"].as_array().map(Vec::len), Some(6));
    assert_eq!(graph["nodes"][0]["name"], "Coal");
    assert_eq!(graph["nodes"][0]["color"], "#222222");
    assert_eq!(graph["nodes"][2]["color"], "#888888");
    assert_eq!(graph["links"][0]["formattedValue"], "40.0");
    assert_eq!(graph["totalValue"], 145.0);
}

#[test]
fn cli_layout_reads_stdin() {
    let csv = fs::read_to_string(fixture("energy.csv")).expect("read csv");
    let exe = assert_cmd::cargo_bin!("sankey-cli");
    let output = assert_cmd::Command::new(exe)
        .args(["layout", "--width", "500", "--height", "300"])
        .write_stdin(csv)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let layout: serde_json::Value = serde_json::from_slice(&output).expect("layout json");
    assert_eq!(layout["extent"]["x1"], 480.0);
    assert_eq!(layout["extent"]["y1"], 280.0);
    let coal = &layout["nodes"][0];
    assert_eq!(coal["name"], "Coal");
    assert_eq!(coal["x0"], 20.0);
}

#[test]
fn cli_layout_rejects_circular_data() {
    let exe = assert_cmd::cargo_bin!("sankey-cli");
    Command::new(exe)
        .args(["layout", fixture("cycle.csv").to_string_lossy().as_ref()])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn cli_render_of_circular_data_is_an_empty_chart() {
    let svg = stdout_of(&["render", fixture("cycle.csv").to_string_lossy().as_ref()]);
    assert!(svg.contains(r#"<g class="links"></g><g class="nodes"></g>"#));
}

#[test]
fn cli_usage_errors_exit_with_2() {
    let exe = assert_cmd::cargo_bin!("sankey-cli");
    Command::new(exe)
        .args(["render", "--format", "png"])
        .assert()
        .failure()
        .code(2);
}
