use sankey::layout::SankeyLayout;
use sankey::render::layout_graph;
use sankey::{
    DataView, DefaultColorPalette, DefaultFormatterFactory, SankeySettings, UpdateOptions,
    UpdateOutcome, Viewport, Visual, build_graph,
};
use serde::Serialize;
use serde_json::Value;
use std::io::Read;
use std::str::FromStr;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Data(sankey::Error),
    Render(sankey::render::Error),
    Json(serde_json::Error),
    EmptyGraph,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Data(err) => write!(f, "{err}"),
            CliError::Render(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::EmptyGraph => write!(f, "No drawable source/target/value rows in input"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<sankey::Error> for CliError {
    fn from(value: sankey::Error) -> Self {
        Self::Data(value)
    }
}

impl From<sankey::render::Error> for CliError {
    fn from(value: sankey::render::Error) -> Self {
        Self::Render(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    Build,
    Layout,
    #[default]
    Render,
}

#[derive(Debug, Clone, Copy, Default)]
enum RenderFormat {
    #[default]
    Svg,
    Html,
}

impl FromStr for RenderFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svg" => Ok(Self::Svg),
            "html" => Ok(Self::Html),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    pretty: bool,
    render_format: RenderFormat,
    width: Option<f64>,
    height: Option<f64>,
    out: Option<String>,
}

const DEFAULT_WIDTH: f64 = 800.0;
const DEFAULT_HEIGHT: f64 = 600.0;

fn usage() -> &'static str {
    "sankey-cli\n\
\n\
USAGE:\n\
  sankey-cli build [--pretty] [<path>|-]\n\
  sankey-cli layout [--pretty] [--width <w>] [--height <h>] [<path>|-]\n\
  sankey-cli [render] [--format svg|html] [--width <w>] [--height <h>] [--out <path>] [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - Input is either JSON (update options with `dataViews`, or a single data view) or CSV\n\
    with `source,target,value` records and an optional header.\n\
  - The viewport is the JSON `viewport` when present, else 800x600; --width/--height override it.\n\
  - render prints SVG to stdout by default; use --out to write a file.\n\
  - Set RUST_LOG (e.g. RUST_LOG=debug) to see dropped rows and layout diagnostics on stderr.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "build" => args.command = Command::Build,
            "layout" => args.command = Command::Layout,
            "render" => args.command = Command::Render,
            "--pretty" => args.pretty = true,
            "--format" => {
                let Some(fmt) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.render_format = fmt
                    .parse::<RenderFormat>()
                    .map_err(|_| CliError::Usage(usage()))?;
            }
            "--width" => {
                let Some(w) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.width = Some(parse_dimension(w)?);
            }
            "--height" => {
                let Some(h) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.height = Some(parse_dimension(h)?);
            }
            "--out" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
            }
            "-" => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some("-".to_string());
            }
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn parse_dimension(raw: &str) -> Result<f64, CliError> {
    let v = raw.parse::<f64>().map_err(|_| CliError::Usage(usage()))?;
    if !v.is_finite() {
        return Err(CliError::Usage(usage()));
    }
    Ok(v)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

/// JSON input is recognized by its first non-blank character; anything else is CSV.
fn parse_update(text: &str) -> Result<UpdateOptions, CliError> {
    let trimmed = text.trim_start();
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        let view = sankey::csv::data_view_from_csv(text)?;
        return Ok(UpdateOptions::new(
            view,
            Viewport::new(DEFAULT_WIDTH, DEFAULT_HEIGHT),
        ));
    }

    let value: Value = serde_json::from_str(trimmed)?;
    if value.get("dataViews").is_some() {
        let has_viewport = value.get("viewport").is_some();
        let mut options: UpdateOptions = serde_json::from_value(value)?;
        if !has_viewport {
            options.viewport = Viewport::new(DEFAULT_WIDTH, DEFAULT_HEIGHT);
        }
        return Ok(options);
    }
    Ok(UpdateOptions::new(
        DataView::from_json(&value)?,
        Viewport::new(DEFAULT_WIDTH, DEFAULT_HEIGHT),
    ))
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    if pretty {
        serde_json::to_writer_pretty(std::io::stdout().lock(), value)?;
    } else {
        serde_json::to_writer(std::io::stdout().lock(), value)?;
    }
    Ok(())
}

fn write_text(text: &str, out: Option<&str>) -> Result<(), CliError> {
    match out {
        None => {
            print!("{text}");
            Ok(())
        }
        Some(path) => {
            std::fs::write(path, text)?;
            Ok(())
        }
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let text = read_input(args.input.as_deref())?;
    let mut options = parse_update(&text)?;
    if let Some(w) = args.width {
        options.viewport.width = w;
    }
    if let Some(h) = args.height {
        options.viewport.height = h;
    }

    match args.command {
        Command::Build | Command::Layout => {
            let Some(view) = options.data_view() else {
                return Err(CliError::EmptyGraph);
            };
            let settings = SankeySettings::from_data_view(view);
            let mut palette = DefaultColorPalette::default();
            let Some(graph) = build_graph(view, &settings, &mut palette, &DefaultFormatterFactory)
            else {
                return Err(CliError::EmptyGraph);
            };

            if let Command::Build = args.command {
                return write_json(&graph, args.pretty);
            }
            let positioned = layout_graph(
                &graph,
                options.viewport.width.max(0.0),
                options.viewport.height.max(0.0),
                &settings,
                &SankeyLayout,
            )?;
            write_json(&positioned, args.pretty)
        }
        Command::Render => {
            let mut visual = Visual::new();
            match visual.update(&options) {
                UpdateOutcome::Rendered { nodes, links } => {
                    tracing::debug!(nodes, links, "rendered sankey");
                }
                UpdateOutcome::Cleared(reason) => {
                    tracing::warn!(?reason, "nothing to draw; writing an empty chart");
                }
            }
            let markup = match args.render_format {
                RenderFormat::Svg => visual.to_svg(),
                RenderFormat::Html => visual.to_html(),
            };
            write_text(&markup, args.out.as_deref())
        }
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
