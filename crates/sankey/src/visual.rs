use sankey_core::{
    ColorPalette, DefaultColorPalette, DefaultFormatterFactory, FormatterFactory,
    SankeySettings, UpdateOptions, ValueFormatter, build_graph,
};
use sankey_layout::{LayeredLayout, SankeyLayout};
use sankey_render::svg::{render_html, render_svg};
use sankey_render::{
    HoverTarget, PointerEvent, RenderContext, Scene, SceneReconciler, layout_graph,
};

/// Why an update left the surface empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearReason {
    /// The update carried no data view.
    NoDataView,
    /// The data view was incomplete or every row was dropped.
    EmptyGraph,
    /// The layout engine rejected the graph, e.g. because of circular links.
    LayoutFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Rendered { nodes: usize, links: usize },
    Cleared(ClearReason),
}

/// One Sankey visual instance.
///
/// State carried between cycles: the last resolved settings, the formatter derived from the
/// last graph, the last viewport width, the color palette and the retained scene. Every
/// update overwrites the first three; the palette keeps its assignments for the lifetime of
/// the visual.
pub struct Visual {
    palette: Box<dyn ColorPalette>,
    formatters: Box<dyn FormatterFactory>,
    layout: Box<dyn LayeredLayout>,
    settings: SankeySettings,
    formatter: Option<Box<dyn ValueFormatter>>,
    viewport_width: f64,
    reconciler: SceneReconciler,
}

impl Default for Visual {
    fn default() -> Self {
        Self::new()
    }
}

impl Visual {
    pub fn new() -> Self {
        Self::with_services(
            Box::new(DefaultColorPalette::default()),
            Box::new(DefaultFormatterFactory),
            Box::new(SankeyLayout),
        )
    }

    pub fn with_services(
        palette: Box<dyn ColorPalette>,
        formatters: Box<dyn FormatterFactory>,
        layout: Box<dyn LayeredLayout>,
    ) -> Self {
        Self {
            palette,
            formatters,
            layout,
            settings: SankeySettings::default(),
            formatter: None,
            viewport_width: 0.0,
            reconciler: SceneReconciler::new(),
        }
    }

    /// Runs one update cycle. Incomplete input and layout failures leave the surface cleared
    /// rather than returning an error.
    pub fn update(&mut self, options: &UpdateOptions) -> UpdateOutcome {
        let Some(data_view) = options.data_view() else {
            tracing::debug!("sankey update without a data view");
            self.reconciler.clear();
            return UpdateOutcome::Cleared(ClearReason::NoDataView);
        };

        self.settings = SankeySettings::from_data_view(data_view);
        self.reconciler.configure_icon(&self.settings);

        let width = options.viewport.width.max(0.0);
        let height = options.viewport.height.max(0.0);
        self.viewport_width = width;
        self.reconciler.set_viewport(width, height);

        let Some(graph) = build_graph(
            data_view,
            &self.settings,
            self.palette.as_mut(),
            self.formatters.as_ref(),
        ) else {
            self.reconciler.clear();
            return UpdateOutcome::Cleared(ClearReason::EmptyGraph);
        };

        self.formatter = Some(
            self.formatters
                .create(graph.format_string.as_deref(), graph.max_value),
        );

        let positioned = match layout_graph(
            &graph,
            width,
            height,
            &self.settings,
            self.layout.as_ref(),
        ) {
            Ok(positioned) => positioned,
            Err(err) => {
                tracing::warn!(error = %err, "sankey layout failed; clearing");
                self.reconciler.clear();
                return UpdateOutcome::Cleared(ClearReason::LayoutFailed);
            }
        };

        let ctx = RenderContext {
            settings: &self.settings,
            viewport_width: self.viewport_width,
            formatter: self.formatter.as_deref(),
        };
        self.reconciler.render(&positioned, &ctx);

        UpdateOutcome::Rendered {
            nodes: positioned.nodes.len(),
            links: positioned.links.len(),
        }
    }

    pub fn on_pointer_move(&mut self, target: &HoverTarget, event: PointerEvent) {
        self.reconciler
            .pointer_move(target, event, self.formatter.as_deref());
    }

    pub fn on_pointer_out(&mut self) {
        self.reconciler.pointer_out();
    }

    pub fn scene(&self) -> &Scene {
        self.reconciler.scene()
    }

    /// Settings resolved by the last cycle that carried a data view.
    pub fn settings(&self) -> &SankeySettings {
        &self.settings
    }

    pub fn viewport_width(&self) -> f64 {
        self.viewport_width
    }

    pub fn to_svg(&self) -> String {
        render_svg(self.scene())
    }

    pub fn to_html(&self) -> String {
        render_html(self.scene())
    }
}
