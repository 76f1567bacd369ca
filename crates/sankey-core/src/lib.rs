#![forbid(unsafe_code)]

//! Sankey visual data model (headless).
//!
//! This crate turns a host-delivered categorical table into a Sankey node/link graph:
//! - [`settings`]: typed, defaulted and clamped settings read from the host property bag
//! - [`graph`]: row aggregation into nodes and links with totals, percentages and colors
//! - [`color`] / [`format`]: the palette and number-formatting services the builder consumes
//! - [`csv`]: a small `source,target,value` importer producing a [`DataView`]

pub mod color;
pub mod csv;
pub mod data_view;
pub mod error;
pub mod format;
pub mod graph;
pub mod settings;

pub use color::{ColorPalette, DefaultColorPalette};
pub use data_view::{
    CategoricalData, CategoryColumn, ColumnSource, DataView, DataViewMetadata, UpdateOptions,
    ValueColumn, Viewport,
};
pub use error::{Error, Result};
pub use format::{DefaultFormatterFactory, FormatterFactory, ValueFormatter, format_fallback};
pub use graph::{SankeyGraph, SankeyLink, SankeyNode, build_graph};
pub use settings::SankeySettings;

#[cfg(test)]
mod tests;
