//! Host-delivered table and update payload.
//!
//! The shapes follow the host's categorical data view: parallel category columns, value
//! columns of the same length, and a `metadata.objects` property bag. Every cell is an
//! arbitrary JSON value and may be `null` or missing entirely.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// One update invocation from the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOptions {
    #[serde(default)]
    pub data_views: Vec<DataView>,
    #[serde(default)]
    pub viewport: Viewport,
}

impl UpdateOptions {
    pub fn new(data_view: DataView, viewport: Viewport) -> Self {
        Self {
            data_views: vec![data_view],
            viewport,
        }
    }

    /// An update without any data view (the host cleared its query).
    pub fn empty(viewport: Viewport) -> Self {
        Self {
            data_views: Vec::new(),
            viewport,
        }
    }

    pub fn data_view(&self) -> Option<&DataView> {
        self.data_views.first()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataView {
    #[serde(default)]
    pub metadata: DataViewMetadata,
    #[serde(default)]
    pub categorical: Option<CategoricalData>,
}

impl DataView {
    pub fn from_json(value: &Value) -> crate::Result<Self> {
        Ok(serde_json::from_value(Value::clone(value))?)
    }

    /// The persisted property bag (`metadata.objects`), when present.
    pub fn objects(&self) -> Option<&Value> {
        self.metadata.objects.as_ref().filter(|v| !v.is_null())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataViewMetadata {
    #[serde(default)]
    pub objects: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoricalData {
    #[serde(default)]
    pub categories: Vec<CategoryColumn>,
    #[serde(default)]
    pub values: Vec<ValueColumn>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSource {
    #[serde(default)]
    pub display_name: Option<String>,
    /// Format-string hint for numeric columns (e.g. `"#,0.00"`).
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryColumn {
    #[serde(default)]
    pub source: ColumnSource,
    #[serde(default)]
    pub values: Vec<Value>,
    /// Per-row style objects, parallel to `values`.
    #[serde(default)]
    pub objects: Option<Vec<Value>>,
}

impl CategoryColumn {
    pub fn new(display_name: &str, values: Vec<Value>) -> Self {
        Self {
            source: ColumnSource {
                display_name: Some(display_name.to_string()),
                format: None,
            },
            values,
            objects: None,
        }
    }

    pub fn value(&self, row: usize) -> Option<&Value> {
        self.values.get(row)
    }

    pub fn row_object(&self, row: usize) -> Option<&Value> {
        self.objects.as_ref()?.get(row).filter(|v| !v.is_null())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueColumn {
    #[serde(default)]
    pub source: ColumnSource,
    #[serde(default)]
    pub values: Vec<Value>,
}

impl ValueColumn {
    pub fn new(display_name: &str, format: Option<&str>, values: Vec<Value>) -> Self {
        Self {
            source: ColumnSource {
                display_name: Some(display_name.to_string()),
                format: format.map(|s| s.to_string()),
            },
            values,
        }
    }

    pub fn format(&self) -> Option<&str> {
        self.source.format.as_deref()
    }
}
