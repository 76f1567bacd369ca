//! Settings resolution from the host property bag.
//!
//! The bag is a JSON object of named groups, each holding named properties. Any level may
//! be missing, `null`, or of an unexpected type; every lookup falls back to a default so
//! the result is always complete. Numeric ranges are enforced here, once, so downstream
//! rendering never revalidates.

use crate::data_view::DataView;
use serde::Serialize;
use serde_json::Value;

pub const DEFAULT_LABEL_FONT_SIZE: f64 = 12.0;
pub const DEFAULT_LINK_OPACITY: f64 = 0.7;
pub const MIN_LINK_OPACITY: f64 = 0.05;
pub const MAX_LINK_OPACITY: f64 = 1.0;
pub const DEFAULT_ICON_SIZE: f64 = 48.0;
pub const MIN_ICON_SIZE: f64 = 12.0;
pub const MAX_ICON_SIZE: f64 = 96.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SankeySettings {
    pub data_point: DataPointSettings,
    pub node: NodeSettings,
    pub links: LinkSettings,
    pub icon: IconSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataPointSettings {
    pub default_color: Option<String>,
    /// Part of the persisted contract; not consulted by the builder.
    pub show_all_data_points: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSettings {
    pub label_font_size: f64,
    pub show_values: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSettings {
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IconSettings {
    pub image_url: String,
    pub size: f64,
}

impl IconSettings {
    /// The configured icon URL, if any.
    pub fn url(&self) -> Option<&str> {
        Some(self.image_url.as_str()).filter(|s| !s.is_empty())
    }
}

impl Default for SankeySettings {
    fn default() -> Self {
        Self::parse(None)
    }
}

impl SankeySettings {
    pub fn from_data_view(data_view: &DataView) -> Self {
        Self::parse(data_view.objects())
    }

    pub fn parse(objects: Option<&Value>) -> Self {
        Self {
            data_point: DataPointSettings {
                default_color: fill_color(objects, "dataPoint", "defaultColor"),
                show_all_data_points: bool_value(objects, "dataPoint", "showAllDataPoints")
                    .unwrap_or(true),
            },
            node: NodeSettings {
                label_font_size: number_value(objects, "nodeSettings", "labelFontSize")
                    .unwrap_or(DEFAULT_LABEL_FONT_SIZE),
                show_values: bool_value(objects, "nodeSettings", "showValues").unwrap_or(true),
            },
            links: LinkSettings {
                opacity: clamped_number(
                    objects,
                    "linkSettings",
                    "opacity",
                    DEFAULT_LINK_OPACITY,
                    MIN_LINK_OPACITY,
                    MAX_LINK_OPACITY,
                ),
            },
            icon: IconSettings {
                image_url: string_value(objects, "iconSettings", "imageUrl").unwrap_or_default(),
                size: clamped_number(
                    objects,
                    "iconSettings",
                    "size",
                    DEFAULT_ICON_SIZE,
                    MIN_ICON_SIZE,
                    MAX_ICON_SIZE,
                ),
            },
        }
    }
}

fn property<'a>(objects: Option<&'a Value>, group: &str, name: &str) -> Option<&'a Value> {
    objects?
        .get(group)?
        .get(name)
        .filter(|v| !v.is_null())
}

fn number_value(objects: Option<&Value>, group: &str, name: &str) -> Option<f64> {
    property(objects, group, name)?
        .as_f64()
        .filter(|v| v.is_finite())
}

fn bool_value(objects: Option<&Value>, group: &str, name: &str) -> Option<bool> {
    property(objects, group, name)?.as_bool()
}

fn string_value(objects: Option<&Value>, group: &str, name: &str) -> Option<String> {
    property(objects, group, name)?
        .as_str()
        .map(|s| s.to_string())
}

fn clamped_number(
    objects: Option<&Value>,
    group: &str,
    name: &str,
    default: f64,
    min: f64,
    max: f64,
) -> f64 {
    number_value(objects, group, name)
        .unwrap_or(default)
        .clamp(min, max)
}

/// Reads a `{ "solid": { "color": ".." } }` fill.
///
/// Returns `None` when the property, the `solid` object or the color is missing, or when
/// the color is an empty string.
pub fn fill_color(objects: Option<&Value>, group: &str, name: &str) -> Option<String> {
    solid_color(property(objects, group, name)?)
}

/// Extracts the solid color from a fill value.
pub fn solid_color(fill: &Value) -> Option<String> {
    fill.get("solid")?
        .get("color")?
        .as_str()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_bag_yields_documented_defaults() {
        let s = SankeySettings::parse(None);
        assert_eq!(s.data_point.default_color, None);
        assert!(s.data_point.show_all_data_points);
        assert_eq!(s.node.label_font_size, 12.0);
        assert!(s.node.show_values);
        assert_eq!(s.links.opacity, 0.7);
        assert_eq!(s.icon.image_url, "");
        assert_eq!(s.icon.url(), None);
        assert_eq!(s.icon.size, 48.0);
    }

    #[test]
    fn present_values_override_defaults() {
        let bag = json!({
            "dataPoint": {
                "defaultColor": { "solid": { "color": "#112233" } },
                "showAllDataPoints": false
            },
            "nodeSettings": { "labelFontSize": 16, "showValues": false },
            "linkSettings": { "opacity": 0.25 },
            "iconSettings": { "imageUrl": "https://example.test/logo.png", "size": 64 }
        });
        let s = SankeySettings::parse(Some(&bag));
        assert_eq!(s.data_point.default_color.as_deref(), Some("#112233"));
        assert!(!s.data_point.show_all_data_points);
        assert_eq!(s.node.label_font_size, 16.0);
        assert!(!s.node.show_values);
        assert_eq!(s.links.opacity, 0.25);
        assert_eq!(s.icon.url(), Some("https://example.test/logo.png"));
        assert_eq!(s.icon.size, 64.0);
    }

    #[test]
    fn out_of_range_numbers_are_clamped() {
        let bag = json!({
            "linkSettings": { "opacity": 5 },
            "iconSettings": { "size": 1000 }
        });
        let s = SankeySettings::parse(Some(&bag));
        assert_eq!(s.links.opacity, 1.0);
        assert_eq!(s.icon.size, 96.0);

        let bag = json!({
            "linkSettings": { "opacity": -1 },
            "iconSettings": { "size": 0 }
        });
        let s = SankeySettings::parse(Some(&bag));
        assert_eq!(s.links.opacity, 0.05);
        assert_eq!(s.icon.size, 12.0);
    }

    #[test]
    fn null_and_mistyped_properties_fall_back() {
        let bag = json!({
            "dataPoint": null,
            "nodeSettings": { "labelFontSize": null, "showValues": "yes" },
            "linkSettings": { "opacity": "0.3" },
            "iconSettings": { "imageUrl": 42 }
        });
        let s = SankeySettings::parse(Some(&bag));
        assert_eq!(s, SankeySettings::default());
    }

    #[test]
    fn fill_color_tolerates_absence_at_any_depth() {
        assert_eq!(fill_color(None, "dataPoint", "defaultColor"), None);
        for bag in [
            json!({}),
            json!({ "dataPoint": {} }),
            json!({ "dataPoint": { "defaultColor": {} } }),
            json!({ "dataPoint": { "defaultColor": { "solid": {} } } }),
            json!({ "dataPoint": { "defaultColor": { "solid": { "color": "" } } } }),
            json!({ "dataPoint": { "defaultColor": { "solid": null } } }),
        ] {
            assert_eq!(fill_color(Some(&bag), "dataPoint", "defaultColor"), None);
        }
    }
}
