//! Display metadata attached to a named query
//!
//! Columns, visualization and filter definitions describe how the results of
//! a pipeline are presented. None of it is interpreted by the service beyond
//! enumeration checks at write time.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata block of a named query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryMetadata {
    #[serde(default)]
    pub columns: Vec<ColumnDefinition>,
    #[serde(default)]
    pub visualization: VisualizationConfig,
    #[serde(default)]
    pub filters: Vec<FilterDefinition>,
}

/// Type of a result column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Number,
    Date,
    Boolean,
    Object,
    Array,
}

/// How one result field is typed and displayed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default = "default_true")]
    pub sortable: bool,
    #[serde(default = "default_true")]
    pub filterable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatter: Option<String>,
}

impl ColumnDefinition {
    /// Create a column with default display hints
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            display_name: None,
            sortable: true,
            filterable: true,
            formatter: None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Default presentation of the query results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefaultView {
    #[default]
    Table,
    Map,
    Chart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
    Scatter,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<ChartType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoordinateFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo_json_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinate_fields: Option<CoordinateFields>,
}

/// Visualization settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationConfig {
    #[serde(default)]
    pub default_view: DefaultView,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<MapConfig>,
}

/// Kind of user-facing filter control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    Text,
    Number,
    Date,
    Range,
    Select,
}

/// Untyped default value of a filter control.
///
/// Any JSON shape is accepted; the variants only keep the primitive kinds
/// apart so callers can match on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    List(Vec<FilterValue>),
    Object(BTreeMap<String, FilterValue>),
}

/// Filter control exposed for a query's results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterDefinition {
    pub field: String,
    #[serde(rename = "type")]
    pub filter_type: FilterType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<FilterValue>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_column_defaults() {
        let column: ColumnDefinition =
            serde_json::from_value(json!({"name": "total", "type": "number"})).unwrap();
        assert_eq!(column.column_type, ColumnType::Number);
        assert!(column.sortable);
        assert!(column.filterable);
        assert!(column.display_name.is_none());
    }

    #[test]
    fn test_visualization_defaults_to_table() {
        let viz: VisualizationConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(viz.default_view, DefaultView::Table);

        let metadata: QueryMetadata = serde_json::from_value(json!({})).unwrap();
        assert_eq!(metadata, QueryMetadata::default());
    }

    #[test]
    fn test_unknown_enum_values_rejected() {
        assert!(serde_json::from_value::<VisualizationConfig>(json!({"defaultView": "grid"})).is_err());
        assert!(
            serde_json::from_value::<ChartConfig>(json!({"type": "donut"})).is_err()
        );
        assert!(
            serde_json::from_value::<FilterDefinition>(json!({"field": "x", "type": "fuzzy"}))
                .is_err()
        );
        assert!(
            serde_json::from_value::<ColumnDefinition>(json!({"name": "x", "type": "int"})).is_err()
        );
    }

    #[test]
    fn test_chart_and_map_wire_names() {
        let viz: VisualizationConfig = serde_json::from_value(json!({
            "defaultView": "chart",
            "chart": {"type": "bar", "xAxis": "month", "yAxis": "revenue"},
            "map": {"geoJsonField": "shape", "coordinateFields": {"lat": "y", "lng": "x"}}
        }))
        .unwrap();

        let chart = viz.chart.as_ref().unwrap();
        assert_eq!(chart.chart_type, Some(ChartType::Bar));
        assert_eq!(chart.x_axis.as_deref(), Some("month"));

        let value = serde_json::to_value(&viz).unwrap();
        assert_eq!(value["chart"]["yAxis"], "revenue");
        assert_eq!(value["map"]["coordinateFields"]["lng"], "x");
    }

    #[test]
    fn test_filter_value_shapes() {
        let filter: FilterDefinition = serde_json::from_value(json!({
            "field": "region",
            "type": "select",
            "options": ["north", "south"],
            "defaultValue": {"min": 1, "labels": ["a", true, null]}
        }))
        .unwrap();

        match filter.default_value {
            Some(FilterValue::Object(ref map)) => {
                assert!(matches!(map.get("min"), Some(FilterValue::Number(_))));
                assert_eq!(
                    map.get("labels"),
                    Some(&FilterValue::List(vec![
                        FilterValue::Text("a".to_string()),
                        FilterValue::Bool(true),
                        FilterValue::Null,
                    ]))
                );
            }
            other => panic!("unexpected default value: {:?}", other),
        }
    }
}
