//! Named query data model

mod metadata;
mod named_query;

pub use metadata::{
    ChartConfig, ChartType, ColumnDefinition, ColumnType, CoordinateFields, DefaultView,
    FilterDefinition, FilterType, FilterValue, MapConfig, QueryMetadata, VisualizationConfig,
};
pub use named_query::{
    NamedQuery, NamedQueryDraft, PipelineStage, QueryPatch, QuerySummary, SummaryMetadata,
    SummaryVisualization, now_millis,
};
