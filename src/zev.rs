// ZEV meter hierarchy
//
// Rebuilds meters, sub-meters and their monthly measurement points from the
// raw grid of a ZEV energy-sharing export.
// - models: report types and the JSON-safety check
// - hierarchy_parser: row-by-row state machine over the grid

pub mod hierarchy_parser;
pub mod models;

pub use hierarchy_parser::{is_measurement_point, month_tokens, HierarchyParser};
pub use models::{
    HierarchySummary, MeasurementPoint, MeterKind, MeterRecord, MonthValue, StructureInfo,
    ZevReport,
};
