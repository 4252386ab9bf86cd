use serde::Serialize;

use crate::grid::ReadingMethod;
use crate::utils::LabelledMap;
use crate::vocabulary::{
    contains_any, mentions_month, APARTMENT_KEYWORDS, CONSUMPTION_KEYWORDS, COST_KEYWORDS,
    METER_POINT_KEYWORDS,
};

/// Classification of a sheet reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureType {
    ZevMonthlyData,
    Unknown,
}

/// Role a column plays in a ZEV export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Month,
    MeterPoint,
    Apartment,
    Consumption,
    Cost,
    Unknown,
}

impl ColumnRole {
    /// Classify a column label; the first matching role wins
    pub fn classify(label: &str) -> Self {
        if mentions_month(label) {
            ColumnRole::Month
        } else if contains_any(label, METER_POINT_KEYWORDS) {
            ColumnRole::MeterPoint
        } else if contains_any(label, APARTMENT_KEYWORDS) {
            ColumnRole::Apartment
        } else if contains_any(label, CONSUMPTION_KEYWORDS) {
            ColumnRole::Consumption
        } else if contains_any(label, COST_KEYWORDS) {
            ColumnRole::Cost
        } else {
            ColumnRole::Unknown
        }
    }
}

/// One hypothesized reading of a sheet, with its plausibility score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureCandidate {
    pub method: ReadingMethod,
    pub score: u32,
    pub structure_type: StructureType,
    /// Names of the scoring rules that fired, in rule order
    pub confidence_factors: Vec<String>,
    pub column_role_map: LabelledMap<ColumnRole>,
    pub columns: Vec<String>,
    /// `[rows, columns]` of the table read under `method`
    pub shape: [usize; 2],
    pub header_row: Option<usize>,
    pub data_start_row: Option<usize>,
    /// Up to 5 rows x 10 columns, stringified, blanks as ""
    pub sample_rows: Vec<LabelledMap<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StructureCandidate {
    /// Candidate that could not be evaluated (load failure or no data rows)
    pub fn failed(method: ReadingMethod, error: impl Into<String>) -> Self {
        Self {
            method,
            score: 0,
            structure_type: StructureType::Unknown,
            confidence_factors: Vec::new(),
            column_role_map: LabelledMap::new(),
            columns: Vec::new(),
            shape: [0, 0],
            header_row: None,
            data_start_row: None,
            sample_rows: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// Eligible for selection: evaluated without error and scored above zero
    pub fn is_viable(&self) -> bool {
        self.error.is_none() && self.score > 0
    }
}
