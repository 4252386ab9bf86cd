use serde::Serialize;

use crate::error::ExtractionWarning;
use crate::grid::CellValue;
use crate::utils::LabelledMap;

/// Kind of a meter block in a ZEV export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MeterKind {
    /// Physical meter with a vendor id (CHINV… or XX001…)
    MainMeter,
    /// Aggregation meter computed by the backend
    VirtualMeter,
    SubMeter,
    VirtualSubMeter,
}

impl MeterKind {
    pub fn is_sub_meter(self) -> bool {
        matches!(self, MeterKind::SubMeter | MeterKind::VirtualSubMeter)
    }

    pub fn is_virtual(self) -> bool {
        matches!(self, MeterKind::VirtualMeter | MeterKind::VirtualSubMeter)
    }
}

/// Value of one measurement point for one month
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MonthValue {
    Number(f64),
    /// Cell content that is not a number, kept verbatim
    Text(String),
}

impl MonthValue {
    /// Blank cells read as 0.0; numeric-looking cells as floats; anything
    /// else keeps its original text
    pub fn from_cell(cell: &CellValue) -> Self {
        if cell.is_blank() {
            return MonthValue::Number(0.0);
        }
        match (cell.as_number(), cell) {
            (Some(n), _) => MonthValue::Number(n),
            (None, CellValue::Text(raw)) => MonthValue::Text(raw.clone()),
            (None, other) => MonthValue::Text(other.as_text()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MonthValue::Number(n) => Some(*n),
            MonthValue::Text(_) => None,
        }
    }
}

/// One labelled reading line of a meter (Messpunkt)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementPoint {
    pub name: String,
    pub values: LabelledMap<MonthValue>,
}

/// One meter block (Zähler) with its measurement points
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeterRecord {
    pub id: String,
    pub kind: MeterKind,
    pub label: String,
    /// Id of the owning main meter; sub-meter kinds only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub month_columns: Vec<String>,
    pub points: Vec<MeasurementPoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HierarchySummary {
    pub total_meters: usize,
    pub total_points: usize,
    pub main_meters: usize,
    pub virtual_meters: usize,
    pub sub_meters: usize,
    pub virtual_sub_meters: usize,
}

impl HierarchySummary {
    pub fn tally(meters: &[MeterRecord]) -> Self {
        let mut summary = HierarchySummary {
            total_meters: meters.len(),
            total_points: meters.iter().map(|m| m.points.len()).sum(),
            ..Default::default()
        };
        for meter in meters {
            match meter.kind {
                MeterKind::MainMeter => summary.main_meters += 1,
                MeterKind::VirtualMeter => summary.virtual_meters += 1,
                MeterKind::SubMeter => summary.sub_meters += 1,
                MeterKind::VirtualSubMeter => summary.virtual_sub_meters += 1,
            }
        }
        summary
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StructureInfo {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Document-wide month columns (from the first meter that declares any)
    pub month_columns: Vec<String>,
}

/// Result of parsing a ZEV export into its meter hierarchy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZevReport {
    pub file_name: String,
    pub structure_verified: bool,
    pub structure_info: StructureInfo,
    pub summary: HierarchySummary,
    #[serde(rename = "zaehler_overview")]
    pub meters: Vec<MeterRecord>,
}

impl ZevReport {
    /// Empty, unverified report carrying one error
    pub fn failed(file_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            structure_verified: false,
            structure_info: StructureInfo {
                errors: vec![error.into()],
                ..Default::default()
            },
            summary: HierarchySummary::default(),
            meters: Vec::new(),
        }
    }

    /// First non-JSON-representable value in the report, if any
    pub fn find_unsafe_value(&self) -> Option<String> {
        for meter in &self.meters {
            for point in &meter.points {
                for (month, value) in point.values.iter() {
                    if let MonthValue::Number(n) = value {
                        if !n.is_finite() {
                            return Some(format!(
                                "meter {} point '{}' month {} is {}",
                                meter.id, point.name, month, n
                            ));
                        }
                    }
                }
            }
        }
        serde_json::to_string(self).err().map(|e| e.to_string())
    }

    /// Replace the report with an empty, unverified one if it would not
    /// serialize to plain JSON
    pub fn ensure_json_safe(self) -> Self {
        match self.find_unsafe_value() {
            None => self,
            Some(cause) => {
                let warning = ExtractionWarning::SerializationGuardTripped(cause);
                let mut fallback = ZevReport::failed(self.file_name, warning.to_string());
                fallback.structure_info.warnings = self.structure_info.warnings;
                fallback.structure_info.month_columns = self.structure_info.month_columns;
                fallback
            }
        }
    }
}
