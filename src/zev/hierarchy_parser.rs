/// ZEV Meter Hierarchy Parser
///
/// Walks the raw, headerless grid of a ZEV export top to bottom and rebuilds
/// the forest of meters, sub-meters and their monthly measurement points.
///
/// # Expected Sheet Structure:
/// ```text
/// Row n:   CHINV... / XX... (col A) | | | | Januar | Februar | ...   (E..P)
/// Row n+1: label (col A)
/// Row n+2: Bezug Netz [kWh]         | | | | 120    | 130     | ...
/// ...
/// Row m:   Untermessungen
/// Row m+1: | CHINV... (col B)       | | | Januar | Februar | ...
/// Row m+2: | label (col B)
/// Row m+3: | Verbrauch [kWh]        | | | 40     | 45      | ...
/// ```
/// A new main-meter id in column A always closes an open sub-meter section.
use std::path::Path;
use tracing::{debug, info, instrument, warn};

use super::models::{
    HierarchySummary, MeasurementPoint, MeterKind, MeterRecord, MonthValue, StructureInfo,
    ZevReport,
};
use crate::config::AnalyzerConfig;
use crate::error::ExtractionWarning;
use crate::grid::{Grid, SheetSource, Workbook};
use crate::utils::dedupe_labels;
use crate::vocabulary::{contains_any, is_meter_id, is_vendor_meter_id, month_index, SUB_METER_MARKER};

/// First month column (E)
pub const FIRST_MONTH_COL: usize = 4;
/// One past the last month column (P)
pub const MONTH_COL_END: usize = 16;

const COL_A: usize = 0;
const COL_B: usize = 1;
const COL_C: usize = 2;

/// Measurement-point vocabulary, lowercase
const UNIT_MARKER: &str = "[kwh]";
const POINT_KEYWORDS: &[&str] = &["messung", "verbrauch", "leistung"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Scanning,
    /// After an "Untermessungen" marker row, until the next main meter
    SubMeterSection,
}

/// Whether `text` is a measurement-point line of a meter of kind `kind`.
///
/// Virtual meters have no fixed point vocabulary, so any text longer than
/// `virtual_point_min_chars` characters qualifies for them.
pub fn is_measurement_point(text: &str, kind: MeterKind, config: &AnalyzerConfig) -> bool {
    let lower = text.to_lowercase();
    lower.contains(UNIT_MARKER)
        || (lower.contains("bezug") && (lower.contains("netz") || lower.contains("lokal")))
        || contains_any(&lower, POINT_KEYWORDS)
        || (kind.is_virtual() && text.chars().count() > config.virtual_point_min_chars)
}

/// Month tokens in columns E..P of `row`, as written in the sheet.
///
/// A repeated token is suffixed (`Januar`, `Januar.1`) so every declared
/// column keeps its own value key.
pub fn month_tokens(grid: &Grid, row: usize) -> Vec<String> {
    let tokens = (FIRST_MONTH_COL..MONTH_COL_END)
        .map(|col| grid.text(row, col))
        .filter(|token| month_index(token).is_some());
    dedupe_labels(tokens)
}

/// Single-pass state machine over the rows of one grid.
///
/// Holds at most one open meter; a meter is sealed (moved into `sealed`)
/// when the next meter id appears or the grid ends, and never touched again.
struct MeterScanner<'a> {
    config: &'a AnalyzerConfig,
    state: ScanState,
    current: Option<MeterRecord>,
    /// Id of the last main or virtual meter, parent of following sub-meters
    enclosing_main: Option<String>,
    sealed: Vec<MeterRecord>,
    document_months: Vec<String>,
    warnings: Vec<ExtractionWarning>,
}

impl<'a> MeterScanner<'a> {
    fn new(config: &'a AnalyzerConfig) -> Self {
        Self {
            config,
            state: ScanState::Scanning,
            current: None,
            enclosing_main: None,
            sealed: Vec::new(),
            document_months: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn scan_row(&mut self, grid: &Grid, row: usize) {
        let col_a = grid.text(row, COL_A);
        let col_b = grid.text(row, COL_B);
        let col_c = grid.text(row, COL_C);

        if [&col_a, &col_b, &col_c]
            .iter()
            .any(|text| contains_any(text, &[SUB_METER_MARKER]))
        {
            debug!("Sub-meter section starts at row {}", row);
            self.state = ScanState::SubMeterSection;
            return;
        }

        if is_meter_id(&col_a) {
            self.open_main_meter(grid, row, col_a);
        } else if self.state == ScanState::SubMeterSection && is_meter_id(&col_b) {
            self.open_sub_meter(grid, row, col_b);
        } else {
            self.scan_point(grid, row, col_a, col_b);
        }
    }

    fn open_main_meter(&mut self, grid: &Grid, row: usize, id: String) {
        self.seal();
        if self.state == ScanState::SubMeterSection {
            debug!("Sub-meter section closed by meter {} at row {}", id, row);
            self.state = ScanState::Scanning;
        }

        let kind = if is_vendor_meter_id(&id) {
            MeterKind::MainMeter
        } else {
            MeterKind::VirtualMeter
        };
        let month_columns = self.month_columns(grid, row);
        let label = grid.text(row + 1, COL_A);
        debug!("Row {}: {:?} {} '{}'", row, kind, id, label);

        self.enclosing_main = Some(id.clone());
        self.current = Some(MeterRecord {
            id,
            kind,
            label,
            parent: None,
            month_columns,
            points: Vec::new(),
        });
    }

    fn open_sub_meter(&mut self, grid: &Grid, row: usize, id: String) {
        self.seal();

        let Some(parent) = self.enclosing_main.clone() else {
            warn!("Sub-meter {} at row {} has no enclosing main meter", id, row);
            self.warnings.push(ExtractionWarning::PartialExtraction {
                row,
                msg: format!("sub-meter {id} has no enclosing main meter, skipped"),
            });
            return;
        };

        let kind = if is_vendor_meter_id(&id) {
            MeterKind::SubMeter
        } else {
            MeterKind::VirtualSubMeter
        };
        let month_columns = self.month_columns(grid, row);
        let label = grid.text(row + 1, COL_B);
        debug!("Row {}: {:?} {} '{}' under {}", row, kind, id, label, parent);

        self.current = Some(MeterRecord {
            id,
            kind,
            label,
            parent: Some(parent),
            month_columns,
            points: Vec::new(),
        });
    }

    /// Month columns declared on a meter-id row; falls back to the first set
    /// seen in the document
    fn month_columns(&mut self, grid: &Grid, row: usize) -> Vec<String> {
        let declared = month_tokens(grid, row);
        if declared.is_empty() {
            return self.document_months.clone();
        }

        let renamed: Vec<&str> = declared
            .iter()
            .filter(|token| month_index(token).is_none())
            .map(String::as_str)
            .collect();
        if !renamed.is_empty() {
            warn!("Row {} repeats month columns, renamed to {:?}", row, renamed);
            self.warnings.push(ExtractionWarning::PartialExtraction {
                row,
                msg: format!("repeated month columns renamed to {}", renamed.join(", ")),
            });
        }

        if self.document_months.is_empty() {
            self.document_months = declared.clone();
        }
        declared
    }

    fn scan_point(&mut self, grid: &Grid, row: usize, col_a: String, col_b: String) {
        let Some(meter) = self.current.as_mut() else {
            return;
        };

        let text = if meter.kind.is_sub_meter() && !col_b.is_empty() {
            col_b
        } else {
            col_a
        };
        if text.is_empty() || text == meter.label {
            return;
        }
        if !is_measurement_point(&text, meter.kind, self.config) {
            return;
        }

        if meter.month_columns.is_empty() {
            self.warnings.push(ExtractionWarning::PartialExtraction {
                row,
                msg: format!(
                    "measurement point '{}' of meter {} has no month columns",
                    text, meter.id
                ),
            });
        }

        let values = meter
            .month_columns
            .iter()
            .enumerate()
            .map(|(i, month)| {
                let cell = grid.get(row, FIRST_MONTH_COL + i);
                (month.clone(), MonthValue::from_cell(cell))
            })
            .collect();

        meter.points.push(MeasurementPoint { name: text, values });
    }

    fn seal(&mut self) {
        if let Some(meter) = self.current.take() {
            debug!(
                "Sealed meter {} with {} measurement points",
                meter.id,
                meter.points.len()
            );
            self.sealed.push(meter);
        }
    }

    fn finish(mut self) -> (Vec<MeterRecord>, Vec<String>, Vec<ExtractionWarning>) {
        self.seal();
        (self.sealed, self.document_months, self.warnings)
    }
}

/// Open `path`, or build the unverified report explaining why it cannot be read
fn open_or_fail(path: &Path) -> Result<Workbook, ZevReport> {
    Workbook::open(path).map_err(|e| {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        warn!("Cannot open {}: {}", path.display(), e);
        ZevReport::failed(file_name, e.to_string())
    })
}

#[derive(Debug, Clone, Default)]
pub struct HierarchyParser {
    config: AnalyzerConfig,
}

impl HierarchyParser {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Parse the first sheet of a spreadsheet file.
    ///
    /// Never fails: an unreadable file yields an empty, unverified report
    /// whose `errors` say why.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> ZevReport {
        match open_or_fail(path.as_ref()) {
            Ok(mut workbook) => self.parse(&mut workbook),
            Err(report) => report,
        }
    }

    /// Parse one named sheet of a spreadsheet file; never fails, like
    /// [`HierarchyParser::parse_file`]
    pub fn parse_file_sheet(&self, path: impl AsRef<Path>, sheet_name: &str) -> ZevReport {
        match open_or_fail(path.as_ref()) {
            Ok(mut workbook) => self.parse_sheet(&mut workbook, sheet_name),
            Err(report) => report,
        }
    }

    /// Parse the first sheet of `source`
    pub fn parse<S: SheetSource + ?Sized>(&self, source: &mut S) -> ZevReport {
        match source.sheet_names().into_iter().next() {
            Some(sheet_name) => self.parse_sheet(source, &sheet_name),
            None => ZevReport::failed(source.source_name(), "workbook has no sheets"),
        }
    }

    /// Parse one named sheet of `source`
    #[instrument(skip(self, source), fields(source = %source.source_name()))]
    pub fn parse_sheet<S: SheetSource + ?Sized>(&self, source: &mut S, sheet_name: &str) -> ZevReport {
        match source.read_sheet(sheet_name) {
            Ok(grid) => self.parse_grid(&grid, source.source_name()),
            Err(e) => {
                warn!("Cannot read sheet '{}': {}", sheet_name, e);
                ZevReport::failed(source.source_name(), e.to_string())
            }
        }
    }

    /// Rebuild the meter hierarchy of a raw, headerless grid
    pub fn parse_grid(&self, grid: &Grid, file_name: &str) -> ZevReport {
        info!("Parsing ZEV meter blocks in {} ({} rows)", file_name, grid.height());

        let mut scanner = MeterScanner::new(&self.config);
        for row in 0..grid.height() {
            scanner.scan_row(grid, row);
        }
        let (meters, month_columns, warnings) = scanner.finish();

        let summary = HierarchySummary::tally(&meters);
        info!(
            "Found {} meters, {} measurement points in {}",
            summary.total_meters, summary.total_points, file_name
        );

        ZevReport {
            file_name: file_name.to_string(),
            structure_verified: true,
            structure_info: StructureInfo {
                errors: Vec::new(),
                warnings: warnings.iter().map(ToString::to_string).collect(),
                month_columns,
            },
            summary,
            meters,
        }
        .ensure_json_safe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::CellValue;

    fn row(values: &[&str]) -> Vec<CellValue> {
        values.iter().map(|v| CellValue::from(*v)).collect()
    }

    #[test]
    fn test_measurement_point_vocabulary() {
        let config = AnalyzerConfig::default();
        let main = MeterKind::MainMeter;
        assert!(is_measurement_point("Bezug Netz [kWh]", main, &config));
        assert!(is_measurement_point("Bezug lokal", main, &config));
        assert!(is_measurement_point("Messung Allgemein", main, &config));
        assert!(is_measurement_point("Verbrauch total", main, &config));
        assert!(is_measurement_point("Leistung max", main, &config));
        assert!(!is_measurement_point("Bezug", main, &config));
        assert!(!is_measurement_point("Wohnung 1.1", main, &config));
    }

    #[test]
    fn test_virtual_catch_all_threshold() {
        // Current behavior: more than 5 characters is a point for virtual kinds
        let config = AnalyzerConfig::default();
        assert!(is_measurement_point("Summe A", MeterKind::VirtualMeter, &config));
        assert!(is_measurement_point("Summe1", MeterKind::VirtualSubMeter, &config));
        assert!(!is_measurement_point("Summe", MeterKind::VirtualMeter, &config));
        assert!(!is_measurement_point("Summe A", MeterKind::MainMeter, &config));
        assert!(!is_measurement_point("Summe A", MeterKind::SubMeter, &config));

        let strict = AnalyzerConfig {
            virtual_point_min_chars: 10,
            ..Default::default()
        };
        assert!(!is_measurement_point("Summe A", MeterKind::VirtualMeter, &strict));
    }

    #[test]
    fn test_month_tokens_only_in_e_to_p() {
        let mut cells = row(&["XX001", "Januar", "", ""]);
        cells.extend(row(&["Januar", "Februar", "Summe", "März"]));
        let grid = Grid::from_rows(vec![cells]);
        assert_eq!(month_tokens(&grid, 0), vec!["Januar", "Februar", "März"]);
    }

    #[test]
    fn test_repeated_month_keeps_both_values() {
        let mut meter_row = row(&["XX001", "", "", ""]);
        meter_row.extend(row(&["Januar", "Januar", "Februar"]));
        let mut point_row = row(&["Bezug Netz [kWh]", "", "", ""]);
        point_row.extend([1.0, 2.0, 3.0].map(CellValue::from));
        let grid = Grid::from_rows(vec![meter_row, row(&["Haus"]), point_row]);

        let report = HierarchyParser::default().parse_grid(&grid, "t.xlsx");
        let meter = &report.meters[0];
        assert_eq!(meter.month_columns, vec!["Januar", "Januar.1", "Februar"]);

        let values = &meter.points[0].values;
        assert_eq!(values.keys().collect::<Vec<_>>(), meter.month_columns);
        assert_eq!(values.get("Januar"), Some(&MonthValue::Number(1.0)));
        assert_eq!(values.get("Januar.1"), Some(&MonthValue::Number(2.0)));
        assert_eq!(values.get("Februar"), Some(&MonthValue::Number(3.0)));

        assert_eq!(report.structure_info.warnings.len(), 1);
        assert!(report.structure_info.warnings[0].contains("Januar.1"));
    }

    #[test]
    fn test_label_row_is_not_a_point() {
        let grid = Grid::from_rows(vec![
            row(&["XX-Total", "", "", "", "Januar"]),
            row(&["Verbrauch Gesamt"]),
            row(&["Verbrauch Gesamt"]),
            row(&["Allgemeinstrom"]),
        ]);
        let report = HierarchyParser::default().parse_grid(&grid, "t.xlsx");
        let meter = &report.meters[0];
        assert_eq!(meter.label, "Verbrauch Gesamt");
        // Label text never counts, the virtual catch-all picks up the last line
        assert_eq!(meter.points.len(), 1);
        assert_eq!(meter.points[0].name, "Allgemeinstrom");
    }

    #[test]
    fn test_rows_before_first_meter_are_ignored() {
        let grid = Grid::from_rows(vec![
            row(&["ZEV Zwischenbächen Leistungsberechnung"]),
            row(&["Verbrauch [kWh]"]),
        ]);
        let report = HierarchyParser::default().parse_grid(&grid, "t.xlsx");
        assert!(report.meters.is_empty());
        assert!(report.structure_verified);
    }

    #[test]
    fn test_sub_meter_without_main_meter_is_skipped() {
        let grid = Grid::from_rows(vec![
            row(&["Untermessungen"]),
            row(&["", "CHINV100", "", "", "Januar"]),
            row(&["", "Wohnung 2"]),
            row(&["", "Verbrauch [kWh]", "", "", "5"]),
        ]);
        let report = HierarchyParser::default().parse_grid(&grid, "t.xlsx");
        assert!(report.meters.is_empty());
        assert_eq!(report.structure_info.warnings.len(), 1);
        assert!(report.structure_info.warnings[0].contains("CHINV100"));
    }

    #[test]
    fn test_point_without_month_columns_is_recorded_with_warning() {
        let grid = Grid::from_rows(vec![row(&["CHINV1"]), row(&["Haus"]), row(&["Bezug Netz [kWh]"])]);
        let report = HierarchyParser::default().parse_grid(&grid, "t.xlsx");
        assert_eq!(report.meters[0].points.len(), 1);
        assert!(report.meters[0].points[0].values.is_empty());
        assert_eq!(report.structure_info.warnings.len(), 1);
    }
}
