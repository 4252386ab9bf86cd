/// Structure Evaluator
///
/// Scores one candidate reading of a sheet. The score is a sum of independent
/// bonuses (see [`SCORING_RULES`]); a weak match on one axis never cancels a
/// match on another.
use tracing::debug;

use super::candidate::{ColumnRole, StructureCandidate, StructureType};
use crate::config::AnalyzerConfig;
use crate::grid::{ReadingMethod, Table};
use crate::utils::LabelledMap;
use crate::vocabulary::{any_contains, count_months_mentioned, DATA_KEYWORDS, HEADER_KEYWORDS};

pub const SAMPLE_ROWS: usize = 5;
pub const SAMPLE_COLUMNS: usize = 10;
/// Rows inspected when guessing a header row
pub const HEADER_SCAN_ROWS: usize = 10;
pub const TYPICAL_COLUMN_COUNT: std::ops::RangeInclusive<usize> = 8..=20;
pub const MANY_ROWS: usize = 10;

pub const MONTHLY_COLUMNS_RULE: &str = "monthly_columns";

/// One additive scoring bonus
pub struct ScoringRule {
    pub name: &'static str,
    pub weight: u32,
    pub applies: fn(&Table, &AnalyzerConfig) -> bool,
}

/// Scoring rules in evaluation order
pub const SCORING_RULES: &[ScoringRule] = &[
    ScoringRule {
        name: "data_present",
        weight: 10,
        applies: |table, _| table.height() > 0,
    },
    ScoringRule {
        name: "zev_header",
        weight: 20,
        applies: |table, _| any_contains(table.columns(), HEADER_KEYWORDS),
    },
    ScoringRule {
        name: MONTHLY_COLUMNS_RULE,
        weight: 30,
        applies: |table, config| count_months_mentioned(table.columns()) >= config.month_threshold,
    },
    ScoringRule {
        name: "metering_columns",
        weight: 15,
        applies: |table, _| any_contains(table.columns(), DATA_KEYWORDS),
    },
    ScoringRule {
        name: "typical_column_count",
        weight: 10,
        applies: |table, _| TYPICAL_COLUMN_COUNT.contains(&table.width()),
    },
    ScoringRule {
        name: "many_data_rows",
        weight: 15,
        applies: |table, _| table.non_empty_rows() > MANY_ROWS,
    },
];

/// Score `table`, the sheet as read under `method`.
///
/// A table without data rows is a degenerate candidate: score 0 and an
/// `error`, so the selector never picks it.
pub fn evaluate(table: &Table, method: ReadingMethod, config: &AnalyzerConfig) -> StructureCandidate {
    if table.height() == 0 {
        debug!("Candidate {} has no data rows", method);
        return StructureCandidate::failed(method, "no data rows");
    }

    let mut score = 0;
    let mut confidence_factors = Vec::new();
    for rule in SCORING_RULES {
        if (rule.applies)(table, config) {
            score += rule.weight;
            confidence_factors.push(rule.name.to_string());
        }
    }

    let structure_type = if confidence_factors.iter().any(|f| f == MONTHLY_COLUMNS_RULE) {
        StructureType::ZevMonthlyData
    } else {
        StructureType::Unknown
    };

    let header_row = estimate_header_row(table, method.header_row(), config);

    debug!(
        "Candidate {} scored {} ({:?})",
        method, score, confidence_factors
    );

    StructureCandidate {
        method,
        score,
        structure_type,
        confidence_factors,
        column_role_map: column_role_map(table.columns()),
        columns: table.columns().to_vec(),
        shape: [table.height(), table.width()],
        header_row,
        data_start_row: Some(header_row.map_or(0, |h| h + 1)),
        sample_rows: sample_rows(table),
        error: None,
    }
}

/// Guess the header row of `table` when the reading did not fix one.
///
/// Scans the first rows for ZEV header vocabulary or a run of month names;
/// the first qualifying row wins. `None` means "unknown header" and callers
/// fall back to reading the sheet without one.
pub fn estimate_header_row(
    table: &Table,
    explicit: Option<usize>,
    config: &AnalyzerConfig,
) -> Option<usize> {
    if explicit.is_some() {
        return explicit;
    }

    table
        .rows()
        .iter()
        .take(HEADER_SCAN_ROWS)
        .position(|row| {
            let values: Vec<String> = row
                .iter()
                .filter(|cell| !cell.is_blank())
                .map(|cell| cell.as_text())
                .collect();
            any_contains(&values, HEADER_KEYWORDS)
                || count_months_mentioned(&values) >= config.month_threshold
        })
}

/// Role of every column, keyed by label
pub fn column_role_map(columns: &[String]) -> LabelledMap<ColumnRole> {
    columns
        .iter()
        .map(|label| (label.clone(), ColumnRole::classify(label)))
        .collect()
}

pub(crate) fn sample_rows(table: &Table) -> Vec<LabelledMap<String>> {
    table
        .rows()
        .iter()
        .take(SAMPLE_ROWS)
        .map(|row| {
            table
                .columns()
                .iter()
                .zip(row.iter())
                .take(SAMPLE_COLUMNS)
                .map(|(label, cell)| (label.clone(), cell.as_text()))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{CellValue, Grid};

    const MONTHS: [&str; 12] = [
        "Januar", "Februar", "März", "April", "Mai", "Juni", "Juli", "August", "September",
        "Oktober", "November", "Dezember",
    ];

    fn text_row(values: &[&str]) -> Vec<CellValue> {
        values.iter().map(|v| CellValue::from(*v)).collect()
    }

    fn table(rows: Vec<Vec<CellValue>>, method: ReadingMethod) -> Table {
        Table::from_grid(&Grid::from_rows(rows), method).unwrap()
    }

    #[test]
    fn test_empty_table_is_degenerate() {
        let t = table(vec![text_row(&["Zähler"])], ReadingMethod::Standard);
        let candidate = evaluate(&t, ReadingMethod::Standard, &AnalyzerConfig::default());
        assert_eq!(candidate.score, 0);
        assert!(!candidate.is_viable());
    }

    #[test]
    fn test_data_present_only() {
        let t = table(
            vec![text_row(&["a", "b"]), text_row(&["1", "2"])],
            ReadingMethod::Standard,
        );
        let candidate = evaluate(&t, ReadingMethod::Standard, &AnalyzerConfig::default());
        assert_eq!(candidate.score, 10);
        assert_eq!(candidate.confidence_factors, vec!["data_present"]);
        assert_eq!(candidate.structure_type, StructureType::Unknown);
    }

    #[test]
    fn test_monthly_columns_set_structure_type() {
        let mut header = vec!["Messpunkt"];
        header.extend(MONTHS);
        let t = table(
            vec![text_row(&header), text_row(&["Bezug Netz [kWh]"])],
            ReadingMethod::Standard,
        );
        let candidate = evaluate(&t, ReadingMethod::Standard, &AnalyzerConfig::default());

        // data 10 + months 30 + metering 15 + 13 columns 10
        assert_eq!(candidate.score, 65);
        assert_eq!(candidate.structure_type, StructureType::ZevMonthlyData);
        assert_eq!(candidate.column_role_map.get("Mai"), Some(&ColumnRole::Month));
        assert_eq!(
            candidate.column_role_map.get("Messpunkt"),
            Some(&ColumnRole::MeterPoint)
        );
    }

    #[test]
    fn test_five_months_are_not_enough() {
        let t = table(
            vec![text_row(&MONTHS[..5]), text_row(&["1"])],
            ReadingMethod::Standard,
        );
        let candidate = evaluate(&t, ReadingMethod::Standard, &AnalyzerConfig::default());
        assert_eq!(candidate.structure_type, StructureType::Unknown);
        assert!(!candidate
            .confidence_factors
            .contains(&MONTHLY_COLUMNS_RULE.to_string()));
    }

    #[test]
    fn test_many_rows_bonus_counts_non_empty_rows_only() {
        let mut rows = vec![text_row(&["x"])];
        rows.extend((0..11).map(|i| vec![CellValue::from(i as f64)]));
        rows.insert(5, vec![CellValue::Empty]);
        let t = table(rows, ReadingMethod::Standard);
        let candidate = evaluate(&t, ReadingMethod::Standard, &AnalyzerConfig::default());
        assert!(candidate
            .confidence_factors
            .contains(&"many_data_rows".to_string()));

        let t = table(
            (0..11).map(|i| vec![CellValue::from(i as f64)]).collect(),
            ReadingMethod::Standard,
        );
        let candidate = evaluate(&t, ReadingMethod::Standard, &AnalyzerConfig::default());
        assert!(!candidate
            .confidence_factors
            .contains(&"many_data_rows".to_string()));
    }

    #[test]
    fn test_estimate_header_row_without_explicit_header() {
        let rows = vec![
            text_row(&["Export 2024"]),
            text_row(&["ZEV Zwischenbächen", "", "Leistungsberechnung"]),
            text_row(&["XX001"]),
        ];
        let t = table(rows, ReadingMethod::NoHeader);
        assert_eq!(
            estimate_header_row(&t, None, &AnalyzerConfig::default()),
            Some(1)
        );
    }

    #[test]
    fn test_estimate_header_row_by_months() {
        let mut month_row = vec![""; 4];
        month_row.extend(&MONTHS[..6]);
        let rows = vec![text_row(&["Titel"]), text_row(&month_row)];
        let t = table(rows, ReadingMethod::NoHeader);
        assert_eq!(
            estimate_header_row(&t, None, &AnalyzerConfig::default()),
            Some(1)
        );
    }

    #[test]
    fn test_estimate_header_row_scans_first_ten_rows_only() {
        let rows_with_header_at = |header: usize| {
            let mut rows: Vec<Vec<CellValue>> = (0..12)
                .map(|i| vec![CellValue::from(format!("Zeile {i}").as_str())])
                .collect();
            rows[header] = text_row(&["ZEV Zwischenbächen"]);
            table(rows, ReadingMethod::NoHeader)
        };
        let config = AnalyzerConfig::default();

        assert_eq!(
            estimate_header_row(&rows_with_header_at(9), None, &config),
            Some(9)
        );
        assert_eq!(estimate_header_row(&rows_with_header_at(10), None, &config), None);
    }

    #[test]
    fn test_estimate_header_row_unknown() {
        let t = table(vec![text_row(&["a"]), text_row(&["b"])], ReadingMethod::NoHeader);
        assert_eq!(estimate_header_row(&t, None, &AnalyzerConfig::default()), None);
        assert_eq!(
            estimate_header_row(&t, Some(4), &AnalyzerConfig::default()),
            Some(4)
        );
    }

    #[test]
    fn test_sample_rows_are_bounded_and_stringified() {
        let header: Vec<String> = (0..12).map(|i| format!("c{i}")).collect();
        let header: Vec<&str> = header.iter().map(String::as_str).collect();
        let mut rows = vec![text_row(&header)];
        for r in 0..7 {
            let mut row: Vec<CellValue> = (0..12).map(|c| CellValue::from((r * c) as f64)).collect();
            row[1] = CellValue::Empty;
            rows.push(row);
        }
        let t = table(rows, ReadingMethod::Standard);
        let samples = sample_rows(&t);

        assert_eq!(samples.len(), 5);
        assert!(samples.iter().all(|row| row.len() == 10));
        assert_eq!(samples[2].get("c3"), Some(&"6".to_string()));
        assert_eq!(samples[0].get("c1"), Some(&String::new()));
    }

    #[test]
    fn test_data_start_row_follows_header() {
        let t = table(
            vec![text_row(&["a"]), text_row(&["b"]), text_row(&["c"])],
            ReadingMethod::HeaderAtRow(1),
        );
        let candidate = evaluate(&t, ReadingMethod::HeaderAtRow(1), &AnalyzerConfig::default());
        assert_eq!(candidate.header_row, Some(1));
        assert_eq!(candidate.data_start_row, Some(2));
    }
}
