/// Consumption Sheet Validation
///
/// Checks that the sheets of a consumption export carry the expected columns
/// (`Zeitstempel`, `Gesamtverbrauch` and at least one `Eigentümer_*` owner
/// column) and reads a consumption sheet with typed timestamp and number
/// columns. Sheets are read with the standard reading (labels in row 1).
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::evaluator::sample_rows;
use super::selector::open_document;
use crate::error::{AnalysisError, LoadError};
use crate::grid::{load_table, CellValue, ReadingMethod, SheetSource, Table};
use crate::utils::LabelledMap;

pub const TIMESTAMP_COLUMN: &str = "Zeitstempel";
pub const TOTAL_COLUMN: &str = "Gesamtverbrauch";
pub const OWNER_COLUMN_PREFIX: &str = "Eigentümer_";

/// Columns every consumption sheet must have
pub const REQUIRED_COLUMNS: &[&str] = &[TIMESTAMP_COLUMN, TOTAL_COLUMN];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y"];

const REPORT_RULE_WIDTH: usize = 60;

/// A column-structure problem found in a consumption export
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ColumnIssue {
    #[error("Workbook has no sheets")]
    NoSheets,

    #[error("Sheet '{sheet}': required column '{column}' not found")]
    MissingRequiredColumn { sheet: String, column: String },

    #[error("Sheet '{sheet}': no owner columns (Eigentümer_*) found")]
    NoOwnerColumns { sheet: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Valid,
    ErrorsFound,
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationStatus::Valid => write!(f, "valid"),
            ValidationStatus::ErrorsFound => write!(f, "errors_found"),
        }
    }
}

/// Column structure of every sheet plus the validation outcome
#[derive(Debug, Clone, Serialize)]
pub struct ColumnValidation {
    pub file_name: String,
    pub sheets: Vec<String>,
    pub columns: LabelledMap<Vec<String>>,
    pub sample_data: LabelledMap<Vec<LabelledMap<String>>>,
    pub validation_status: ValidationStatus,
    pub validation_errors: Vec<String>,
}

impl ColumnValidation {
    pub fn is_valid(&self) -> bool {
        self.validation_status == ValidationStatus::Valid
    }
}

/// Plain-text report
impl fmt::Display for ColumnValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(REPORT_RULE_WIDTH);
        writeln!(f, "{rule}")?;
        writeln!(f, "STRUCTURE VALIDATION REPORT")?;
        writeln!(f, "{rule}")?;
        writeln!(f, "File: {}", self.file_name)?;
        writeln!(f, "Status: {}", self.validation_status)?;
        writeln!(f)?;

        writeln!(f, "SHEETS:")?;
        for sheet in &self.sheets {
            writeln!(f, "  - {sheet}")?;
        }
        writeln!(f)?;

        writeln!(f, "COLUMNS:")?;
        for (sheet, columns) in self.columns.iter() {
            writeln!(f, "  {sheet}:")?;
            for column in columns {
                writeln!(f, "    - {column}")?;
            }
        }
        writeln!(f)?;

        if self.validation_errors.is_empty() {
            writeln!(f, "VALIDATION: no errors found")?;
        } else {
            writeln!(f, "VALIDATION ERRORS:")?;
            for error in &self.validation_errors {
                writeln!(f, "  - {error}")?;
            }
        }
        write!(f, "{rule}")
    }
}

/// Column checks for one sheet
pub fn validate_columns(sheet: &str, columns: &[String]) -> Vec<ColumnIssue> {
    let mut issues: Vec<ColumnIssue> = REQUIRED_COLUMNS
        .iter()
        .filter(|required| !columns.iter().any(|c| c == *required))
        .map(|required| ColumnIssue::MissingRequiredColumn {
            sheet: sheet.to_string(),
            column: required.to_string(),
        })
        .collect();

    // Owner columns are only expected next to a total column
    let has_total = columns.iter().any(|c| c == TOTAL_COLUMN);
    let has_owner = columns.iter().any(|c| c.starts_with(OWNER_COLUMN_PREFIX));
    if has_total && !has_owner {
        issues.push(ColumnIssue::NoOwnerColumns {
            sheet: sheet.to_string(),
        });
    }

    issues
}

/// Check the columns of every sheet of `source`.
///
/// A sheet too short to hold a label row is validated as having no columns.
#[instrument(skip(source), fields(source = %source.source_name()))]
pub fn validate_document<S: SheetSource + ?Sized>(
    source: &mut S,
) -> Result<ColumnValidation, AnalysisError> {
    let sheets = source.sheet_names();
    let mut columns = LabelledMap::new();
    let mut sample_data = LabelledMap::new();
    let mut issues = Vec::new();

    if sheets.is_empty() {
        issues.push(ColumnIssue::NoSheets);
    }

    for sheet_name in &sheets {
        let table = match load_table(source, sheet_name, ReadingMethod::Standard) {
            Ok(table) => Some(table),
            Err(LoadError::HeaderOutOfRange { .. }) => None,
            Err(e) => return Err(e.into()),
        };
        let labels = table.as_ref().map(|t| t.columns().to_vec()).unwrap_or_default();

        issues.extend(validate_columns(sheet_name, &labels));
        sample_data.insert(
            sheet_name.clone(),
            table.as_ref().map(sample_rows).unwrap_or_default(),
        );
        columns.insert(sheet_name.clone(), labels);
    }

    let validation_status = if issues.is_empty() {
        ValidationStatus::Valid
    } else {
        ValidationStatus::ErrorsFound
    };
    info!(
        "Validated {} sheets: {} ({} issues)",
        sheets.len(),
        validation_status,
        issues.len()
    );

    Ok(ColumnValidation {
        file_name: source.source_name().to_string(),
        sheets,
        columns,
        sample_data,
        validation_status,
        validation_errors: issues.iter().map(ToString::to_string).collect(),
    })
}

/// Open a spreadsheet file and validate its columns
pub fn validate_file(path: impl AsRef<Path>) -> Result<ColumnValidation, AnalysisError> {
    let mut workbook = open_document(path)?;
    validate_document(&mut workbook)
}

/// One cell of a cleaned consumption table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConsumptionValue {
    Timestamp(NaiveDateTime),
    Number(f64),
    Text(String),
    /// Blank cell, or a number column cell that is not a number
    Missing,
}

impl ConsumptionValue {
    fn raw(cell: &CellValue) -> Self {
        match cell {
            _ if cell.is_blank() => ConsumptionValue::Missing,
            CellValue::Number(n) => ConsumptionValue::Number(*n),
            other => ConsumptionValue::Text(other.as_text()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConsumptionValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// Consumption sheet with blank rows dropped and typed columns
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumptionTable {
    pub sheet_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<ConsumptionValue>>,
    /// Columns that could not be converted
    pub warnings: Vec<String>,
}

impl ConsumptionTable {
    /// Values of the column labelled `label`, top to bottom
    pub fn column(&self, label: &str) -> Option<Vec<&ConsumptionValue>> {
        let index = self.columns.iter().position(|c| c == label)?;
        Some(self.rows.iter().map(|row| &row[index]).collect())
    }
}

/// Columns holding kWh figures: the total and the owner shares
pub fn is_numeric_column(label: &str) -> bool {
    label.starts_with(TOTAL_COLUMN) || label.starts_with(OWNER_COLUMN_PREFIX)
}

/// Parse the timestamp notations found in consumption exports; a bare date
/// reads as midnight
pub fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DATE_FORMATS.iter().find_map(|format| {
                chrono::NaiveDate::parse_from_str(text, format)
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
            })
        })
}

/// Drop all-blank rows and type the timestamp and kWh columns.
///
/// Number columns coerce unreadable cells to `Missing`. The timestamp column
/// converts all or nothing: one unreadable timestamp leaves the column as
/// read and records a warning.
pub fn clean_consumption_table(table: &Table, sheet_name: &str) -> ConsumptionTable {
    let kept: Vec<&Vec<CellValue>> = table
        .rows()
        .iter()
        .filter(|row| row.iter().any(|cell| !cell.is_blank()))
        .collect();
    debug!(
        "Sheet '{}': dropped {} blank rows",
        sheet_name,
        table.height() - kept.len()
    );

    let mut rows: Vec<Vec<ConsumptionValue>> = kept
        .iter()
        .map(|row| row.iter().map(ConsumptionValue::raw).collect())
        .collect();
    let mut warnings = Vec::new();

    for (index, label) in table.columns().iter().enumerate() {
        if label == TIMESTAMP_COLUMN {
            let parsed: Option<Vec<Option<NaiveDateTime>>> = kept
                .iter()
                .map(|row| {
                    let cell = &row[index];
                    if cell.is_blank() {
                        Some(None)
                    } else {
                        parse_timestamp(&cell.as_text()).map(Some)
                    }
                })
                .collect();
            match parsed {
                Some(stamps) => {
                    for (row, stamp) in rows.iter_mut().zip(stamps) {
                        row[index] = stamp.map_or(ConsumptionValue::Missing, ConsumptionValue::Timestamp);
                    }
                }
                None => {
                    warn!("Sheet '{}': column '{}' is not a timestamp column", sheet_name, label);
                    warnings.push(format!("column '{label}' could not be converted to timestamps"));
                }
            }
        } else if is_numeric_column(label) {
            for (row, cells) in rows.iter_mut().zip(&kept) {
                row[index] = cells[index]
                    .as_number()
                    .map_or(ConsumptionValue::Missing, ConsumptionValue::Number);
            }
        }
    }

    ConsumptionTable {
        sheet_name: sheet_name.to_string(),
        columns: table.columns().to_vec(),
        rows,
        warnings,
    }
}

/// Read a consumption sheet (the first sheet unless `sheet_name` is given)
#[instrument(skip(source), fields(source = %source.source_name()))]
pub fn consumption_data<S: SheetSource + ?Sized>(
    source: &mut S,
    sheet_name: Option<&str>,
) -> Result<ConsumptionTable, AnalysisError> {
    let sheet_name = match sheet_name {
        Some(name) => name.to_string(),
        None => source.sheet_names().into_iter().next().ok_or_else(|| {
            AnalysisError::UnreadableDocument(format!("{}: workbook has no sheets", source.source_name()))
        })?,
    };

    let table = load_table(source, &sheet_name, ReadingMethod::Standard)?;
    let cleaned = clean_consumption_table(&table, &sheet_name);
    info!(
        "Read consumption sheet '{}': {} rows x {} columns",
        sheet_name,
        cleaned.rows.len(),
        cleaned.columns.len()
    );
    Ok(cleaned)
}
