/// Structure Selector
///
/// Tries a fixed set of readings per sheet (standard, header at rows 1-10,
/// no header), scores each one and keeps the most plausible.
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

use super::candidate::StructureCandidate;
use super::evaluator::evaluate;
use crate::config::AnalyzerConfig;
use crate::error::{AnalysisError, LoadError};
use crate::grid::{load_table, ReadingMethod, SheetSource, Table, Workbook};
use crate::utils::LabelledMap;

/// Highest header row tried by the selector
pub const MAX_HEADER_ROW: usize = 10;

/// Structure report for a whole document
#[derive(Debug, Clone, Serialize)]
pub struct DocumentAnalysis {
    pub file_name: String,
    pub sheets: Vec<String>,
    pub recommended_sheet: Option<String>,
    pub recommended_reading_method: Option<StructureCandidate>,
    pub structure_info: LabelledMap<StructureCandidate>,
    pub sample_data: LabelledMap<Vec<LabelledMap<String>>>,
    /// Sheets without a viable reading; their `structure_info` entry holds a
    /// zero-score candidate
    pub warnings: Vec<String>,
}

/// A sheet re-read with the reading the selector recommended
#[derive(Debug, Clone, Serialize)]
pub struct RecommendedRead {
    pub sheet_name: String,
    pub candidate: StructureCandidate,
    pub table: Table,
    /// The document analysis the recommendation came from
    pub analysis: DocumentAnalysis,
}

/// Readings tried for every sheet, in tie-breaking order
pub fn candidate_methods() -> Vec<ReadingMethod> {
    std::iter::once(ReadingMethod::Standard)
        .chain((1..=MAX_HEADER_ROW).map(ReadingMethod::HeaderAtRow))
        .chain(std::iter::once(ReadingMethod::NoHeader))
        .collect()
}

/// Highest-scoring viable candidate; the earliest one wins ties
pub fn select_best(candidates: &[StructureCandidate]) -> Option<&StructureCandidate> {
    candidates
        .iter()
        .filter(|c| c.is_viable())
        .fold(None, |best: Option<&StructureCandidate>, c| match best {
            Some(b) if b.score >= c.score => Some(b),
            _ => Some(c),
        })
}

#[derive(Debug, Clone, Default)]
pub struct StructureSelector {
    config: AnalyzerConfig,
}

impl StructureSelector {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Load and score `sheet_name` under every candidate reading.
    ///
    /// Load failures become zero-score candidates carrying the error; nothing
    /// here fails as a whole.
    pub fn evaluate_sheet<S: SheetSource + ?Sized>(
        &self,
        source: &mut S,
        sheet_name: &str,
    ) -> Vec<StructureCandidate> {
        candidate_methods()
            .into_iter()
            .map(|method| match load_table(source, sheet_name, method) {
                Ok(table) => evaluate(&table, method, &self.config),
                Err(e) => {
                    debug!("Reading {} of sheet '{}' failed: {}", method, sheet_name, e);
                    StructureCandidate::failed(method, e.to_string())
                }
            })
            .collect()
    }

    /// Best reading of one sheet
    #[instrument(skip(self, source), fields(source = %source.source_name()))]
    pub fn analyze_sheet<S: SheetSource + ?Sized>(
        &self,
        source: &mut S,
        sheet_name: &str,
    ) -> Result<StructureCandidate, AnalysisError> {
        let candidates = self.evaluate_sheet(source, sheet_name);
        let best = select_best(&candidates).cloned().ok_or_else(|| {
            AnalysisError::NoViableStructure(format!(
                "sheet '{}' of {}",
                sheet_name,
                source.source_name()
            ))
        })?;

        info!(
            "Sheet '{}': recommended reading {} (score {}, {:?})",
            sheet_name, best.method, best.score, best.structure_type
        );
        Ok(best)
    }

    /// Best reading of every sheet plus the document-wide recommendation.
    ///
    /// Every sheet gets a `structure_info` entry. Sheets without a viable
    /// reading are also reported in `warnings`; the call only fails when no
    /// sheet at all can be read sensibly.
    #[instrument(skip(self, source), fields(source = %source.source_name()))]
    pub fn analyze_document<S: SheetSource + ?Sized>(
        &self,
        source: &mut S,
    ) -> Result<DocumentAnalysis, AnalysisError> {
        let sheets = source.sheet_names();
        info!("Analyzing {} sheets", sheets.len());

        let mut analysis = DocumentAnalysis {
            file_name: source.source_name().to_string(),
            sheets: sheets.clone(),
            recommended_sheet: None,
            recommended_reading_method: None,
            structure_info: LabelledMap::new(),
            sample_data: LabelledMap::new(),
            warnings: Vec::new(),
        };

        for sheet_name in &sheets {
            let candidates = self.evaluate_sheet(source, sheet_name);
            let best = select_best(&candidates).cloned();
            match best {
                Some(candidate) => {
                    info!(
                        "Sheet '{}': recommended reading {} (score {}, {:?})",
                        sheet_name, candidate.method, candidate.score, candidate.structure_type
                    );
                    let better = analysis
                        .recommended_reading_method
                        .as_ref()
                        .map_or(true, |current| candidate.score > current.score);
                    if better {
                        analysis.recommended_sheet = Some(sheet_name.clone());
                        analysis.recommended_reading_method = Some(candidate.clone());
                    }
                    analysis
                        .sample_data
                        .insert(sheet_name.clone(), candidate.sample_rows.clone());
                    analysis.structure_info.insert(sheet_name.clone(), candidate);
                }
                None => {
                    let e = AnalysisError::NoViableStructure(format!(
                        "sheet '{}' of {}",
                        sheet_name, analysis.file_name
                    ));
                    warn!("{}", e);
                    analysis.warnings.push(e.to_string());
                    if let Some(fallback) = best_effort(candidates) {
                        analysis.structure_info.insert(sheet_name.clone(), fallback);
                    }
                }
            }
        }

        if analysis.recommended_reading_method.is_none() {
            return Err(AnalysisError::NoViableStructure(analysis.file_name));
        }

        Ok(analysis)
    }

    /// Open a spreadsheet file and analyze it
    pub fn analyze_file(&self, path: impl AsRef<Path>) -> Result<DocumentAnalysis, AnalysisError> {
        let mut workbook = open_document(path)?;
        self.analyze_document(&mut workbook)
    }

    /// Re-read the recommended sheet with the recommended reading
    #[instrument(skip(self, source), fields(source = %source.source_name()))]
    pub fn read_with_recommended_method<S: SheetSource + ?Sized>(
        &self,
        source: &mut S,
    ) -> Result<RecommendedRead, AnalysisError> {
        let analysis = self.analyze_document(source)?;
        let (Some(sheet_name), Some(candidate)) = (
            analysis.recommended_sheet.clone(),
            analysis.recommended_reading_method.clone(),
        ) else {
            return Err(AnalysisError::NoViableStructure(analysis.file_name));
        };

        let table = load_table(source, &sheet_name, candidate.method)?;
        info!(
            "Read sheet '{}' with {}: {} rows x {} columns",
            sheet_name,
            candidate.method,
            table.height(),
            table.width()
        );

        Ok(RecommendedRead {
            sheet_name,
            candidate,
            table,
            analysis,
        })
    }
}

/// Candidate reported for a sheet without a viable reading: the first one
/// that evaluated without error, else the first failure
fn best_effort(candidates: Vec<StructureCandidate>) -> Option<StructureCandidate> {
    let index = candidates
        .iter()
        .position(|c| c.error.is_none())
        .unwrap_or(0);
    candidates.into_iter().nth(index)
}

/// Open `path` as a workbook, mapping open failures to `UnreadableDocument`
pub fn open_document(path: impl AsRef<Path>) -> Result<Workbook, AnalysisError> {
    Workbook::open(path).map_err(|e| match e {
        LoadError::WorkbookOpen(msg) => AnalysisError::UnreadableDocument(msg),
        other => AnalysisError::Load(other),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(method: ReadingMethod, score: u32) -> StructureCandidate {
        let mut c = StructureCandidate::failed(method, "");
        c.error = None;
        c.score = score;
        c
    }

    #[test]
    fn test_candidate_methods_are_fixed() {
        let methods = candidate_methods();
        assert_eq!(methods.len(), 12);
        assert_eq!(methods[0], ReadingMethod::Standard);
        assert_eq!(methods[1], ReadingMethod::HeaderAtRow(1));
        assert_eq!(methods[10], ReadingMethod::HeaderAtRow(10));
        assert_eq!(methods[11], ReadingMethod::NoHeader);
    }

    #[test]
    fn test_select_best_first_wins_ties() {
        let candidates = vec![
            scored(ReadingMethod::Standard, 25),
            scored(ReadingMethod::HeaderAtRow(1), 40),
            scored(ReadingMethod::HeaderAtRow(2), 40),
            scored(ReadingMethod::NoHeader, 10),
        ];
        let best = select_best(&candidates).unwrap();
        assert_eq!(best.method, ReadingMethod::HeaderAtRow(1));
    }

    #[test]
    fn test_select_best_skips_errors_and_zero_scores() {
        let mut errored = scored(ReadingMethod::Standard, 90);
        errored.error = Some("load failed".to_string());
        let candidates = vec![
            errored,
            scored(ReadingMethod::HeaderAtRow(1), 0),
            scored(ReadingMethod::NoHeader, 10),
        ];
        assert_eq!(
            select_best(&candidates).unwrap().method,
            ReadingMethod::NoHeader
        );
    }

    #[test]
    fn test_select_best_none_viable() {
        let candidates = vec![scored(ReadingMethod::Standard, 0)];
        assert!(select_best(&candidates).is_none());
        assert!(select_best(&[]).is_none());
    }

    #[test]
    fn test_best_effort_prefers_evaluated_candidate() {
        let failed = StructureCandidate::failed(ReadingMethod::Standard, "no data rows");
        let evaluated = scored(ReadingMethod::NoHeader, 0);
        let picked = best_effort(vec![failed.clone(), evaluated]).unwrap();
        assert_eq!(picked.method, ReadingMethod::NoHeader);

        let picked = best_effort(vec![failed]).unwrap();
        assert_eq!(picked.error.as_deref(), Some("no data rows"));
        assert!(best_effort(Vec::new()).is_none());
    }

    #[test]
    fn test_open_document_missing_file_is_unreadable() {
        let result = open_document("/nonexistent/zev_export.xlsx");
        assert!(matches!(result, Err(AnalysisError::UnreadableDocument(_))));
    }
}
