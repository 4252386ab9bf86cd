// Structure recognition for ZEV exports
//
// A sheet's header row and column roles are not fixed between exports, so
// every sheet is read several ways and each reading is scored:
// - candidate: a scored reading and its column roles
// - evaluator: additive scoring rules and header-row estimation
// - selector: candidate enumeration and best-reading selection
// - validation: required-column checks and typed consumption tables

pub mod candidate;
pub mod evaluator;
pub mod selector;
pub mod validation;

pub use candidate::{ColumnRole, StructureCandidate, StructureType};
pub use evaluator::{estimate_header_row, evaluate, ScoringRule, SCORING_RULES};
pub use selector::{
    candidate_methods, open_document, select_best, DocumentAnalysis, RecommendedRead,
    StructureSelector,
};
pub use validation::{
    clean_consumption_table, consumption_data, validate_columns, validate_document, validate_file,
    ColumnIssue, ColumnValidation, ConsumptionTable, ConsumptionValue, ValidationStatus,
};
