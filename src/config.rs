use std::env;

pub const DEFAULT_VIRTUAL_POINT_MIN_CHARS: usize = 5;
pub const DEFAULT_MONTH_THRESHOLD: usize = 6;

/// Tunable heuristics of the structure engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzerConfig {
    /// Virtual meters have no fixed point vocabulary: any line longer than
    /// this many characters under a virtual meter counts as a measurement point
    pub virtual_point_min_chars: usize,
    /// Distinct month names needed before a label row counts as monthly data
    pub month_threshold: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            virtual_point_min_chars: DEFAULT_VIRTUAL_POINT_MIN_CHARS,
            month_threshold: DEFAULT_MONTH_THRESHOLD,
        }
    }
}

impl AnalyzerConfig {
    pub fn from_env() -> Self {
        AnalyzerConfig {
            virtual_point_min_chars: env::var("ZEV_VIRTUAL_POINT_MIN_CHARS")
                .unwrap_or_else(|_| DEFAULT_VIRTUAL_POINT_MIN_CHARS.to_string())
                .parse()
                .unwrap_or(DEFAULT_VIRTUAL_POINT_MIN_CHARS),
            month_threshold: env::var("ZEV_MONTH_THRESHOLD")
                .unwrap_or_else(|_| DEFAULT_MONTH_THRESHOLD.to_string())
                .parse()
                .unwrap_or(DEFAULT_MONTH_THRESHOLD),
        }
    }
}
