use std::fmt;

use serde::{Serialize, Serializer};

use super::cell::CellValue;
use super::sheet::Grid;
use crate::error::LoadError;
use crate::utils::dedupe_labels;

/// How a sheet is turned into a labelled table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReadingMethod {
    /// The format's default: first row holds the labels
    Standard,
    /// Row `k` holds the labels, data follows below it
    HeaderAtRow(usize),
    /// No label row; columns are numbered
    NoHeader,
}

impl ReadingMethod {
    /// Row used as the label row, if any
    pub fn header_row(&self) -> Option<usize> {
        match self {
            ReadingMethod::Standard => Some(0),
            ReadingMethod::HeaderAtRow(k) => Some(*k),
            ReadingMethod::NoHeader => None,
        }
    }
}

impl fmt::Display for ReadingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadingMethod::Standard => write!(f, "standard"),
            ReadingMethod::HeaderAtRow(k) => write!(f, "header_at_row({k})"),
            ReadingMethod::NoHeader => write!(f, "no_header"),
        }
    }
}

impl Serialize for ReadingMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A grid read under one [`ReadingMethod`]: unique column labels plus data rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// Slice `grid` as if `method` described its layout.
    ///
    /// Blank label cells become `Unnamed: {col}` and repeated labels get `.1`,
    /// `.2`, ... suffixes, so every column has exactly one distinct label.
    pub fn from_grid(grid: &Grid, method: ReadingMethod) -> Result<Self, LoadError> {
        let Some(header_row) = method.header_row() else {
            return Ok(Self {
                columns: (0..grid.width()).map(|i| i.to_string()).collect(),
                rows: grid.rows().to_vec(),
            });
        };

        if header_row >= grid.height() {
            return Err(LoadError::HeaderOutOfRange {
                header_row,
                rows: grid.height(),
            });
        }

        let raw_labels = (0..grid.width()).map(|col| {
            let label = grid.text(header_row, col);
            if label.is_empty() {
                format!("Unnamed: {col}")
            } else {
                label
            }
        });

        Ok(Self {
            columns: dedupe_labels(raw_labels),
            rows: grid.rows()[header_row + 1..].to_vec(),
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Rows with at least one non-blank cell
    pub fn non_empty_rows(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| row.iter().any(|cell| !cell.is_blank()))
            .count()
    }
}
