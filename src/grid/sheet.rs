use calamine::{Data, Range};

use super::cell::CellValue;

static BLANK: CellValue = CellValue::Empty;

/// Raw rectangular cell grid of one sheet, in absolute sheet coordinates.
///
/// Row 0 is spreadsheet row 1 and column 0 is column A, even when the sheet
/// starts further down or to the right. Rows are padded to a common width and
/// trailing all-blank rows are dropped.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Grid {
    rows: Vec<Vec<CellValue>>,
    width: usize,
}

impl Grid {
    pub fn from_rows(rows: Vec<Vec<CellValue>>) -> Self {
        let mut rows = rows;
        while rows
            .last()
            .is_some_and(|row| row.iter().all(CellValue::is_blank))
        {
            rows.pop();
        }

        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, CellValue::Empty);
        }

        Self { rows, width }
    }

    /// Build from a calamine range, re-anchoring it at A1.
    ///
    /// calamine ranges start at the first used cell, so a sheet whose data
    /// begins in C3 yields a range with start (2, 2). Column positions matter
    /// to the meter parser, hence the padding.
    pub fn from_range(range: &Range<Data>) -> Self {
        let Some((start_row, start_col)) = range.start() else {
            return Self::default();
        };
        let (start_row, start_col) = (start_row as usize, start_col as usize);

        let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); start_row];
        for row in range.rows() {
            let mut cells = vec![CellValue::Empty; start_col];
            cells.extend(row.iter().map(CellValue::from));
            rows.push(cells);
        }

        Self::from_rows(rows)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Cell at (row, col); out-of-range positions read as blank
    pub fn get(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&BLANK)
    }

    /// Trimmed text of the cell at (row, col)
    pub fn text(&self, row: usize, col: usize) -> String {
        self.get(row, col).as_text()
    }
}
