use calamine::{open_workbook_auto, Reader, Sheets};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

use super::sheet::Grid;
use super::table::{ReadingMethod, Table};
use crate::error::LoadError;

/// Anything that can hand out raw sheet grids by name
pub trait SheetSource {
    /// Display name of the document (file name for on-disk workbooks)
    fn source_name(&self) -> &str;

    fn sheet_names(&self) -> Vec<String>;

    /// Read one sheet from scratch
    fn read_sheet(&mut self, sheet_name: &str) -> Result<Grid, LoadError>;
}

/// Read `sheet_name` and slice it according to `method`
pub fn load_table<S: SheetSource + ?Sized>(
    source: &mut S,
    sheet_name: &str,
    method: ReadingMethod,
) -> Result<Table, LoadError> {
    let grid = source.read_sheet(sheet_name)?;
    Table::from_grid(&grid, method)
}

/// Spreadsheet file on disk (xlsx, xlsm, xlsb, xls or ods)
pub struct Workbook {
    file_name: String,
    sheets: Sheets<BufReader<File>>,
}

impl Workbook {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        info!("Opening workbook: {}", path.display());

        let sheets = match open_workbook_auto(path) {
            Ok(wb) => wb,
            Err(e) => return Err(LoadError::WorkbookOpen(format!("{}: {e}", path.display()))),
        };

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self { file_name, sheets })
    }
}

impl SheetSource for Workbook {
    fn source_name(&self) -> &str {
        &self.file_name
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.sheet_names()
    }

    fn read_sheet(&mut self, sheet_name: &str) -> Result<Grid, LoadError> {
        if !self.sheets.sheet_names().iter().any(|n| n == sheet_name) {
            return Err(LoadError::SheetNotFound(sheet_name.to_string()));
        }

        let range = self
            .sheets
            .worksheet_range(sheet_name)
            .map_err(|e| LoadError::WorkbookOpen(format!("{sheet_name}: {e}")))?;

        let grid = Grid::from_range(&range);
        debug!(
            "Read sheet '{}': {} rows x {} columns",
            sheet_name,
            grid.height(),
            grid.width()
        );
        Ok(grid)
    }
}

/// Sheets already held in memory, in document order
#[derive(Debug, Clone, Default)]
pub struct MemoryWorkbook {
    name: String,
    sheets: Vec<(String, Grid)>,
}

impl MemoryWorkbook {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sheets: Vec::new(),
        }
    }

    pub fn with_sheet(mut self, sheet_name: impl Into<String>, grid: Grid) -> Self {
        self.sheets.push((sheet_name.into(), grid));
        self
    }
}

impl SheetSource for MemoryWorkbook {
    fn source_name(&self) -> &str {
        &self.name
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.clone()).collect()
    }

    fn read_sheet(&mut self, sheet_name: &str) -> Result<Grid, LoadError> {
        self.sheets
            .iter()
            .find(|(name, _)| name == sheet_name)
            .map(|(_, grid)| grid.clone())
            .ok_or_else(|| LoadError::SheetNotFound(sheet_name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::CellValue;

    #[test]
    fn test_open_missing_workbook() {
        let result = Workbook::open("/nonexistent/path/to/export.xlsx");
        assert!(matches!(result, Err(LoadError::WorkbookOpen(_))));
    }

    #[test]
    fn test_memory_workbook_sheets() {
        let grid = Grid::from_rows(vec![vec![CellValue::from("Zähler")]]);
        let mut wb = MemoryWorkbook::new("export.xlsx")
            .with_sheet("Januar", grid.clone())
            .with_sheet("Februar", Grid::default());

        assert_eq!(wb.source_name(), "export.xlsx");
        assert_eq!(wb.sheet_names(), vec!["Januar", "Februar"]);
        assert_eq!(wb.read_sheet("Januar").unwrap(), grid);
        assert_eq!(
            wb.read_sheet("März"),
            Err(LoadError::SheetNotFound("März".to_string()))
        );
    }

    #[test]
    fn test_load_table_applies_method() {
        let grid = Grid::from_rows(vec![
            vec![CellValue::from("Zähler"), CellValue::from("Januar")],
            vec![CellValue::from("XX001"), CellValue::from(1.0)],
        ]);
        let mut wb = MemoryWorkbook::new("m").with_sheet("S", grid);

        let table = load_table(&mut wb, "S", ReadingMethod::Standard).unwrap();
        assert_eq!(table.columns(), ["Zähler", "Januar"]);
        assert_eq!(table.height(), 1);
    }
}
