// Grid loading boundary
//
// Turns spreadsheet documents into raw cell grids and header-sliced tables.
// - cell: closed scalar type for cell contents
// - sheet: absolute-coordinate grid of one sheet
// - table: a grid read under one header interpretation
// - workbook: calamine-backed and in-memory sheet sources

pub mod cell;
pub mod sheet;
pub mod table;
pub mod workbook;

pub use cell::CellValue;
pub use sheet::Grid;
pub use table::{ReadingMethod, Table};
pub use workbook::{load_table, MemoryWorkbook, SheetSource, Workbook};
