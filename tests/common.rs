#![allow(dead_code)]

use zev_structure::grid::{CellValue, Grid, MemoryWorkbook};

pub const MONTHS: [&str; 12] = [
    "Januar", "Februar", "März", "April", "Mai", "Juni", "Juli", "August", "September",
    "Oktober", "November", "Dezember",
];

pub fn text_row(values: &[&str]) -> Vec<CellValue> {
    values.iter().map(|v| CellValue::from(*v)).collect()
}

/// Columns A..D from `lead`, then one cell per entry of `months` from column E
pub fn month_row(lead: &[&str], months: &[CellValue]) -> Vec<CellValue> {
    let mut row = text_row(lead);
    row.resize(4, CellValue::Empty);
    row.extend(months.iter().cloned());
    row
}

pub fn month_names(months: &[&str]) -> Vec<CellValue> {
    months.iter().map(|m| CellValue::from(*m)).collect()
}

pub fn numbers(values: &[f64]) -> Vec<CellValue> {
    values.iter().map(|v| CellValue::from(*v)).collect()
}

pub fn workbook(grid: Grid) -> MemoryWorkbook {
    MemoryWorkbook::new("zev_export.xlsx").with_sheet("Tabelle1", grid)
}

/// Monthly consumption sheet: a title line, then a header at row 1
pub fn monthly_sheet() -> Grid {
    let mut header = vec!["Zähler", "Wohnung"];
    header.extend(MONTHS);
    let mut rows = vec![text_row(&["ZEV Zwischenbächen Leistungsberechnung"]), text_row(&header)];
    for apartment in 1..=12 {
        let meter = format!("CHINV00{apartment}");
        let label = format!("Wohnung {apartment}");
        let mut row = text_row(&[meter.as_str(), label.as_str()]);
        row.extend((1..=12).map(|m| CellValue::from((apartment * 10 + m) as f64)));
        rows.push(row);
    }
    Grid::from_rows(rows)
}

/// Headerless meter export with a main meter, its sub-meters and a virtual
/// total meter:
///
/// - CHINV0012345 (main, 2 points)
///   - CHINV0099 (sub, 1 point)
///   - XX-Allgemein (virtual sub, inherits months, 1 point)
/// - XX-ZEV-Total (virtual, 1 point)
pub fn meter_export() -> Grid {
    let months = month_names(&["Januar", "Februar", "März"]);
    Grid::from_rows(vec![
        text_row(&["ZEV Zwischenbächen Leistungsberechnung"]),
        month_row(&["CHINV0012345"], &months),
        text_row(&["Haus A"]),
        month_row(&["Bezug Netz [kWh]"], &numbers(&[100.0, 110.0, 120.0])),
        month_row(
            &["Bezug lokal [kWh]"],
            &[CellValue::from(50.0), CellValue::Empty, CellValue::from("n.v.")],
        ),
        text_row(&["Untermessungen"]),
        month_row(&["", "CHINV0099"], &months),
        text_row(&["", "Wohnung 1.1"]),
        month_row(&["", "Verbrauch [kWh]"], &numbers(&[10.0, 11.0, 12.0])),
        text_row(&["", "XX-Allgemein"]),
        text_row(&["", "Allgemein"]),
        month_row(&["", "Summe Allgemeinstrom"], &numbers(&[1.0, 2.0, 3.0])),
        month_row(&["XX-ZEV-Total"], &months),
        text_row(&["ZEV Total"]),
        text_row(&["", "CHINV0100"]),
        month_row(&["Verbrauch total"], &numbers(&[5.0, 6.0, 7.0])),
    ])
}
