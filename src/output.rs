use crate::error::RiskError;
use crate::types::{Cell, RiskSummary, Table};
use chrono::{NaiveDate, NaiveDateTime};
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;
use std::path::Path;
use tabled::{builder::Builder, settings::Style, Table as TextTable};

pub const EXPORT_FILE_NAME: &str = "Revenue_Risk_Output.xlsx";
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const MAX_SHEET_COLUMNS: usize = 16_384;

/// Encode the table as a single-sheet workbook. Header row first, no index column.
pub fn to_xlsx_bytes(table: &Table) -> Result<Vec<u8>, RiskError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let date_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
    let sheet = workbook.add_worksheet();

    let width = table.headers.len().max(table.rows.iter().map(Vec::len).max().unwrap_or(0));
    if width > MAX_SHEET_COLUMNS {
        return Err(RiskError::TooManyColumns(width));
    }
    let column = |col: usize| u16::try_from(col).map_err(|_| RiskError::TooManyColumns(width));

    for (col, header) in table.headers.iter().enumerate() {
        sheet.write_string_with_format(0, column(col)?, header, &header_format)?;
    }
    for (r, row) in table.rows.iter().enumerate() {
        let row_idx = (r + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let col = column(col)?;
            match cell {
                Cell::Empty => {}
                Cell::Number(n) if n.is_finite() => {
                    sheet.write_number(row_idx, col, *n)?;
                }
                Cell::Number(_) => {}
                Cell::Text(s) => {
                    sheet.write_string(row_idx, col, s)?;
                }
                Cell::Bool(b) => {
                    sheet.write_boolean(row_idx, col, *b)?;
                }
                Cell::DateTime(dt) => {
                    sheet.write_number_with_format(row_idx, col, excel_serial(dt), &date_format)?;
                }
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Days since the 1899-12-30 epoch Excel uses for its date serials.
fn excel_serial(dt: &NaiveDateTime) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    (*dt - epoch).num_milliseconds() as f64 / 86_400_000.0
}

pub fn write_xlsx(path: &Path, table: &Table) -> Result<(), RiskError> {
    let bytes = to_xlsx_bytes(table)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

pub fn write_csv(path: &Path, table: &Table) -> Result<(), RiskError> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(&table.headers)?;
    for row in &table.rows {
        wtr.write_record(row.iter().map(|c| c.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), RiskError> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Markdown rendering of the first `max_rows` rows.
pub fn render_table_rows(table: &Table, max_rows: usize) -> String {
    let mut builder = Builder::default();
    builder.push_record(table.headers.clone());
    for row in table.rows.iter().take(max_rows) {
        let values: Vec<String> = row.iter().map(|c| c.to_string()).collect();
        builder.push_record(values);
    }
    TextTable::from(builder).with(Style::markdown()).to_string()
}

pub fn preview_table_rows(table: &Table, max_rows: usize) {
    if table.is_empty() {
        println!("(no rows)\n");
        return;
    }
    println!("{}\n", render_table_rows(table, max_rows));
    if table.len() > max_rows {
        println!("({} more rows not shown)\n", table.len() - max_rows);
    }
}

pub fn print_summary(summary: &RiskSummary) {
    let table_str = TextTable::new([*summary]).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}
