use crate::error::RiskError;
use crate::types::{Cell, Table};
use crate::util::cell_from_field;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::NaiveDateTime;
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub total_rows: usize,
    pub blank_rows: usize,
}

/// Decode an uploaded spreadsheet into a `Table`.
///
/// `name` is the original file name; its extension picks the decoder. CSV goes
/// through the csv reader, everything else is opened as a workbook and only
/// its first worksheet is read.
pub fn load_table(name: &str, bytes: &[u8]) -> Result<Table, RiskError> {
    let is_csv = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    let (table, report) = if is_csv {
        load_csv(name, bytes)?
    } else {
        load_workbook(name, bytes)?
    };
    debug!(
        file = name,
        columns = table.headers.len(),
        rows = report.total_rows,
        blank_rows = report.blank_rows,
        "loaded sheet"
    );
    Ok(table)
}

fn load_workbook(name: &str, bytes: &[u8]) -> Result<(Table, LoadReport), RiskError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = match workbook.worksheet_range_at(0) {
        Some(r) => r?,
        None => return Err(RiskError::EmptySheet(name.to_string())),
    };

    let mut rows = range.rows();
    let header_row = rows
        .next()
        .ok_or_else(|| RiskError::EmptySheet(name.to_string()))?;
    let headers = normalize_headers(header_row.iter().map(|c| cell_from_data(c).to_string()));
    let mut table = Table::new(name, headers);
    let mut report = LoadReport::default();

    for row in rows {
        report.total_rows += 1;
        let cells: Vec<Cell> = row.iter().map(cell_from_data).collect();
        if cells.iter().all(Cell::is_empty) {
            report.blank_rows += 1;
            continue;
        }
        table.push_row(cells);
    }
    Ok((table, report))
}

fn load_csv(name: &str, bytes: &[u8]) -> Result<(Table, LoadReport), RiskError> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(bytes);
    let header_record = rdr.headers()?.clone();
    if header_record.is_empty() {
        return Err(RiskError::EmptySheet(name.to_string()));
    }
    let headers = normalize_headers(header_record.iter().map(str::to_string));
    let mut table = Table::new(name, headers);
    let mut report = LoadReport::default();

    for result in rdr.records() {
        let record = result?;
        report.total_rows += 1;
        let cells: Vec<Cell> = record.iter().map(cell_from_field).collect();
        if cells.iter().all(Cell::is_empty) {
            report.blank_rows += 1;
            continue;
        }
        table.push_row(cells);
    }
    Ok((table, report))
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) => {
            if s.trim().is_empty() {
                Cell::Empty
            } else {
                Cell::Text(s.clone())
            }
        }
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => Cell::DateTime(ndt),
            None => Cell::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
            .map(Cell::DateTime)
            .unwrap_or_else(|_| Cell::Text(s.clone())),
        Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Text(e.to_string()),
    }
}

/// Trim header names, name blank ones `Unnamed: <index>` and suffix repeats
/// with `.1`, `.2`, ... so every column can be addressed by name.
fn normalize_headers<I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen: HashMap<String, usize> = HashMap::new();
    raw.into_iter()
        .enumerate()
        .map(|(idx, h)| {
            let base = match h.trim() {
                "" => format!("Unnamed: {}", idx),
                t => t.to_string(),
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{}.{}", base, count)
            };
            *count += 1;
            name
        })
        .collect()
}
