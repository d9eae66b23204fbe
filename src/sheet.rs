//! Typed tabular input for the instrumentation pipeline.
//!
//! Every monitoring-station export, whatever its on-disk format, is loaded
//! into a [`Sheet`]: row 0 becomes the header and every later row is one
//! timestamped sample. Workbooks (`.xlsx`, `.xls`, `.ods`) are read with
//! calamine; `.csv`/`.tsv` exports become a single sheet named after the file.

use std::fmt;
use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result, bail};
use calamine::{Data, DataType, Reader, open_workbook_auto};
use tracing::debug;

/// One cell of a sheet.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Empty,
}

impl CellValue {
    /// Interprets a raw text field: blank becomes [`CellValue::Empty`],
    /// anything that parses as a float becomes a number.
    pub fn from_field(field: &str) -> Self {
        if field.trim().is_empty() {
            return CellValue::Empty;
        }
        match field.trim().parse::<f64>() {
            Ok(v) => CellValue::Number(v),
            Err(_) => CellValue::Text(field.to_string()),
        }
    }

    /// Float conversion with the usual "parse the trimmed text" semantics.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
            CellValue::Empty => None,
        }
    }

    /// True for missing cells and for the literal text "nan" in any case.
    pub fn is_nan_like(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Number(v) => v.is_nan(),
            CellValue::Text(s) => s.trim().eq_ignore_ascii_case("nan"),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(v) => write!(f, "{v}"),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Empty => Ok(()),
        }
    }
}

/// A rectangular-ish sheet: a header row plus sample rows in stored order.
///
/// Rows may be ragged; missing trailing cells read as [`CellValue::Empty`].
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub title: String,
    header: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    pub fn new(title: impl Into<String>, header: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            title: title.into(),
            header,
            rows,
        }
    }

    /// Builds a sheet from a grid of cells whose first row is the header.
    pub fn from_grid(title: impl Into<String>, mut grid: Vec<Vec<CellValue>>) -> Self {
        if grid.is_empty() {
            return Self::new(title, Vec::new(), Vec::new());
        }
        let header = grid.remove(0).iter().map(|c| c.to_string()).collect();
        Self::new(title, header, grid)
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn data_row_count(&self) -> usize {
        self.rows.len()
    }

    /// Cell at `(row, col)` of the data rows, `Empty` when out of range.
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        const EMPTY: &CellValue = &CellValue::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(EMPTY)
    }

    /// Renders the sheet as tab-separated text, header first.
    pub fn to_tsv(&self) -> String {
        let mut lines = vec![self.header.join("\t")];
        for row in &self.rows {
            let fields: Vec<String> = row.iter().map(|c| c.to_string()).collect();
            lines.push(fields.join("\t"));
        }
        lines.join("\n")
    }
}

/// Loads every sheet of a workbook or delimited file.
pub fn load_workbook(path: &Path) -> Result<Vec<Sheet>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => load_spreadsheet(path),
        "csv" => load_delimited(path, b','),
        "tsv" => load_delimited(path, b'\t'),
        other => bail!("unsupported file type '{}' for {}", other, path.display()),
    }
}

fn load_spreadsheet(path: &Path) -> Result<Vec<Sheet>> {
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("cannot open {}", path.display()))?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .with_context(|| format!("cannot read sheet '{}' of {}", name, path.display()))?;

        // Keep column 0 anchored at column A even when the used range starts later.
        let leading = range.start().map(|(_, col)| col as usize).unwrap_or(0);

        let grid: Vec<Vec<CellValue>> = range
            .rows()
            .map(|row| {
                std::iter::repeat_n(CellValue::Empty, leading)
                    .chain(row.iter().map(convert_cell))
                    .collect()
            })
            .collect();

        debug!(sheet = %name, rows = grid.len(), "Sheet loaded");
        sheets.push(Sheet::from_grid(name, grid));
    }

    Ok(sheets)
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Int(v) => CellValue::Number(*v as f64),
        Data::Float(v) => CellValue::Number(*v),
        Data::String(s) if s.trim().is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        Data::DateTime(_) => match cell.as_datetime() {
            Some(dt) => CellValue::Text(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => CellValue::Empty,
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(_) | Data::Empty => CellValue::Empty,
    }
}

fn load_delimited(path: &Path, delimiter: u8) -> Result<Vec<Sheet>> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(file);

    let mut grid = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("bad record {} in {}", idx + 1, path.display()))?;
        if idx == 0 {
            grid.push(record.iter().map(|f| CellValue::Text(f.trim().to_string())).collect());
        } else {
            grid.push(record.iter().map(CellValue::from_field).collect());
        }
    }

    let title = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Sheet1")
        .to_string();

    Ok(vec![Sheet::from_grid(title, grid)])
}
