//! First/last sample extraction per sensor column.
//!
//! Rows are taken in stored order: the first data row is the start of the
//! reporting window and the last one is the latest reading. Sheets are not
//! re-sorted by timestamp, so an out-of-order export yields wrong deltas.

use crate::instruments::utility::round_to;
use crate::sheet::{CellValue, Sheet};

/// Minimum number of data rows needed to compute a change.
pub const MIN_DATA_ROWS: usize = 2;

/// Raw per-column result before instrument resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSample {
    pub instrument_name: String,
    pub weekly_change: Option<f64>,
    pub cumulative_change: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SheetExtract {
    Samples(Vec<ColumnSample>),
    TooShort { data_rows: usize },
}

/// `round(last - first, 3)` when both cells are numeric.
pub fn weekly_change(first: &CellValue, last: &CellValue) -> Option<f64> {
    let delta = last.as_f64()? - first.as_f64()?;
    delta.is_finite().then(|| round_to(delta, 3))
}

/// Extracts one sample per data column (column 0 holds the timestamp).
///
/// Columns whose latest cell is missing, "nan" or non-numeric contribute
/// nothing. Columns with a blank header are ignored.
pub fn extract_samples(sheet: &Sheet) -> SheetExtract {
    let data_rows = sheet.data_row_count();
    if data_rows < MIN_DATA_ROWS {
        return SheetExtract::TooShort { data_rows };
    }

    let last = data_rows - 1;
    let samples = sheet
        .header()
        .iter()
        .enumerate()
        .skip(1)
        .filter_map(|(col, name)| {
            let name = name.trim();
            if name.is_empty() {
                return None;
            }

            let latest = sheet.cell(last, col);
            if latest.is_nan_like() {
                return None;
            }
            let cumulative_change = latest.as_f64().filter(|v| v.is_finite())?;

            Some(ColumnSample {
                instrument_name: name.to_string(),
                weekly_change: weekly_change(sheet.cell(0, col), latest),
                cumulative_change,
            })
        })
        .collect();

    SheetExtract::Samples(samples)
}
