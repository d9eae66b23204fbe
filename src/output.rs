//! Output formatting and persistence for the worst-case summary.
//!
//! Supports log output, JSON serialization, CSV export of the summary and of
//! every reading, and the row layout used by the report sheet.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::instruments::types::{SensorReading, StatusResult, WorstCaseRecord};
use crate::tsv::TsvTable;
use csv::WriterBuilder;
use std::fs::File;

/// One CSV row of the summary, with the report's column names.
#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    #[serde(rename = "위치")]
    location: &'a str,
    #[serde(rename = "계측기 종류")]
    instrument_type: &'static str,
    #[serde(rename = "계측기명")]
    instrument_name: &'a str,
    #[serde(rename = "주간변화량")]
    weekly_change: String,
    #[serde(rename = "누적변화량")]
    cumulative_change: String,
    #[serde(rename = "단위")]
    unit: &'static str,
    #[serde(rename = "상태")]
    status: &'static str,
    #[serde(rename = "비율")]
    ratio: String,
}

impl<'a> SummaryRow<'a> {
    fn from_record(record: &'a WorstCaseRecord) -> Self {
        Self::graded(&record.reading, record.status_result())
    }

    fn graded(reading: &'a SensorReading, result: StatusResult) -> Self {
        SummaryRow {
            location: &reading.location,
            instrument_type: reading.instrument_type.label(),
            instrument_name: &reading.instrument_name,
            weekly_change: reading.weekly_change_text(),
            cumulative_change: reading.cumulative_change_text(),
            unit: reading.unit,
            status: result.status.label(),
            ratio: result.ratio_text(),
        }
    }
}

/// Logs one line per summary record.
pub fn print_summary(records: &[WorstCaseRecord]) {
    for record in records {
        let row = SummaryRow::from_record(record);
        info!(
            location = row.location,
            instrument = row.instrument_name,
            kind = row.instrument_type,
            weekly = %row.weekly_change,
            cumulative = %row.cumulative_change,
            unit = row.unit,
            status = row.status,
            ratio = %row.ratio,
            "Worst case"
        );
    }
}

/// Logs the summary as pretty-printed JSON.
pub fn print_json(records: &[WorstCaseRecord]) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(records)?);
    Ok(())
}

/// Writes the summary to a CSV file, replacing any existing file.
pub fn write_summary_csv(path: &str, records: &[WorstCaseRecord]) -> Result<()> {
    debug!(path, records = records.len(), "Writing summary CSV");

    let file = File::create(path)?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

    for record in records {
        writer.serialize(SummaryRow::from_record(record))?;
    }
    writer.flush()?;

    Ok(())
}

/// Writes every accumulated reading, each graded on its own, sorted by
/// location. Readings at one location keep their ingestion order.
pub fn write_readings_csv(path: &str, readings: &[SensorReading]) -> Result<()> {
    debug!(path, readings = readings.len(), "Writing readings CSV");

    let mut sorted: Vec<&SensorReading> = readings.iter().collect();
    sorted.sort_by(|a, b| a.location.cmp(&b.location));

    let file = File::create(path)?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

    for reading in sorted {
        writer.serialize(SummaryRow::graded(reading, reading.classify()))?;
    }
    writer.flush()?;

    Ok(())
}

/// Summary rows in the report sheet's column order (no ratio column), sorted
/// by location and then instrument type label.
pub fn instrument_table(records: &[WorstCaseRecord]) -> TsvTable {
    let header = ["위치", "계측기 종류", "계측기명", "주간변화량", "누적변화량", "단위", "상태"]
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut sorted: Vec<&WorstCaseRecord> = records.iter().collect();
    sorted.sort_by(|a, b| {
        (a.reading.location.as_str(), a.reading.instrument_type.label())
            .cmp(&(b.reading.location.as_str(), b.reading.instrument_type.label()))
    });

    let rows = sorted
        .into_iter()
        .map(|record| {
            let row = SummaryRow::from_record(record);
            vec![
                row.location.to_string(),
                row.instrument_type.to_string(),
                row.instrument_name.to_string(),
                row.weekly_change,
                row.cumulative_change,
                row.unit.to_string(),
                row.status.to_string(),
            ]
        })
        .collect();

    TsvTable { header, rows }
}
