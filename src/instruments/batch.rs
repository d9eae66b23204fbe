//! Per-run accumulation of sensor readings across uploaded files.
//!
//! Files are ingested one at a time, in upload order. A file's readings are
//! buffered and only appended once every sheet in it agrees with the batch's
//! reporting date, so a rejected file never leaves partial rows behind.

use std::path::Path;

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::alerts::select_alerts;
use crate::instruments::extract::{SheetExtract, extract_samples};
use crate::instruments::identity::{SiteProfile, resolve};
use crate::instruments::reduce::worst_case;
use crate::instruments::types::{SensorReading, WorstCaseRecord};
use crate::instruments::utility::find_iso_date;
use crate::sheet::{Sheet, load_workbook};

/// Cross-file inconsistency that rejects a file from the batch.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("reporting date mismatch in '{file}' (sheet '{sheet}'): batch is {expected}, file has {found}")]
    DateMismatch {
        file: String,
        sheet: String,
        expected: NaiveDate,
        found: NaiveDate,
    },
}

/// A file that could not be read at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub file: String,
    pub cause: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedSheet {
    pub title: String,
    pub reason: String,
}

/// What one accepted file contributed.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub file: String,
    pub readings_added: usize,
    pub skipped_sheets: Vec<SkippedSheet>,
}

/// Reporting date of a sheet: the first `YYYY-MM-DD` in column 0 of its last row.
pub fn reporting_date(sheet: &Sheet) -> Option<NaiveDate> {
    let last = sheet.data_row_count().checked_sub(1)?;
    find_iso_date(&sheet.cell(last, 0).to_string())
}

/// Accumulator for one processing run.
#[derive(Debug, Default)]
pub struct BatchState {
    profile: SiteProfile,
    readings: Vec<SensorReading>,
    reporting_date: Option<NaiveDate>,
    failures: Vec<FileFailure>,
}

impl BatchState {
    pub fn new(profile: SiteProfile) -> Self {
        Self {
            profile,
            ..Default::default()
        }
    }

    pub fn readings(&self) -> &[SensorReading] {
        &self.readings
    }

    pub fn reporting_date(&self) -> Option<NaiveDate> {
        self.reporting_date
    }

    pub fn failures(&self) -> &[FileFailure] {
        &self.failures
    }

    /// Clears everything gathered so far; the site profile is kept.
    pub fn reset(&mut self) {
        self.readings.clear();
        self.reporting_date = None;
        self.failures.clear();
    }

    pub fn record_failure(&mut self, file: &str, cause: impl Into<String>) {
        let cause = cause.into();
        warn!(file, cause = %cause, "File skipped");
        self.failures.push(FileFailure {
            file: file.to_string(),
            cause,
        });
    }

    /// Ingests the sheets of one file.
    ///
    /// Sheets with fewer than two data rows are listed in the outcome and
    /// otherwise ignored. A file that leaves nothing usable, or whose usable
    /// sheet carries no date in column A, is recorded as a failure and yields
    /// `Ok(None)`. A sheet dated differently from the batch rejects the whole
    /// file with an error. Either way the state keeps none of the file's rows.
    #[tracing::instrument(skip(self, sheets), fields(sheets = sheets.len()))]
    pub fn ingest_file(
        &mut self,
        file: &str,
        sheets: &[Sheet],
    ) -> Result<Option<BatchOutcome>, ValidationError> {
        let mut expected = self.reporting_date;
        let mut buffer = Vec::new();
        let mut skipped_sheets = Vec::new();

        for sheet in sheets {
            let samples = match extract_samples(sheet) {
                SheetExtract::Samples(samples) => samples,
                SheetExtract::TooShort { data_rows } => {
                    debug!(sheet = %sheet.title, data_rows, "Sheet too short");
                    skipped_sheets.push(SkippedSheet {
                        title: sheet.title.clone(),
                        reason: format!("{data_rows} data row(s), at least 2 required"),
                    });
                    continue;
                }
            };

            let Some(found) = reporting_date(sheet) else {
                self.record_failure(
                    file,
                    format!(
                        "no YYYY-MM-DD date in column A of the last row of sheet '{}'",
                        sheet.title
                    ),
                );
                return Ok(None);
            };

            match expected {
                None => expected = Some(found),
                Some(batch_date) if batch_date != found => {
                    return Err(ValidationError::DateMismatch {
                        file: file.to_string(),
                        sheet: sheet.title.clone(),
                        expected: batch_date,
                        found,
                    });
                }
                Some(_) => {}
            }

            let location = self.profile.normalize_location(&sheet.title);
            buffer.extend(
                samples
                    .into_iter()
                    .filter_map(|sample| resolve(&location, sample)),
            );
        }

        if skipped_sheets.len() == sheets.len() {
            let titles: Vec<&str> = skipped_sheets.iter().map(|s| s.title.as_str()).collect();
            self.record_failure(
                file,
                format!("no sheet with at least 2 data rows (skipped: {})", titles.join(", ")),
            );
            return Ok(None);
        }

        if self.reporting_date.is_none() {
            if let Some(date) = expected {
                info!(%date, "Reporting date established");
            }
        }
        self.reporting_date = expected;

        let readings_added = buffer.len();
        self.readings.append(&mut buffer);
        info!(readings_added, skipped = skipped_sheets.len(), "File ingested");

        Ok(Some(BatchOutcome {
            file: file.to_string(),
            readings_added,
            skipped_sheets,
        }))
    }

    /// Loads and ingests a file from disk.
    ///
    /// Unreadable files are recorded as failures and yield `Ok(None)`.
    pub fn ingest_path(&mut self, path: &Path) -> Result<Option<BatchOutcome>, ValidationError> {
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        match load_workbook(path) {
            Ok(sheets) => self.ingest_file(&file, &sheets),
            Err(e) => {
                self.record_failure(&file, format!("{e:#}"));
                Ok(None)
            }
        }
    }

    /// Worst-case summary rebuilt from every reading gathered so far.
    pub fn summarize(&self) -> Vec<WorstCaseRecord> {
        worst_case(&self.readings)
    }

    /// Summary records that need attention, in summary order.
    pub fn alerts(&self) -> Vec<WorstCaseRecord> {
        select_alerts(&self.summarize()).into_iter().cloned().collect()
    }
}
