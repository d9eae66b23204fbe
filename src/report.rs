//! Fixed-anchor placement of report tables into a workbook.
//!
//! The daily report sheet has one anchor cell per table. Tables extracted from
//! chat logs and PDFs go in with their header row; the blast and instrument
//! tables fill pre-labelled rows and go in without one.

use std::str::FromStr;

use anyhow::{Result, anyhow};
use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use tracing::debug;

use crate::tsv::TsvTable;

/// Table slots on the report sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableSlot {
    Weather,
    ConstructionStatus,
    WorkContent,
    Personnel,
    Equipment,
    Blast,
    Instruments,
}

/// 1-based anchor cell of a slot and whether its header row is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub row: u32,
    pub col: u16,
    pub with_header: bool,
}

impl TableSlot {
    pub fn anchor(self) -> Anchor {
        let (row, col, with_header) = match self {
            TableSlot::Weather => (4, 30, true),
            TableSlot::ConstructionStatus => (12, 30, true),
            TableSlot::WorkContent => (47, 30, true),
            TableSlot::Personnel => (64, 31, true),
            TableSlot::Equipment => (110, 31, true),
            TableSlot::Blast => (160, 31, false),
            TableSlot::Instruments => (171, 31, false),
        };
        Anchor {
            row,
            col,
            with_header,
        }
    }
}

impl FromStr for TableSlot {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weather" => Ok(TableSlot::Weather),
            "status" | "construction-status" => Ok(TableSlot::ConstructionStatus),
            "work" | "work-content" => Ok(TableSlot::WorkContent),
            "personnel" => Ok(TableSlot::Personnel),
            "equipment" => Ok(TableSlot::Equipment),
            "blast" => Ok(TableSlot::Blast),
            "instruments" => Ok(TableSlot::Instruments),
            other => Err(anyhow!("unknown table slot '{other}'")),
        }
    }
}

/// A table bound to its slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub slot: TableSlot,
    pub table: TsvTable,
}

/// Writes placements into workbook bytes.
pub trait ReportWriter {
    fn write(&self, placements: &[Placement]) -> Result<Vec<u8>>;
}

/// Renders placements onto a single sheet with `rust_xlsxwriter`.
#[derive(Debug, Clone)]
pub struct XlsxReportWriter {
    pub sheet_name: String,
}

impl Default for XlsxReportWriter {
    fn default() -> Self {
        Self {
            sheet_name: "작업일보".to_string(),
        }
    }
}

impl ReportWriter for XlsxReportWriter {
    fn write(&self, placements: &[Placement]) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&self.sheet_name)?;

        for placement in placements {
            write_placement(worksheet, placement)?;
        }

        Ok(workbook.save_to_buffer()?)
    }
}

fn write_placement(worksheet: &mut Worksheet, placement: &Placement) -> Result<(), XlsxError> {
    let anchor = placement.slot.anchor();
    // rust_xlsxwriter is 0-based.
    let top = anchor.row - 1;
    let left = anchor.col - 1;

    let header = anchor.with_header.then_some(&placement.table.header);
    let rows = header.into_iter().chain(placement.table.rows.iter());

    let mut written = 0;
    for (r, fields) in rows.enumerate() {
        for (c, value) in fields.iter().enumerate() {
            write_value(worksheet, top + r as u32, left + c as u16, value)?;
        }
        written += 1;
    }

    debug!(slot = ?placement.slot, rows = written, "Table placed");
    Ok(())
}

fn write_value(worksheet: &mut Worksheet, row: u32, col: u16, value: &str) -> Result<(), XlsxError> {
    if value.is_empty() {
        return Ok(());
    }
    match value.trim().parse::<f64>() {
        Ok(number) if number.is_finite() => {
            worksheet.write_number(row, col, number)?;
        }
        _ => {
            worksheet.write_string(row, col, value)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TsvTable {
        TsvTable {
            header: vec!["구분".into(), "인원".into()],
            rows: vec![vec!["형틀공".into(), "12".into()], vec!["철근공".into(), "".into()]],
        }
    }

    #[test]
    fn test_anchors() {
        assert_eq!(
            TableSlot::Weather.anchor(),
            Anchor {
                row: 4,
                col: 30,
                with_header: true
            }
        );
        assert_eq!(TableSlot::Instruments.anchor().row, 171);
        assert!(!TableSlot::Blast.anchor().with_header);
    }

    #[test]
    fn test_slot_from_str() {
        assert_eq!("Personnel".parse::<TableSlot>().unwrap(), TableSlot::Personnel);
        assert_eq!("status".parse::<TableSlot>().unwrap(), TableSlot::ConstructionStatus);
        assert!("lunch".parse::<TableSlot>().is_err());
    }

    #[test]
    fn test_writer_produces_xlsx_bytes() {
        let writer = XlsxReportWriter::default();
        let bytes = writer
            .write(&[
                Placement {
                    slot: TableSlot::Personnel,
                    table: table(),
                },
                Placement {
                    slot: TableSlot::Blast,
                    table: table(),
                },
            ])
            .unwrap();

        // xlsx files are zip archives.
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_writer_with_no_placements() {
        let bytes = XlsxReportWriter::default().write(&[]).unwrap();
        assert!(!bytes.is_empty());
    }
}
