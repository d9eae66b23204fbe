//! Post-processing for tab-separated tables returned by the extraction service.
//!
//! Model output is rarely clean: tables arrive inside code fences, with a
//! stray `tsv` label, prose around them, and rows whose field count drifts
//! from the header. Everything here is lenient and never panics.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TsvError {
    #[error("no valid table found")]
    NoTable,
}

/// A header plus rows that all have exactly `header.len()` fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TsvTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TsvTable {
    pub fn to_tsv(&self) -> String {
        std::iter::once(&self.header)
            .chain(self.rows.iter())
            .map(|fields| fields.join("\t"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Drops code-fence lines (with or without a language tag) and a leading
/// bare `tsv` label line.
pub fn strip_code_fences(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("```") {
            // A fence can carry data right after the ticks.
            if rest.contains('\t') {
                lines.push(rest);
            }
            continue;
        }
        lines.push(line);
    }

    let first_content = lines.iter().position(|l| !l.trim().is_empty());
    if let Some(idx) = first_content {
        if lines[idx].trim().eq_ignore_ascii_case("tsv") {
            lines.remove(idx);
        }
    }

    lines.join("\n").trim().to_string()
}

/// Keeps only lines that contain a tab, trimmed.
pub fn extract_tsv(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| line.contains('\t'))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Forces every row to the header's field count: short rows are padded with
/// empty fields, overflow fields are joined with a space into the last column.
pub fn fix_field_count(tsv: &str) -> String {
    let mut lines = tsv.trim().lines();
    let Some(header) = lines.next() else {
        return String::new();
    };
    let width = header.split('\t').count();

    let mut fixed = vec![header.to_string()];
    for line in lines {
        fixed.push(normalize_fields(line.split('\t').map(str::to_string).collect(), width).join("\t"));
    }
    fixed.join("\n")
}

fn normalize_fields(mut fields: Vec<String>, width: usize) -> Vec<String> {
    if fields.len() < width {
        fields.resize(width, String::new());
    } else if fields.len() > width {
        let overflow = fields.split_off(width - 1).join(" ");
        fields.push(overflow);
    }
    fields
}

/// Fences stripped, tab lines kept, field counts fixed, then split into a table.
pub fn parse_table(text: &str) -> Result<TsvTable, TsvError> {
    let tsv = fix_field_count(&extract_tsv(&strip_code_fences(text)));

    let mut lines = tsv.lines().filter(|l| !l.trim().is_empty());
    let header_line = lines.next().ok_or(TsvError::NoTable)?;
    if !header_line.contains('\t') {
        return Err(TsvError::NoTable);
    }

    let header: Vec<String> = header_line.split('\t').map(|h| h.trim().to_string()).collect();
    let rows = lines
        .map(|line| line.split('\t').map(|f| f.trim().to_string()).collect())
        .collect();

    Ok(TsvTable { header, rows })
}

/// Splits a response holding several fenced tables and parses each one.
///
/// Chunks without a usable table are dropped; the result keeps response order.
pub fn split_tables(text: &str) -> Vec<TsvTable> {
    text.split("```")
        .filter(|chunk| chunk.contains('\t'))
        .filter_map(|chunk| parse_table(chunk).ok())
        .collect()
}
