//! CLI entry point for the construction report tool.
//!
//! Provides subcommands for analyzing instrument exports, extracting tables
//! from report documents, and assembling the daily report workbook.

mod infra;
mod services;

use crate::infra::config::AppConfig;
use crate::infra::gemini::client::GeminiClient;
use crate::services::extraction_api::{Document, ExtractionRequest, ExtractionTask, TableExtractor};
use anyhow::{Context, Result, anyhow};
use chrono::Local;
use clap::{Parser, Subcommand};
use construction_report::{
    alerts::{AlertMessage, select_alerts},
    fetch::BasicClient,
    instruments::batch::BatchState,
    notify::{Notifier, TeamsWebhook},
    output::{instrument_table, print_json, print_summary, write_readings_csv, write_summary_csv},
    report::{Placement, ReportWriter, TableSlot, XlsxReportWriter},
    sheet::load_workbook,
    tsv::{TsvError, TsvTable, parse_table, split_tables},
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    filter::LevelFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "construction_report")]
#[command(about = "Instrumentation summaries and daily report assembly", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize instrument exports and flag threshold exceedances
    Analyze {
        /// Workbook or CSV exports, processed in the given order
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,

        /// CSV file to write the worst-case summary to
        #[arg(short, long)]
        summary: Option<String>,

        /// CSV file to write every reading to, each with its own status
        #[arg(short, long)]
        readings: Option<String>,

        /// Also log the summary as JSON
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Send alerts to the configured Teams webhook
        #[arg(long, default_value_t = false)]
        notify: bool,
    },
    /// Extract a tab-separated table from a PDF, spreadsheet, text file or raw text
    ExtractTable {
        /// Path to a document, or the report text itself
        #[arg(value_name = "FILE_OR_TEXT")]
        source: String,

        /// Extraction task; guessed from the file name when omitted
        #[arg(short, long, value_enum)]
        task: Option<ExtractionTask>,

        /// File to write the TSV to instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Assemble the daily report workbook from instrument exports and TSV tables
    BuildReport {
        /// Instrument exports for the instrument table
        #[arg(long, num_args = 1.., value_name = "FILES")]
        instruments: Vec<PathBuf>,

        /// Extra table as <slot>=<tsv file>, e.g. personnel=personnel.tsv
        #[arg(long = "table", value_parser = parse_table_arg)]
        tables: Vec<(TableSlot, PathBuf)>,

        /// Blast record TSV
        #[arg(long)]
        blast: Option<PathBuf>,

        /// Workbook to write
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn parse_table_arg(arg: &str) -> Result<(TableSlot, PathBuf), String> {
    let (name, path) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected <slot>=<file>, got '{arg}'"))?;
    let slot = name.parse::<TableSlot>().map_err(|e| e.to_string())?;
    Ok((slot, PathBuf::from(path)))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/construction_report.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("construction_report.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive(LevelFilter::INFO.into()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive(LevelFilter::DEBUG.into()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();
    config.log_summary();

    match cli.command {
        Commands::Analyze {
            files,
            summary,
            readings,
            json,
            notify,
        } => {
            let exports = Exports {
                summary: summary.as_deref(),
                readings: readings.as_deref(),
                json,
            };
            analyze_files(&config, &files, exports, notify).await?;
        }
        Commands::ExtractTable {
            source,
            task,
            output,
        } => {
            extract_table(&config, &source, task, output.as_deref()).await?;
        }
        Commands::BuildReport {
            instruments,
            tables,
            blast,
            output,
        } => {
            build_report(&config, &instruments, tables, blast.as_deref(), &output)?;
        }
    }

    Ok(())
}

/// Ingests files in order into a fresh batch. A date mismatch aborts the run.
fn ingest_all(config: &AppConfig, files: &[PathBuf]) -> Result<BatchState> {
    let mut batch = BatchState::new(config.site_profile()?);

    for path in files {
        match batch.ingest_path(path) {
            Ok(Some(outcome)) => {
                for skipped in &outcome.skipped_sheets {
                    warn!(
                        file = %outcome.file,
                        sheet = %skipped.title,
                        reason = %skipped.reason,
                        "Sheet skipped"
                    );
                }
            }
            Ok(None) => {}
            Err(e) => {
                error!(error = %e, "Batch rejected");
                return Err(e.into());
            }
        }
    }

    info!(
        files = files.len(),
        failed = batch.failures().len(),
        readings = batch.readings().len(),
        "Ingestion finished"
    );
    Ok(batch)
}

/// Where `analyze` writes its results besides the log.
#[derive(Debug, Clone, Copy)]
struct Exports<'a> {
    summary: Option<&'a str>,
    readings: Option<&'a str>,
    json: bool,
}

/// Builds the worst-case summary, reports it, and optionally sends alerts.
#[tracing::instrument(skip(config, files), fields(files = files.len()))]
async fn analyze_files(
    config: &AppConfig,
    files: &[PathBuf],
    exports: Exports<'_>,
    notify: bool,
) -> Result<()> {
    let batch = ingest_all(config, files)?;
    let records = batch.summarize();

    if records.is_empty() {
        warn!("No instrument readings found");
        return Ok(());
    }

    print_summary(&records);
    if exports.json {
        print_json(&records)?;
    }
    if let Some(path) = exports.readings {
        write_readings_csv(path, batch.readings())
            .with_context(|| format!("failed to write readings to '{path}'"))?;
        info!(path, readings = batch.readings().len(), "Readings written");
    }
    if let Some(path) = exports.summary {
        write_summary_csv(path, &records)
            .with_context(|| format!("failed to write summary to '{path}'"))?;
        info!(path, records = records.len(), "Summary written");
    }

    let alerts = select_alerts(&records);
    for alert in &alerts {
        warn!(
            location = %alert.reading.location,
            instrument = %alert.reading.instrument_name,
            status = alert.status.label(),
            ratio = %alert.status_result().ratio_text(),
            "Threshold alert"
        );
    }
    info!(alerts = alerts.len(), "Alert selection finished");

    if !notify {
        return Ok(());
    }

    let date = batch
        .reporting_date()
        .unwrap_or_else(|| Local::now().date_naive());
    let Some(message) = AlertMessage::build(&alerts, date) else {
        info!("No alerts to send");
        return Ok(());
    };
    let Some(url) = config.teams_webhook_url.as_deref() else {
        warn!("TEAMS_WEBHOOK_URL not set, alerts not sent");
        return Ok(());
    };

    let webhook = TeamsWebhook::new(BasicClient::with_timeout(Duration::from_secs(30))?, url);
    match webhook.send(&message).await {
        Ok(()) => info!(alerts = message.blocks.len(), "Alerts sent"),
        Err(e) => warn!(error = %e, "Alert delivery failed"),
    }

    Ok(())
}

fn is_spreadsheet(path: &Path) -> bool {
    let ext = path
        .extension()
        .and_then(OsStr::to_str)
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    matches!(ext.as_str(), "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" | "csv")
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Turns a document into TSV. Spreadsheets are converted directly; everything
/// else goes through the extraction service.
#[tracing::instrument(skip(config, source), fields(task = ?task))]
async fn extract_table(
    config: &AppConfig,
    source: &str,
    task: Option<ExtractionTask>,
    output: Option<&Path>,
) -> Result<()> {
    let path = Path::new(source);

    if path.is_file() && is_spreadsheet(path) {
        let sheets = load_workbook(path)?;
        let first = sheets
            .first()
            .ok_or_else(|| anyhow!("'{source}' has no sheets"))?;
        info!(sheet = %first.title, "Spreadsheet converted without extraction");
        return emit_tsv(&first.to_tsv(), output);
    }

    let request = if path.is_file() && is_pdf(path) {
        let bytes = std::fs::read(path).with_context(|| format!("failed to read '{source}'"))?;
        let name = path.file_name().and_then(OsStr::to_str).unwrap_or_default();
        ExtractionRequest {
            task: task.unwrap_or_else(|| ExtractionTask::for_file_name(name)),
            document: Document::Pdf(bytes),
        }
    } else {
        let text = if path.is_file() {
            std::fs::read_to_string(path).with_context(|| format!("failed to read '{source}'"))?
        } else {
            source.to_string()
        };
        ExtractionRequest {
            task: task.unwrap_or(ExtractionTask::ChatReport),
            document: Document::Text(text),
        }
    };

    let multi = request.task == ExtractionTask::ChatReport;
    let extractor = GeminiClient::new(config.gemini_api_key()?, &config.gemini_model)?;
    let answer = extractor.extract(request).await?;

    // Chat reports come back as several fenced tables.
    let tables = if multi {
        split_tables(&answer)
    } else {
        parse_table(&answer).into_iter().collect::<Vec<_>>()
    };

    if tables.is_empty() {
        warn!(error = %TsvError::NoTable, "Extraction produced no table");
        return Ok(());
    }

    info!(tables = tables.len(), "Tables extracted");
    let tsv = tables
        .iter()
        .map(TsvTable::to_tsv)
        .collect::<Vec<_>>()
        .join("\n\n");
    emit_tsv(&tsv, output)
}

fn emit_tsv(tsv: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, format!("{tsv}\n"))
                .with_context(|| format!("failed to write '{}'", path.display()))?;
            info!(path = %path.display(), "TSV written");
        }
        None => println!("{tsv}"),
    }
    Ok(())
}

fn read_table(path: &Path) -> Result<TsvTable> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    parse_table(&text).with_context(|| format!("no table in '{}'", path.display()))
}

/// Collects every placement and writes the report workbook.
#[tracing::instrument(skip_all, fields(output = %output.display()))]
fn build_report(
    config: &AppConfig,
    instruments: &[PathBuf],
    tables: Vec<(TableSlot, PathBuf)>,
    blast: Option<&Path>,
    output: &Path,
) -> Result<()> {
    let mut placements = Vec::new();

    for (slot, path) in tables {
        placements.push(Placement {
            slot,
            table: read_table(&path)?,
        });
    }
    if let Some(path) = blast {
        placements.push(Placement {
            slot: TableSlot::Blast,
            table: read_table(path)?,
        });
    }
    if !instruments.is_empty() {
        let batch = ingest_all(config, instruments)?;
        placements.push(Placement {
            slot: TableSlot::Instruments,
            table: instrument_table(&batch.summarize()),
        });
    }

    let bytes = XlsxReportWriter::default().write(&placements)?;
    std::fs::write(output, bytes)
        .with_context(|| format!("failed to write '{}'", output.display()))?;

    info!(tables = placements.len(), "Report written");
    Ok(())
}
