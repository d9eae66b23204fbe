use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use construction_report::alerts::{AlertMessage, select_alerts};
use construction_report::instruments::batch::{BatchState, ValidationError};
use construction_report::instruments::types::{InstrumentType, Status};
use construction_report::notify::TeamsWebhook;
use construction_report::fetch::BasicClient;
use construction_report::output::{instrument_table, write_readings_csv, write_summary_csv};
use construction_report::report::{Placement, ReportWriter, TableSlot, XlsxReportWriter};
use construction_report::sheet::load_workbook;
use construction_report::tsv::parse_table;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn batch_of(names: &[&str]) -> BatchState {
    let mut batch = BatchState::default();
    for name in names {
        batch
            .ingest_path(&fixture(name))
            .expect("fixture should ingest")
            .expect("fixture should be readable");
    }
    batch
}

#[test]
fn test_csv_fixture_loads_as_single_sheet() {
    let sheets = load_workbook(&fixture("station_b.csv")).unwrap();
    assert_eq!(sheets.len(), 1);
    assert_eq!(sheets[0].title, "station_b");
    assert_eq!(sheets[0].header(), ["Time", "W-1", "Temp"]);
    assert_eq!(sheets[0].data_row_count(), 2);
}

#[test]
fn test_full_pipeline() {
    let batch = batch_of(&["단면_A.csv", "station_b.csv"]);
    assert_eq!(batch.reporting_date(), NaiveDate::from_ymd_opt(2024, 5, 1));

    let summary = batch.summarize();
    let keys: Vec<(&str, &str, InstrumentType)> = summary
        .iter()
        .map(|r| {
            (
                r.reading.location.as_str(),
                r.reading.instrument_name.as_str(),
                r.reading.instrument_type,
            )
        })
        .collect();
    assert_eq!(
        keys,
        vec![
            ("신풍 특피", "StrainA", InstrumentType::StrainGauge),
            ("신풍 특피", "INC-1", InstrumentType::Inclinometer),
            ("station_b", "W-1", InstrumentType::WaterLevelGauge),
        ]
    );

    let alerts = select_alerts(&summary);
    let flagged: Vec<(&str, Status)> = alerts
        .iter()
        .map(|r| (r.reading.instrument_name.as_str(), r.status))
        .collect();
    assert_eq!(
        flagged,
        vec![("StrainA", Status::Tier2Exceeded), ("W-1", Status::Tier1Exceeded)]
    );
    assert_eq!(alerts[1].reading.weekly_change, Some(0.6));
}

#[test]
fn test_mismatched_file_is_rejected_without_partial_rows() {
    let mut batch = batch_of(&["단면_A.csv", "station_b.csv"]);
    let before = batch.readings().len();

    let err = batch.ingest_path(&fixture("station_c.csv")).unwrap_err();
    assert_eq!(
        err,
        ValidationError::DateMismatch {
            file: "station_c.csv".into(),
            sheet: "station_c".into(),
            expected: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            found: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
        }
    );
    assert_eq!(batch.readings().len(), before);
}

#[test]
fn test_alert_card_for_batch() {
    let batch = batch_of(&["단면_A.csv", "station_b.csv"]);
    let summary = batch.summarize();
    let alerts = select_alerts(&summary);

    let date = batch.reporting_date().unwrap();
    let message = AlertMessage::build(&alerts, date).unwrap();
    let card = TeamsWebhook::<BasicClient>::card(&message);

    let body = &card["attachments"][0]["content"]["body"];
    assert_eq!(body[0]["text"], "⚠️ 계측기 경고 알림 (2024년 5월 1일)");
    assert_eq!(body.as_array().unwrap().len(), 4);
    assert!(body[2]["text"].as_str().unwrap().contains("StrainA (변형률계)"));
}

#[test]
fn test_summary_csv_and_report_workbook() {
    let batch = batch_of(&["단면_A.csv", "station_b.csv"]);
    let summary = batch.summarize();

    let csv_path = std::env::temp_dir().join("construction_report_it_summary.csv");
    write_summary_csv(csv_path.to_str().unwrap(), &summary).unwrap();
    let csv = fs::read_to_string(&csv_path).unwrap();
    assert_eq!(csv.lines().count(), 4);
    assert!(csv.contains("신풍 특피,변형률계,StrainA,300,2100.000,ton,2차 초과,83.4%"));
    fs::remove_file(&csv_path).unwrap();

    let personnel = parse_table(&fs::read_to_string(fixture("personnel.tsv")).unwrap()).unwrap();
    assert_eq!(personnel.rows[1], vec!["철근공", "8", "", "160"]);

    let bytes = XlsxReportWriter::default()
        .write(&[
            Placement {
                slot: TableSlot::Personnel,
                table: personnel,
            },
            Placement {
                slot: TableSlot::Instruments,
                table: instrument_table(&summary),
            },
        ])
        .unwrap();
    assert_eq!(&bytes[..2], b"PK");
}

#[test]
fn test_readings_csv_lists_every_reading() {
    let batch = batch_of(&["station_b.csv", "단면_A.csv"]);

    let path = std::env::temp_dir().join("construction_report_it_readings.csv");
    write_readings_csv(path.to_str().unwrap(), batch.readings()).unwrap();
    let csv = fs::read_to_string(&path).unwrap();
    let locations: Vec<&str> = csv
        .lines()
        .skip(1)
        .map(|line| line.split(',').next().unwrap())
        .collect();
    assert_eq!(locations, vec!["station_b", "신풍 특피", "신풍 특피"]);
    assert!(csv.contains("신풍 특피,지중경사계,INC-1,2.5,12.500,mm,1차 미만,9.7%"));
    fs::remove_file(&path).unwrap();
}
