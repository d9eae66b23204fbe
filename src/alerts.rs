//! Selection and formatting of threshold alerts.

use chrono::NaiveDate;
use serde::Serialize;

use crate::instruments::types::{Status, WorstCaseRecord};
use crate::instruments::utility::korean_date_label;

const INTRO: &str = "다음 계측기에서 주의가 필요한 변화가 감지되었습니다:";

/// Records that need attention: everything not graded `Stable`.
///
/// Read-only; the summary itself is left as is.
pub fn select_alerts(records: &[WorstCaseRecord]) -> Vec<&WorstCaseRecord> {
    records.iter().filter(|r| r.status != Status::Stable).collect()
}

/// One alerting instrument, ready for a notifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertBlock {
    pub location: String,
    pub instrument_name: String,
    pub instrument_type: String,
    pub status: String,
    pub ratio: String,
}

impl AlertBlock {
    pub fn from_record(record: &WorstCaseRecord) -> Self {
        Self {
            location: record.reading.location.clone(),
            instrument_name: record.reading.instrument_name.clone(),
            instrument_type: record.reading.instrument_type.label().to_string(),
            status: record.status.label().to_string(),
            ratio: record.status_result().ratio_text(),
        }
    }

    pub fn text(&self) -> String {
        format!(
            "📍 위치: {}\n\n📊 계측기: {} ({})\n\n⚠️ 상태: {}\n\n📈 3차 초과 대비: {}",
            self.location, self.instrument_name, self.instrument_type, self.status, self.ratio
        )
    }
}

/// A dated batch of alert blocks, in summary order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertMessage {
    pub title: String,
    pub intro: String,
    pub blocks: Vec<AlertBlock>,
}

impl AlertMessage {
    /// Builds the message for the selected records; `None` when nothing alerts.
    pub fn build(alerts: &[&WorstCaseRecord], date: NaiveDate) -> Option<Self> {
        if alerts.is_empty() {
            return None;
        }

        Some(Self {
            title: format!("⚠️ 계측기 경고 알림 ({})", korean_date_label(date)),
            intro: INTRO.to_string(),
            blocks: alerts.iter().map(|r| AlertBlock::from_record(r)).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruments::types::{InstrumentType, SensorReading};

    fn record(name: &str, status: Status, ratio: f64) -> WorstCaseRecord {
        WorstCaseRecord {
            reading: SensorReading {
                location: "신풍 주출입구".into(),
                instrument_name: name.into(),
                instrument_type: InstrumentType::Inclinometer,
                unit: "mm",
                weekly_change: Some(1.0),
                cumulative_change: 90.0,
            },
            status,
            ratio,
        }
    }

    #[test]
    fn test_select_skips_stable_only() {
        let records = vec![
            record("INC-1", Status::Stable, 0.1),
            record("INC-2", Status::Tier1Exceeded, 0.7),
            record("INC-3", Status::Error, 0.0),
        ];
        let alerts = select_alerts(&records);
        let names: Vec<&str> = alerts
            .iter()
            .map(|r| r.reading.instrument_name.as_str())
            .collect();
        assert_eq!(names, vec!["INC-2", "INC-3"]);
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn test_block_text() {
        let block = AlertBlock::from_record(&record("INC-2", Status::Tier1Exceeded, 0.6979));
        assert_eq!(block.ratio, "69.8%");
        assert_eq!(
            block.text(),
            "📍 위치: 신풍 주출입구\n\n📊 계측기: INC-2 (지중경사계)\n\n⚠️ 상태: 1차 초과\n\n📈 3차 초과 대비: 69.8%"
        );
    }

    #[test]
    fn test_message_title_and_order() {
        let records = vec![
            record("INC-2", Status::Tier2Exceeded, 0.85),
            record("INC-1", Status::Tier1Exceeded, 0.65),
        ];
        let alerts = select_alerts(&records);
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let message = AlertMessage::build(&alerts, date).unwrap();

        assert_eq!(message.title, "⚠️ 계측기 경고 알림 (2024년 5월 1일)");
        assert_eq!(message.blocks.len(), 2);
        assert_eq!(message.blocks[0].instrument_name, "INC-2");
    }

    #[test]
    fn test_no_alerts_no_message() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert!(AlertMessage::build(&[], date).is_none());
    }
}
