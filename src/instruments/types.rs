//! Data types used by the instrumentation pipeline.

use std::fmt;

use serde::Serialize;

/// Kind of monitoring instrument, derived from its column header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum InstrumentType {
    StrainGauge,
    WaterLevelGauge,
    Inclinometer,
    LoadCell,
    Unclassified,
}

impl InstrumentType {
    /// Label used on the report sheet and in alerts.
    pub fn label(self) -> &'static str {
        match self {
            InstrumentType::StrainGauge => "변형률계",
            InstrumentType::WaterLevelGauge => "지하수위계",
            InstrumentType::Inclinometer => "지중경사계",
            InstrumentType::LoadCell => "ST하중계",
            InstrumentType::Unclassified => "기타",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            InstrumentType::StrainGauge | InstrumentType::LoadCell => "ton",
            InstrumentType::WaterLevelGauge => "m",
            InstrumentType::Inclinometer => "mm",
            InstrumentType::Unclassified => "",
        }
    }
}

impl fmt::Display for InstrumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One sensor column of one station sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    pub location: String,
    pub instrument_name: String,
    pub instrument_type: InstrumentType,
    pub unit: &'static str,
    /// Last sample minus first sample, rounded to 3 places.
    pub weekly_change: Option<f64>,
    /// The most recent raw sample, read as the running total.
    pub cumulative_change: f64,
}

impl SensorReading {
    /// Weekly change as shown on the report; `-` when it could not be computed.
    pub fn weekly_change_text(&self) -> String {
        match self.weekly_change {
            Some(v) => format!("{v}"),
            None => "-".to_string(),
        }
    }

    pub fn cumulative_change_text(&self) -> String {
        format!("{:.3}", self.cumulative_change)
    }
}

/// Threshold outcome. `Stable` through `Tier3Exceeded` are ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Status {
    Stable,
    Tier1Exceeded,
    Tier2Exceeded,
    Tier3Exceeded,
    Unknown,
    Error,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::Stable => "1차 미만",
            Status::Tier1Exceeded => "1차 초과",
            Status::Tier2Exceeded => "2차 초과",
            Status::Tier3Exceeded => "3차 초과",
            Status::Unknown => "확인필요",
            Status::Error => "오류",
        }
    }

    /// Position on the escalation ladder; `None` for outcomes off the ladder.
    pub fn severity(self) -> Option<u8> {
        match self {
            Status::Stable => Some(0),
            Status::Tier1Exceeded => Some(1),
            Status::Tier2Exceeded => Some(2),
            Status::Tier3Exceeded => Some(3),
            Status::Unknown | Status::Error => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusResult {
    pub status: Status,
    /// Observed magnitude over the tier-3 limit, 0 when not computable.
    pub ratio: f64,
}

impl StatusResult {
    pub fn ratio_text(&self) -> String {
        format!("{:.1}%", self.ratio * 100.0 + 0.0)
    }
}

/// The reading chosen to represent one (location, instrument type) group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorstCaseRecord {
    #[serde(flatten)]
    pub reading: SensorReading,
    pub status: Status,
    pub ratio: f64,
}

impl WorstCaseRecord {
    pub fn status_result(&self) -> StatusResult {
        StatusResult {
            status: self.status,
            ratio: self.ratio,
        }
    }
}
