//! Canonical location and instrument-type resolution.
//!
//! Sheet titles are free text typed into the logging client ("도림 출입구#1 ALL",
//! "신풍 주출입구 PCB", ...). [`SiteProfile`] folds them into the handful of
//! location labels used on the daily report. Instrument types come from
//! keywords in the column header, checked in a fixed priority order.

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::instruments::extract::ColumnSample;
use crate::instruments::types::{InstrumentType, SensorReading};

/// How sheet titles are reduced to a location.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LocationVariant {
    /// Map entrance and cross-section titles onto their fixed labels.
    EntranceAliases,
    /// Keep only the text before `marker` (e.g. an inclinometer series suffix).
    StripSuffix { marker: String },
}

/// Site-specific constants for location normalization.
///
/// Loaded from a JSON file when `SITE_PROFILE_PATH` is set:
/// ```json
/// {
///   "main_entrance_label": "신풍 주출입구",
///   "station_prefix": "도림",
///   "variant": { "kind": "strip_suffix", "marker": "INC_" }
/// }
/// ```
/// Missing fields keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SiteProfile {
    pub main_entrance_marker: String,
    pub main_entrance_label: String,
    pub cross_section_marker: String,
    pub cross_section_label: String,
    pub entrance_marker: String,
    pub station_prefix: String,
    pub variant: LocationVariant,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            main_entrance_marker: "주출입구".to_string(),
            main_entrance_label: "신풍 주출입구".to_string(),
            cross_section_marker: "단면".to_string(),
            cross_section_label: "신풍 특피".to_string(),
            entrance_marker: "출입구".to_string(),
            station_prefix: "도림".to_string(),
            variant: LocationVariant::EntranceAliases,
        }
    }
}

impl SiteProfile {
    /// Loads a profile from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read site profile '{path}'"))?;
        let profile: SiteProfile = serde_json::from_str(&content)
            .with_context(|| format!("invalid site profile '{path}'"))?;
        Ok(profile)
    }

    /// Reduces a sheet title to its canonical location label.
    pub fn normalize_location(&self, title: &str) -> String {
        let stripped = remove_all_marker(title);

        match &self.variant {
            LocationVariant::StripSuffix { marker } => {
                let prefix = match stripped.find(marker.as_str()) {
                    Some(pos) => &stripped[..pos],
                    None => stripped.as_str(),
                };
                collapse_whitespace(prefix)
            }
            LocationVariant::EntranceAliases => {
                let location = collapse_whitespace(&stripped);
                if location.contains(&self.main_entrance_marker) {
                    self.main_entrance_label.clone()
                } else if location.contains(&self.cross_section_marker) {
                    self.cross_section_label.clone()
                } else if location.contains(&self.entrance_marker)
                    && !location.starts_with(&self.station_prefix)
                {
                    let aliased = format!("{}{}", self.station_prefix, self.entrance_marker);
                    location.replace(&self.entrance_marker, &aliased)
                } else {
                    location
                }
            }
        }
    }
}

/// Removes every occurrence of "ALL", ignoring ASCII case.
pub fn remove_all_marker(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(ch) = rest.chars().next() {
        if rest
            .get(..3)
            .is_some_and(|head| head.eq_ignore_ascii_case("all"))
        {
            rest = &rest[3..];
            continue;
        }
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    out
}

pub fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_strain(name: &str) -> bool {
    name.contains("변형률") || name.to_lowercase().contains("strain")
}

fn is_water_level(name: &str) -> bool {
    name.contains('W') || name.contains("지하수위") || name.to_lowercase().contains("water")
}

fn is_inclinometer(name: &str) -> bool {
    name.contains("INC") || name.contains("지중경사") || name.to_lowercase().contains("inclino")
}

fn is_load_cell(name: &str) -> bool {
    name.contains("하중") || name.contains("LC") || name.to_lowercase().contains("load")
}

/// Keyword predicates in priority order; the first match wins.
static TYPE_RULES: &[(fn(&str) -> bool, InstrumentType)] = &[
    (is_strain, InstrumentType::StrainGauge),
    (is_water_level, InstrumentType::WaterLevelGauge),
    (is_inclinometer, InstrumentType::Inclinometer),
    (is_load_cell, InstrumentType::LoadCell),
];

pub fn classify_instrument(name: &str) -> InstrumentType {
    TYPE_RULES
        .iter()
        .find(|(matches, _)| matches(name))
        .map(|(_, kind)| *kind)
        .unwrap_or(InstrumentType::Unclassified)
}

/// Load cells share a naming prefix with neighbouring channels; only the
/// channels whose name ends in `R` are real load readings.
pub fn is_load_channel(name: &str) -> bool {
    name.trim().to_uppercase().ends_with('R')
}

/// Turns an extracted column into a typed reading, or `None` when the column
/// is not a tracked instrument.
pub fn resolve(location: &str, sample: ColumnSample) -> Option<SensorReading> {
    let instrument_type = classify_instrument(&sample.instrument_name);
    match instrument_type {
        InstrumentType::Unclassified => return None,
        InstrumentType::LoadCell if !is_load_channel(&sample.instrument_name) => return None,
        _ => {}
    }

    Some(SensorReading {
        location: location.to_string(),
        instrument_name: sample.instrument_name,
        instrument_type,
        unit: instrument_type.unit(),
        weekly_change: sample.weekly_change,
        cumulative_change: sample.cumulative_change,
    })
}
