use std::collections::HashMap;

use crate::instruments::types::{InstrumentType, SensorReading, WorstCaseRecord};

/// Reduces readings to one [`WorstCaseRecord`] per (location, instrument type).
///
/// The winner of a group is the reading with the largest `|weekly_change|`.
/// Readings without a weekly change never compete, and a group with no
/// candidates produces no record. Ties keep the first reading seen, and
/// groups come out in the order their first candidate appeared.
pub fn worst_case(readings: &[SensorReading]) -> Vec<WorstCaseRecord> {
    let mut order: Vec<&SensorReading> = Vec::new();
    let mut index: HashMap<(&str, InstrumentType), usize> = HashMap::new();

    for reading in readings {
        let Some(change) = reading.weekly_change else {
            continue;
        };

        let key = (reading.location.as_str(), reading.instrument_type);
        match index.get(&key).copied() {
            Some(slot) => {
                let current = order[slot]
                    .weekly_change
                    .map(f64::abs)
                    .unwrap_or_default();
                if change.abs() > current {
                    order[slot] = reading;
                }
            }
            None => {
                index.insert(key, order.len());
                order.push(reading);
            }
        }
    }

    order
        .into_iter()
        .map(|winner| {
            let result = winner.classify();
            WorstCaseRecord {
                reading: winner.clone(),
                status: result.status,
                ratio: result.ratio,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruments::types::Status;

    fn reading(
        location: &str,
        name: &str,
        kind: InstrumentType,
        weekly: Option<f64>,
        cumulative: f64,
    ) -> SensorReading {
        SensorReading {
            location: location.to_string(),
            instrument_name: name.to_string(),
            instrument_type: kind,
            unit: kind.unit(),
            weekly_change: weekly,
            cumulative_change: cumulative,
        }
    }

    #[test]
    fn test_selects_largest_absolute_change() {
        let readings = vec![
            reading("정거장", "변형률-1", InstrumentType::StrainGauge, Some(-5.0), 1000.0),
            reading("정거장", "변형률-2", InstrumentType::StrainGauge, Some(3.0), 2100.0),
            reading("정거장", "변형률-3", InstrumentType::StrainGauge, Some(-8.0), 1600.0),
        ];

        let records = worst_case(&readings);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.reading.instrument_name, "변형률-3");
        // Classified on the winner's cumulative change, not the group max.
        assert_eq!(record.status, Status::Tier1Exceeded);
        assert_eq!(record.ratio, 1600.0 / 2518.0);
    }

    #[test]
    fn test_tie_keeps_first_encountered() {
        let readings = vec![
            reading("A", "W-1", InstrumentType::WaterLevelGauge, Some(0.3), 0.0),
            reading("A", "W-2", InstrumentType::WaterLevelGauge, Some(-0.3), 0.0),
        ];
        let records = worst_case(&readings);
        assert_eq!(records[0].reading.instrument_name, "W-1");
    }

    #[test]
    fn test_missing_weekly_change_never_wins() {
        let readings = vec![
            reading("A", "INC-1", InstrumentType::Inclinometer, None, 120.0),
            reading("A", "INC-2", InstrumentType::Inclinometer, Some(0.1), 5.0),
        ];
        let records = worst_case(&readings);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].reading.instrument_name, "INC-2");
        assert_eq!(records[0].status, Status::Stable);
    }

    #[test]
    fn test_group_without_candidates_is_absent() {
        let readings = vec![reading("A", "INC-1", InstrumentType::Inclinometer, None, 120.0)];
        assert!(worst_case(&readings).is_empty());
    }

    #[test]
    fn test_groups_split_by_location_and_type() {
        let readings = vec![
            reading("A", "W-1", InstrumentType::WaterLevelGauge, Some(0.1), 0.0),
            reading("B", "W-1", InstrumentType::WaterLevelGauge, Some(0.2), 0.0),
            reading("A", "INC-1", InstrumentType::Inclinometer, Some(1.0), 10.0),
            reading("A", "W-2", InstrumentType::WaterLevelGauge, Some(0.9), 0.0),
        ];
        let records = worst_case(&readings);
        let keys: Vec<(&str, &str)> = records
            .iter()
            .map(|r| (r.reading.location.as_str(), r.reading.instrument_name.as_str()))
            .collect();
        assert_eq!(keys, vec![("A", "W-2"), ("B", "W-1"), ("A", "INC-1")]);
    }

    #[test]
    fn test_reclassifying_a_record_is_stable() {
        let readings = vec![reading("A", "LC-1R", InstrumentType::LoadCell, Some(2.0), 81.0)];
        let record = &worst_case(&readings)[0];
        assert_eq!(record.reading.classify(), record.status_result());
        assert_eq!(record.reading.classify(), record.reading.classify());
    }
}
