use crate::instruments::types::{InstrumentType, SensorReading, Status, StatusResult};

/// Which change a threshold rule compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Basis {
    /// `|cumulative_change|`
    Cumulative,
    /// `|weekly_change|`, 0 when the weekly change is missing.
    Weekly,
}

/// Absolute tier-3 limit plus the fractions of it that open tiers 2 and 1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdRule {
    pub basis: Basis,
    pub limit: f64,
    pub tier2_fraction: f64,
    pub tier1_fraction: f64,
}

impl ThresholdRule {
    pub fn tier2_limit(&self) -> f64 {
        self.limit * self.tier2_fraction
    }

    pub fn tier1_limit(&self) -> f64 {
        self.limit * self.tier1_fraction
    }

    /// Grades a magnitude, highest tier first, so boundaries land on the
    /// higher tier.
    ///
    /// | Range                | Status          |
    /// |----------------------|-----------------|
    /// | >= limit             | Tier3Exceeded   |
    /// | >= limit * tier2     | Tier2Exceeded   |
    /// | >= limit * tier1     | Tier1Exceeded   |
    /// | below                | Stable          |
    pub fn grade(&self, value: f64) -> StatusResult {
        if !value.is_finite() {
            return StatusResult {
                status: Status::Error,
                ratio: 0.0,
            };
        }

        let status = match value {
            v if v >= self.limit => Status::Tier3Exceeded,
            v if v >= self.tier2_limit() => Status::Tier2Exceeded,
            v if v >= self.tier1_limit() => Status::Tier1Exceeded,
            _ => Status::Stable,
        };

        StatusResult {
            status,
            ratio: value / self.limit,
        }
    }
}

/// Per-discipline safety limits.
static RULES: &[(InstrumentType, ThresholdRule)] = &[
    (
        InstrumentType::LoadCell,
        ThresholdRule {
            basis: Basis::Cumulative,
            limit: 100.0,
            tier2_fraction: 0.8,
            tier1_fraction: 0.6,
        },
    ),
    (
        InstrumentType::StrainGauge,
        ThresholdRule {
            basis: Basis::Cumulative,
            limit: 2518.0,
            tier2_fraction: 0.8,
            tier1_fraction: 0.6,
        },
    ),
    (
        InstrumentType::Inclinometer,
        ThresholdRule {
            basis: Basis::Cumulative,
            limit: 128.96,
            tier2_fraction: 0.8,
            tier1_fraction: 0.6,
        },
    ),
    (
        InstrumentType::WaterLevelGauge,
        ThresholdRule {
            basis: Basis::Weekly,
            limit: 1.0,
            tier2_fraction: 0.75,
            tier1_fraction: 0.5,
        },
    ),
];

pub fn rule_for(instrument_type: InstrumentType) -> Option<&'static ThresholdRule> {
    RULES
        .iter()
        .find(|(kind, _)| *kind == instrument_type)
        .map(|(_, rule)| rule)
}

/// Classifies a change pair for the given instrument type.
///
/// Types without a rule are `Unknown`; a non-finite basis value is `Error`.
/// Both come back with a ratio of 0.
pub fn classify(
    instrument_type: InstrumentType,
    weekly_change: Option<f64>,
    cumulative_change: f64,
) -> StatusResult {
    let Some(rule) = rule_for(instrument_type) else {
        return StatusResult {
            status: Status::Unknown,
            ratio: 0.0,
        };
    };

    let basis = match rule.basis {
        Basis::Cumulative => cumulative_change.abs(),
        Basis::Weekly => weekly_change.unwrap_or(0.0).abs(),
    };

    rule.grade(basis)
}

impl SensorReading {
    pub fn classify(&self) -> StatusResult {
        classify(
            self.instrument_type,
            self.weekly_change,
            self.cumulative_change,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load_cell(cumulative: f64) -> Status {
        classify(InstrumentType::LoadCell, None, cumulative).status
    }

    fn water(weekly: Option<f64>) -> Status {
        classify(InstrumentType::WaterLevelGauge, weekly, 0.0).status
    }

    #[test]
    fn test_load_cell_boundaries() {
        assert_eq!(load_cell(100.0), Status::Tier3Exceeded);
        assert_eq!(load_cell(80.0), Status::Tier2Exceeded);
        assert_eq!(load_cell(60.0), Status::Tier1Exceeded);
        assert_eq!(load_cell(59.999), Status::Stable);
        assert_eq!(load_cell(-100.0), Status::Tier3Exceeded);
    }

    #[test]
    fn test_water_level_boundaries() {
        assert_eq!(water(Some(1.0)), Status::Tier3Exceeded);
        assert_eq!(water(Some(0.75)), Status::Tier2Exceeded);
        assert_eq!(water(Some(0.5)), Status::Tier1Exceeded);
        assert_eq!(water(Some(0.49)), Status::Stable);
        assert_eq!(water(Some(-0.6)), Status::Tier1Exceeded);
        assert_eq!(water(None), Status::Stable);
    }

    #[test]
    fn test_water_level_ignores_cumulative() {
        let result = classify(InstrumentType::WaterLevelGauge, Some(0.1), 5000.0);
        assert_eq!(result.status, Status::Stable);
    }

    #[test]
    fn test_strain_and_inclinometer_tiers() {
        let strain = rule_for(InstrumentType::StrainGauge).unwrap();
        assert_eq!(strain.grade(strain.tier2_limit()).status, Status::Tier2Exceeded);
        assert_eq!(strain.grade(strain.tier1_limit()).status, Status::Tier1Exceeded);
        assert_eq!(strain.grade(2518.0).status, Status::Tier3Exceeded);
        assert_eq!(strain.grade(1500.0).status, Status::Stable);

        let inc = rule_for(InstrumentType::Inclinometer).unwrap();
        assert_eq!(inc.grade(128.96).status, Status::Tier3Exceeded);
        assert_eq!(inc.grade(110.0).status, Status::Tier2Exceeded);
        assert_eq!(inc.grade(80.0).status, Status::Tier1Exceeded);
        assert_eq!(inc.grade(77.0).status, Status::Stable);
    }

    #[test]
    fn test_ratio_against_tier3_limit() {
        let result = classify(InstrumentType::LoadCell, None, -85.0);
        assert_eq!(result.status, Status::Tier2Exceeded);
        assert_eq!(result.ratio, 0.85);

        let result = classify(InstrumentType::WaterLevelGauge, Some(0.6), 0.0);
        assert_eq!(result.ratio, 0.6);
    }

    #[test]
    fn test_unclassified_is_unknown() {
        let result = classify(InstrumentType::Unclassified, Some(1.0), 1.0);
        assert_eq!(result.status, Status::Unknown);
        assert_eq!(result.ratio, 0.0);
    }

    #[test]
    fn test_non_finite_basis_is_error() {
        let result = classify(InstrumentType::StrainGauge, None, f64::NAN);
        assert_eq!(result.status, Status::Error);
        assert_eq!(result.ratio, 0.0);
    }

    #[test]
    fn test_classification_is_monotonic() {
        for (kind, rule) in RULES {
            let mut previous = 0;
            for step in 0..=300 {
                let value = rule.limit * step as f64 / 200.0;
                let (weekly, cumulative) = match rule.basis {
                    Basis::Weekly => (Some(value), 0.0),
                    Basis::Cumulative => (None, value),
                };
                let severity = classify(*kind, weekly, cumulative)
                    .status
                    .severity()
                    .unwrap();
                assert!(severity >= previous, "{kind:?} dropped a tier at {value}");
                previous = severity;
            }
            assert_eq!(previous, 3);
        }
    }
}
