//! # Speed / Energy Consumption Lookup Table
//!
//! Static ordered lookup mapping vehicle speed (km/h) to battery energy draw
//! (kWh), with linear interpolation between measured samples.
//!
//! The built-in table is fleet-measured Tesla Model S data covering
//! 0-250 km/h in 10 km/h steps. Speeds outside the table range return the
//! boundary sample's value; there is no extrapolation past either end.

use thiserror::Error;

/// One measured (speed, energy draw) sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergySample {
    pub speed_kmh: f64,
    pub energy_kwh: f64,
}

/// Errors detected when constructing a table from custom samples.
///
/// These are startup-fatal: a fleet is never started on a malformed table.
#[derive(Debug, Error)]
pub enum EnergyTableError {
    #[error("energy consumption table must contain at least one sample")]
    Empty,

    #[error("table speeds must be strictly increasing (violated at sample {index})")]
    NonIncreasingSpeed { index: usize },
}

/// Fleet-measured consumption data, km/h : kWh.
const TESLA_MODEL_S_SAMPLES: [(f64, f64); 26] = [
    (0.0, 0.0),
    (10.0, 2.0),
    (20.0, 3.0),
    (30.0, 4.1),
    (40.0, 5.0),
    (50.0, 6.3),
    (60.0, 7.8),
    (70.0, 10.0),
    (80.0, 12.5),
    (90.0, 15.0),
    (100.0, 18.0),
    (110.0, 23.0),
    (120.0, 27.5),
    (130.0, 32.0),
    (140.0, 38.0),
    (150.0, 45.0),
    (160.0, 52.0),
    (170.0, 60.0),
    (180.0, 70.0),
    (190.0, 81.0),
    (200.0, 92.5),
    (210.0, 104.0),
    (220.0, 117.0),
    (230.0, 133.0),
    (240.0, 148.0),
    (250.0, 162.0),
];

/// Immutable speed→energy lookup table, shared read-only by every battery
/// task for the lifetime of the process.
#[derive(Debug, Clone)]
pub struct EnergyConsumptionTable {
    samples: Vec<EnergySample>,
}

impl EnergyConsumptionTable {
    /// Build a table from custom samples, validating shape at startup.
    pub fn new(samples: Vec<EnergySample>) -> Result<Self, EnergyTableError> {
        if samples.is_empty() {
            return Err(EnergyTableError::Empty);
        }
        for (index, pair) in samples.windows(2).enumerate() {
            if pair[1].speed_kmh <= pair[0].speed_kmh {
                return Err(EnergyTableError::NonIncreasingSpeed { index: index + 1 });
            }
        }
        Ok(Self { samples })
    }

    /// The built-in Tesla Model S consumption table.
    pub fn tesla_model_s() -> Self {
        Self {
            samples: TESLA_MODEL_S_SAMPLES
                .iter()
                .map(|&(speed_kmh, energy_kwh)| EnergySample {
                    speed_kmh,
                    energy_kwh,
                })
                .collect(),
        }
    }

    /// Energy draw in kWh for the given speed.
    ///
    /// Exact sample speeds return the stored value. Between samples the value
    /// is linearly interpolated. Outside the table range the nearest boundary
    /// sample's value is returned, so the result is finite for any finite
    /// input (zero and negative speeds included).
    pub fn lookup(&self, speed_kmh: f64) -> f64 {
        // First sample at or above the requested speed.
        let upper_idx = self
            .samples
            .partition_point(|sample| sample.speed_kmh < speed_kmh);

        if upper_idx == self.samples.len() {
            // Above table max: clamp to the last sample.
            return self.samples[upper_idx - 1].energy_kwh;
        }

        let upper = self.samples[upper_idx];
        if upper.speed_kmh == speed_kmh || upper_idx == 0 {
            // Exact match, or below table min: clamp to the first sample.
            return upper.energy_kwh;
        }

        let lower = self.samples[upper_idx - 1];
        lower.energy_kwh
            + (upper.energy_kwh - lower.energy_kwh) * (speed_kmh - lower.speed_kmh)
                / (upper.speed_kmh - lower.speed_kmh)
    }

    /// Highest speed covered by the table (km/h).
    pub fn max_speed_kmh(&self) -> f64 {
        self.samples[self.samples.len() - 1].speed_kmh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn two_point_table() -> EnergyConsumptionTable {
        EnergyConsumptionTable::new(vec![
            EnergySample {
                speed_kmh: 50.0,
                energy_kwh: 6.3,
            },
            EnergySample {
                speed_kmh: 60.0,
                energy_kwh: 7.8,
            },
        ])
        .unwrap()
    }

    #[test]
    fn test_interpolation_between_samples() {
        let table = two_point_table();
        // 6.3 + (7.8 - 6.3) * (55 - 50) / (60 - 50) = 7.05
        assert!((table.lookup(55.0) - 7.05).abs() < 1e-12);
    }

    #[test]
    fn test_exact_sample_match() {
        let table = EnergyConsumptionTable::tesla_model_s();
        assert_eq!(table.lookup(0.0), 0.0);
        assert_eq!(table.lookup(50.0), 6.3);
        assert_eq!(table.lookup(250.0), 162.0);
    }

    #[test]
    fn test_clamps_below_table_min() {
        let table = two_point_table();
        assert_eq!(table.lookup(10.0), 6.3);
        assert_eq!(table.lookup(-5.0), 6.3);
    }

    #[test]
    fn test_clamps_above_table_max() {
        let table = two_point_table();
        assert_eq!(table.lookup(300.0), 7.8);
    }

    #[test]
    fn test_builtin_table_zero_speed_draws_nothing() {
        let table = EnergyConsumptionTable::tesla_model_s();
        assert_eq!(table.lookup(0.0), 0.0);
        assert_eq!(table.max_speed_kmh(), 250.0);
    }

    #[test]
    fn test_empty_table_rejected() {
        assert!(matches!(
            EnergyConsumptionTable::new(vec![]),
            Err(EnergyTableError::Empty)
        ));
    }

    #[test]
    fn test_non_increasing_speeds_rejected() {
        let samples = vec![
            EnergySample {
                speed_kmh: 50.0,
                energy_kwh: 6.3,
            },
            EnergySample {
                speed_kmh: 50.0,
                energy_kwh: 7.8,
            },
        ];
        assert!(matches!(
            EnergyConsumptionTable::new(samples),
            Err(EnergyTableError::NonIncreasingSpeed { index: 1 })
        ));
    }

    proptest! {
        #[test]
        fn lookup_is_finite_and_within_sample_range(speed in -100.0f64..400.0) {
            let table = EnergyConsumptionTable::tesla_model_s();
            let energy = table.lookup(speed);
            prop_assert!(energy.is_finite());
            prop_assert!((0.0..=162.0).contains(&energy));
        }

        #[test]
        fn lookup_is_monotone_on_builtin_table(a in 0.0f64..250.0, b in 0.0f64..250.0) {
            let table = EnergyConsumptionTable::tesla_model_s();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(table.lookup(lo) <= table.lookup(hi));
        }
    }
}
