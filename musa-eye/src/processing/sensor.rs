//! Simulated biosensor readings conditioned on ripeness
//!
//! The ranges follow the respiration curve of a climacteric fruit: low CO2 and acidic
//! flesh before ripening, a CO2 peak at optimal ripeness, then fermentation with a pH
//! drifting toward neutral and moisture loss.

use crate::error::VisionError;
use crate::processing::ripeness::RipenessCategory;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Decimal places kept per channel
pub const CO2_DECIMALS: i32 = 1;
pub const PH_DECIMALS: i32 = 2;
pub const HUMIDITY_DECIMALS: i32 = 1;

/// Closed interval a simulated value is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorRange {
    pub min: f64,
    pub max: f64,
}

impl SensorRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Ranges for all three channels of one category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorRanges {
    pub co2_ppm: SensorRange,
    pub ph: SensorRange,
    pub humidity_pct: SensorRange,
}

/// Sensor ranges for every known category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorProfiles {
    pub fresh: SensorRanges,
    pub optimally_ripe: SensorRanges,
    pub overripe: SensorRanges,
}

impl Default for SensorProfiles {
    fn default() -> Self {
        Self {
            fresh: SensorRanges {
                co2_ppm: SensorRange::new(200.0, 350.0),
                ph: SensorRange::new(4.5, 5.2),
                humidity_pct: SensorRange::new(85.0, 90.0),
            },
            optimally_ripe: SensorRanges {
                co2_ppm: SensorRange::new(450.0, 600.0),
                ph: SensorRange::new(5.3, 6.2),
                humidity_pct: SensorRange::new(80.0, 85.0),
            },
            overripe: SensorRanges {
                co2_ppm: SensorRange::new(300.0, 500.0),
                ph: SensorRange::new(6.3, 7.0),
                humidity_pct: SensorRange::new(60.0, 75.0),
            },
        }
    }
}

impl SensorProfiles {
    /// Ranges for a category; Unclassified has none
    pub fn ranges_for(&self, category: RipenessCategory) -> Option<&SensorRanges> {
        match category {
            RipenessCategory::Fresh => Some(&self.fresh),
            RipenessCategory::OptimallyRipe => Some(&self.optimally_ripe),
            RipenessCategory::Overripe => Some(&self.overripe),
            RipenessCategory::Unclassified => None,
        }
    }

    pub fn validate(&self) -> Result<(), VisionError> {
        let profiles = [
            ("fresh", &self.fresh),
            ("optimally_ripe", &self.optimally_ripe),
            ("overripe", &self.overripe),
        ];
        for (name, ranges) in profiles {
            let channels = [
                ("co2_ppm", ranges.co2_ppm, CO2_DECIMALS),
                ("ph", ranges.ph, PH_DECIMALS),
                ("humidity_pct", ranges.humidity_pct, HUMIDITY_DECIMALS),
            ];
            for (channel, range, decimals) in channels {
                if !range.min.is_finite() || !range.max.is_finite() || range.min > range.max {
                    return Err(VisionError::Config(format!(
                        "Sensor range {}.{} is invalid ({}..={})",
                        name, channel, range.min, range.max
                    )));
                }
                // Rounded draws only stay inside bounds that sit on the rounding grid
                if !on_grid(range.min, decimals) || !on_grid(range.max, decimals) {
                    return Err(VisionError::Config(format!(
                        "Sensor range {}.{} ({}..={}) must have at most {} decimals",
                        name, channel, range.min, range.max, decimals
                    )));
                }
            }
        }
        Ok(())
    }
}

/// One simulated reading
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub co2_ppm: f64,
    pub ph: f64,
    pub humidity_pct: f64,
}

impl SensorReading {
    /// Reading reported for unclassified detections
    pub const fn zero() -> Self {
        Self {
            co2_ppm: 0.0,
            ph: 0.0,
            humidity_pct: 0.0,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::zero()
    }
}

/// Uniform draw from `[lo, hi]`
pub fn sample<R: Rng + ?Sized>(lo: f64, hi: f64, rng: &mut R) -> f64 {
    if lo >= hi {
        return lo;
    }
    rng.gen_range(lo..=hi)
}

/// Round half away from zero to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

fn on_grid(value: f64, decimals: i32) -> bool {
    (round_to(value, decimals) - value).abs() <= 1e-9 * value.abs().max(1.0)
}

/// Sample, round, then keep the result inside the range
fn draw<R: Rng + ?Sized>(range: SensorRange, decimals: i32, rng: &mut R) -> f64 {
    round_to(sample(range.min, range.max, rng), decimals)
        .max(range.min)
        .min(range.max)
}

/// Draw CO2 (1 decimal), pH (2 decimals) and humidity (1 decimal) independently
pub fn simulate<R: Rng + ?Sized>(
    category: RipenessCategory,
    profiles: &SensorProfiles,
    rng: &mut R,
) -> SensorReading {
    let Some(ranges) = profiles.ranges_for(category) else {
        return SensorReading::zero();
    };

    SensorReading {
        co2_ppm: draw(ranges.co2_ppm, CO2_DECIMALS, rng),
        ph: draw(ranges.ph, PH_DECIMALS, rng),
        humidity_pct: draw(ranges.humidity_pct, HUMIDITY_DECIMALS, rng),
    }
}
