//! Configuration for musa-eye

use crate::error::VisionError;
use crate::processing::ripeness::{default_hue_bands, HueBand, RipenessCategory};
use crate::processing::sensor::SensorProfiles;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest hue value in the 8-bit HSV convention
pub const MAX_HUE: u8 = 179;

/// Inclusive HSV band a pixel must fall into to count as object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorBand {
    /// Lower bound (hue, saturation, value)
    pub lower: [u8; 3],
    /// Upper bound (hue, saturation, value)
    pub upper: [u8; 3],
}

impl Default for ColorBand {
    fn default() -> Self {
        Self {
            lower: [10, 40, 40],
            upper: [80, 255, 255],
        }
    }
}

impl ColorBand {
    /// True when every channel lies inside the band
    pub fn contains(&self, hsv: [u8; 3]) -> bool {
        (0..3).all(|c| self.lower[c] <= hsv[c] && hsv[c] <= self.upper[c])
    }
}

/// Opening parameters for the mask cleaner (3x3 square element)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MorphologyConfig {
    pub erode_iterations: u8,
    pub dilate_iterations: u8,
}

impl Default for MorphologyConfig {
    fn default() -> Self {
        Self {
            erode_iterations: 2,
            dilate_iterations: 2,
        }
    }
}

/// Shape thresholds applied to the largest region
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometryThresholds {
    /// Region area must be strictly greater than this (pixels)
    pub min_area: f64,
    /// Elongation ratio must be at least this
    pub min_ratio: f64,
}

impl Default for GeometryThresholds {
    fn default() -> Self {
        Self {
            min_area: 5000.0,
            min_ratio: 1.5,
        }
    }
}

/// USB camera settings, used by the `camera` feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// USB camera device index (0, 1, 2, etc.)
    pub camera_id: u32,
    /// Target frame rate (frames per second)
    pub frame_rate: u32,
    /// Camera resolution (width, height)
    pub resolution: (u32, u32),
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            camera_id: 0,
            frame_rate: 30,
            resolution: (640, 480),
        }
    }
}

impl CameraConfig {
    fn validate(&self) -> Result<(), VisionError> {
        if self.frame_rate == 0 || self.frame_rate > 120 {
            return Err(config_err("Frame rate must be between 1 and 120"));
        }

        if self.resolution.0 == 0 || self.resolution.1 == 0 {
            return Err(config_err("Resolution must be non-zero"));
        }

        if self.resolution.0 > 7680 || self.resolution.1 > 4320 {
            return Err(config_err("Resolution too large (max 8K)"));
        }

        let total_pixels = self.resolution.0
            .checked_mul(self.resolution.1)
            .ok_or_else(|| config_err("Resolution would cause integer overflow"))?;

        if total_pixels > 100_000_000 {
            return Err(config_err("Resolution too large (max 100M pixels)"));
        }

        if self.camera_id > 100 {
            return Err(config_err("Camera ID too large (max 100)"));
        }

        Ok(())
    }
}

/// Analyzer configuration
///
/// Every section falls back to its default when missing from a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Flip frames horizontally before analysis
    pub mirror: bool,
    /// Hand the cleaned mask to the display sink as well
    pub show_mask: bool,
    /// Exit-key poll window per cycle (milliseconds)
    pub poll_interval_ms: u32,
    /// HSV band used by the segmenter
    pub color_band: ColorBand,
    /// Erosion/dilation iteration counts
    pub morphology: MorphologyConfig,
    /// Area and elongation thresholds
    pub geometry: GeometryThresholds,
    /// Ordered hue-to-ripeness table, first match wins
    pub hue_bands: Vec<HueBand>,
    /// Simulated sensor ranges per ripeness category
    pub sensor_profiles: SensorProfiles,
    /// Camera device settings
    pub camera: CameraConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            mirror: true,
            show_mask: false,
            poll_interval_ms: 1,
            color_band: ColorBand::default(),
            morphology: MorphologyConfig::default(),
            geometry: GeometryThresholds::default(),
            hue_bands: default_hue_bands(),
            sensor_profiles: SensorProfiles::default(),
            camera: CameraConfig::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Load configuration from a TOML file and validate it
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, VisionError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Parse configuration from TOML text and validate it
    pub fn from_toml_str(text: &str) -> Result<Self, VisionError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Render configuration as TOML
    pub fn to_toml_string(&self) -> Result<String, VisionError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), VisionError> {
        for c in 0..3 {
            if self.color_band.lower[c] > self.color_band.upper[c] {
                return Err(config_err(format!(
                    "Color band channel {} is inverted ({} > {})",
                    c, self.color_band.lower[c], self.color_band.upper[c]
                )));
            }
        }
        if self.color_band.upper[0] > MAX_HUE {
            return Err(config_err(format!("Color band hue must not exceed {}", MAX_HUE)));
        }

        if !self.geometry.min_area.is_finite() || self.geometry.min_area < 0.0 {
            return Err(config_err("Minimum area must be finite and non-negative"));
        }
        if !self.geometry.min_ratio.is_finite() || self.geometry.min_ratio <= 0.0 {
            return Err(config_err("Minimum ratio must be finite and positive"));
        }

        self.validate_hue_bands()?;
        self.sensor_profiles.validate()?;
        self.camera.validate()?;

        Ok(())
    }

    fn validate_hue_bands(&self) -> Result<(), VisionError> {
        for (i, band) in self.hue_bands.iter().enumerate() {
            if band.min > band.max {
                return Err(config_err(format!("Hue band {} is inverted", i)));
            }
            if band.min < 0 || band.max > MAX_HUE as i32 {
                return Err(config_err(format!(
                    "Hue band {} must lie within 0..={}",
                    i, MAX_HUE
                )));
            }
            if band.category == RipenessCategory::Unclassified {
                return Err(config_err(format!(
                    "Hue band {} maps to Unclassified, which is the fallback",
                    i
                )));
            }
            for other in &self.hue_bands[..i] {
                if band.min <= other.max && other.min <= band.max {
                    return Err(config_err(format!(
                        "Hue band {} ({}..={}) overlaps {}..={}",
                        i, band.min, band.max, other.min, other.max
                    )));
                }
            }
        }
        Ok(())
    }
}

fn config_err(msg: impl Into<String>) -> VisionError {
    VisionError::Config(msg.into())
}
