//! Stateless per-frame analysis pipeline
//!
//! Segment → clean → locate → filter → classify → simulate. Every call starts from
//! scratch; nothing carries over between frames.

use crate::config::AnalyzerConfig;
use crate::error::VisionError;
use crate::processing::{
    average_hue, classify, clean, locate, segment, simulate, to_hsv, BoundingRegion, HsvFrame,
    RipenessCategory, SensorReading,
};
use image::{imageops, GrayImage, RgbImage};
use rand::Rng;
use serde::Serialize;
use tracing::debug;

/// A region that passed the geometric filter
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Detection {
    pub region: BoundingRegion,
    /// Mean hue over the region's box (0..=179)
    pub hue: i32,
    pub category: RipenessCategory,
    pub reading: SensorReading,
}

impl Detection {
    pub fn status(&self) -> &'static str {
        self.category.status()
    }

    pub fn description(&self) -> &'static str {
        self.category.description()
    }
}

/// Result of analyzing one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FrameOutcome {
    /// No region, or the largest one failed the geometric filter
    Searching,
    Detected(Detection),
}

impl FrameOutcome {
    pub fn is_detected(&self) -> bool {
        matches!(self, FrameOutcome::Detected(_))
    }

    pub fn detection(&self) -> Option<&Detection> {
        match self {
            FrameOutcome::Detected(detection) => Some(detection),
            FrameOutcome::Searching => None,
        }
    }
}

/// Outcome plus the cleaned mask it was derived from
#[derive(Debug, Clone)]
pub struct FrameAnalysis {
    pub outcome: FrameOutcome,
    pub mask: GrayImage,
}

/// Serializable record of one analyzed frame
#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    pub frame_index: u64,
    #[serde(flatten)]
    pub outcome: FrameOutcome,
}

impl FrameReport {
    pub fn to_json(&self) -> Result<String, VisionError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Runs the analysis stages with a fixed configuration
#[derive(Debug, Clone)]
pub struct FrameAnalyzer {
    config: AnalyzerConfig,
}

impl FrameAnalyzer {
    /// Create an analyzer, rejecting invalid configuration
    pub fn new(config: AnalyzerConfig) -> Result<Self, VisionError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Apply the mirroring flag
    pub fn prepare(&self, frame: RgbImage) -> RgbImage {
        if self.config.mirror {
            imageops::flip_horizontal(&frame)
        } else {
            frame
        }
    }

    /// Run every stage on a prepared frame
    pub fn analyze<R: Rng + ?Sized>(&self, frame: &RgbImage, rng: &mut R) -> FrameAnalysis {
        let hsv = to_hsv(frame);
        let raw_mask = segment(&hsv, &self.config.color_band);
        let mask = clean(&raw_mask, &self.config.morphology);

        let outcome = match locate(&mask) {
            Some(region) => self.evaluate_region(&hsv, region, rng),
            None => {
                debug!("No region in mask");
                FrameOutcome::Searching
            }
        };

        FrameAnalysis { outcome, mask }
    }

    /// Sample a located region's hue from the HSV projection, then evaluate it
    pub fn evaluate_region<R: Rng + ?Sized>(
        &self,
        hsv: &HsvFrame,
        region: BoundingRegion,
        rng: &mut R,
    ) -> FrameOutcome {
        self.evaluate(region, average_hue(hsv, &region), rng)
    }

    /// Apply the geometric filter, then classify and simulate a reading
    pub fn evaluate<R: Rng + ?Sized>(
        &self,
        region: BoundingRegion,
        hue: i32,
        rng: &mut R,
    ) -> FrameOutcome {
        if !self.config.geometry.accepts(&region) {
            debug!(
                "Region rejected (area={:.0}, ratio={:.2})",
                region.area,
                region.elongation_ratio()
            );
            return FrameOutcome::Searching;
        }

        let category = classify(hue, &self.config.hue_bands);
        let reading = simulate(category, &self.config.sensor_profiles, rng);
        debug!("Detected {:?} at hue {}", category, hue);

        FrameOutcome::Detected(Detection {
            region,
            hue,
            category,
            reading,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn region(width: u32, height: u32, area: f64) -> BoundingRegion {
        BoundingRegion { x: 0, y: 0, width, height, area }
    }

    fn analyzer() -> FrameAnalyzer {
        FrameAnalyzer::new(AnalyzerConfig::default()).unwrap()
    }

    #[test]
    fn test_scenario_optimally_ripe() {
        let mut rng = StdRng::seed_from_u64(11);
        let outcome = analyzer().evaluate(region(100, 50, 6000.0), 30, &mut rng);
        let detection = outcome.detection().unwrap();
        assert_eq!(detection.category, RipenessCategory::OptimallyRipe);
        assert!((450.0..=600.0).contains(&detection.reading.co2_ppm));
        assert!((5.3..=6.2).contains(&detection.reading.ph));
        assert!((80.0..=85.0).contains(&detection.reading.humidity_pct));
    }

    #[test]
    fn test_scenario_small_area_searching() {
        let mut rng = StdRng::seed_from_u64(11);
        for hue in [0, 30, 60, 120] {
            let outcome = analyzer().evaluate(region(200, 20, 4000.0), hue, &mut rng);
            assert_eq!(outcome, FrameOutcome::Searching);
        }
    }

    #[test]
    fn test_scenario_square_searching() {
        let mut rng = StdRng::seed_from_u64(11);
        let outcome = analyzer().evaluate(region(120, 100, 8000.0), 30, &mut rng);
        assert_eq!(outcome, FrameOutcome::Searching);
    }

    #[test]
    fn test_scenario_unclassified_zero_reading() {
        let mut rng = StdRng::seed_from_u64(11);
        let outcome = analyzer().evaluate(region(300, 100, 10000.0), 90, &mut rng);
        let detection = outcome.detection().unwrap();
        assert_eq!(detection.category, RipenessCategory::Unclassified);
        assert_eq!(detection.reading, SensorReading::zero());
    }

    #[test]
    fn test_evaluate_region_filters_and_samples_hue() {
        let mut rng = StdRng::seed_from_u64(11);
        let hsv = to_hsv(&RgbImage::from_pixel(300, 100, Rgb([255, 255, 0])));

        let rejected = analyzer().evaluate_region(&hsv, region(100, 100, 9801.0), &mut rng);
        assert_eq!(rejected, FrameOutcome::Searching);

        let accepted = analyzer().evaluate_region(&hsv, region(300, 100, 29601.0), &mut rng);
        let detection = accepted.detection().unwrap();
        assert_eq!(detection.hue, 30);
        assert_eq!(detection.category, RipenessCategory::OptimallyRipe);
    }

    #[test]
    fn test_analyze_left_edge_bar() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut frame = RgbImage::from_pixel(320, 240, Rgb([30, 30, 140]));
        for y in 100..160 {
            for x in 0..200 {
                frame.put_pixel(x, y, Rgb([240, 220, 20]));
            }
        }
        let analysis = analyzer().analyze(&frame, &mut rng);
        let detection = analysis.outcome.detection().copied().unwrap();
        assert_eq!((detection.region.x, detection.region.width), (0, 200));
    }

    #[test]
    fn test_analyze_blank_frame_searching() {
        let mut rng = StdRng::seed_from_u64(0);
        let frame = RgbImage::from_pixel(64, 48, Rgb([20, 20, 120]));
        let analysis = analyzer().analyze(&frame, &mut rng);
        assert_eq!(analysis.outcome, FrameOutcome::Searching);
        assert_eq!(analysis.mask.dimensions(), (64, 48));
    }

    #[test]
    fn test_analyze_yellow_bar() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut frame = RgbImage::from_pixel(320, 240, Rgb([30, 30, 140]));
        for y in 100..160 {
            for x in 40..260 {
                frame.put_pixel(x, y, Rgb([240, 220, 20]));
            }
        }
        let analysis = analyzer().analyze(&frame, &mut rng);
        let detection = analysis.outcome.detection().copied().unwrap();
        assert_eq!((detection.region.x, detection.region.y), (40, 100));
        assert_eq!((detection.region.width, detection.region.height), (220, 60));
        assert_eq!(detection.category, RipenessCategory::OptimallyRipe);
    }

    #[test]
    fn test_prepare_mirrors() {
        let mut frame = RgbImage::new(3, 1);
        frame.put_pixel(0, 0, Rgb([255, 0, 0]));
        let mirrored = analyzer().prepare(frame.clone());
        assert_eq!(mirrored.get_pixel(2, 0), &Rgb([255, 0, 0]));

        let mut config = AnalyzerConfig::default();
        config.mirror = false;
        let plain = FrameAnalyzer::new(config).unwrap().prepare(frame.clone());
        assert_eq!(plain, frame);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let mut config = AnalyzerConfig::default();
        config.geometry.min_ratio = -1.0;
        assert!(FrameAnalyzer::new(config).is_err());
    }

    #[test]
    fn test_report_json() {
        let report = FrameReport { frame_index: 3, outcome: FrameOutcome::Searching };
        let json = report.to_json().unwrap();
        assert!(json.contains("\"frame_index\":3"));
        assert!(json.contains("\"state\":\"searching\""));

        let mut rng = StdRng::seed_from_u64(5);
        let outcome = analyzer().evaluate(region(300, 100, 10000.0), 50, &mut rng);
        let json = FrameReport { frame_index: 4, outcome }.to_json().unwrap();
        assert!(json.contains("\"state\":\"detected\""));
        assert!(json.contains("\"category\":\"fresh\""));
    }
}
