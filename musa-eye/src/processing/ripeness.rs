//! Hue-based ripeness classification

use crate::processing::region::BoundingRegion;
use crate::processing::segmentation::HsvFrame;
use image::GenericImageView;
use serde::{Deserialize, Serialize};

/// Discrete ripeness stage inferred from hue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RipenessCategory {
    /// Pre-climacteric, still green
    Fresh,
    /// Climacteric peak, ready to eat
    OptimallyRipe,
    /// Senescence
    Overripe,
    /// Hue outside every known band
    Unclassified,
}

impl RipenessCategory {
    pub fn status(&self) -> &'static str {
        match self {
            RipenessCategory::Fresh => "Segar",
            RipenessCategory::OptimallyRipe => "Matang Optimal",
            RipenessCategory::Overripe => "Mulai Busuk",
            RipenessCategory::Unclassified => "Tidak Terkelompok",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RipenessCategory::Fresh => "Belum Matang",
            RipenessCategory::OptimallyRipe => "Siap Makan",
            RipenessCategory::Overripe => "Terlalu Matang",
            RipenessCategory::Unclassified => "Unknown",
        }
    }

    /// (status, description)
    pub fn labels(&self) -> (&'static str, &'static str) {
        (self.status(), self.description())
    }
}

/// Inclusive hue interval mapped to a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HueBand {
    pub min: i32,
    pub max: i32,
    pub category: RipenessCategory,
}

impl HueBand {
    pub const fn new(min: i32, max: i32, category: RipenessCategory) -> Self {
        Self { min, max, category }
    }

    pub fn contains(&self, hue: i32) -> bool {
        self.min <= hue && hue <= self.max
    }
}

/// Stock table, in evaluation order
pub fn default_hue_bands() -> Vec<HueBand> {
    vec![
        HueBand::new(40, 80, RipenessCategory::Fresh),
        HueBand::new(25, 39, RipenessCategory::OptimallyRipe),
        HueBand::new(0, 24, RipenessCategory::Overripe),
    ]
}

/// Map a hue to the first band containing it, Unclassified otherwise
pub fn classify(hue: i32, bands: &[HueBand]) -> RipenessCategory {
    bands
        .iter()
        .find(|band| band.contains(hue))
        .map(|band| band.category)
        .unwrap_or(RipenessCategory::Unclassified)
}

/// Mean hue over the region's box, truncated to an integer.
///
/// The box is clipped to the frame; an empty intersection yields 0.
pub fn average_hue(hsv: &HsvFrame, region: &BoundingRegion) -> i32 {
    let x0 = region.x.max(0) as u32;
    let y0 = region.y.max(0) as u32;
    if x0 >= hsv.width() || y0 >= hsv.height() {
        return 0;
    }
    let x_end = (region.x as i64 + region.width as i64).clamp(0, hsv.width() as i64) as u32;
    let y_end = (region.y as i64 + region.height as i64).clamp(0, hsv.height() as i64) as u32;
    if x_end <= x0 || y_end <= y0 {
        return 0;
    }

    let view = hsv.view(x0, y0, x_end - x0, y_end - y0);
    let (sum, count) = view
        .pixels()
        .fold((0u64, 0u64), |(sum, count), (_, _, p)| (sum + p[0] as u64, count + 1));

    (sum / count) as i32
}
