//! Contour extraction, region selection and the geometric filter

use crate::config::GeometryThresholds;
use image::GrayImage;
use imageproc::contours::find_contours;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Boundary polygon of one connected mask region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    pub points: Vec<(i32, i32)>,
}

impl Contour {
    pub fn new(points: Vec<(i32, i32)>) -> Self {
        Self { points }
    }

    /// Enclosed area by the shoelace formula, unsigned
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }

        let mut twice_area: i64 = 0;
        for i in 0..n {
            let (x1, y1) = self.points[i];
            let (x2, y2) = self.points[(i + 1) % n];
            twice_area += x1 as i64 * y2 as i64 - x2 as i64 * y1 as i64;
        }
        twice_area.abs() as f64 / 2.0
    }

    /// Smallest upright rectangle containing every point, as (x, y, width, height).
    ///
    /// Extents are inclusive, so a single point yields a 1x1 box.
    pub fn bounding_rect(&self) -> Option<(i32, i32, u32, u32)> {
        let (first_x, first_y) = *self.points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first_x, first_y, first_x, first_y);
        for &(x, y) in &self.points[1..] {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Some((
            min_x,
            min_y,
            (max_x - min_x) as u32 + 1,
            (max_y - min_y) as u32 + 1,
        ))
    }
}

/// Axis-aligned box around the selected contour
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    /// Area enclosed by the contour (not the box)
    pub area: f64,
}

impl BoundingRegion {
    /// Build a region from a contour; `None` for an empty contour
    pub fn from_contour(contour: &Contour) -> Option<Self> {
        let (x, y, width, height) = contour.bounding_rect()?;
        Some(Self {
            x,
            y,
            width,
            height,
            area: contour.area(),
        })
    }

    /// Longer side over shorter side
    pub fn elongation_ratio(&self) -> f64 {
        elongation_ratio(self.width, self.height)
    }
}

/// Longer side over shorter side, the divisor clamped to at least 1
pub fn elongation_ratio(width: u32, height: u32) -> f64 {
    let longer = width.max(height);
    let shorter = width.min(height).max(1);
    longer as f64 / shorter as f64
}

impl GeometryThresholds {
    /// Accept a region that is both large and elongated enough
    pub fn accepts(&self, region: &BoundingRegion) -> bool {
        self.accepts_shape(region.area, region.width, region.height)
    }

    /// `area > min_area` and `ratio >= min_ratio`
    pub fn accepts_shape(&self, area: f64, width: u32, height: u32) -> bool {
        area > self.min_area && elongation_ratio(width, height) >= self.min_ratio
    }
}

/// Outermost contours of a binary mask (holes and nested regions are skipped).
///
/// Only the parent link is checked: `find_contours` reports the outer border of a
/// region touching column 0 as a `Hole`, but it still has no parent.
pub fn external_contours(mask: &GrayImage) -> Vec<Contour> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| c.parent.is_none())
        .map(|c| Contour::new(c.points.into_iter().map(|p| (p.x, p.y)).collect()))
        .collect()
}

/// Pick the contour with the largest area; the first one wins ties
pub fn largest_contour(contours: Vec<Contour>) -> Option<Contour> {
    let mut best: Option<(f64, Contour)> = None;
    for contour in contours {
        let area = contour.area();
        match &best {
            Some((best_area, _)) if area <= *best_area => {}
            _ => best = Some((area, contour)),
        }
    }
    best.map(|(_, contour)| contour)
}

/// Locate the largest external region in a cleaned mask.
///
/// `None` means the mask has no region at all, which is a normal per-frame outcome.
pub fn locate(mask: &GrayImage) -> Option<BoundingRegion> {
    let contours = external_contours(mask);
    debug!("Found {} external contours", contours.len());
    largest_contour(contours).and_then(|c| BoundingRegion::from_contour(&c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn rect_contour(x: i32, y: i32, w: i32, h: i32) -> Contour {
        Contour::new(vec![(x, y), (x + w, y), (x + w, y + h), (x, y + h)])
    }

    fn filled_mask(width: u32, height: u32, rects: &[(u32, u32, u32, u32)]) -> GrayImage {
        let mut mask = GrayImage::new(width, height);
        for &(x0, y0, w, h) in rects {
            for y in y0..y0 + h {
                for x in x0..x0 + w {
                    mask.put_pixel(x, y, Luma([255]));
                }
            }
        }
        mask
    }

    #[test]
    fn test_contour_area_square() {
        assert_eq!(rect_contour(0, 0, 10, 10).area(), 100.0);
    }

    #[test]
    fn test_contour_area_orientation_independent() {
        let mut contour = rect_contour(2, 3, 7, 5);
        let forward = contour.area();
        contour.points.reverse();
        assert_eq!(contour.area(), forward);
        assert_eq!(forward, 35.0);
    }

    #[test]
    fn test_contour_area_triangle() {
        let contour = Contour::new(vec![(0, 0), (4, 0), (0, 3)]);
        assert_eq!(contour.area(), 6.0);
    }

    #[test]
    fn test_contour_area_degenerate() {
        assert_eq!(Contour::new(vec![]).area(), 0.0);
        assert_eq!(Contour::new(vec![(1, 1)]).area(), 0.0);
        assert_eq!(Contour::new(vec![(1, 1), (5, 1)]).area(), 0.0);
    }

    #[test]
    fn test_bounding_rect_inclusive() {
        assert_eq!(rect_contour(2, 3, 7, 5).bounding_rect(), Some((2, 3, 8, 6)));
        assert_eq!(Contour::new(vec![(4, 4)]).bounding_rect(), Some((4, 4, 1, 1)));
        assert_eq!(Contour::new(vec![]).bounding_rect(), None);
    }

    #[test]
    fn test_elongation_ratio() {
        assert_eq!(elongation_ratio(100, 50), 2.0);
        assert_eq!(elongation_ratio(50, 100), 2.0);
        assert_eq!(elongation_ratio(120, 100), 1.2);
    }

    #[test]
    fn test_elongation_ratio_degenerate() {
        assert_eq!(elongation_ratio(0, 0), 0.0);
        assert_eq!(elongation_ratio(10, 0), 10.0);
        assert_eq!(elongation_ratio(0, 7), 7.0);
    }

    #[test]
    fn test_filter_boundaries() {
        let thresholds = GeometryThresholds::default();
        // Area equal to the minimum is rejected
        assert!(!thresholds.accepts_shape(5000.0, 150, 100));
        assert!(thresholds.accepts_shape(5000.5, 150, 100));
        // Ratio equal to the minimum is accepted
        assert!(thresholds.accepts_shape(6000.0, 150, 100));
        assert!(!thresholds.accepts_shape(6000.0, 149, 100));
    }

    #[test]
    fn test_locate_blob_at_left_edge() {
        let mask = filled_mask(60, 40, &[(0, 10, 50, 20)]);
        let region = locate(&mask).unwrap();
        assert_eq!((region.x, region.y, region.width, region.height), (0, 10, 50, 20));
        assert_eq!(region.area, 49.0 * 19.0);
    }

    #[test]
    fn test_locate_blob_at_top_left_corner() {
        let mask = filled_mask(60, 40, &[(0, 0, 30, 12)]);
        let region = locate(&mask).unwrap();
        assert_eq!((region.x, region.y, region.width, region.height), (0, 0, 30, 12));
    }

    #[test]
    fn test_locate_full_mask() {
        let mask = filled_mask(30, 20, &[(0, 0, 30, 20)]);
        let region = locate(&mask).unwrap();
        assert_eq!((region.x, region.y, region.width, region.height), (0, 0, 30, 20));
    }

    #[test]
    fn test_locate_left_edge_blob_beats_smaller_interior_one() {
        let mask = filled_mask(100, 60, &[(0, 5, 40, 20), (60, 40, 10, 10)]);
        let region = locate(&mask).unwrap();
        assert_eq!((region.x, region.y), (0, 5));
    }

    #[test]
    fn test_locate_empty_mask() {
        let mask = GrayImage::new(20, 20);
        assert!(locate(&mask).is_none());
    }

    #[test]
    fn test_locate_picks_largest() {
        let mask = filled_mask(100, 100, &[(5, 5, 10, 10), (30, 40, 50, 20)]);
        let region = locate(&mask).unwrap();
        assert_eq!((region.x, region.y), (30, 40));
        assert_eq!((region.width, region.height), (50, 20));
        // Boundary polygon runs through pixel centres
        assert_eq!(region.area, 49.0 * 19.0);
    }

    #[test]
    fn test_locate_ignores_nested_region() {
        // Ring with an island inside its hole
        let mut mask = filled_mask(60, 60, &[(10, 10, 40, 40)]);
        for y in 15..45 {
            for x in 15..45 {
                mask.put_pixel(x, y, Luma([0]));
            }
        }
        for y in 25..35 {
            for x in 25..35 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        let contours = external_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].bounding_rect(), Some((10, 10, 40, 40)));
    }

    #[test]
    fn test_largest_contour_first_wins_ties() {
        let a = rect_contour(0, 0, 10, 10);
        let b = rect_contour(50, 50, 10, 10);
        let best = largest_contour(vec![a.clone(), b]).unwrap();
        assert_eq!(best, a);
    }
}
