//! Color-space segmentation and mask cleaning

use crate::config::{ColorBand, MorphologyConfig, MAX_HUE};
use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{dilate, erode};
use palette::{FromColor, Hsv, Srgb};
use tracing::trace;

/// Mask value for object pixels
pub const MASK_ON: u8 = 255;
/// Mask value for background pixels
pub const MASK_OFF: u8 = 0;

/// Frame whose three channels hold (H, S, V) instead of (R, G, B).
///
/// Hue is stored halved (0..=179) so it fits a byte; saturation and value use 0..=255.
pub type HsvFrame = ImageBuffer<Rgb<u8>, Vec<u8>>;

/// Convert one RGB pixel to 8-bit HSV
pub fn rgb_to_hsv(rgb: [u8; 3]) -> [u8; 3] {
    let [r, g, b] = rgb;
    let hsv: Hsv = Hsv::from_color(Srgb::new(r, g, b).into_format::<f32>());

    let degrees = hsv.hue.into_positive_degrees();
    let hue = ((degrees / 2.0).round() as u32 % (MAX_HUE as u32 + 1)) as u8;
    let saturation = (hsv.saturation * 255.0).round().clamp(0.0, 255.0) as u8;
    let value = (hsv.value * 255.0).round().clamp(0.0, 255.0) as u8;

    [hue, saturation, value]
}

/// Project a frame into HSV
pub fn to_hsv(frame: &RgbImage) -> HsvFrame {
    ImageBuffer::from_fn(frame.width(), frame.height(), |x, y| {
        Rgb(rgb_to_hsv(frame.get_pixel(x, y).0))
    })
}

/// Mark every pixel whose HSV value lies inside `band` (inclusive on all channels)
pub fn segment(hsv: &HsvFrame, band: &ColorBand) -> GrayImage {
    ImageBuffer::from_fn(hsv.width(), hsv.height(), |x, y| {
        if band.contains(hsv.get_pixel(x, y).0) {
            Luma([MASK_ON])
        } else {
            Luma([MASK_OFF])
        }
    })
}

/// Morphological opening: erosion first, then dilation.
///
/// `k` iterations with a 3x3 square element are a single pass at chessboard radius `k`.
pub fn clean(mask: &GrayImage, morphology: &MorphologyConfig) -> GrayImage {
    let eroded = match morphology.erode_iterations {
        0 => mask.clone(),
        k => erode(mask, Norm::LInf, k),
    };
    let opened = match morphology.dilate_iterations {
        0 => eroded,
        k => dilate(&eroded, Norm::LInf, k),
    };
    trace!(
        "Mask cleaned (erode={}, dilate={})",
        morphology.erode_iterations,
        morphology.dilate_iterations
    );
    opened
}

/// Count object pixels in a mask
pub fn foreground_pixels(mask: &GrayImage) -> usize {
    mask.pixels().filter(|p| p[0] != MASK_OFF).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_to_hsv_primaries() {
        assert_eq!(rgb_to_hsv([255, 0, 0]), [0, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 255, 0]), [60, 255, 255]);
        assert_eq!(rgb_to_hsv([0, 0, 255]), [120, 255, 255]);
        assert_eq!(rgb_to_hsv([255, 255, 0]), [30, 255, 255]);
    }

    #[test]
    fn test_rgb_to_hsv_gray_has_no_saturation() {
        let [_, s, v] = rgb_to_hsv([128, 128, 128]);
        assert_eq!(s, 0);
        assert_eq!(v, 128);
        assert_eq!(rgb_to_hsv([0, 0, 0]), [0, 0, 0]);
    }

    #[test]
    fn test_rgb_to_hsv_hue_stays_in_range() {
        // Just below 360 degrees must wrap rather than produce 180
        let [h, _, _] = rgb_to_hsv([255, 0, 1]);
        assert!(h <= MAX_HUE);
    }

    #[test]
    fn test_segment_marks_band() {
        let mut frame = RgbImage::from_pixel(4, 4, Rgb([0, 0, 255]));
        frame.put_pixel(1, 1, Rgb([255, 255, 0]));
        frame.put_pixel(2, 2, Rgb([0, 200, 0]));

        let mask = segment(&to_hsv(&frame), &ColorBand::default());
        assert_eq!(mask.get_pixel(1, 1)[0], MASK_ON);
        assert_eq!(mask.get_pixel(2, 2)[0], MASK_ON);
        assert_eq!(mask.get_pixel(0, 0)[0], MASK_OFF);
        assert_eq!(foreground_pixels(&mask), 2);
    }

    #[test]
    fn test_segment_rejects_dark_pixels() {
        // Yellow hue but value below the band
        let frame = RgbImage::from_pixel(2, 2, Rgb([30, 30, 0]));
        let mask = segment(&to_hsv(&frame), &ColorBand::default());
        assert_eq!(foreground_pixels(&mask), 0);
    }

    #[test]
    fn test_clean_removes_speckle() {
        let mut mask = GrayImage::new(40, 40);
        mask.put_pixel(3, 3, Luma([MASK_ON]));
        mask.put_pixel(30, 5, Luma([MASK_ON]));
        let cleaned = clean(&mask, &MorphologyConfig::default());
        assert_eq!(foreground_pixels(&cleaned), 0);
    }

    #[test]
    fn test_clean_preserves_large_blob() {
        let mut mask = GrayImage::new(60, 60);
        for y in 10..50 {
            for x in 15..45 {
                mask.put_pixel(x, y, Luma([MASK_ON]));
            }
        }
        let cleaned = clean(&mask, &MorphologyConfig::default());
        assert_eq!(foreground_pixels(&cleaned), 40 * 30);
        assert_eq!(cleaned.get_pixel(15, 10)[0], MASK_ON);
        assert_eq!(cleaned.get_pixel(14, 10)[0], MASK_OFF);
    }

    #[test]
    fn test_clean_zero_iterations_is_identity() {
        let mut mask = GrayImage::new(10, 10);
        mask.put_pixel(5, 5, Luma([MASK_ON]));
        let config = MorphologyConfig {
            erode_iterations: 0,
            dilate_iterations: 0,
        };
        assert_eq!(clean(&mask, &config), mask);
    }
}
