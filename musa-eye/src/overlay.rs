//! Presentation adapter: turns a frame outcome into overlay graphics and text

use crate::pipeline::FrameOutcome;
use crate::processing::{BoundingRegion, RipenessCategory};
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

pub const BOX_COLOR: Rgb<u8> = Rgb([255, 255, 0]);
pub const STATUS_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
pub const OPTIMAL_STATUS_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const SENSOR_COLOR: Rgb<u8> = Rgb([255, 255, 100]);
pub const SEARCHING_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

pub const SEARCHING_TEXT: &str = "Mencari Pisang...";

const BOX_THICKNESS: u32 = 2;
const PANEL_HEIGHT: i32 = 130;
const PANEL_EXTRA_WIDTH: u32 = 50;
const PANEL_ALPHA: f32 = 0.6;

/// One line of overlay text; `origin` is the baseline-left corner in frame pixels
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayText {
    pub text: String,
    pub origin: (i32, i32),
    pub color: Rgb<u8>,
    pub scale: f64,
    pub thickness: i32,
}

/// Darkened backdrop behind the text block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Panel {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    /// Weight of the black fill
    pub alpha: f32,
}

/// Everything drawn on top of a frame for one outcome
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Overlay {
    pub bounding_box: Option<BoundingRegion>,
    pub panel: Option<Panel>,
    pub texts: Vec<OverlayText>,
}

impl Overlay {
    pub fn for_outcome(outcome: &FrameOutcome) -> Self {
        let detection = match outcome {
            FrameOutcome::Searching => {
                return Self {
                    bounding_box: None,
                    panel: None,
                    texts: vec![OverlayText {
                        text: SEARCHING_TEXT.to_string(),
                        origin: (20, 50),
                        color: SEARCHING_COLOR,
                        scale: 0.8,
                        thickness: 2,
                    }],
                };
            }
            FrameOutcome::Detected(detection) => detection,
        };

        let region = detection.region;
        let (x, y) = (region.x, region.y);
        let status_color = if detection.category == RipenessCategory::OptimallyRipe {
            OPTIMAL_STATUS_COLOR
        } else {
            STATUS_COLOR
        };
        let reading = detection.reading;

        let sensor_line = |text: String, dy: i32| OverlayText {
            text,
            origin: (x + 5, y - dy),
            color: SENSOR_COLOR,
            scale: 0.5,
            thickness: 1,
        };

        Self {
            bounding_box: Some(region),
            panel: Some(Panel {
                x,
                y: y - PANEL_HEIGHT,
                width: region.width + PANEL_EXTRA_WIDTH,
                height: PANEL_HEIGHT as u32,
                alpha: PANEL_ALPHA,
            }),
            texts: vec![
                OverlayText {
                    text: format!("{} (Hue: {})", detection.status(), detection.hue),
                    origin: (x + 5, y - 105),
                    color: status_color,
                    scale: 0.6,
                    thickness: 2,
                },
                sensor_line(format!("Est. CO2 : {:.1} ppm", reading.co2_ppm), 80),
                sensor_line(format!("Est. pH  : {:.2}", reading.ph), 55),
                sensor_line(format!("Kelembaban: {:.1}%", reading.humidity_pct), 30),
            ],
        }
    }

    /// Text lines joined for logs
    pub fn summary(&self) -> String {
        self.texts
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" | ")
    }

    /// Draw the box and panel onto a copy of `frame`. Text is left to the sink.
    pub fn render(&self, frame: &RgbImage) -> RgbImage {
        let mut annotated = frame.clone();

        if let Some(region) = &self.bounding_box {
            draw_box(&mut annotated, region);
        }
        if let Some(panel) = &self.panel {
            darken(&mut annotated, panel);
        }

        annotated
    }
}

fn draw_box(image: &mut RgbImage, region: &BoundingRegion) {
    // Corners are inclusive, like the region extents
    for inset in 0..BOX_THICKNESS {
        let width = (region.width + 1).saturating_sub(2 * inset);
        let height = (region.height + 1).saturating_sub(2 * inset);
        if width == 0 || height == 0 {
            break;
        }
        let rect = Rect::at(region.x + inset as i32, region.y + inset as i32).of_size(width, height);
        draw_hollow_rect_mut(image, rect, BOX_COLOR);
    }
}

fn darken(image: &mut RgbImage, panel: &Panel) {
    let x0 = panel.x.max(0) as u32;
    let y0 = panel.y.max(0) as u32;
    let x1 = (panel.x as i64 + panel.width as i64).clamp(0, image.width() as i64) as u32;
    let y1 = (panel.y as i64 + panel.height as i64).clamp(0, image.height() as i64) as u32;
    let keep = 1.0 - panel.alpha.clamp(0.0, 1.0);

    for y in y0..y1 {
        for x in x0..x1 {
            let pixel = image.get_pixel_mut(x, y);
            for channel in pixel.0.iter_mut() {
                *channel = (*channel as f32 * keep).round() as u8;
            }
        }
    }
}
