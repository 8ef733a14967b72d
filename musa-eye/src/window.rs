//! On-screen display through an OpenCV highgui window

use crate::error::VisionError;
use crate::overlay::Overlay;
use crate::sink::DisplaySink;
use crate::utils::{gray_image_to_mat, rgb_image_to_mat};
use image::{GrayImage, RgbImage};
use opencv::{
    core::{Point, Scalar},
    highgui,
    imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8},
};
use tracing::{info, warn};

const ESC_KEY: i32 = 27;
const MASK_WINDOW: &str = "Mask";

/// Window sink; ESC requests exit
pub struct WindowSink {
    title: String,
    poll_interval_ms: i32,
}

impl WindowSink {
    pub fn open(title: impl Into<String>, poll_interval_ms: u32) -> Result<Self, VisionError> {
        let title = title.into();
        highgui::named_window(&title, highgui::WINDOW_AUTOSIZE)
            .map_err(|e| VisionError::Display(format!("Failed to open window: {}", e)))?;
        info!("Opened window \"{}\"", title);
        Ok(Self {
            title,
            poll_interval_ms: poll_interval_ms.max(1) as i32,
        })
    }
}

impl DisplaySink for WindowSink {
    fn present(&mut self, frame: &RgbImage, overlay: &Overlay) -> Result<(), VisionError> {
        let mut mat = rgb_image_to_mat(&overlay.render(frame))?;

        for text in &overlay.texts {
            let [r, g, b] = text.color.0;
            imgproc::put_text(
                &mut mat,
                &text.text,
                Point::new(text.origin.0, text.origin.1),
                FONT_HERSHEY_SIMPLEX,
                text.scale,
                Scalar::new(b as f64, g as f64, r as f64, 0.0),
                text.thickness,
                LINE_8,
                false,
            )?;
        }

        highgui::imshow(&self.title, &mat)
            .map_err(|e| VisionError::Display(format!("Failed to show frame: {}", e)))?;
        Ok(())
    }

    fn present_mask(&mut self, mask: &GrayImage) -> Result<(), VisionError> {
        let mat = gray_image_to_mat(mask)?;
        highgui::imshow(MASK_WINDOW, &mat)
            .map_err(|e| VisionError::Display(format!("Failed to show mask: {}", e)))?;
        Ok(())
    }

    fn poll_exit(&mut self) -> Result<bool, VisionError> {
        let key = highgui::wait_key(self.poll_interval_ms)?;
        Ok(key >= 0 && key & 0xFF == ESC_KEY)
    }
}

impl Drop for WindowSink {
    fn drop(&mut self) {
        if let Err(e) = highgui::destroy_all_windows() {
            warn!("Failed to close windows: {}", e);
        }
    }
}
