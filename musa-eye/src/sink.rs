//! Display sinks

use crate::error::VisionError;
use crate::overlay::Overlay;
use image::{GrayImage, RgbImage};
use std::path::PathBuf;
use tracing::{debug, info};

/// Receives annotated frames and reports whether the user asked to stop
pub trait DisplaySink {
    /// Show one frame with its overlay
    fn present(&mut self, frame: &RgbImage, overlay: &Overlay) -> Result<(), VisionError>;

    /// Show the cleaned mask; ignored unless the sink supports it
    fn present_mask(&mut self, _mask: &GrayImage) -> Result<(), VisionError> {
        Ok(())
    }

    /// True when an exit was requested during the last presentation interval
    fn poll_exit(&mut self) -> Result<bool, VisionError>;
}

impl<D: DisplaySink + ?Sized> DisplaySink for Box<D> {
    fn present(&mut self, frame: &RgbImage, overlay: &Overlay) -> Result<(), VisionError> {
        (**self).present(frame, overlay)
    }

    fn present_mask(&mut self, mask: &GrayImage) -> Result<(), VisionError> {
        (**self).present_mask(mask)
    }

    fn poll_exit(&mut self) -> Result<bool, VisionError> {
        (**self).poll_exit()
    }
}

/// Headless sink: logs overlay text and optionally writes annotated PNGs.
///
/// The PNGs carry the box and panel only; text goes to the log. A searching frame
/// is therefore written unchanged, and its "Mencari Pisang..." line appears only in
/// the log.
#[derive(Debug, Default)]
pub struct LogSink {
    output_dir: Option<PathBuf>,
    frame_limit: Option<u64>,
    presented: u64,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `frame_NNNNNN.png` (and `mask_NNNNNN.png`) into `dir`
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Result<Self, VisionError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        self.output_dir = Some(dir);
        Ok(self)
    }

    /// Request exit once this many frames have been presented
    pub fn with_frame_limit(mut self, limit: u64) -> Self {
        self.frame_limit = Some(limit);
        self
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl DisplaySink for LogSink {
    fn present(&mut self, frame: &RgbImage, overlay: &Overlay) -> Result<(), VisionError> {
        info!("[frame {}] {}", self.presented, overlay.summary());

        if let Some(dir) = &self.output_dir {
            let path = dir.join(format!("frame_{:06}.png", self.presented));
            overlay.render(frame).save(&path)?;
            debug!("Wrote {}", path.display());
        }

        self.presented += 1;
        Ok(())
    }

    fn present_mask(&mut self, mask: &GrayImage) -> Result<(), VisionError> {
        if let Some(dir) = &self.output_dir {
            let path = dir.join(format!("mask_{:06}.png", self.presented));
            mask.save(&path)?;
        }
        Ok(())
    }

    fn poll_exit(&mut self) -> Result<bool, VisionError> {
        Ok(self.frame_limit.map_or(false, |limit| self.presented >= limit))
    }
}
