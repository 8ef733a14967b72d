//! USB webcam capture

use crate::config::CameraConfig;
use crate::error::VisionError;
use crate::source::FrameSource;
use crate::utils::mat_to_rgb_image;
use image::RgbImage;
use opencv::{
    core::Mat,
    prelude::*,
    videoio::{VideoCapture, CAP_ANY, CAP_PROP_FPS, CAP_PROP_FRAME_HEIGHT, CAP_PROP_FRAME_WIDTH},
};
use tracing::{info, warn};

/// Frame source backed by an OpenCV `VideoCapture`
pub struct CameraSource {
    config: CameraConfig,
    capture: Option<VideoCapture>,
}

impl CameraSource {
    /// Open and configure the camera
    pub fn open(config: CameraConfig) -> Result<Self, VisionError> {
        let mut capture = VideoCapture::new(config.camera_id as i32, CAP_ANY)
            .map_err(|e| VisionError::Camera(format!("Failed to open camera {}: {}", config.camera_id, e)))?;

        if !capture.is_opened()
            .map_err(|e| VisionError::Camera(format!("Camera {} not opened: {}", config.camera_id, e)))? {
            return Err(VisionError::Camera(format!("Camera {} failed to open", config.camera_id)));
        }

        let width = config.resolution.0 as f64;
        let height = config.resolution.1 as f64;
        let fps = config.frame_rate as f64;

        if width <= 0.0 || height <= 0.0 || fps <= 0.0 {
            return Err(VisionError::Camera("Invalid camera resolution or frame rate".to_string()));
        }

        // Drivers may ignore these; the frames carry their real size
        capture.set(CAP_PROP_FRAME_WIDTH, width)
            .map_err(|e| VisionError::Camera(format!("Failed to set width: {}", e)))?;
        capture.set(CAP_PROP_FRAME_HEIGHT, height)
            .map_err(|e| VisionError::Camera(format!("Failed to set height: {}", e)))?;
        capture.set(CAP_PROP_FPS, fps)
            .map_err(|e| VisionError::Camera(format!("Failed to set FPS: {}", e)))?;

        info!("Camera {} initialized at {}x{} @ {}fps",
            config.camera_id,
            config.resolution.0,
            config.resolution.1,
            config.frame_rate);

        Ok(Self {
            config,
            capture: Some(capture),
        })
    }

    /// Check if the device is still held
    pub fn is_open(&self) -> bool {
        self.capture.is_some()
    }
}

impl FrameSource for CameraSource {
    fn acquire(&mut self) -> Result<Option<RgbImage>, VisionError> {
        let Some(capture) = self.capture.as_mut() else {
            return Ok(None);
        };

        let mut frame = Mat::default();
        let grabbed = capture.read(&mut frame)
            .map_err(|e| VisionError::Camera(format!("Failed to read frame: {}", e)))?;

        if !grabbed || frame.empty() {
            warn!("Camera {} returned no frame", self.config.camera_id);
            return Ok(None);
        }

        mat_to_rgb_image(&frame).map(Some)
    }

    fn release(&mut self) {
        if let Some(mut capture) = self.capture.take() {
            if let Err(e) = capture.release() {
                warn!("Failed to release camera {}: {}", self.config.camera_id, e);
            }
            info!("Camera {} released", self.config.camera_id);
        }
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        self.release();
    }
}
