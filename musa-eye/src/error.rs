//! Error types for musa-eye

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Camera error: {0}")]
    Camera(String),

    #[error("Display error: {0}")]
    Display(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("OpenCV error: {0}")]
    OpenCv(String),
}

impl From<toml::de::Error> for VisionError {
    fn from(err: toml::de::Error) -> Self {
        VisionError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for VisionError {
    fn from(err: toml::ser::Error) -> Self {
        VisionError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for VisionError {
    fn from(err: serde_json::Error) -> Self {
        VisionError::Serialization(err.to_string())
    }
}

#[cfg(feature = "camera")]
impl From<opencv::Error> for VisionError {
    fn from(err: opencv::Error) -> Self {
        VisionError::OpenCv(err.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vision_error_display() {
        let err = VisionError::Camera("Test error".to_string());
        assert!(err.to_string().contains("Camera error"));
        assert!(err.to_string().contains("Test error"));
    }

    #[test]
    fn test_vision_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let vision_err: VisionError = io_err.into();
        match vision_err {
            VisionError::Io(_) => {}
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_vision_error_from_toml() {
        let toml_err = toml::from_str::<toml::Value>("= broken").unwrap_err();
        let vision_err: VisionError = toml_err.into();
        match vision_err {
            VisionError::Config(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Config error"),
        }
    }

    #[test]
    fn test_all_error_variants() {
        let _ = VisionError::Camera("camera".to_string());
        let _ = VisionError::Display("display".to_string());
        let _ = VisionError::Config("config".to_string());
        let _ = VisionError::Serialization("serialization".to_string());
        let _ = VisionError::OpenCv("opencv".to_string());
    }
}
