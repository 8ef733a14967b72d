//! musa-eye: banana ripeness analysis for live video
//!
//! Locates an elongated yellow/green object by color and shape, estimates its
//! ripeness from hue, and simulates biosensor readings (CO2, pH, humidity)
//! consistent with that ripeness stage.
//!
//! Camera capture and window output live behind the `camera` feature (OpenCV);
//! the analysis pipeline itself is pure Rust.

pub mod config;
pub mod error;
pub mod overlay;
pub mod pipeline;
pub mod processing;
pub mod session;
pub mod sink;
pub mod source;

#[cfg(feature = "camera")]
pub mod camera;
#[cfg(feature = "camera")]
pub mod window;
#[cfg(feature = "camera")]
mod utils;

pub use config::AnalyzerConfig;
pub use error::VisionError;
pub use overlay::Overlay;
pub use pipeline::{Detection, FrameAnalyzer, FrameOutcome, FrameReport};
pub use processing::{RipenessCategory, SensorReading};
pub use session::{AnalyzerSession, CycleStatus};
pub use sink::{DisplaySink, LogSink};
pub use source::{FrameSequence, FrameSource, ImageDirSource};

#[cfg(feature = "camera")]
pub use camera::CameraSource;
#[cfg(feature = "camera")]
pub use window::WindowSink;
