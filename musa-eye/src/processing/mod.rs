//! Per-frame analysis stages

pub mod region;
pub mod ripeness;
pub mod segmentation;
pub mod sensor;

pub use region::{locate, BoundingRegion, Contour};
pub use ripeness::{average_hue, classify, HueBand, RipenessCategory};
pub use segmentation::{clean, segment, to_hsv, HsvFrame};
pub use sensor::{simulate, SensorProfiles, SensorRange, SensorRanges, SensorReading};
