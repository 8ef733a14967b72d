//! Frame sources

use crate::error::VisionError;
use image::RgbImage;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Anything that yields frames on demand
pub trait FrameSource {
    /// Next frame, or `None` once the stream is exhausted
    fn acquire(&mut self) -> Result<Option<RgbImage>, VisionError>;

    /// Release the underlying device; called once when the session ends
    fn release(&mut self) {}
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn acquire(&mut self) -> Result<Option<RgbImage>, VisionError> {
        (**self).acquire()
    }

    fn release(&mut self) {
        (**self).release()
    }
}

/// In-memory queue of frames
#[derive(Debug, Default, Clone)]
pub struct FrameSequence {
    frames: VecDeque<RgbImage>,
}

impl FrameSequence {
    pub fn new(frames: impl IntoIterator<Item = RgbImage>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for FrameSequence {
    fn acquire(&mut self) -> Result<Option<RgbImage>, VisionError> {
        Ok(self.frames.pop_front())
    }

    fn release(&mut self) {
        self.frames.clear();
    }
}

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff", "webp"];

/// Image files from a directory, in file-name order
#[derive(Debug)]
pub struct ImageDirSource {
    dir: PathBuf,
    paths: VecDeque<PathBuf>,
}

impl ImageDirSource {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, VisionError> {
        let dir = dir.as_ref().to_path_buf();
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_file() && has_image_extension(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        info!("Opened {} frames from {}", paths.len(), dir.display());
        Ok(Self {
            dir,
            paths: paths.into(),
        })
    }

    pub fn remaining(&self) -> usize {
        self.paths.len()
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for ImageDirSource {
    fn acquire(&mut self) -> Result<Option<RgbImage>, VisionError> {
        let Some(path) = self.paths.pop_front() else {
            return Ok(None);
        };
        debug!("Reading frame {}", path.display());
        Ok(Some(image::open(&path)?.to_rgb8()))
    }

    fn release(&mut self) {
        self.paths.clear();
        debug!("Released frame directory {}", self.dir.display());
    }
}
