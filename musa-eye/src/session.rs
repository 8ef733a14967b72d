//! Capture → analyze → present loop

use crate::config::AnalyzerConfig;
use crate::error::VisionError;
use crate::overlay::Overlay;
use crate::pipeline::{FrameAnalyzer, FrameReport};
use crate::sink::DisplaySink;
use crate::source::FrameSource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

/// What one cycle did
#[derive(Debug, Clone)]
pub enum CycleStatus {
    /// A frame was analyzed and presented
    Processed {
        report: FrameReport,
        /// The sink asked to stop after this frame
        exit_requested: bool,
    },
    /// The source has no more frames
    EndOfStream,
}

impl CycleStatus {
    /// True when the loop should not run another cycle
    pub fn is_final(&self) -> bool {
        match self {
            CycleStatus::Processed { exit_requested, .. } => *exit_requested,
            CycleStatus::EndOfStream => true,
        }
    }
}

/// Owns the frame source for its whole lifetime and releases it exactly once
pub struct AnalyzerSession<S: FrameSource, D: DisplaySink, R: Rng = StdRng> {
    analyzer: FrameAnalyzer,
    source: Option<S>,
    sink: D,
    rng: R,
    frame_index: u64,
}

impl<S: FrameSource, D: DisplaySink> AnalyzerSession<S, D, StdRng> {
    /// Create a session seeded from OS entropy
    pub fn new(config: AnalyzerConfig, source: S, sink: D) -> Result<Self, VisionError> {
        Self::with_rng(config, source, sink, StdRng::from_entropy())
    }
}

impl<S: FrameSource, D: DisplaySink, R: Rng> AnalyzerSession<S, D, R> {
    /// Create a session with an explicit random source
    pub fn with_rng(config: AnalyzerConfig, source: S, sink: D, rng: R) -> Result<Self, VisionError> {
        let analyzer = FrameAnalyzer::new(config)?;
        Ok(Self {
            analyzer,
            source: Some(source),
            sink,
            rng,
            frame_index: 0,
        })
    }

    pub fn analyzer(&self) -> &FrameAnalyzer {
        &self.analyzer
    }

    pub fn sink(&self) -> &D {
        &self.sink
    }

    /// Frames processed so far
    pub fn frames_processed(&self) -> u64 {
        self.frame_index
    }

    /// Acquire one frame, analyze it, present it and poll for exit
    pub fn run_once(&mut self) -> Result<CycleStatus, VisionError> {
        let source = self
            .source
            .as_mut()
            .ok_or_else(|| VisionError::Camera("Frame source already released".to_string()))?;

        let Some(frame) = source.acquire()? else {
            info!("Frame source exhausted after {} frames", self.frame_index);
            return Ok(CycleStatus::EndOfStream);
        };

        let frame = self.analyzer.prepare(frame);
        let analysis = self.analyzer.analyze(&frame, &mut self.rng);
        let overlay = Overlay::for_outcome(&analysis.outcome);

        if self.analyzer.config().show_mask {
            self.sink.present_mask(&analysis.mask)?;
        }
        self.sink.present(&frame, &overlay)?;
        let exit_requested = self.sink.poll_exit()?;

        let report = FrameReport {
            frame_index: self.frame_index,
            outcome: analysis.outcome,
        };
        self.frame_index += 1;

        if exit_requested {
            info!("Exit requested after frame {}", report.frame_index);
        } else {
            debug!("Frame {} processed", report.frame_index);
        }

        Ok(CycleStatus::Processed {
            report,
            exit_requested,
        })
    }

    /// Cycle until the stream ends or the sink requests exit; returns frames processed
    pub fn run(&mut self) -> Result<u64, VisionError> {
        loop {
            if self.run_once()?.is_final() {
                return Ok(self.frame_index);
            }
        }
    }

    /// Release the frame source
    pub fn close(mut self) {
        self.release_source();
    }

    fn release_source(&mut self) {
        if let Some(mut source) = self.source.take() {
            source.release();
            info!("Frame source released");
        }
    }
}

impl<S: FrameSource, D: DisplaySink, R: Rng> Drop for AnalyzerSession<S, D, R> {
    fn drop(&mut self) {
        self.release_source();
    }
}
