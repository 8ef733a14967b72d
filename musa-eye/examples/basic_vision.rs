//! Basic example of using musa-eye
//!
//! Feeds a few synthetic frames through a session and prints each report.

use image::{Rgb, RgbImage};
use musa_eye::session::CycleStatus;
use musa_eye::{AnalyzerConfig, AnalyzerSession, FrameSequence, LogSink};

fn frame_with_bar(color: Rgb<u8>) -> RgbImage {
    let mut frame = RgbImage::from_pixel(640, 480, Rgb([40, 40, 160]));
    for y in 200..280 {
        for x in 120..520 {
            frame.put_pixel(x, y, color);
        }
    }
    frame
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let frames = vec![
        frame_with_bar(Rgb([150, 230, 40])),  // green, fresh
        frame_with_bar(Rgb([240, 220, 20])),  // yellow, ripe
        frame_with_bar(Rgb([200, 110, 40])),  // brown, overripe
        RgbImage::from_pixel(640, 480, Rgb([40, 40, 160])),
    ];

    let config = AnalyzerConfig::default();
    let mut session = AnalyzerSession::new(config, FrameSequence::new(frames), LogSink::new())?;

    loop {
        match session.run_once()? {
            CycleStatus::Processed { report, .. } => match report.outcome.detection() {
                Some(detection) => println!(
                    "frame {}: {} (hue {}), CO2 {:.1} ppm, pH {:.2}, humidity {:.1}%",
                    report.frame_index,
                    detection.status(),
                    detection.hue,
                    detection.reading.co2_ppm,
                    detection.reading.ph,
                    detection.reading.humidity_pct
                ),
                None => println!("frame {}: searching", report.frame_index),
            },
            CycleStatus::EndOfStream => break,
        }
    }

    session.close();
    Ok(())
}
