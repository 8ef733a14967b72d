// Musa Command Line Interface
// Banana ripeness analysis from a camera, a frames directory or a single image

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use musa_eye::session::CycleStatus;
use musa_eye::{
    AnalyzerConfig, AnalyzerSession, DisplaySink, FrameAnalyzer, FrameReport, FrameSource,
    ImageDirSource, LogSink,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[cfg_attr(not(feature = "camera"), allow(dead_code))]
const WINDOW_TITLE: &str = "Smart Banana Analyzer + IoT Sensor Sim";

#[derive(Parser)]
#[command(name = "musa")]
#[command(about = "Banana ripeness analyzer with simulated biosensor readings", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the live analysis loop
    Run {
        /// Read frames from this directory instead of a camera
        #[arg(long)]
        frames_dir: Option<PathBuf>,

        /// Capture from the configured USB camera (needs the `camera` feature)
        #[arg(long, conflicts_with = "frames_dir")]
        camera: bool,

        /// Write annotated frames (and masks) here
        #[arg(long, short)]
        output_dir: Option<PathBuf>,

        /// Stop after this many frames
        #[arg(long)]
        frame_limit: Option<u64>,

        /// Configuration file path (TOML)
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Do not mirror frames horizontally
        #[arg(long)]
        no_mirror: bool,

        /// Also present the cleaned mask
        #[arg(long)]
        show_mask: bool,

        /// Seed for the sensor simulation
        #[arg(long)]
        seed: Option<u64>,

        /// Print one JSON report per frame on stdout
        #[arg(long)]
        json: bool,
    },

    /// Analyze a single image and print its JSON report
    Analyze {
        /// Image file
        image: PathBuf,

        /// Configuration file path (TOML)
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Do not mirror the image horizontally
        #[arg(long)]
        no_mirror: bool,

        /// Seed for the sensor simulation
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the default configuration as TOML
    Show,

    /// Load a configuration file and report whether it is valid
    Check {
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_json);

    match cli.command {
        Commands::Run {
            frames_dir,
            camera,
            output_dir,
            frame_limit,
            config,
            no_mirror,
            show_mask,
            seed,
            json,
        } => {
            let mut config = load_config(config.as_deref())?;
            apply_overrides(&mut config, no_mirror, show_mask);

            let source: Box<dyn FrameSource> = match frames_dir {
                Some(dir) => Box::new(
                    ImageDirSource::open(&dir)
                        .with_context(|| format!("Failed to open frames directory {}", dir.display()))?,
                ),
                None if camera => open_camera(&config)?,
                None => bail!("No frame source: pass --frames-dir or --camera"),
            };

            let sink = build_sink(&config, camera, output_dir, frame_limit)?;
            run_loop(config, source, sink, seed, json)?;
        }
        Commands::Analyze {
            image,
            config,
            no_mirror,
            seed,
        } => {
            let mut config = load_config(config.as_deref())?;
            apply_overrides(&mut config, no_mirror, false);
            let report = analyze_image(config, &image, seed)?;
            println!("{}", report.to_json()?);
        }
        Commands::Config(cmd) => handle_config_command(cmd)?,
    }

    Ok(())
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AnalyzerConfig> {
    match path {
        Some(path) => AnalyzerConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(AnalyzerConfig::default()),
    }
}

/// Command-line flags only switch settings on top of the loaded config
fn apply_overrides(config: &mut AnalyzerConfig, no_mirror: bool, show_mask: bool) {
    if no_mirror {
        config.mirror = false;
    }
    config.show_mask |= show_mask;
}

fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

#[cfg(feature = "camera")]
fn open_camera(config: &AnalyzerConfig) -> anyhow::Result<Box<dyn FrameSource>> {
    let source = musa_eye::CameraSource::open(config.camera)
        .with_context(|| format!("Failed to open camera {}", config.camera.camera_id))?;
    Ok(Box::new(source))
}

#[cfg(not(feature = "camera"))]
fn open_camera(_config: &AnalyzerConfig) -> anyhow::Result<Box<dyn FrameSource>> {
    bail!("Camera capture requires the `camera` feature")
}

#[cfg(feature = "camera")]
fn open_window(config: &AnalyzerConfig) -> anyhow::Result<Box<dyn DisplaySink>> {
    let window = musa_eye::WindowSink::open(WINDOW_TITLE, config.poll_interval_ms)?;
    Ok(Box::new(window))
}

#[cfg(not(feature = "camera"))]
fn open_window(_config: &AnalyzerConfig) -> anyhow::Result<Box<dyn DisplaySink>> {
    bail!("Window output requires the `camera` feature")
}

fn build_sink(
    config: &AnalyzerConfig,
    use_camera: bool,
    output_dir: Option<PathBuf>,
    frame_limit: Option<u64>,
) -> anyhow::Result<Box<dyn DisplaySink>> {
    // Live camera runs get a window unless output is being recorded
    if use_camera && output_dir.is_none() && frame_limit.is_none() {
        return open_window(config);
    }

    let mut sink = LogSink::new();
    if let Some(dir) = output_dir {
        sink = sink
            .with_output_dir(&dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }
    if let Some(limit) = frame_limit {
        sink = sink.with_frame_limit(limit);
    }
    Ok(Box::new(sink))
}

fn run_loop(
    config: AnalyzerConfig,
    source: Box<dyn FrameSource>,
    sink: Box<dyn DisplaySink>,
    seed: Option<u64>,
    json: bool,
) -> anyhow::Result<()> {
    let mut session = AnalyzerSession::with_rng(config, source, sink, rng_from(seed))?;

    loop {
        let status = session.run_once()?;
        if let CycleStatus::Processed { report, .. } = &status {
            if json {
                println!("{}", report.to_json()?);
            }
        }
        if status.is_final() {
            break;
        }
    }

    info!("Processed {} frames", session.frames_processed());
    session.close();
    Ok(())
}

fn analyze_image(config: AnalyzerConfig, path: &Path, seed: Option<u64>) -> anyhow::Result<FrameReport> {
    let analyzer = FrameAnalyzer::new(config)?;
    let frame = image::open(path)
        .with_context(|| format!("Failed to read image {}", path.display()))?
        .to_rgb8();
    let frame = analyzer.prepare(frame);
    let analysis = analyzer.analyze(&frame, &mut rng_from(seed));
    Ok(FrameReport {
        frame_index: 0,
        outcome: analysis.outcome,
    })
}

fn handle_config_command(cmd: ConfigCommands) -> anyhow::Result<()> {
    match cmd {
        ConfigCommands::Show => {
            print!("{}", AnalyzerConfig::default().to_toml_string()?);
        }
        ConfigCommands::Check { file } => {
            let config = load_config(Some(&file))?;
            println!(
                "{} is valid ({} hue bands, min area {}, min ratio {})",
                file.display(),
                config.hue_bands.len(),
                config.geometry.min_area,
                config.geometry.min_ratio
            );
        }
    }
    Ok(())
}
