//! Property inspection command-line tool.
//!
//! Analyzes one or more images, either as an unordered image set or as the
//! ordered frames of a video, and prints the scan report as JSON.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use image::RgbImage;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use safenest_models::{BuildingAge, Climate, Detection, Sensitivity, UserContext};
use safenest_vision::{
    load_image, sample_interval, save_annotated, DetectionFlags, InspectionConfig, ScanSession,
};

#[derive(Parser, Debug)]
#[command(
    name = "safenest-inspect",
    about = "Detect structural defects in property photos and score the risk",
    version
)]
struct Args {
    /// Image files to inspect
    #[arg(required = true, value_name = "IMAGE")]
    paths: Vec<PathBuf>,

    /// Detector sensitivity (low|medium|high)
    #[arg(long, value_name = "LEVEL")]
    sensitivity: Option<String>,

    /// Climate zone (hot_humid|cold_dry|coastal|temperate)
    #[arg(long, value_name = "ZONE")]
    climate: Option<String>,

    /// Construction era (pre_1950|pre_1970|1970_1990|1990_2010|post_2010)
    #[arg(long, value_name = "ERA")]
    building_age: Option<String>,

    /// Treat inputs as ordered video frames and track defects across them
    #[arg(long)]
    frames: bool,

    /// Frame rate of the source sequence when using --frames
    #[arg(long, default_value_t = 30.0)]
    fps: f64,

    /// Frames per second to sample from the sequence
    #[arg(long)]
    target_fps: Option<f64>,

    /// Tracker IoU match threshold
    #[arg(long)]
    iou_threshold: Option<f64>,

    /// Frames a track may go unmatched before it stops matching
    #[arg(long)]
    max_dropout: Option<u64>,

    /// Write a copy of every analyzed image with detection boxes here
    #[arg(long, value_name = "DIR")]
    annotate_dir: Option<PathBuf>,

    /// Skip crack detection
    #[arg(long)]
    no_cracks: bool,

    /// Skip mold detection
    #[arg(long)]
    no_mold: bool,

    /// Skip rust detection
    #[arg(long)]
    no_rust: bool,

    /// Skip water damage detection
    #[arg(long)]
    no_water_damage: bool,

    /// Pretty-print the JSON report
    #[arg(long)]
    pretty: bool,
}

impl Args {
    fn flags(&self) -> DetectionFlags {
        DetectionFlags {
            detect_cracks: !self.no_cracks,
            detect_water_damage: !self.no_water_damage,
            detect_mold: !self.no_mold,
            detect_rust: !self.no_rust,
        }
    }

    /// Environment config with command-line overrides applied.
    fn config(&self) -> Result<InspectionConfig> {
        let mut config = InspectionConfig::from_env();

        if let Some(raw) = &self.sensitivity {
            config.detector.sensitivity = raw.parse::<Sensitivity>()?;
        }
        if let Some(target_fps) = self.target_fps {
            config.target_fps = target_fps;
        }
        if let Some(iou) = self.iou_threshold {
            config.tracker.iou_threshold = iou;
        }
        if let Some(max_dropout) = self.max_dropout {
            config.tracker.max_dropout = max_dropout;
        }

        config.validate().context("Invalid inspection configuration")?;
        Ok(config)
    }

    fn user_context(&self) -> Option<UserContext> {
        if self.climate.is_none() && self.building_age.is_none() {
            return None;
        }

        let climate = self.climate.as_deref().map(Climate::from_key);
        if climate == Some(Climate::Unknown) {
            warn!("Unknown climate zone, no climate adjustment applied");
        }
        let building_age = self.building_age.as_deref().map(BuildingAge::from_key);
        if building_age == Some(BuildingAge::Unknown) {
            warn!("Unknown building age, no age penalty applied");
        }

        Some(UserContext::new(building_age, climate))
    }
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("safenest_vision=info,safenest_inspect=info,warn"));

    // Logs go to stderr so stdout carries only the report
    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    let config = args.config()?;
    info!(
        sensitivity = %config.detector.sensitivity,
        images = args.paths.len(),
        frames = args.frames,
        "Starting safenest-inspect"
    );

    if let Some(dir) = &args.annotate_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let mut session =
        ScanSession::from_config(&config, args.user_context()).with_flags(args.flags());

    if args.frames {
        let interval = sample_interval(args.fps, config.target_fps);
        info!(interval, "Sampling frame sequence");

        for (frame_idx, path) in args.paths.iter().enumerate() {
            if frame_idx % interval != 0 {
                continue;
            }
            let image = open(path)?;
            let frame = session
                .process_frame(&image, Some(frame_idx as u64))
                .with_context(|| format!("Failed to analyze {}", path.display()))?;
            annotate(&args, path, &image, &frame.detections)?;
        }
    } else {
        let images = args
            .paths
            .iter()
            .map(|path| open(path))
            .collect::<Result<Vec<_>>>()?;
        let frames = session
            .analyze_batch(&images, None)
            .context("Failed to analyze images")?;

        for ((path, image), frame) in args.paths.iter().zip(&images).zip(&frames) {
            annotate(&args, path, image, &frame.detections)?;
        }
    }

    let report = session.finish();
    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", json);

    Ok(())
}

fn open(path: &Path) -> Result<RgbImage> {
    load_image(path).with_context(|| format!("Failed to load {}", path.display()))
}

fn annotate(args: &Args, path: &Path, image: &RgbImage, detections: &[Detection]) -> Result<()> {
    let Some(dir) = &args.annotate_dir else {
        return Ok(());
    };
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let out = dir.join(format!("{}_annotated.png", stem));
    save_annotated(image, detections, &out)
        .with_context(|| format!("Failed to write {}", out.display()))
}
