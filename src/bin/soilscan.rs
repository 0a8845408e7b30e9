//! Soil color scanner command line
//!
//! # Usage
//!
//! ```bash
//! # Calibrate from a photo of the reference chart
//! soilscan calibrate chart.jpg
//!
//! # Classify a soil photo, optionally restricted to a region
//! soilscan classify soil.jpg --rect 0.25,0.25,0.5,0.5
//! soilscan classify soil.jpg --polygon "0.1,0.1;0.9,0.2;0.5,0.9"
//!
//! # Inspect or drop the stored calibration
//! soilscan status
//! soilscan reset
//! ```

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use flexi_logger::Logger;
use log::{error, info, warn};
use serde::Serialize;

use soil_colorscan::calibration::{CalibrationEngine, JsonFileStore};
use soil_colorscan::detection::{NormalizedRect, Point, Polygon, Selection};
use soil_colorscan::exif::{DeviceInfo, ExifExtractor};
use soil_colorscan::{image_loader, worker, AnalysisError, ColorClassifier, ScanConfig};

/// Calibrated soil color classification from photos
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Calibration store file
    #[arg(long, value_name = "FILE", default_value = "soilscan-calibration.json")]
    store: PathBuf,

    /// JSON configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Calibrate the camera from a photo of the reference chart
    Calibrate {
        /// Chart photo
        image: PathBuf,
    },
    /// Classify the soil color in a photo
    Classify {
        /// Soil photo
        image: PathBuf,

        /// Normalized sampling rectangle: x,y,width,height
        #[arg(long, value_parser = parse_rect, conflicts_with = "polygon")]
        rect: Option<NormalizedRect>,

        /// Normalized sampling polygon: x,y;x,y;x,y
        #[arg(long, value_parser = parse_polygon)]
        polygon: Option<Polygon>,
    },
    /// Show the current calibration
    Status,
    /// Drop the stored calibration
    Reset,
}

fn parse_numbers(s: &str, separator: char) -> Result<Vec<f64>, String> {
    s.split(separator)
        .map(|v| {
            v.trim()
                .parse::<f64>()
                .map_err(|e| format!("invalid number '{}': {e}", v.trim()))
        })
        .collect()
}

fn parse_rect(s: &str) -> Result<NormalizedRect, String> {
    match parse_numbers(s, ',')?.as_slice() {
        &[x, y, width, height] => Ok(NormalizedRect::new(x, y, width, height)),
        _ => Err("expected x,y,width,height".to_string()),
    }
}

fn parse_polygon(s: &str) -> Result<Polygon, String> {
    let vertices = s
        .split(';')
        .map(|pair| match parse_numbers(pair, ',')?.as_slice() {
            &[x, y] => Ok(Point::new(x, y)),
            _ => Err(format!("expected x,y vertex, got '{pair}'")),
        })
        .collect::<Result<Vec<_>, String>>()?;
    if vertices.len() < 3 {
        return Err("a polygon needs at least three vertices".to_string());
    }
    Ok(Polygon::new(vertices))
}

fn print_json(value: &impl Serialize) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn device_of(path: &Path) -> DeviceInfo {
    match ExifExtractor::extract_device_from_path(path) {
        Ok(Some(device)) => device,
        Ok(None) => DeviceInfo::default(),
        Err(e) => {
            warn!("event=exif_unreadable path={} error={}", path.display(), e);
            DeviceInfo::default()
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config = match &args.config {
        Some(path) => ScanConfig::from_json_file(path)?,
        None => ScanConfig::default(),
    };
    let store = Arc::new(JsonFileStore::new(&args.store));

    let device = match &args.command {
        Command::Calibrate { image } | Command::Classify { image, .. } => device_of(image),
        Command::Status | Command::Reset => DeviceInfo::default(),
    };
    let engine = Arc::new(CalibrationEngine::new(config, store, device)?);

    match args.command {
        Command::Calibrate { image } => {
            let chart = image_loader::load_image(&image)?;
            engine.begin_calibration()?;
            let state = worker::calibrate_in_background(engine.clone(), chart).await??;
            info!("event=cli_calibrate state={}", state);
            print_json(&*engine.snapshot())?;
        }
        Command::Classify {
            image,
            rect,
            polygon,
        } => {
            let selection = match (rect, polygon) {
                (Some(rect), _) => Selection::Rect(rect),
                (None, Some(polygon)) => Selection::Polygon(polygon),
                (None, None) => Selection::FullImage,
            };
            if !engine.snapshot().is_calibrated() {
                warn!("event=cli_classify_uncalibrated");
            }
            let sample = image_loader::load_image(&image)?;
            let result = worker::sample_in_background(
                engine.clone(),
                ColorClassifier::default(),
                sample,
                selection,
            )
            .await??;
            print_json(&result)?;
        }
        Command::Status => print_json(&*engine.snapshot())?,
        Command::Reset => {
            engine.reset()?;
            print_json(&*engine.snapshot())?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    let _logger = match Logger::try_with_env_or_str(level).and_then(|logger| logger.start()) {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("logging disabled: {e}");
            None
        }
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("event=cli_failed error={}", e);
            match e.downcast_ref::<AnalysisError>() {
                Some(analysis) => {
                    eprintln!("error: {}", analysis.user_message());
                    // 2 marks failures worth retrying with a new photo
                    if analysis.is_recoverable() {
                        ExitCode::from(2)
                    } else {
                        ExitCode::FAILURE
                    }
                }
                None => {
                    eprintln!("error: {e}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}
