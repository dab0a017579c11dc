use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use pulselens_core::detection::domain::face_detector::FaceDetector;
use pulselens_core::detection::infrastructure::onnx_yolo_detector::{
    DetectorConfig, OnnxYoloDetector,
};
use pulselens_core::frames::infrastructure::image_file_reader::ImageFileReader;
use pulselens_core::frames::infrastructure::image_sequence_reader::{
    is_image_file, ImageSequenceReader,
};
use pulselens_core::pipeline::infrastructure::threaded_scan_executor::ThreadedScanExecutor;
use pulselens_core::pipeline::scan_executor::{ProgressFn, ScanReport};
use pulselens_core::pipeline::scan_image_use_case::ScanImageUseCase;
use pulselens_core::pipeline::scan_logger::StdoutScanLogger;
use pulselens_core::pipeline::scan_stream_use_case::ScanStreamUseCase;
use pulselens_core::shared::clock::FrameRateClock;
use pulselens_core::shared::constants::{DEFAULT_MIN_FACE_SIZE, FACE_MODEL_NAME, FACE_MODEL_URL};
use pulselens_core::shared::model_resolver;
use pulselens_core::vitals::domain::heart_rate_monitor::HeartRateMonitor;
use pulselens_core::vitals::domain::monitor_config::MonitorConfig;
use pulselens_core::vitals::domain::single_frame_estimator::SingleFrameEstimator;
use pulselens_core::vitals::domain::vitals_estimate::{SignalStatus, VitalsEstimate};

/// Camera-based heart rate estimation from face images and frame sequences.
#[derive(Parser)]
#[command(name = "pulselens")]
struct Cli {
    /// Input image file, or a directory of frames for streaming estimation.
    input: PathBuf,

    /// Frame rate of a frame directory in Hz (overrides the config file).
    #[arg(long)]
    fps: Option<f64>,

    /// Signal buffer length in samples (overrides the config file).
    #[arg(long)]
    buffer_size: Option<usize>,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value = "0.5")]
    confidence: f64,

    /// Smallest face side in pixels that counts as a detection.
    #[arg(long, default_value_t = DEFAULT_MIN_FACE_SIZE)]
    min_face_size: u32,

    /// Frames a lost face keeps its last region (overrides the config file).
    #[arg(long)]
    max_missed_frames: Option<usize>,

    /// JSON file with monitor settings; missing fields use defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print estimates as JSON (one line per frame for directories).
    #[arg(long)]
    json: bool,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;
    let config = monitor_config(&cli)?;
    let detector = build_detector(&cli)?;

    if cli.input.is_dir() {
        run_stream(&cli.input, config, detector, cli.json)
    } else {
        run_image(&cli.input, detector, cli.json)
    }
}

fn run_image(
    input: &Path,
    detector: Box<dyn FaceDetector>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut use_case = ScanImageUseCase::new(
        Box::new(ImageFileReader::new()),
        SingleFrameEstimator::new(detector),
    );
    let estimate = use_case.execute(input)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&estimate)?);
    } else {
        print_estimate(&estimate);
    }
    Ok(())
}

fn run_stream(
    input: &Path,
    config: MonitorConfig,
    detector: Box<dyn FaceDetector>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let fps = config.sampling_rate;
    let monitor =
        HeartRateMonitor::with_clock(config, detector, Box::new(FrameRateClock::new(fps)))?;

    let progress: ProgressFn = Box::new(|current, total| {
        eprint!("\rProcessing frame {current}/{total}");
        true
    });
    let mut use_case = ScanStreamUseCase::new(
        Box::new(ImageSequenceReader::new(fps)),
        Box::new(monitor),
        Box::new(ThreadedScanExecutor::new()),
        Box::new(StdoutScanLogger::default()),
        Some(progress),
        None,
    );
    let report = use_case.execute(input)?;
    eprintln!();

    if json {
        for estimate in &report.estimates {
            println!("{}", serde_json::to_string(estimate)?);
        }
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &ScanReport) {
    println!(
        "Frames processed: {} ({} skipped)",
        report.frames_processed, report.frames_skipped
    );
    let measured = report
        .estimates
        .iter()
        .filter(|e| e.status == SignalStatus::Measured)
        .count();
    println!("Frames with a spectral estimate: {measured}");
    match report.final_estimate() {
        Some(estimate) => print_estimate(estimate),
        None => println!("No frames were estimated"),
    }
    if let (None, Some(bpm)) = (
        report.final_estimate().and_then(|e| e.heart_rate),
        report.last_heart_rate(),
    ) {
        println!("Last measured heart rate: {bpm:.1} bpm");
    }
}

fn print_estimate(estimate: &VitalsEstimate) {
    let Some(region) = estimate.region.filter(|_| estimate.region_found) else {
        println!("No face detected");
        return;
    };
    println!(
        "Face region: {}x{} at ({}, {})",
        region.width, region.height, region.x, region.y
    );
    match (estimate.heart_rate, estimate.status) {
        (Some(bpm), _) => println!("Heart rate: {bpm:.1} bpm"),
        (None, SignalStatus::Warmup) => println!("Heart rate: -- (collecting signal)"),
        (None, SignalStatus::DegenerateRoi) => println!("Heart rate: -- (forehead not visible)"),
        (None, _) => println!("Heart rate: --"),
    }
    if let Some(bp) = estimate.blood_pressure {
        println!("Blood pressure: {:.1}/{:.1} mmHg", bp.systolic, bp.diastolic);
    }
    if let Some(spo2) = estimate.oxygen_saturation {
        println!("Oxygen saturation: {spo2:.1} %");
    }
    if let Some(stress) = estimate.stress_index {
        println!("Stress index: {stress:.1}");
    }
}

fn monitor_config(cli: &Cli) -> Result<MonitorConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("Cannot read config {}: {e}", path.display()))?;
            serde_json::from_str(&text)
                .map_err(|e| format!("Invalid config {}: {e}", path.display()))?
        }
        None => MonitorConfig::default(),
    };
    if let Some(fps) = cli.fps {
        config.sampling_rate = fps;
    }
    if let Some(size) = cli.buffer_size {
        config.buffer_capacity = size;
    }
    if let Some(max) = cli.max_missed_frames {
        config.max_missed_frames = max;
    }
    config.validate()?;
    log::debug!("Monitor config: {config:?}");
    Ok(config)
}

fn build_detector(cli: &Cli) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {FACE_MODEL_NAME}");
    let model_path = model_resolver::resolve(
        FACE_MODEL_NAME,
        FACE_MODEL_URL,
        None,
        Some(Box::new(download_progress)),
    )?;

    let config = DetectorConfig {
        confidence: cli.confidence,
        min_face_size: cli.min_face_size,
    };
    Ok(Box::new(OnnxYoloDetector::new(&model_path, config)?))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input not found: {}", cli.input.display()).into());
    }
    if !cli.input.is_dir() && !is_image_file(&cli.input) {
        return Err(format!(
            "Input must be an image file or a directory of frames: {}",
            cli.input.display()
        )
        .into());
    }
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    if let Some(fps) = cli.fps {
        if !(fps.is_finite() && fps > 0.0) {
            return Err(format!("Frame rate must be positive, got {fps}").into());
        }
    }
    Ok(())
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face detection model... {pct}%");
    } else {
        eprint!("\rDownloading face detection model... {downloaded} bytes");
    }
}
