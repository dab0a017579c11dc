use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use crate::frames::domain::frame_source::FrameSource;
use crate::frames::domain::source_metadata::SourceMetadata;
use crate::pipeline::scan_executor::{ScanConfig, ScanExecutor, ScanReport};
use crate::pipeline::scan_logger::ScanLogger;
use crate::shared::error::VitalsError;
use crate::shared::frame::Frame;
use crate::vitals::domain::vitals_estimator::VitalsEstimator;

const DEFAULT_CHANNEL_CAPACITY: usize = 8;

type SendError = Box<dyn std::error::Error + Send + Sync>;

/// Runs a scan with decoding on a dedicated reader thread.
///
/// Layout: `reader → bounded channel → caller thread [estimate]`
///
/// The source comes back from the reader thread and is closed exactly once
/// after it has been joined.
///
/// The estimator keeps its session state on the calling thread and sees
/// frames strictly in source order.
pub struct ThreadedScanExecutor {
    channel_capacity: usize,
}

impl ThreadedScanExecutor {
    pub fn new() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn with_channel_capacity(channel_capacity: usize) -> Self {
        Self {
            channel_capacity: channel_capacity.max(1),
        }
    }
}

impl Default for ThreadedScanExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanExecutor for ThreadedScanExecutor {
    fn execute(
        &self,
        source: Box<dyn FrameSource>,
        estimator: &mut dyn VitalsEstimator,
        metadata: &SourceMetadata,
        config: ScanConfig,
        logger: &mut dyn ScanLogger,
    ) -> Result<ScanReport, Box<dyn std::error::Error>> {
        let (frame_tx, frame_rx) =
            crossbeam_channel::bounded::<Result<(Frame, f64), SendError>>(self.channel_capacity);
        let reader_handle = spawn_reader(source, frame_tx, config.cancelled.clone());

        let outcome = run_main_loop(
            &frame_rx,
            estimator,
            metadata.total_frames,
            &config,
            logger,
        );

        // Unblocks the reader if the loop stopped early.
        drop(frame_rx);
        let reader_result = join_reader(reader_handle);

        let report = outcome?;
        reader_result?;
        logger.info(&format!(
            "Scanned {} frames ({} skipped){}",
            report.frames_processed,
            report.frames_skipped,
            if report.cancelled { ", cancelled" } else { "" }
        ));
        Ok(report)
    }
}

fn spawn_reader(
    mut source: Box<dyn FrameSource>,
    frame_tx: crossbeam_channel::Sender<Result<(Frame, f64), SendError>>,
    cancelled: Arc<AtomicBool>,
) -> JoinHandle<Box<dyn FrameSource>> {
    std::thread::spawn(move || {
        let mut frames = source.frames();
        loop {
            if cancelled.load(Ordering::Relaxed) {
                break;
            }
            let started = Instant::now();
            let Some(frame_result) = frames.next() else {
                break;
            };
            let read_ms = started.elapsed().as_secs_f64() * 1000.0;
            let mapped = frame_result
                .map(|frame| (frame, read_ms))
                .map_err(|e| -> SendError { e.to_string().into() });
            if frame_tx.send(mapped).is_err() {
                break;
            }
        }
        drop(frames);
        source
    })
}

fn run_main_loop(
    frame_rx: &crossbeam_channel::Receiver<Result<(Frame, f64), SendError>>,
    estimator: &mut dyn VitalsEstimator,
    total_frames: usize,
    config: &ScanConfig,
    logger: &mut dyn ScanLogger,
) -> Result<ScanReport, Box<dyn std::error::Error>> {
    let mut report = ScanReport::default();

    for received in frame_rx {
        if config.cancelled.load(Ordering::Relaxed) {
            report.cancelled = true;
            break;
        }
        let (frame, read_ms) = received.map_err(|e| e.to_string())?;
        logger.timing("read", read_ms);
        logger.metric("queue_depth", frame_rx.len() as f64);

        let started = Instant::now();
        match estimator.estimate(&frame) {
            Ok(estimate) => {
                logger.timing("estimate", started.elapsed().as_secs_f64() * 1000.0);
                if let Some(bpm) = estimate.heart_rate {
                    logger.metric("heart_rate_bpm", bpm);
                }
                report.estimates.push(estimate);
            }
            Err(VitalsError::InvalidInput(reason)) => {
                log::warn!("Skipping frame {}: {reason}", frame.index());
                report.frames_skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }

        report.frames_processed += 1;
        logger.progress(report.frames_processed, total_frames);
        if let Some(ref callback) = config.on_progress {
            if !callback(report.frames_processed, total_frames) {
                config.cancelled.store(true, Ordering::Relaxed);
                report.cancelled = true;
                break;
            }
        }
    }

    report.cancelled |= config.cancelled.load(Ordering::Relaxed);
    Ok(report)
}

fn join_reader(handle: JoinHandle<Box<dyn FrameSource>>) -> Result<(), Box<dyn std::error::Error>> {
    match handle.join() {
        Ok(mut source) => {
            source.close();
            Ok(())
        }
        Err(_) => Err("Reader thread panicked".into()),
    }
}
