use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::frames::domain::frame_source::FrameSource;
use crate::pipeline::scan_executor::{ProgressFn, ScanConfig, ScanExecutor, ScanReport};
use crate::pipeline::scan_logger::ScanLogger;
use crate::vitals::domain::vitals_estimator::VitalsEstimator;

/// Streams a frame source through one monitoring session.
///
/// Opens the source, hands the read → estimate loop to a `ScanExecutor` and
/// emits the logger summary. Single-use: `execute` consumes the source.
pub struct ScanStreamUseCase {
    source: Option<Box<dyn FrameSource>>,
    estimator: Box<dyn VitalsEstimator>,
    executor: Box<dyn ScanExecutor>,
    logger: Box<dyn ScanLogger>,
    on_progress: Option<ProgressFn>,
    cancelled: Arc<AtomicBool>,
}

impl ScanStreamUseCase {
    pub fn new(
        source: Box<dyn FrameSource>,
        estimator: Box<dyn VitalsEstimator>,
        executor: Box<dyn ScanExecutor>,
        logger: Box<dyn ScanLogger>,
        on_progress: Option<ProgressFn>,
        cancelled: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            source: Some(source),
            estimator,
            executor,
            logger,
            on_progress,
            cancelled: cancelled.unwrap_or_else(|| Arc::new(AtomicBool::new(false))),
        }
    }

    pub fn execute(&mut self, input: &Path) -> Result<ScanReport, Box<dyn std::error::Error>> {
        let mut source = self.source.take().ok_or("Scan already executed")?;
        let metadata = source.open(input)?;
        self.logger.info(&format!(
            "Scanning {} ({} frames, {}x{} at {} fps)",
            input.display(),
            metadata.total_frames,
            metadata.width,
            metadata.height,
            metadata.fps
        ));

        let config = ScanConfig {
            on_progress: self.on_progress.take(),
            cancelled: self.cancelled.clone(),
        };
        let report = self.executor.execute(
            source,
            self.estimator.as_mut(),
            &metadata,
            config,
            self.logger.as_mut(),
        )?;
        self.logger.summary();
        Ok(report)
    }
}
