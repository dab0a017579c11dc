use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use serde::Serialize;

use crate::frames::domain::frame_source::FrameSource;
use crate::frames::domain::source_metadata::SourceMetadata;
use crate::pipeline::scan_logger::ScanLogger;
use crate::vitals::domain::vitals_estimate::VitalsEstimate;
use crate::vitals::domain::vitals_estimator::VitalsEstimator;

/// Callback invoked after each frame with `(frames_done, total_frames)`.
/// Returning `false` stops the scan.
pub type ProgressFn = Box<dyn Fn(usize, usize) -> bool + Send>;

/// Configuration for one scan run.
pub struct ScanConfig {
    pub on_progress: Option<ProgressFn>,
    pub cancelled: Arc<AtomicBool>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            on_progress: None,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// Outcome of streaming a source through an estimator.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ScanReport {
    /// One estimate per accepted frame, in frame order.
    pub estimates: Vec<VitalsEstimate>,
    pub frames_processed: usize,
    /// Frames rejected as malformed.
    pub frames_skipped: usize,
    pub cancelled: bool,
}

impl ScanReport {
    pub fn final_estimate(&self) -> Option<&VitalsEstimate> {
        self.estimates.last()
    }

    /// Most recent estimate that carried a heart rate.
    pub fn last_heart_rate(&self) -> Option<f64> {
        self.estimates.iter().rev().find_map(|e| e.heart_rate)
    }
}

/// Abstracts how the read → estimate loop of a scan is executed.
///
/// This is a port; infrastructure provides the concrete schedulers.
pub trait ScanExecutor: Send {
    fn execute(
        &self,
        source: Box<dyn FrameSource>,
        estimator: &mut dyn VitalsEstimator,
        metadata: &SourceMetadata,
        config: ScanConfig,
        logger: &mut dyn ScanLogger,
    ) -> Result<ScanReport, Box<dyn std::error::Error>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::region::Region;
    use crate::vitals::domain::vitals_estimate::SignalStatus;

    #[test]
    fn test_report_accessors() {
        let measured = VitalsEstimate::located(
            Region::new(0, 0, 10, 10),
            Some(71.0),
            SignalStatus::Measured,
            None,
        );
        let report = ScanReport {
            estimates: vec![measured, VitalsEstimate::not_found()],
            frames_processed: 2,
            frames_skipped: 0,
            cancelled: false,
        };
        assert_eq!(report.final_estimate(), Some(&VitalsEstimate::not_found()));
        assert_eq!(report.last_heart_rate(), Some(71.0));
    }

    #[test]
    fn test_empty_report() {
        let report = ScanReport::default();
        assert!(report.final_estimate().is_none());
        assert!(report.last_heart_rate().is_none());
    }
}
