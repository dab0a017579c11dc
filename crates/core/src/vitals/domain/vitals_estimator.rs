use crate::shared::error::VitalsError;
use crate::shared::frame::Frame;
use crate::vitals::domain::vitals_estimate::VitalsEstimate;

/// Domain interface shared by the streaming and single-frame estimators.
pub trait VitalsEstimator: Send {
    fn estimate(&mut self, frame: &Frame) -> Result<VitalsEstimate, VitalsError>;
}
