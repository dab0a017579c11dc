use thiserror::Error;

/// Errors surfaced by the vitals estimators.
///
/// Missing faces, warm-up and degenerate forehead bands are not errors; they
/// are reported through [`crate::vitals::domain::vitals_estimate::SignalStatus`].
#[derive(Error, Debug)]
pub enum VitalsError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("face detection failed: {0}")]
    Detection(String),
}
