use serde::Serialize;

use crate::shared::region::Region;
use crate::signal::domain::spectral_estimator::SignalFeatures;

/// Which condition shaped an estimate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalStatus {
    /// A spectral estimate ran on this frame.
    Measured,
    /// Not enough signal yet for a spectral estimate.
    Warmup,
    RegionNotFound,
    /// The forehead band had no area; the frame contributed no sample.
    DegenerateRoi,
    /// The window was long enough but held no in-band peak.
    NoDominantFrequency,
    /// Single-frame color heuristic.
    Heuristic,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BloodPressure {
    pub systolic: f64,
    pub diastolic: f64,
}

/// Vital signs reported for one processed frame or image.
///
/// Every physiological field is optional; a missing value is never
/// substituted with a default.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VitalsEstimate {
    pub heart_rate: Option<f64>,
    pub blood_pressure: Option<BloodPressure>,
    pub oxygen_saturation: Option<f64>,
    pub stress_index: Option<f64>,
    pub region_found: bool,
    pub status: SignalStatus,
    pub region: Option<Region>,
    pub signal: Option<SignalFeatures>,
}

impl VitalsEstimate {
    pub fn not_found() -> Self {
        Self {
            heart_rate: None,
            blood_pressure: None,
            oxygen_saturation: None,
            stress_index: None,
            region_found: false,
            status: SignalStatus::RegionNotFound,
            region: None,
            signal: None,
        }
    }

    /// An estimate for a located face with only the heart rate filled.
    pub fn located(
        region: Region,
        heart_rate: Option<f64>,
        status: SignalStatus,
        signal: Option<SignalFeatures>,
    ) -> Self {
        Self {
            heart_rate,
            region_found: true,
            status,
            region: Some(region),
            signal,
            ..Self::not_found()
        }
    }
}
