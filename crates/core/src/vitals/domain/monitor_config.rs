use serde::{Deserialize, Serialize};

use crate::shared::constants::{
    DEFAULT_BUFFER_CAPACITY, DEFAULT_FILTER_ORDER, DEFAULT_MAX_MISSED_FRAMES,
    DEFAULT_MIN_WINDOW_SECS, DEFAULT_RATE_HISTORY, DEFAULT_SAMPLING_RATE, HEART_BAND_HIGH_HZ,
    HEART_BAND_LOW_HZ,
};
use crate::shared::error::VitalsError;

/// Tunables of one heart-rate monitoring session.
///
/// Missing fields in a serialized config fall back to their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub buffer_capacity: usize,
    /// Nominal frame rate in Hz used for spectral analysis.
    pub sampling_rate: f64,
    pub min_window_secs: f64,
    pub band_low_hz: f64,
    pub band_high_hz: f64,
    pub filter_order: usize,
    pub history_len: usize,
    pub max_missed_frames: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            sampling_rate: DEFAULT_SAMPLING_RATE,
            min_window_secs: DEFAULT_MIN_WINDOW_SECS,
            band_low_hz: HEART_BAND_LOW_HZ,
            band_high_hz: HEART_BAND_HIGH_HZ,
            filter_order: DEFAULT_FILTER_ORDER,
            history_len: DEFAULT_RATE_HISTORY,
            max_missed_frames: DEFAULT_MAX_MISSED_FRAMES,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), VitalsError> {
        let invalid = |msg: String| Err(VitalsError::InvalidConfig(msg));
        if self.buffer_capacity == 0 {
            return invalid("buffer_capacity must be >= 1".into());
        }
        if self.history_len == 0 {
            return invalid("history_len must be >= 1".into());
        }
        if !(self.sampling_rate.is_finite() && self.sampling_rate > 0.0) {
            return invalid(format!(
                "sampling_rate must be positive, got {}",
                self.sampling_rate
            ));
        }
        if !(self.min_window_secs.is_finite() && self.min_window_secs > 0.0) {
            return invalid(format!(
                "min_window_secs must be positive, got {}",
                self.min_window_secs
            ));
        }
        if !(self.band_low_hz > 0.0 && self.band_low_hz < self.band_high_hz) {
            return invalid(format!(
                "band [{}, {}] Hz is empty or inverted",
                self.band_low_hz, self.band_high_hz
            ));
        }
        if self.band_high_hz >= self.sampling_rate / 2.0 {
            return invalid(format!(
                "band_high_hz {} must lie below the Nyquist frequency {} of a {} Hz stream",
                self.band_high_hz,
                self.sampling_rate / 2.0,
                self.sampling_rate
            ));
        }
        if self.filter_order == 0 || self.filter_order % 2 != 0 {
            return invalid(format!(
                "filter_order must be a positive even number, got {}",
                self.filter_order
            ));
        }
        if self.buffer_capacity < self.min_window_samples() {
            return invalid(format!(
                "buffer_capacity {} cannot hold the {} samples of a {} s window at {} Hz",
                self.buffer_capacity,
                self.min_window_samples(),
                self.min_window_secs,
                self.sampling_rate
            ));
        }
        Ok(())
    }

    /// Samples needed before the first estimate at the nominal rate.
    pub fn min_window_samples(&self) -> usize {
        (self.min_window_secs * self.sampling_rate).ceil() as usize
    }
}
