use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use serde::Serialize;

use crate::shared::constants::{
    DEFAULT_FILTER_ORDER, DEFAULT_MIN_WINDOW_SECS, HEART_BAND_HIGH_HZ, HEART_BAND_LOW_HZ,
};
use crate::signal::domain::bandpass::BandPassFilter;
use crate::signal::domain::signal_buffer::Sample;

/// Descriptive statistics of the band-passed signal behind one estimate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SignalFeatures {
    pub mean: f64,
    pub std_dev: f64,
    pub range: f64,
    /// Strongest bin of the whole spectrum, not restricted to the heart band.
    pub dominant_freq_hz: f64,
    /// Mean squared magnitude over the spectrum bins.
    pub power: f64,
    /// Largest value of the filtered signal.
    pub peak_amplitude: f64,
}

/// Result of one spectral pass over a signal window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpectralAnalysis {
    pub bpm: f64,
    pub peak_hz: f64,
    pub features: SignalFeatures,
}

/// Turns a window of forehead samples into an instantaneous heart rate.
///
/// Pipeline: mean removal, zero-phase Butterworth band-pass, magnitude
/// spectrum, strongest in-band bin. Ties go to the lowest frequency.
#[derive(Clone, Debug)]
pub struct SpectralEstimator {
    low_hz: f64,
    high_hz: f64,
    order: usize,
    min_window_secs: f64,
}

impl SpectralEstimator {
    pub fn new(low_hz: f64, high_hz: f64, order: usize, min_window_secs: f64) -> Self {
        Self {
            low_hz,
            high_hz,
            order,
            min_window_secs,
        }
    }

    /// Samples required before an estimate is attempted at `sampling_rate`.
    pub fn min_samples(&self, sampling_rate: f64) -> usize {
        (self.min_window_secs * sampling_rate).ceil().max(1.0) as usize
    }

    pub fn estimate(&self, snapshot: &[Sample], sampling_rate: f64) -> Option<f64> {
        self.analyze(snapshot, sampling_rate).map(|a| a.bpm)
    }

    /// Full analysis of `snapshot`, `None` while the window is too short or
    /// no in-band peak exists.
    pub fn analyze(&self, snapshot: &[Sample], sampling_rate: f64) -> Option<SpectralAnalysis> {
        if !(sampling_rate > 0.0) || snapshot.len() < self.min_samples(sampling_rate) {
            return None;
        }
        let values: Vec<f64> = snapshot.iter().map(|s| s.value).collect();
        if values.iter().any(|v| !v.is_finite()) {
            log::warn!("Non-finite sample in signal window, skipping estimate");
            return None;
        }

        let filter = match BandPassFilter::new(self.low_hz, self.high_hz, self.order, sampling_rate)
        {
            Ok(filter) => filter,
            Err(e) => {
                log::debug!("No band-pass at {sampling_rate} Hz: {e}");
                return None;
            }
        };
        let filtered = filter.filtfilt(&detrend(&values));

        let spectrum = magnitude_spectrum(&filtered);
        let n = filtered.len() as f64;
        let freq = |k: usize| k as f64 * sampling_rate / n;

        let mut peak: Option<(usize, f64)> = None;
        for (k, &mag) in spectrum.iter().enumerate() {
            let f = freq(k);
            if f < self.low_hz || f > self.high_hz {
                continue;
            }
            if peak.map_or(true, |(_, best)| mag > best) {
                peak = Some((k, mag));
            }
        }
        let (k, _) = peak?;
        let peak_hz = freq(k);

        Some(SpectralAnalysis {
            bpm: peak_hz * 60.0,
            peak_hz,
            features: features(&filtered, &spectrum, sampling_rate),
        })
    }
}

impl Default for SpectralEstimator {
    fn default() -> Self {
        Self::new(
            HEART_BAND_LOW_HZ,
            HEART_BAND_HIGH_HZ,
            DEFAULT_FILTER_ORDER,
            DEFAULT_MIN_WINDOW_SECS,
        )
    }
}

/// Subtracts the arithmetic mean.
pub fn detrend(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| v - mean).collect()
}

/// Magnitudes of the non-negative frequency bins `0..=n/2` of a real signal.
fn magnitude_spectrum(signal: &[f64]) -> Vec<f64> {
    let n = signal.len();
    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);
    let mut buf: Vec<Complex<f64>> = signal.iter().map(|&v| Complex::new(v, 0.0)).collect();
    fft.process(&mut buf);
    buf[..n / 2 + 1].iter().map(|c| c.norm()).collect()
}

fn features(signal: &[f64], spectrum: &[f64], sampling_rate: f64) -> SignalFeatures {
    let n = signal.len() as f64;
    let mean = signal.iter().sum::<f64>() / n;
    let variance = signal.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let min = signal.iter().copied().fold(f64::INFINITY, f64::min);
    let max = signal.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let (dominant_bin, _) = spectrum
        .iter()
        .copied()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |best, (k, mag)| {
            if mag > best.1 {
                (k, mag)
            } else {
                best
            }
        });
    let power = spectrum.iter().map(|m| m * m).sum::<f64>() / spectrum.len() as f64;

    SignalFeatures {
        mean,
        std_dev: variance.sqrt(),
        range: max - min,
        dominant_freq_hz: dominant_bin as f64 * sampling_rate / n,
        power,
        peak_amplitude: max,
    }
}
