//! Butterworth band-pass filtering as a cascade of biquad sections.
//!
//! The band is built from a high-pass cascade at the low cutoff followed by a
//! low-pass cascade at the high cutoff, each of the requested order.
//! [`BandPassFilter::filtfilt`] runs the cascade forward and backward for a
//! zero-phase result.

use std::f64::consts::PI;

use crate::shared::error::VitalsError;

/// Normalized biquad coefficients (`a0 == 1`), transposed direct form II.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

#[derive(Clone, Copy)]
enum Kind {
    LowPass,
    HighPass,
}

impl Biquad {
    /// Bilinear-transform design with frequency prewarping at `cutoff_hz`.
    fn design(kind: Kind, cutoff_hz: f64, q: f64, sample_rate: f64) -> Self {
        let w0 = 2.0 * PI * cutoff_hz / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);
        let a0 = 1.0 + alpha;
        let (b0, b1, b2) = match kind {
            Kind::LowPass => {
                let k = (1.0 - cos_w0) / 2.0;
                (k, 1.0 - cos_w0, k)
            }
            Kind::HighPass => {
                let k = (1.0 + cos_w0) / 2.0;
                (k, -(1.0 + cos_w0), k)
            }
        };
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: -2.0 * cos_w0 / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    /// DC gain of the section.
    fn dc_gain(&self) -> f64 {
        (self.b0 + self.b1 + self.b2) / (1.0 + self.a1 + self.a2)
    }

    /// Filters `signal` in place, starting from the steady state for a
    /// constant input equal to `signal[0]`.
    fn apply(&self, signal: &mut [f64]) {
        let Some(&x0) = signal.first() else {
            return;
        };
        let y0 = x0 * self.dc_gain();
        let mut z2 = self.b2 * x0 - self.a2 * y0;
        let mut z1 = y0 - self.b0 * x0;
        for x in signal.iter_mut() {
            let input = *x;
            let y = self.b0 * input + z1;
            z1 = self.b1 * input - self.a1 * y + z2;
            z2 = self.b2 * input - self.a2 * y;
            *x = y;
        }
    }
}

/// Q factors of the second-order sections of an `order`-th order Butterworth
/// prototype (`order` even).
fn butterworth_qs(order: usize) -> Vec<f64> {
    (0..order / 2)
        .map(|k| {
            let theta = PI * (2 * k + 1) as f64 / (2 * order) as f64;
            1.0 / (2.0 * theta.cos())
        })
        .collect()
}

/// Zero-phase capable Butterworth band-pass filter.
#[derive(Clone, Debug)]
pub struct BandPassFilter {
    sections: Vec<Biquad>,
}

impl BandPassFilter {
    /// Designs a band-pass of the given even `order` per band edge.
    ///
    /// Both cutoffs must lie strictly between 0 and Nyquist.
    pub fn new(
        low_hz: f64,
        high_hz: f64,
        order: usize,
        sample_rate: f64,
    ) -> Result<Self, VitalsError> {
        if order == 0 || order % 2 != 0 {
            return Err(VitalsError::InvalidConfig(format!(
                "filter order must be a positive even number, got {order}"
            )));
        }
        let nyquist = sample_rate / 2.0;
        if !(low_hz > 0.0 && low_hz < high_hz && high_hz < nyquist) {
            return Err(VitalsError::InvalidConfig(format!(
                "band [{low_hz}, {high_hz}] Hz must lie inside (0, {nyquist}) Hz"
            )));
        }

        let qs = butterworth_qs(order);
        let high_pass = qs
            .iter()
            .map(|&q| Biquad::design(Kind::HighPass, low_hz, q, sample_rate));
        let low_pass = qs
            .iter()
            .map(|&q| Biquad::design(Kind::LowPass, high_hz, q, sample_rate));
        Ok(Self {
            sections: high_pass.chain(low_pass).collect(),
        })
    }

    /// Samples of odd-extension padding added at each end by [`Self::filtfilt`].
    pub fn pad_len(&self) -> usize {
        3 * (2 * self.sections.len() + 1)
    }

    /// Causal single pass.
    pub fn filter(&self, signal: &[f64]) -> Vec<f64> {
        let mut out = signal.to_vec();
        self.run_cascade(&mut out);
        out
    }

    /// Forward-backward filtering with odd-extension padding.
    ///
    /// The output has no phase shift relative to the input and the same length.
    pub fn filtfilt(&self, signal: &[f64]) -> Vec<f64> {
        let n = signal.len();
        if n == 0 {
            return Vec::new();
        }
        let pad = self.pad_len().min(n - 1);

        let first = signal[0];
        let last = signal[n - 1];
        let mut ext = Vec::with_capacity(n + 2 * pad);
        ext.extend((1..=pad).rev().map(|i| 2.0 * first - signal[i]));
        ext.extend_from_slice(signal);
        ext.extend((1..=pad).map(|i| 2.0 * last - signal[n - 1 - i]));

        self.run_cascade(&mut ext);
        ext.reverse();
        self.run_cascade(&mut ext);
        ext.reverse();

        ext[pad..pad + n].to_vec()
    }

    fn run_cascade(&self, signal: &mut [f64]) {
        for section in &self.sections {
            section.apply(signal);
        }
    }
}
