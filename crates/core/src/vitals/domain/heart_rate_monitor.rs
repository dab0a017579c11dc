use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::domain::region_locator::RegionLocator;
use crate::shared::clock::{Clock, MonotonicClock};
use crate::shared::error::VitalsError;
use crate::shared::frame::Frame;
use crate::signal::domain::rate_smoother::{MovingAverageSmoother, RateSmoother};
use crate::signal::domain::roi_sampler::RoiSampler;
use crate::signal::domain::signal_buffer::SignalBuffer;
use crate::signal::domain::spectral_estimator::SpectralEstimator;
use crate::vitals::domain::monitor_config::MonitorConfig;
use crate::vitals::domain::vitals_estimate::{SignalStatus, VitalsEstimate};
use crate::vitals::domain::vitals_estimator::VitalsEstimator;

/// Streaming heart-rate estimation for one monitoring session.
///
/// Each frame goes through face location, forehead sampling, buffering and,
/// once enough signal has accumulated, spectral estimation followed by
/// moving-average smoothing. Frames must be fed in arrival order; sessions
/// share no state and may live on different threads.
pub struct HeartRateMonitor {
    config: MonitorConfig,
    locator: RegionLocator,
    sampler: RoiSampler,
    buffer: SignalBuffer,
    estimator: SpectralEstimator,
    smoother: Box<dyn RateSmoother>,
    clock: Box<dyn Clock>,
    warmed_up: bool,
}

impl HeartRateMonitor {
    /// Session timestamped with the wall clock, for live capture.
    pub fn new(config: MonitorConfig, detector: Box<dyn FaceDetector>) -> Result<Self, VitalsError> {
        Self::with_clock(config, detector, Box::new(MonotonicClock::new()))
    }

    pub fn with_clock(
        config: MonitorConfig,
        detector: Box<dyn FaceDetector>,
        clock: Box<dyn Clock>,
    ) -> Result<Self, VitalsError> {
        config.validate()?;
        let buffer = SignalBuffer::new(config.buffer_capacity)?;
        let smoother = MovingAverageSmoother::new(config.history_len)?;
        let estimator = SpectralEstimator::new(
            config.band_low_hz,
            config.band_high_hz,
            config.filter_order,
            config.min_window_secs,
        );
        log::info!(
            "Heart-rate session: {} sample buffer at {} Hz, first estimate after {} samples",
            config.buffer_capacity,
            config.sampling_rate,
            estimator.min_samples(config.sampling_rate)
        );
        Ok(Self {
            locator: RegionLocator::new(detector, config.max_missed_frames),
            sampler: RoiSampler::new(),
            buffer,
            estimator,
            smoother: Box::new(smoother),
            clock,
            warmed_up: false,
            config,
        })
    }

    /// Advances the session by one frame.
    ///
    /// Malformed frames and detector failures return an error and leave the
    /// session untouched.
    pub fn process_frame(&mut self, frame: &Frame) -> Result<VitalsEstimate, VitalsError> {
        if let Err(e) = frame.validate(3) {
            log::warn!("Skipping frame {}: {e}", frame.index());
            return Err(e);
        }

        let Some(region) = self.locator.locate(frame)?.region() else {
            return Ok(VitalsEstimate::not_found());
        };

        let held = self.smoother.current();
        let Some(sample) = self.sampler.sample(frame, &region, self.clock.as_mut()) else {
            log::debug!("Frame {}: forehead band of {region:?} is empty", frame.index());
            return Ok(VitalsEstimate::located(
                region,
                held,
                SignalStatus::DegenerateRoi,
                None,
            ));
        };
        self.buffer.push(sample);

        if self.buffer.len() < self.estimator.min_samples(self.config.sampling_rate) {
            return Ok(VitalsEstimate::located(region, held, SignalStatus::Warmup, None));
        }

        let snapshot = self.buffer.snapshot();
        let Some(analysis) = self.estimator.analyze(&snapshot, self.config.sampling_rate) else {
            return Ok(VitalsEstimate::located(
                region,
                held,
                SignalStatus::NoDominantFrequency,
                None,
            ));
        };

        let smoothed = self.smoother.push(analysis.bpm);
        if !self.warmed_up {
            self.warmed_up = true;
            log::info!(
                "Warm-up complete after {} samples, first estimate {smoothed:.1} bpm",
                snapshot.len()
            );
        }
        log::debug!(
            "Frame {}: instantaneous {:.1} bpm, smoothed {smoothed:.1} bpm (measured rate {:?} Hz)",
            frame.index(),
            analysis.bpm,
            self.buffer.measured_rate()
        );

        Ok(VitalsEstimate::located(
            region,
            Some(smoothed),
            SignalStatus::Measured,
            Some(analysis.features),
        ))
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Samples currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Effective sampling rate from the buffered timestamps.
    pub fn measured_rate(&self) -> Option<f64> {
        self.buffer.measured_rate()
    }

    /// Forgets all signal, history and tracking state.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.smoother.reset();
        self.locator.reset();
        self.warmed_up = false;
    }
}

impl VitalsEstimator for HeartRateMonitor {
    fn estimate(&mut self, frame: &Frame) -> Result<VitalsEstimate, VitalsError> {
        self.process_frame(frame)
    }
}
