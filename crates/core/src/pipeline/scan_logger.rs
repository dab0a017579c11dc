use std::collections::BTreeMap;
use std::time::Instant;

/// Observer for scan orchestration events.
///
/// Keeps the executor independent of where progress and timings end up
/// (terminal, tests, a future GUI).
pub trait ScanLogger: Send {
    /// Report frame-level progress. `total` is 0 when unknown.
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long a named stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (queue depth, heart rate, ...).
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// Emit an end-of-scan summary. Default: no-op.
    fn summary(&self) {}
}

/// Discards all events.
pub struct NullScanLogger;

impl ScanLogger for NullScanLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Running count, sum and extremes of one recorded series.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Series {
    count: usize,
    sum: f64,
    min: f64,
    max: f64,
}

impl Series {
    fn record(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += value;
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }
}

/// Terminal-oriented logger that aggregates stage timings and metrics and
/// prints a summary when the scan ends.
///
/// Progress lines are throttled to every `throttle_frames` frames.
pub struct StdoutScanLogger {
    throttle_frames: usize,
    timings: BTreeMap<String, Series>,
    metrics: BTreeMap<String, Series>,
    start_time: Instant,
    frames_seen: usize,
}

impl StdoutScanLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: BTreeMap::new(),
            metrics: BTreeMap::new(),
            start_time: Instant::now(),
            frames_seen: 0,
        }
    }

    /// Formatted summary, or `None` if nothing was recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut lines = vec![format!(
            "Scan summary ({} frames, {:.1}s total):",
            self.frames_seen,
            elapsed_ms / 1000.0
        )];

        for (stage, series) in &self.timings {
            let pct = if elapsed_ms > 0.0 {
                series.sum / elapsed_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "  {stage:12}: avg {:6.1}ms  total {:7.0}ms  ({pct:4.1}%)",
                series.mean(),
                series.sum
            ));
        }
        for (name, series) in &self.metrics {
            lines.push(format!(
                "  {name}: avg {:.1}  min {:.1}  max {:.1}",
                series.mean(),
                series.min,
                series.max
            ));
        }

        if self.frames_seen > 0 && elapsed_ms > 0.0 {
            let fps = self.frames_seen as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    pub fn mean_timing(&self, stage: &str) -> Option<f64> {
        self.timings.get(stage).map(Series::mean)
    }

    pub fn mean_metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).map(Series::mean)
    }
}

impl Default for StdoutScanLogger {
    fn default() -> Self {
        Self::new(30)
    }
}

impl ScanLogger for StdoutScanLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frames_seen = current;
        if current % self.throttle_frames != 0 && current != total {
            return;
        }
        if total > 0 {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("Scanning: {current}/{total} frames ({pct:.1}%)");
        } else {
            log::info!("Scanning: {current} frames");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.timings
            .entry(stage.to_string())
            .or_default()
            .record(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().record(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_accepts_everything() {
        let mut logger = NullScanLogger;
        logger.progress(1, 10);
        logger.timing("estimate", 5.0);
        logger.metric("queue_depth", 3.0);
        logger.info("hello");
        logger.summary();
    }

    #[test]
    fn test_timings_are_averaged_per_stage() {
        let mut logger = StdoutScanLogger::new(10);
        logger.timing("estimate", 20.0);
        logger.timing("estimate", 30.0);
        logger.timing("read", 5.0);
        assert_relative_eq!(logger.mean_timing("estimate").unwrap(), 25.0);
        assert_relative_eq!(logger.mean_timing("read").unwrap(), 5.0);
        assert!(logger.mean_timing("missing").is_none());
    }

    #[test]
    fn test_summary_lists_stages_and_metrics() {
        let mut logger = StdoutScanLogger::new(10);
        logger.progress(10, 10);
        logger.timing("estimate", 12.0);
        logger.metric("heart_rate_bpm", 70.0);
        logger.metric("heart_rate_bpm", 74.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Scan summary (10 frames"));
        assert!(summary.contains("estimate"));
        assert!(summary.contains("heart_rate_bpm: avg 72.0  min 70.0  max 74.0"));
    }

    #[test]
    fn test_empty_summary_is_none() {
        assert!(StdoutScanLogger::new(10).summary_string().is_none());
    }
}
