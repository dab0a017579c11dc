use std::time::{Duration, Instant};

/// Source of sample timestamps for a monitoring session.
///
/// Readings are monotonic and relative to the clock's own origin.
pub trait Clock: Send {
    fn now(&mut self) -> Duration;
}

/// Wall-clock readings for live capture.
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&mut self) -> Duration {
        self.origin.elapsed()
    }
}

/// Advances one frame period per reading.
///
/// Used for recorded frame sequences, which are decoded much faster than
/// they were captured.
pub struct FrameRateClock {
    step: Duration,
    ticks: u32,
}

impl FrameRateClock {
    pub fn new(fps: f64) -> Self {
        let step = if fps > 0.0 {
            Duration::from_secs_f64(1.0 / fps)
        } else {
            Duration::ZERO
        };
        Self { step, ticks: 0 }
    }
}

impl Clock for FrameRateClock {
    fn now(&mut self) -> Duration {
        let reading = self.step * self.ticks;
        self.ticks = self.ticks.saturating_add(1);
        reading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_rate_clock_starts_at_zero() {
        let mut clock = FrameRateClock::new(30.0);
        assert_eq!(clock.now(), Duration::ZERO);
    }

    #[test]
    fn test_frame_rate_clock_steps_by_period() {
        let mut clock = FrameRateClock::new(25.0);
        clock.now();
        clock.now();
        assert_eq!(clock.now(), Duration::from_millis(80));
    }

    #[test]
    fn test_frame_rate_clock_zero_fps_stands_still() {
        let mut clock = FrameRateClock::new(0.0);
        clock.now();
        assert_eq!(clock.now(), Duration::ZERO);
    }

    #[test]
    fn test_monotonic_clock_never_goes_backwards() {
        let mut clock = MonotonicClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
