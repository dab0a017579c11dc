use crate::shared::constants::DEFAULT_RATE_HISTORY;
use crate::shared::error::VitalsError;
use crate::signal::domain::ring_buffer::RingBuffer;

/// Domain interface for temporal smoothing of instantaneous heart rates.
pub trait RateSmoother: Send {
    /// Records `bpm` and returns the smoothed rate.
    fn push(&mut self, bpm: f64) -> f64;

    /// Current smoothed rate, `None` before the first push.
    fn current(&self) -> Option<f64>;

    fn reset(&mut self);
}

/// Arithmetic mean over the most recent `history_len` estimates.
#[derive(Clone, Debug)]
pub struct MovingAverageSmoother {
    history: RingBuffer<f64>,
}

impl MovingAverageSmoother {
    pub fn new(history_len: usize) -> Result<Self, VitalsError> {
        Ok(Self {
            history: RingBuffer::new(history_len)?,
        })
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

impl Default for MovingAverageSmoother {
    fn default() -> Self {
        Self {
            history: RingBuffer::new(DEFAULT_RATE_HISTORY).expect("default history is non-zero"),
        }
    }
}

impl RateSmoother for MovingAverageSmoother {
    fn push(&mut self, bpm: f64) -> f64 {
        self.history.push(bpm);
        self.current().unwrap_or(bpm)
    }

    fn current(&self) -> Option<f64> {
        if self.history.is_empty() {
            return None;
        }
        Some(self.history.iter().sum::<f64>() / self.history.len() as f64)
    }

    fn reset(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_default_history_len() {
        let mut smoother = MovingAverageSmoother::default();
        for _ in 0..25 {
            smoother.push(70.0);
        }
        assert_eq!(smoother.len(), 10);
    }

    #[test]
    fn test_first_push_returns_value() {
        let mut smoother = MovingAverageSmoother::default();
        assert_eq!(smoother.current(), None);
        assert_relative_eq!(smoother.push(72.0), 72.0);
    }

    #[test]
    fn test_mean_of_recent_history() {
        let mut smoother = MovingAverageSmoother::new(3).unwrap();
        smoother.push(60.0);
        smoother.push(70.0);
        assert_relative_eq!(smoother.push(80.0), 70.0);
        // 60 is evicted
        assert_relative_eq!(smoother.push(90.0), 80.0);
    }

    #[test]
    fn test_reset_clears_history() {
        let mut smoother = MovingAverageSmoother::new(3).unwrap();
        smoother.push(60.0);
        smoother.reset();
        assert!(smoother.is_empty());
        assert_relative_eq!(smoother.push(100.0), 100.0);
    }

    #[test]
    fn test_zero_history_is_rejected() {
        assert!(MovingAverageSmoother::new(0).is_err());
    }

    proptest! {
        #[test]
        fn prop_smoothed_value_is_mean_of_last_ten(
            rates in proptest::collection::vec(40.0f64..200.0, 1..60),
        ) {
            let mut smoother = MovingAverageSmoother::default();
            let mut last = 0.0;
            for &r in &rates {
                last = smoother.push(r);
            }
            prop_assert!(smoother.len() <= 10);
            let tail = &rates[rates.len().saturating_sub(10)..];
            let expected = tail.iter().sum::<f64>() / tail.len() as f64;
            prop_assert!((last - expected).abs() < 1e-9);
        }
    }
}
