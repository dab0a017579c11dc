use std::time::Duration;

use crate::shared::constants::DEFAULT_BUFFER_CAPACITY;
use crate::shared::error::VitalsError;
use crate::signal::domain::ring_buffer::RingBuffer;

/// One plethysmographic reading: the forehead green mean at a point in time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub value: f64,
    pub timestamp: Duration,
}

impl Sample {
    pub fn new(value: f64, timestamp: Duration) -> Self {
        Self { value, timestamp }
    }
}

/// Rolling window of the most recent samples of a session.
#[derive(Clone, Debug)]
pub struct SignalBuffer {
    samples: RingBuffer<Sample>,
}

impl SignalBuffer {
    pub fn new(capacity: usize) -> Result<Self, VitalsError> {
        Ok(Self {
            samples: RingBuffer::new(capacity)?,
        })
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    /// Owned copy of the buffered samples, oldest first.
    pub fn snapshot(&self) -> Vec<Sample> {
        self.samples.to_vec()
    }

    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.samples.capacity()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Effective sampling rate implied by the buffered timestamps.
    pub fn measured_rate(&self) -> Option<f64> {
        let first = self.samples.first()?;
        let last = self.samples.last()?;
        let span = last.timestamp.checked_sub(first.timestamp)?.as_secs_f64();
        if self.len() < 2 || span <= 0.0 {
            return None;
        }
        Some((self.len() - 1) as f64 / span)
    }
}

impl Default for SignalBuffer {
    fn default() -> Self {
        Self {
            samples: RingBuffer::new(DEFAULT_BUFFER_CAPACITY)
                .expect("default capacity is non-zero"),
        }
    }
}
