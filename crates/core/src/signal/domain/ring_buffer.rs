use crate::shared::error::VitalsError;

/// Fixed-capacity FIFO backed by a preallocated slot array and a write cursor.
///
/// Pushing into a full buffer overwrites the oldest element. Iteration
/// always yields elements oldest first.
#[derive(Clone, Debug)]
pub struct RingBuffer<T: Copy> {
    slots: Vec<T>,
    capacity: usize,
    /// Index the next push writes to.
    cursor: usize,
    len: usize,
}

impl<T: Copy> RingBuffer<T> {
    pub fn new(capacity: usize) -> Result<Self, VitalsError> {
        if capacity == 0 {
            return Err(VitalsError::InvalidConfig(
                "ring buffer capacity must be >= 1".into(),
            ));
        }
        Ok(Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            cursor: 0,
            len: 0,
        })
    }

    /// Appends `value`, returning the evicted element when the buffer was full.
    pub fn push(&mut self, value: T) -> Option<T> {
        let evicted = if self.slots.len() < self.capacity {
            self.slots.push(value);
            None
        } else {
            Some(std::mem::replace(&mut self.slots[self.cursor], value))
        };
        self.cursor = (self.cursor + 1) % self.capacity;
        self.len = (self.len + 1).min(self.capacity);
        evicted
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.cursor = 0;
        self.len = 0;
    }

    pub fn first(&self) -> Option<T> {
        self.iter().next()
    }

    pub fn last(&self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let idx = (self.cursor + self.capacity - 1) % self.capacity;
        Some(self.slots[idx])
    }

    /// Elements in insertion order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        // Until the first wrap the slots are already in order.
        let start = if self.is_full() { self.cursor } else { 0 };
        (0..self.len).map(move |i| self.slots[(start + i) % self.capacity])
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }
}
