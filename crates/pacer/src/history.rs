//! Bounded sliding windows of recent samples.

use std::collections::VecDeque;

use serde::Serialize;

use crate::models::Sample;

/// FIFO series that evicts its oldest entry once full.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundedSeries<T> {
    capacity: usize,
    samples: VecDeque<Sample<T>>,
}

impl<T: Copy> BoundedSeries<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, t: u64, value: T) {
        // Keep timestamps non-decreasing
        let t = self.samples.back().map_or(t, |last| t.max(last.t));
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(Sample { t, value });
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<T> {
        self.samples.back().map(|s| s.value)
    }

    /// Newest entry with its timestamp.
    pub fn latest_sample(&self) -> Option<Sample<T>> {
        self.samples.back().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample<T>> {
        self.samples.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = T> + '_ {
        self.samples.iter().map(|s| s.value)
    }

    pub fn to_vec(&self) -> Vec<Sample<T>> {
        self.samples.iter().copied().collect()
    }
}

/// Pace and heart-rate windows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleHistory {
    pub pace: BoundedSeries<f64>,
    pub heart_rate: BoundedSeries<u16>,
}

impl SampleHistory {
    /// Starts with one pace sample at t = 0 and no heart-rate samples.
    pub fn seeded(capacity: usize, initial_pace: f64) -> Self {
        let mut pace = BoundedSeries::new(capacity);
        pace.push(0, initial_pace);
        Self {
            pace,
            heart_rate: BoundedSeries::new(capacity),
        }
    }

    pub fn record(&mut self, t: u64, pace: f64, heart_rate: u16) {
        self.pace.push(t, pace);
        self.heart_rate.push(t, heart_rate);
    }
}
