//! Per-neuron delay line
//!
//! Synaptic amplitudes arriving at a neuron are accumulated under the
//! absolute step at which they take effect. Reading an entry during stepping
//! consumes it; inspection goes through [`DelayBuffer::peek`], which never
//! mutates the store.

use std::collections::BTreeMap;

/// Sparse store of pending synaptic input keyed by delivery step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DelayBuffer {
    pending: BTreeMap<u64, f64>,
}

impl DelayBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate `amplitude` for delivery at `step`
    pub fn push(&mut self, step: u64, amplitude: f64) {
        *self.pending.entry(step).or_insert(0.0) += amplitude;
    }

    /// Remove and return the amplitude due at `step`, 0 if none
    pub fn consume(&mut self, step: u64) -> f64 {
        self.pending.remove(&step).unwrap_or(0.0)
    }

    /// Amplitude due at `step` without removing it
    pub fn peek(&self, step: u64) -> f64 {
        self.pending.get(&step).copied().unwrap_or(0.0)
    }

    /// Number of steps with pending input
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True when nothing is pending
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Earliest step with pending input
    pub fn next_delivery(&self) -> Option<u64> {
        self.pending.keys().next().copied()
    }
}
