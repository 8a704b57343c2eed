//! Simulation constants for the Brunel balanced network
//!
//! [`BrunelConfig`] is an immutable value built once and shared by the
//! [`Network`](crate::Network) and every neuron it owns. The defaults are the
//! reference model constants: 12 500 neurons split 10 000 / 2 500, 10 %
//! connection probability, 0.1 ms time step and a 1.5 ms transmission delay.

use crate::error::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Named parameters of a Brunel network simulation
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BrunelConfig {
    /// Time step (ms)
    pub dt_ms: f64,
    /// Steps per millisecond, the inverse of `dt_ms`
    pub steps_per_ms: u64,
    /// Excitatory sub-population size
    pub n_excitatory: usize,
    /// Inhibitory sub-population size
    pub n_inhibitory: usize,
    /// Excitatory in-degree of every neuron
    pub c_excitatory: usize,
    /// Inhibitory in-degree of every neuron
    pub c_inhibitory: usize,
    /// Excitatory synaptic amplitude (mV)
    pub j_excitatory: f64,
    /// Relative strength of inhibition, `g` in J_I = -g * J_E
    pub inhibition_ratio: f64,
    /// Transmission delay (steps)
    pub delay_steps: u64,
    /// Membrane time constant (ms)
    pub tau_ms: f64,
    /// Membrane capacitance (pF)
    pub capacitance: f64,
    /// Spike threshold (mV)
    pub v_threshold: f64,
    /// Reset potential (mV)
    pub v_reset: f64,
    /// Refractory period (steps)
    pub refractory_steps: u64,
    /// External drive relative to the threshold rate, `nu_ext / nu_thr`
    pub external_ratio: f64,
}

impl Default for BrunelConfig {
    fn default() -> Self {
        Self {
            dt_ms: 0.1,
            steps_per_ms: 10,
            n_excitatory: 10_000,
            n_inhibitory: 2_500,
            c_excitatory: 1_000,
            c_inhibitory: 250,
            j_excitatory: 0.1,
            inhibition_ratio: 5.0,
            delay_steps: 15,
            tau_ms: 20.0,
            capacitance: 1.0,
            v_threshold: 20.0,
            v_reset: 0.0,
            refractory_steps: 20,
            external_ratio: 2.0,
        }
    }
}

impl BrunelConfig {
    /// Scaled copy of the reference network with `n_excitatory` excitatory
    /// neurons, a 4:1 E/I split and 10 % connection probability.
    pub fn scaled(n_excitatory: usize) -> Self {
        let n_inhibitory = n_excitatory / 4;
        Self {
            n_excitatory,
            n_inhibitory,
            c_excitatory: n_excitatory / 10,
            c_inhibitory: n_inhibitory / 10,
            ..Self::default()
        }
    }

    /// Validate parameters
    pub fn validate(&self) -> Result<()> {
        if !(self.dt_ms > 0.0) || !self.dt_ms.is_finite() {
            return Err(BrunelError::invalid_argument(
                "dt_ms",
                self.dt_ms.to_string(),
                "> 0.0",
            ));
        }
        if self.steps_per_ms == 0 {
            return Err(BrunelError::invalid_argument("steps_per_ms", "0", "> 0"));
        }
        if (self.dt_ms * self.steps_per_ms as f64 - 1.0).abs() > 1e-9 {
            return Err(BrunelError::invalid_config(format!(
                "steps_per_ms={} does not match dt_ms={}",
                self.steps_per_ms, self.dt_ms
            )));
        }
        if self.delay_steps == 0 {
            return Err(BrunelError::invalid_argument("delay_steps", "0", ">= 1"));
        }
        if !(self.tau_ms > 0.0) {
            return Err(BrunelError::invalid_argument(
                "tau_ms",
                self.tau_ms.to_string(),
                "> 0.0",
            ));
        }
        if !(self.capacitance > 0.0) {
            return Err(BrunelError::invalid_argument(
                "capacitance",
                self.capacitance.to_string(),
                "> 0.0",
            ));
        }
        if !(self.v_threshold > self.v_reset) {
            return Err(BrunelError::invalid_argument(
                "v_threshold",
                format!("{} (with v_reset={})", self.v_threshold, self.v_reset),
                "> v_reset",
            ));
        }
        if !self.j_excitatory.is_finite() {
            return Err(BrunelError::invalid_argument(
                "j_excitatory",
                self.j_excitatory.to_string(),
                "finite",
            ));
        }
        if !(self.inhibition_ratio >= 0.0) {
            return Err(BrunelError::invalid_argument(
                "inhibition_ratio",
                self.inhibition_ratio.to_string(),
                ">= 0.0",
            ));
        }
        if !(self.external_ratio >= 0.0) {
            return Err(BrunelError::invalid_argument(
                "external_ratio",
                self.external_ratio.to_string(),
                ">= 0.0",
            ));
        }
        Ok(())
    }

    /// Total neuron count of the split population
    pub fn population(&self) -> usize {
        self.n_excitatory + self.n_inhibitory
    }

    /// Total in-degree of every neuron
    pub fn c_total(&self) -> usize {
        self.c_excitatory + self.c_inhibitory
    }

    /// Membrane resistance, tau / C (ms/pF)
    pub fn resistance(&self) -> f64 {
        self.tau_ms / self.capacitance
    }

    /// Inhibitory synaptic amplitude (mV), negative
    pub fn j_inhibitory(&self) -> f64 {
        -self.j_excitatory * self.inhibition_ratio
    }

    /// Per-step membrane decay factor, exp(-dt / tau)
    pub fn membrane_decay(&self) -> f64 {
        (-self.dt_ms / self.tau_ms).exp()
    }

    /// External spike rate per excitatory synapse (spikes/ms)
    pub fn external_rate(&self) -> f64 {
        let denominator = self.c_excitatory as f64 * self.j_excitatory * self.tau_ms;
        if denominator <= 0.0 {
            return 0.0;
        }
        self.external_ratio * self.v_threshold / denominator
    }

    /// Expected number of external events reaching one neuron per step
    pub fn external_events_per_step(&self) -> f64 {
        self.external_rate() * self.c_excitatory as f64 * self.dt_ms
    }

    /// Convert milliseconds to steps, rounding to the nearest step
    pub fn ms_to_steps(&self, ms: f64) -> Result<u64> {
        if !ms.is_finite() || ms < 0.0 {
            return Err(BrunelError::invalid_argument(
                "ms",
                ms.to_string(),
                "finite and >= 0.0",
            ));
        }
        Ok((ms * self.steps_per_ms as f64).round() as u64)
    }

    /// Convert steps to milliseconds
    pub fn steps_to_ms(&self, steps: u64) -> f64 {
        steps as f64 * self.dt_ms
    }
}
