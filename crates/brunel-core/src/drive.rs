//! Background input from outside the simulated population
//!
//! Each neuron receives external spikes from `C_E` independent sources firing
//! at `nu_ext`; every event raises the potential by `J_E`.

use crate::{config::BrunelConfig, error::*};
use rand::Rng;
use rand_distr::{Distribution, Poisson};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How the external background input is generated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum DriveMode {
    /// No background input
    #[default]
    Disabled,
    /// Poisson-distributed event count per neuron and step
    Poisson,
    /// Deterministic expected jump per step
    MeanField,
}

/// Sampler for the per-step external jump of a single neuron
#[derive(Debug, Clone)]
pub enum ExternalDrive {
    /// No background input
    Disabled,
    /// `J_E * k` with `k ~ Poisson(nu_ext * C_E * dt)`
    Poisson {
        /// Event count distribution
        events: Poisson<f64>,
        /// Expected events per step
        lambda: f64,
        /// Jump per event (mV)
        amplitude: f64,
    },
    /// `J_E * nu_ext * C_E * dt` every step
    MeanField {
        /// Jump per step (mV)
        jump: f64,
    },
}

impl ExternalDrive {
    /// Build the sampler for `mode` from the configured external rate
    pub fn new(mode: DriveMode, config: &BrunelConfig) -> Result<Self> {
        let lambda = config.external_events_per_step();
        match mode {
            DriveMode::Disabled => Ok(Self::Disabled),
            _ if lambda == 0.0 => Ok(Self::Disabled),
            DriveMode::Poisson => {
                let events = Poisson::new(lambda).map_err(|e| {
                    BrunelError::invalid_argument("external_rate", lambda.to_string(), e.to_string())
                })?;
                Ok(Self::Poisson {
                    events,
                    lambda,
                    amplitude: config.j_excitatory,
                })
            }
            DriveMode::MeanField => Ok(Self::MeanField {
                jump: config.j_excitatory * lambda,
            }),
        }
    }

    /// True when no input is generated
    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Disabled)
    }

    /// Mean jump per step (mV)
    pub fn mean_jump(&self) -> f64 {
        match self {
            Self::Disabled => 0.0,
            Self::Poisson { lambda, amplitude, .. } => lambda * amplitude,
            Self::MeanField { jump } => *jump,
        }
    }

    /// Draw the external jump of one neuron for one step
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        match self {
            Self::Disabled => 0.0,
            Self::Poisson { events, amplitude, .. } => events.sample(rng) * amplitude,
            Self::MeanField { jump } => *jump,
        }
    }
}
