//! Fixed-step simulator for Brunel balanced networks
//!
//! A population of leaky integrate-and-fire neurons, split into excitatory
//! and inhibitory sub-populations, is wired with fixed in-degree random
//! connectivity and advanced in discrete time steps. Spikes reach their
//! targets through per-neuron delay lines after a fixed transmission delay.
//!
//! ```no_run
//! use brunel_core::{BrunelConfig, Network, NetworkOptions};
//!
//! let config = BrunelConfig::default();
//! let mut network = Network::new(config.population(), config, NetworkOptions::balanced())?;
//! network.run_ms(100.0)?;
//! println!("mean spikes per neuron: {:.2}", network.stats().mean_spike_count);
//! # Ok::<(), brunel_core::BrunelError>(())
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod config;
pub mod connectivity;
pub mod delay;
pub mod drive;
pub mod error;
pub mod network;
pub mod neuron;
pub mod stats;

// Re-export essential types
pub use config::BrunelConfig;
pub use connectivity::{ConnectivityGenerator, PopulationLayout};
pub use delay::DelayBuffer;
pub use drive::{DriveMode, ExternalDrive};
pub use error::{BrunelError, Result};
pub use network::{Network, NetworkOptions, DEFAULT_SEED};
pub use neuron::{
    CurrentSchedule, MembraneParams, Neuron, NeuronIndex, NeuronKind, NeuronState, StepInput,
    Synapse,
};
pub use stats::PopulationStats;
