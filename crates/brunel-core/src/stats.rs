//! Population activity summaries

use crate::{
    config::BrunelConfig,
    neuron::{Neuron, NeuronKind},
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Spike-count and connectivity summary over a population
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PopulationStats {
    /// Number of neurons summarised
    pub neurons: usize,
    /// Steps simulated so far
    pub elapsed_steps: u64,
    /// Total spikes across the population
    pub total_spikes: usize,
    /// Mean spikes per neuron
    pub mean_spike_count: f64,
    /// Mean spikes per excitatory neuron
    pub mean_excitatory_spikes: f64,
    /// Mean spikes per inhibitory neuron
    pub mean_inhibitory_spikes: f64,
    /// Mean firing rate (Hz)
    pub mean_rate_hz: f64,
    /// Mean number of outgoing connections
    pub mean_out_degree: f64,
}

impl PopulationStats {
    /// Summarise `neurons` after `elapsed_steps` steps
    pub fn collect(neurons: &[Neuron], elapsed_steps: u64, config: &BrunelConfig) -> Self {
        let mut stats = Self {
            neurons: neurons.len(),
            elapsed_steps,
            ..Self::default()
        };
        if neurons.is_empty() {
            return stats;
        }

        let (mut excitatory, mut inhibitory) = ((0usize, 0usize), (0usize, 0usize));
        let mut edges = 0usize;
        for neuron in neurons {
            let count = neuron.spike_count();
            let bucket = match neuron.kind() {
                NeuronKind::Excitatory => &mut excitatory,
                NeuronKind::Inhibitory => &mut inhibitory,
            };
            bucket.0 += 1;
            bucket.1 += count;
            stats.total_spikes += count;
            edges += neuron.out_degree();
        }

        stats.mean_spike_count = stats.total_spikes as f64 / neurons.len() as f64;
        stats.mean_excitatory_spikes = mean(excitatory);
        stats.mean_inhibitory_spikes = mean(inhibitory);
        stats.mean_out_degree = edges as f64 / neurons.len() as f64;

        let elapsed_s = config.steps_to_ms(elapsed_steps) / 1_000.0;
        if elapsed_s > 0.0 {
            stats.mean_rate_hz = stats.mean_spike_count / elapsed_s;
        }
        stats
    }
}

fn mean((neurons, spikes): (usize, usize)) -> f64 {
    if neurons == 0 {
        0.0
    } else {
        spikes as f64 / neurons as f64
    }
}
