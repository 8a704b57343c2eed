//! Random sparse connectivity for balanced networks
//!
//! Every neuron draws a fixed number of excitatory and inhibitory presynaptic
//! partners uniformly, with replacement, from the matching sub-population.
//! The in-degree is therefore exact while the out-degree is binomial around
//! the same mean. Self-connections and parallel edges are kept.

use crate::{
    config::BrunelConfig,
    error::*,
    neuron::{Neuron, NeuronKind},
};
use core::ops::Range;
use rand::{distributions::Uniform, Rng};

/// Assignment of population indices to sub-populations
///
/// Indices below `n_excitatory` are excitatory, the rest inhibitory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopulationLayout {
    size: usize,
    n_excitatory: usize,
}

impl PopulationLayout {
    /// Excitatory/inhibitory split taken from the configuration
    pub fn split(config: &BrunelConfig, size: usize) -> Result<Self> {
        if size != config.population() {
            return Err(BrunelError::invalid_config(format!(
                "population split needs {} + {} = {} neurons, got {}",
                config.n_excitatory,
                config.n_inhibitory,
                config.population(),
                size
            )));
        }
        Ok(Self {
            size,
            n_excitatory: config.n_excitatory,
        })
    }

    /// Single excitatory population
    pub fn uniform(size: usize) -> Self {
        Self {
            size,
            n_excitatory: size,
        }
    }

    /// Population size
    pub fn size(&self) -> usize {
        self.size
    }

    /// Sub-population of `index`
    pub fn kind_of(&self, index: usize) -> NeuronKind {
        if index < self.n_excitatory {
            NeuronKind::Excitatory
        } else {
            NeuronKind::Inhibitory
        }
    }

    /// Indices of excitatory neurons
    pub fn excitatory_range(&self) -> Range<usize> {
        0..self.n_excitatory
    }

    /// Indices of inhibitory neurons
    pub fn inhibitory_range(&self) -> Range<usize> {
        self.n_excitatory..self.size
    }
}

/// Generator of fixed in-degree random graphs
#[derive(Debug, Clone)]
pub struct ConnectivityGenerator {
    layout: PopulationLayout,
    c_excitatory: usize,
    c_inhibitory: usize,
}

impl ConnectivityGenerator {
    /// Create a generator drawing `c_excitatory` + `c_inhibitory` sources per neuron
    pub fn new(layout: PopulationLayout, c_excitatory: usize, c_inhibitory: usize) -> Self {
        Self {
            layout,
            c_excitatory,
            c_inhibitory,
        }
    }

    /// Generator using the configured in-degrees
    pub fn from_config(layout: PopulationLayout, config: &BrunelConfig) -> Self {
        Self::new(layout, config.c_excitatory, config.c_inhibitory)
    }

    /// Edges created by one call to [`wire`](Self::wire)
    pub fn edge_count(&self) -> usize {
        self.layout.size() * (self.c_excitatory + self.c_inhibitory)
    }

    /// Register random incoming connections for every neuron
    ///
    /// Each drawn source gets an outgoing connection to the target through
    /// [`Neuron::add_connection`]. Returns the number of edges created.
    pub fn wire<R: Rng>(&self, neurons: &mut [Neuron], rng: &mut R) -> Result<usize> {
        if neurons.len() != self.layout.size() {
            return Err(BrunelError::invalid_config(format!(
                "layout covers {} neurons, population has {}",
                self.layout.size(),
                neurons.len()
            )));
        }

        let excitatory = Self::sampler(self.layout.excitatory_range(), self.c_excitatory, "excitatory")?;
        let inhibitory = Self::sampler(self.layout.inhibitory_range(), self.c_inhibitory, "inhibitory")?;

        let mut edges = 0;
        for target in 0..neurons.len() {
            for (sampler, in_degree) in [(&excitatory, self.c_excitatory), (&inhibitory, self.c_inhibitory)] {
                let Some(sampler) = sampler else { continue };
                for _ in 0..in_degree {
                    let source = rng.sample(sampler);
                    neurons[source].add_connection(target)?;
                    edges += 1;
                }
            }
        }

        log::debug!(
            "Wired {} edges over {} neurons (C_E={}, C_I={})",
            edges,
            neurons.len(),
            self.c_excitatory,
            self.c_inhibitory
        );
        Ok(edges)
    }

    fn sampler(range: Range<usize>, in_degree: usize, name: &str) -> Result<Option<Uniform<usize>>> {
        if in_degree == 0 {
            return Ok(None);
        }
        if range.is_empty() {
            return Err(BrunelError::invalid_config(format!(
                "{} in-degree is {} but the {} population is empty",
                name, in_degree, name
            )));
        }
        Ok(Some(Uniform::new(range.start, range.end)))
    }
}
