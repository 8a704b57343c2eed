//! Brunel network: population, global clock and spike delivery

use crate::{
    config::BrunelConfig,
    connectivity::{ConnectivityGenerator, PopulationLayout},
    drive::{DriveMode, ExternalDrive},
    error::*,
    neuron::{Neuron, NeuronIndex, StepInput},
    stats::PopulationStats,
};
use rand::{rngs::StdRng, SeedableRng};
use std::sync::Arc;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Seed used when none is given
pub const DEFAULT_SEED: u64 = 42;

/// Construction options of a [`Network`]
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkOptions {
    /// Keep the full potential trace of every neuron
    pub record_potentials: bool,
    /// Feed scheduled injected currents into the membrane
    pub injected_current: bool,
    /// Background input mode
    pub external_drive: DriveMode,
    /// Deliver spikes along outgoing connections
    pub connections: bool,
    /// Split the population into excitatory and inhibitory neurons
    pub population_split: bool,
    /// Generate random connectivity at construction
    pub random_connectivity: bool,
    /// Seed of the network random source
    pub seed: u64,
}

impl Default for NetworkOptions {
    fn default() -> Self {
        Self {
            record_potentials: false,
            injected_current: true,
            external_drive: DriveMode::Disabled,
            connections: true,
            population_split: false,
            random_connectivity: false,
            seed: DEFAULT_SEED,
        }
    }
}

impl NetworkOptions {
    /// Options from the five positional flags of the reference model
    ///
    /// `default_current` enables the injected-current channel used by
    /// single-neuron runs. The Poisson background drive comes with the
    /// population split, so it only reaches split E/I populations.
    pub fn from_flags(
        record_potentials: bool,
        default_current: bool,
        connections: bool,
        population_split: bool,
        random_connectivity: bool,
    ) -> Self {
        Self {
            record_potentials,
            injected_current: default_current,
            external_drive: if population_split {
                DriveMode::Poisson
            } else {
                DriveMode::Disabled
            },
            connections,
            population_split,
            random_connectivity,
            seed: DEFAULT_SEED,
        }
    }

    /// Enable potential recording
    pub fn with_potential_recording(mut self, enabled: bool) -> Self {
        self.record_potentials = enabled;
        self
    }

    /// Enable or disable the injected-current channel
    pub fn with_injected_current(mut self, enabled: bool) -> Self {
        self.injected_current = enabled;
        self
    }

    /// Set the background input mode
    pub fn with_external_drive(mut self, mode: DriveMode) -> Self {
        self.external_drive = mode;
        self
    }

    /// Enable or disable spike delivery
    pub fn with_connections(mut self, enabled: bool) -> Self {
        self.connections = enabled;
        self
    }

    /// Enable the excitatory/inhibitory split
    pub fn with_population_split(mut self, enabled: bool) -> Self {
        self.population_split = enabled;
        self
    }

    /// Enable random connectivity
    pub fn with_random_connectivity(mut self, enabled: bool) -> Self {
        self.random_connectivity = enabled;
        self
    }

    /// Set random seed for reproducibility
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Full Brunel setup: split population, random wiring, Poisson drive
    pub fn balanced() -> Self {
        Self::default()
            .with_external_drive(DriveMode::Poisson)
            .with_population_split(true)
            .with_random_connectivity(true)
    }
}

/// Population of LIF neurons advanced in fixed steps
#[derive(Debug)]
pub struct Network {
    config: Arc<BrunelConfig>,
    options: NetworkOptions,
    layout: PopulationLayout,
    /// Arena indexed by neuron index, never reordered
    neurons: Vec<Neuron>,
    drive: ExternalDrive,
    rng: StdRng,
    current_step: u64,
    edges: usize,
    /// External jumps of the step being computed
    external: Vec<f64>,
    /// Neurons that spiked during the last step, ascending
    spiked: Vec<NeuronIndex>,
}

impl Network {
    /// Build a network of `population` neurons
    pub fn new(
        population: usize,
        config: impl Into<Arc<BrunelConfig>>,
        options: NetworkOptions,
    ) -> Result<Self> {
        let config = config.into();
        config.validate()?;

        if population == 0 {
            return Err(BrunelError::invalid_config("population must not be empty"));
        }
        if population - 1 > u32::MAX as usize {
            return Err(BrunelError::invalid_config(format!(
                "population of {} exceeds the neuron index range",
                population
            )));
        }

        let layout = if options.population_split {
            PopulationLayout::split(&config, population)?
        } else {
            PopulationLayout::uniform(population)
        };

        let mut neurons = (0..population)
            .map(|i| Neuron::new(i, layout.kind_of(i), &config, population, options.record_potentials))
            .collect::<Result<Vec<_>>>()?;

        let drive = ExternalDrive::new(options.external_drive, &config)?;
        let mut rng = StdRng::seed_from_u64(options.seed);

        let mut edges = 0;
        if options.random_connectivity {
            if !options.connections {
                log::warn!("Random connectivity requested with connections disabled; skipping wiring");
            } else if !options.population_split {
                return Err(BrunelError::invalid_config(
                    "random connectivity requires the excitatory/inhibitory population split",
                ));
            } else {
                let generator = ConnectivityGenerator::from_config(layout, &config);
                edges = generator.wire(&mut neurons, &mut rng)?;
            }
        }

        log::info!(
            "Built network: {} neurons ({} excitatory), {} edges, drive {:?}, seed {}",
            population,
            layout.excitatory_range().len(),
            edges,
            options.external_drive,
            options.seed
        );

        Ok(Self {
            config,
            options,
            layout,
            neurons,
            drive,
            rng,
            current_step: 0,
            edges,
            external: vec![0.0; population],
            spiked: Vec::new(),
        })
    }

    /// Build a network from the five positional flags of the reference model
    pub fn with_flags(
        population: usize,
        config: impl Into<Arc<BrunelConfig>>,
        record_potentials: bool,
        default_current: bool,
        connections: bool,
        population_split: bool,
        random_connectivity: bool,
    ) -> Result<Self> {
        let options = NetworkOptions::from_flags(
            record_potentials,
            default_current,
            connections,
            population_split,
            random_connectivity,
        );
        Self::new(population, config, options)
    }

    /// Advance every neuron by one step
    ///
    /// All neurons integrate the input due at the current step before any
    /// spike of this step is delivered; deliveries land `delay_steps` ahead.
    /// Returns the neurons that spiked.
    pub fn step(&mut self) -> &[NeuronIndex] {
        let now = self.current_step;

        // Drawn sequentially so the trajectory does not depend on scheduling
        if !self.drive.is_disabled() {
            for jump in self.external.iter_mut() {
                *jump = self.drive.sample(&mut self.rng);
            }
        }

        self.spiked.clear();
        let injected = self.options.injected_current;

        #[cfg(feature = "parallel")]
        {
            let spiked: Vec<NeuronIndex> = self
                .neurons
                .par_iter_mut()
                .zip(self.external.par_iter())
                .filter_map(|(neuron, &external)| Self::advance(neuron, now, injected, external))
                .collect();
            self.spiked.extend(spiked);
        }

        #[cfg(not(feature = "parallel"))]
        {
            let spiked = self
                .neurons
                .iter_mut()
                .zip(self.external.iter())
                .filter_map(|(neuron, &external)| Self::advance(neuron, now, injected, external));
            self.spiked.extend(spiked);
        }

        if self.options.connections {
            self.deliver(now + self.config.delay_steps);
        }

        self.current_step += 1;
        &self.spiked
    }

    /// Integrate one neuron, returning its index if it spiked
    fn advance(neuron: &mut Neuron, now: u64, injected: bool, external: f64) -> Option<NeuronIndex> {
        let input = StepInput {
            current: if injected { neuron.current_at(now) } else { 0.0 },
            psp: neuron.consume_buffered_at(now) + external,
        };
        neuron.integrate_step(now, input).then(|| neuron.index())
    }

    /// Push the spikes of this step into the target delay lines
    fn deliver(&mut self, delivery_step: u64) {
        for &source in &self.spiked {
            let source = source.as_usize();
            for k in 0..self.neurons[source].out_degree() {
                let synapse = self.neurons[source].connections()[k];
                self.neurons[synapse.target.as_usize()].receive_at(delivery_step, synapse.amplitude);
            }
        }
    }

    /// Run `steps` steps and return the population for inspection
    pub fn run(&mut self, steps: u64) -> &[Neuron] {
        self.run_with(steps, |_, _| {})
    }

    /// Run for `duration_ms` milliseconds
    pub fn run_ms(&mut self, duration_ms: f64) -> Result<&[Neuron]> {
        let steps = self.config.ms_to_steps(duration_ms)?;
        Ok(self.run(steps))
    }

    /// Run `steps` steps, handing every step's spikes to `observer`
    pub fn run_with<F>(&mut self, steps: u64, mut observer: F) -> &[Neuron]
    where
        F: FnMut(u64, &[NeuronIndex]),
    {
        log::info!(
            "Starting run: {} steps ({}ms) from step {}",
            steps,
            self.config.steps_to_ms(steps),
            self.current_step
        );

        let mut spike_count = 0usize;
        for i in 0..steps {
            let step = self.current_step;
            let spiked = self.step();
            spike_count += spiked.len();
            observer(step, spiked);

            if i % (steps / 10).max(1) == 0 {
                let progress = (i as f64 / steps as f64) * 100.0;
                log::debug!("Run progress: {:.1}%", progress);
            }
        }

        log::info!("Run completed: {} spikes in {} steps", spike_count, steps);
        &self.neurons
    }

    /// Schedule injected current for one neuron over `[start_ms, stop_ms)`
    pub fn set_current(&mut self, amplitude: f64, index: usize, start_ms: f64, stop_ms: f64) -> Result<()> {
        let len = self.neurons.len();
        if index >= len {
            return Err(BrunelError::out_of_bounds(index, len));
        }
        let start = self.config.ms_to_steps(start_ms)?;
        let stop = self.config.ms_to_steps(stop_ms)?;
        self.neurons[index].schedule_current(amplitude, start, stop)
    }

    /// Injected current of neuron `index` at `step`
    pub fn current(&self, index: usize, step: u64) -> Result<f64> {
        Ok(self.neuron(index)?.current_at(step))
    }

    /// Neuron at `index`
    pub fn neuron(&self, index: usize) -> Result<&Neuron> {
        self.neurons
            .get(index)
            .ok_or(BrunelError::out_of_bounds(index, self.neurons.len()))
    }

    /// Mutable neuron at `index`
    ///
    /// Input queued through the returned neuron bypasses the clock check of
    /// [`Network::receive_at`].
    pub fn neuron_mut(&mut self, index: usize) -> Result<&mut Neuron> {
        let len = self.neurons.len();
        self.neurons
            .get_mut(index)
            .ok_or(BrunelError::out_of_bounds(index, len))
    }

    /// Queue `amplitude` for neuron `index` at absolute `step`
    ///
    /// Steps the clock has already passed are rejected; input queued there
    /// would never be consumed.
    pub fn receive_at(&mut self, index: usize, step: u64, amplitude: f64) -> Result<()> {
        if step < self.current_step {
            return Err(BrunelError::invalid_argument(
                "step",
                step.to_string(),
                format!(">= current step ({})", self.current_step),
            ));
        }
        if !amplitude.is_finite() {
            return Err(BrunelError::invalid_argument(
                "amplitude",
                amplitude.to_string(),
                "finite",
            ));
        }
        self.neuron_mut(index)?.receive_at(step, amplitude);
        Ok(())
    }

    /// Add a connection from `source` to `target`
    pub fn connect(&mut self, source: usize, target: usize) -> Result<()> {
        self.neuron_mut(source)?.add_connection(target)?;
        self.edges += 1;
        Ok(())
    }

    /// All neurons, by index
    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    /// Population size
    pub fn len(&self) -> usize {
        self.neurons.len()
    }

    /// Always false for a constructed network
    pub fn is_empty(&self) -> bool {
        self.neurons.is_empty()
    }

    /// Next step to be simulated
    pub fn current_step(&self) -> u64 {
        self.current_step
    }

    /// Simulated time (ms)
    pub fn current_time_ms(&self) -> f64 {
        self.config.steps_to_ms(self.current_step)
    }

    /// Simulation constants
    pub fn config(&self) -> &BrunelConfig {
        &self.config
    }

    /// Construction options
    pub fn options(&self) -> &NetworkOptions {
        &self.options
    }

    /// Sub-population layout
    pub fn layout(&self) -> &PopulationLayout {
        &self.layout
    }

    /// Number of connections in the network
    pub fn edge_count(&self) -> usize {
        self.edges
    }

    /// Activity summary up to the current step
    pub fn stats(&self) -> PopulationStats {
        PopulationStats::collect(&self.neurons, self.current_step, &self.config)
    }

    /// All recorded spikes as `(step, neuron)`, ordered by step then neuron
    pub fn spike_raster(&self) -> Vec<(u64, NeuronIndex)> {
        let mut raster: Vec<_> = self
            .neurons
            .iter()
            .flat_map(|neuron| neuron.spike_times().iter().map(move |&t| (t, neuron.index())))
            .collect();
        raster.sort_unstable();
        raster
    }
}
