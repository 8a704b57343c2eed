//! Leaky integrate-and-fire point neuron
//!
//! Each [`Neuron`] carries its own integration state, spike history, outgoing
//! connections, incoming delay line and injected-current schedule. The
//! [`Network`](crate::Network) owns all neurons and drives them one step at a
//! time through [`Neuron::integrate_step`].

use crate::{config::BrunelConfig, delay::DelayBuffer, error::*};
use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Position of a neuron in its population, fixed for its lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NeuronIndex(pub u32);

impl NeuronIndex {
    /// Create a new neuron index
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Get the raw index value
    pub const fn raw(&self) -> u32 {
        self.0
    }

    /// Index as a slice position
    pub const fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NeuronIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{}", self.0)
    }
}

/// Sub-population membership, which fixes the sign of outgoing synapses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NeuronKind {
    /// Positive outgoing amplitude
    Excitatory,
    /// Negative outgoing amplitude, scaled by the inhibition ratio
    Inhibitory,
}

impl NeuronKind {
    /// Signed amplitude carried by every outgoing synapse of this kind
    pub fn efficacy(self, config: &BrunelConfig) -> f64 {
        match self {
            NeuronKind::Excitatory => config.j_excitatory,
            NeuronKind::Inhibitory => config.j_inhibitory(),
        }
    }
}

/// Lifecycle state of a neuron
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeuronState {
    /// Membrane potential follows its input
    Integrating,
    /// Potential held at reset for `remaining` more steps
    Refractory {
        /// Steps left before integration resumes
        remaining: u64,
    },
}

/// Membrane constants shared by every neuron of a network
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MembraneParams {
    /// Per-step decay factor exp(-dt / tau)
    pub decay: f64,
    /// Membrane resistance (ms/pF)
    pub resistance: f64,
    /// Spike threshold (mV)
    pub v_threshold: f64,
    /// Reset potential (mV)
    pub v_reset: f64,
    /// Refractory period (steps)
    pub refractory_steps: u64,
}

impl MembraneParams {
    /// Derive the membrane constants from a configuration
    pub fn from_config(config: &BrunelConfig) -> Self {
        Self {
            decay: config.membrane_decay(),
            resistance: config.resistance(),
            v_threshold: config.v_threshold,
            v_reset: config.v_reset,
            refractory_steps: config.refractory_steps,
        }
    }
}

/// Injected current active on the half-open step window `[start, stop)`
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CurrentSchedule {
    /// Current amplitude (pA)
    pub amplitude: f64,
    /// First step with current
    pub start: u64,
    /// First step without current
    pub stop: u64,
}

impl CurrentSchedule {
    /// Create a schedule; an empty or inverted window is rejected
    pub fn new(amplitude: f64, start: u64, stop: u64) -> Result<Self> {
        if !amplitude.is_finite() {
            return Err(BrunelError::invalid_argument(
                "amplitude",
                amplitude.to_string(),
                "finite",
            ));
        }
        if stop <= start {
            return Err(BrunelError::invalid_argument(
                "stop_step",
                stop.to_string(),
                format!("> start_step ({})", start),
            ));
        }
        Ok(Self {
            amplitude,
            start,
            stop,
        })
    }

    /// Current injected at `step`
    pub fn at(&self, step: u64) -> f64 {
        if (self.start..self.stop).contains(&step) {
            self.amplitude
        } else {
            0.0
        }
    }
}

/// Outgoing connection with its signed amplitude (mV)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Synapse {
    /// Post-synaptic neuron
    pub target: NeuronIndex,
    /// Amplitude delivered to the target per spike
    pub amplitude: f64,
}

/// Input seen by a neuron during one step
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepInput {
    /// Injected current (pA), integrated through the membrane resistance
    pub current: f64,
    /// Instantaneous potential jump (mV) from delivered spikes and external events
    pub psp: f64,
}

impl StepInput {
    /// Input made of injected current only
    pub fn current(current: f64) -> Self {
        Self { current, psp: 0.0 }
    }
}

/// Leaky integrate-and-fire neuron
#[derive(Debug, Clone)]
pub struct Neuron {
    index: NeuronIndex,
    kind: NeuronKind,
    params: MembraneParams,
    /// Signed amplitude of every outgoing synapse
    efficacy: f64,
    /// Exclusive upper bound on connection targets
    population: usize,
    potential: f64,
    state: NeuronState,
    spikes: Vec<u64>,
    record_potentials: bool,
    trace: Vec<f64>,
    connections: Vec<Synapse>,
    buffer: DelayBuffer,
    schedule: Option<CurrentSchedule>,
}

impl Neuron {
    /// Create a neuron at `index` in a population of `population` neurons
    pub fn new(
        index: usize,
        kind: NeuronKind,
        config: &BrunelConfig,
        population: usize,
        record_potentials: bool,
    ) -> Result<Self> {
        config.validate()?;
        if index >= population {
            return Err(BrunelError::out_of_bounds(index, population));
        }
        let raw = u32::try_from(index).map_err(|_| {
            BrunelError::invalid_argument("index", index.to_string(), "<= u32::MAX")
        })?;

        Ok(Self {
            index: NeuronIndex::new(raw),
            kind,
            params: MembraneParams::from_config(config),
            efficacy: kind.efficacy(config),
            population,
            potential: config.v_reset,
            state: NeuronState::Integrating,
            spikes: Vec::new(),
            record_potentials,
            trace: Vec::new(),
            connections: Vec::new(),
            buffer: DelayBuffer::new(),
            schedule: None,
        })
    }

    /// Advance the neuron by exactly one step
    ///
    /// The threshold test applies to the potential carried into the step: a
    /// neuron whose potential exceeds threshold spikes at `step`, resets and
    /// holds the reset potential for `refractory_steps` steps, ignoring all
    /// input. Otherwise the membrane relaxes exactly towards `R * I` over one
    /// step and the delivered jumps are added on top. Returns `true` if the
    /// neuron spiked.
    pub fn integrate_step(&mut self, step: u64, input: StepInput) -> bool {
        let mut spiked = false;

        if self.state == NeuronState::Integrating && self.potential > self.params.v_threshold {
            self.spikes.push(step);
            self.potential = self.params.v_reset;
            if self.params.refractory_steps > 0 {
                self.state = NeuronState::Refractory {
                    remaining: self.params.refractory_steps,
                };
            }
            spiked = true;
        }

        match self.state {
            NeuronState::Refractory { remaining } => {
                self.potential = self.params.v_reset;
                self.state = if remaining <= 1 {
                    NeuronState::Integrating
                } else {
                    NeuronState::Refractory {
                        remaining: remaining - 1,
                    }
                };
            }
            NeuronState::Integrating => {
                // v(t + dt) = v_inf + (v(t) - v_inf) * exp(-dt / tau); never overshoots v_inf
                let v_inf = self.params.resistance * input.current;
                self.potential = v_inf + (self.potential - v_inf) * self.params.decay + input.psp;
            }
        }

        if self.record_potentials {
            self.trace.push(self.potential);
        }

        spiked
    }

    /// Replace the injected-current schedule
    pub fn schedule_current(&mut self, amplitude: f64, start_step: u64, stop_step: u64) -> Result<()> {
        self.schedule = Some(CurrentSchedule::new(amplitude, start_step, stop_step)?);
        Ok(())
    }

    /// Remove the injected-current schedule
    pub fn clear_current(&mut self) {
        self.schedule = None;
    }

    /// Active schedule, if any
    pub fn schedule(&self) -> Option<&CurrentSchedule> {
        self.schedule.as_ref()
    }

    /// Injected current at `step`
    pub fn current_at(&self, step: u64) -> f64 {
        self.schedule.map_or(0.0, |schedule| schedule.at(step))
    }

    /// Queue `amplitude` for delivery at absolute `step`
    pub fn receive_at(&mut self, step: u64, amplitude: f64) {
        self.buffer.push(step, amplitude);
    }

    /// Take the input due at `step` out of the delay line
    pub fn consume_buffered_at(&mut self, step: u64) -> f64 {
        self.buffer.consume(step)
    }

    /// Input due at `step`, left in the delay line
    pub fn peek_buffered_at(&self, step: u64) -> f64 {
        self.buffer.peek(step)
    }

    /// Number of steps with undelivered input
    pub fn pending_deliveries(&self) -> usize {
        self.buffer.len()
    }

    /// Add an outgoing connection to `target`
    pub fn add_connection(&mut self, target: usize) -> Result<()> {
        if target >= self.population {
            return Err(BrunelError::out_of_bounds(target, self.population));
        }
        // population <= u32::MAX + 1 was checked when the neuron was created
        self.connections.push(Synapse {
            target: NeuronIndex::new(target as u32),
            amplitude: self.efficacy,
        });
        Ok(())
    }

    /// Neuron index
    pub fn index(&self) -> NeuronIndex {
        self.index
    }

    /// Sub-population membership
    pub fn kind(&self) -> NeuronKind {
        self.kind
    }

    /// Signed outgoing amplitude
    pub fn efficacy(&self) -> f64 {
        self.efficacy
    }

    /// Lifecycle state
    pub fn state(&self) -> NeuronState {
        self.state
    }

    /// Current membrane potential (mV)
    pub fn potential(&self) -> f64 {
        self.potential
    }

    /// Steps at which the neuron spiked, ascending
    pub fn spike_times(&self) -> &[u64] {
        &self.spikes
    }

    /// Number of recorded spikes
    pub fn spike_count(&self) -> usize {
        self.spikes.len()
    }

    /// Potential after every simulated step; empty unless recording is enabled
    pub fn potential_trace(&self) -> &[f64] {
        &self.trace
    }

    /// Outgoing connections in creation order
    pub fn connections(&self) -> &[Synapse] {
        &self.connections
    }

    /// Targets of the outgoing connections in creation order
    pub fn connection_targets(&self) -> impl Iterator<Item = usize> + '_ {
        self.connections.iter().map(|synapse| synapse.target.as_usize())
    }

    /// Number of outgoing connections
    pub fn out_degree(&self) -> usize {
        self.connections.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-5;

    fn neuron(kind: NeuronKind) -> Neuron {
        Neuron::new(0, kind, &BrunelConfig::default(), 3, true).unwrap()
    }

    fn drive(neuron: &mut Neuron, steps: u64) -> Vec<u64> {
        (0..steps)
            .filter(|&step| {
                let current = neuron.current_at(step);
                neuron.integrate_step(step, StepInput::current(current))
            })
            .collect()
    }

    #[test]
    fn test_neuron_creation() {
        let n = neuron(NeuronKind::Excitatory);
        assert_eq!(n.index(), NeuronIndex::new(0));
        assert_eq!(n.potential(), 0.0);
        assert_eq!(n.state(), NeuronState::Integrating);
        assert!(n.spike_times().is_empty());
        assert!(n.potential_trace().is_empty());

        let result = Neuron::new(3, NeuronKind::Excitatory, &BrunelConfig::default(), 3, false);
        assert!(matches!(result, Err(BrunelError::IndexOutOfBounds { index: 3, len: 3 })));
    }

    #[test]
    fn test_threshold_current_never_spikes() {
        let mut n = neuron(NeuronKind::Excitatory);
        n.schedule_current(1.0, 0, 20_000).unwrap();

        assert!(drive(&mut n, 20_000).is_empty());
        let trace = n.potential_trace();
        assert!((trace[4999] - 20.0).abs() < EPSILON);
        assert!((trace[2580] - 20.0).abs() > EPSILON);
        assert!(trace.iter().all(|&v| v <= 20.0));
    }

    #[test]
    fn test_suprathreshold_spike_train() {
        let mut n = neuron(NeuronKind::Excitatory);
        n.schedule_current(1.1, 0, 5_000).unwrap();

        let spikes = drive(&mut n, 5_000);
        let expected: Vec<u64> = (0..10).map(|k| 480 + 500 * k).collect();
        assert_eq!(spikes, expected);
        assert_eq!(n.spike_times(), expected.as_slice());

        let trace = n.potential_trace();
        assert_eq!(trace.len(), 5_000);
        assert!((trace[479] - 20.0).abs() < 1e-2);
        assert!(trace[479] > 20.0);
        assert!(trace[480..500].iter().all(|v| v.abs() < EPSILON));
        assert!(trace[500].abs() > EPSILON);
        assert!((trace[979] - 20.0).abs() < 1e-2);
    }

    #[test]
    fn test_refractory_ignores_input() {
        let mut n = neuron(NeuronKind::Excitatory);
        n.potential = 25.0;

        assert!(n.integrate_step(0, StepInput::current(5.0)));
        assert_eq!(n.state(), NeuronState::Refractory { remaining: 19 });

        for step in 1..20 {
            let spiked = n.integrate_step(step, StepInput { current: 100.0, psp: 50.0 });
            assert!(!spiked);
            assert_eq!(n.potential(), 0.0);
        }
        assert_eq!(n.state(), NeuronState::Integrating);

        n.integrate_step(20, StepInput { current: 0.0, psp: 0.1 });
        assert!((n.potential() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_psp_is_added_unscaled() {
        let mut n = neuron(NeuronKind::Excitatory);
        n.integrate_step(0, StepInput { current: 0.0, psp: 0.1 });
        assert!((n.potential() - 0.1).abs() < 1e-12);

        n.integrate_step(1, StepInput::default());
        let decayed = 0.1 * BrunelConfig::default().membrane_decay();
        assert!((n.potential() - decayed).abs() < 1e-12);
    }

    #[test]
    fn test_zero_refractory_period() {
        let config = BrunelConfig {
            refractory_steps: 0,
            ..BrunelConfig::default()
        };
        let mut n = Neuron::new(0, NeuronKind::Excitatory, &config, 1, false).unwrap();
        n.potential = 21.0;

        assert!(n.integrate_step(0, StepInput::current(0.0)));
        assert_eq!(n.state(), NeuronState::Integrating);
        assert!(n.potential_trace().is_empty());
    }

    #[test]
    fn test_current_schedule() {
        let mut n = neuron(NeuronKind::Excitatory);
        assert_eq!(n.current_at(0), 0.0);

        n.schedule_current(1.5, 10, 20).unwrap();
        assert_eq!(n.current_at(9), 0.0);
        assert_eq!(n.current_at(10), 1.5);
        assert_eq!(n.current_at(19), 1.5);
        assert_eq!(n.current_at(20), 0.0);

        // Replaces the previous window
        n.schedule_current(2.0, 0, 5).unwrap();
        assert_eq!(n.current_at(4), 2.0);
        assert_eq!(n.current_at(15), 0.0);

        n.clear_current();
        assert!(n.schedule().is_none());
        assert_eq!(n.current_at(4), 0.0);
    }

    #[test]
    fn test_invalid_schedule_keeps_previous() {
        let mut n = neuron(NeuronKind::Excitatory);
        n.schedule_current(1.0, 0, 10).unwrap();

        assert!(matches!(
            n.schedule_current(1.0, 10, 10),
            Err(BrunelError::InvalidArgument { .. })
        ));
        assert!(n.schedule_current(1.0, 10, 5).is_err());
        assert!(n.schedule_current(f64::NAN, 0, 5).is_err());
        assert_eq!(n.current_at(3), 1.0);
    }

    #[test]
    fn test_connection_sign() {
        let mut exc = neuron(NeuronKind::Excitatory);
        let mut inh = neuron(NeuronKind::Inhibitory);

        exc.add_connection(1).unwrap();
        exc.add_connection(1).unwrap();
        inh.add_connection(2).unwrap();

        assert_eq!(exc.connection_targets().collect::<Vec<_>>(), vec![1, 1]);
        assert!(exc.connections().iter().all(|s| s.amplitude == 0.1));
        assert_eq!(inh.connections()[0].amplitude, -0.5);
        assert_eq!(inh.connections()[0].target, NeuronIndex::new(2));
    }

    #[test]
    fn test_connection_bounds() {
        let mut n = neuron(NeuronKind::Excitatory);
        let result = n.add_connection(3);
        assert!(matches!(result, Err(BrunelError::IndexOutOfBounds { index: 3, len: 3 })));
        assert_eq!(n.out_degree(), 0);
    }

    #[test]
    fn test_buffer_consume_and_peek() {
        let mut n = neuron(NeuronKind::Excitatory);
        n.receive_at(15, 0.1);
        n.receive_at(15, 0.1);

        assert!((n.peek_buffered_at(15) - 0.2).abs() < 1e-12);
        assert_eq!(n.pending_deliveries(), 1);
        assert!((n.consume_buffered_at(15) - 0.2).abs() < 1e-12);
        assert_eq!(n.peek_buffered_at(15), 0.0);
        assert_eq!(n.consume_buffered_at(15), 0.0);
        assert_eq!(n.pending_deliveries(), 0);
    }
}
