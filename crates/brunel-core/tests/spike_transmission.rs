//! Delayed spike delivery between explicitly connected neurons

use brunel_core::{BrunelConfig, Network, NetworkOptions};

const EPSILON: f64 = 1e-5;

fn recording_network(population: usize) -> Network {
    let options = NetworkOptions::default().with_potential_recording(true);
    Network::new(population, BrunelConfig::default(), options).expect("network")
}

#[test]
fn buffer_is_written_once_and_consumed_once() {
    let config = BrunelConfig::default();
    let delay = config.delay_steps;
    let mut network = recording_network(2);

    network.set_current(1.1, 0, 0.0, 400.0).unwrap();
    network.set_current(0.0, 1, 0.0, 400.0).unwrap();
    network.connect(0, 1).unwrap();

    // Spike at step 480
    for _ in 0..481 {
        network.step();
    }
    assert_eq!(network.neuron(0).unwrap().spike_times(), &[480]);

    let target = network.neuron(1).unwrap();
    assert!((target.peek_buffered_at(480 + delay) - config.j_excitatory).abs() < EPSILON);
    // Peeking does not consume
    assert!((target.peek_buffered_at(480 + delay) - config.j_excitatory).abs() < EPSILON);

    for _ in 481..480 + delay {
        network.step();
    }
    assert!(network.neuron(1).unwrap().peek_buffered_at(480 + delay) > 0.0);

    // Step 480 + delay consumes the entry
    network.step();
    let target = network.neuron(1).unwrap();
    assert_eq!(target.peek_buffered_at(480 + delay), 0.0);
    assert_eq!(target.pending_deliveries(), 0);
}

#[test]
fn spike_propagates_along_chain() {
    let config = BrunelConfig::default();
    let delay = config.delay_steps as usize;
    let refractory = config.refractory_steps as usize;
    let mut network = recording_network(3);

    network.set_current(1.1, 0, 300.0, 400.0).unwrap();
    network.set_current(1.0, 1, 0.0, 500.0).unwrap();
    network.set_current(0.0, 2, 0.0, 500.0).unwrap();
    network.connect(0, 1).unwrap();
    network.connect(0, 2).unwrap();

    let neurons = network.run(5_000);
    let potentials0 = neurons[0].potential_trace();
    let potentials1 = neurons[1].potential_trace();
    let potentials2 = neurons[2].potential_trace();

    // Neuron 0 crosses after 480 integration steps from 300 ms
    assert_eq!(neurons[0].spike_times()[0], 3_480);
    assert!((potentials0[3_479] - 20.0).abs() < 1e-2);
    assert!(potentials0[3_480].abs() < EPSILON);
    assert!(potentials0[3_480 + refractory + 1].abs() > EPSILON);

    // Neuron 1 sits just below threshold; the 0.1 mV input pushes it over
    assert!((potentials1[3_479 + delay] - 20.0).abs() < 1e-2);
    assert!(potentials1[3_480 + delay] > 20.0);
    assert_eq!(neurons[1].spike_times(), &[3_480 + delay as u64 + 1]);
    assert!(potentials1[3_480 + delay + refractory + 1].abs() > EPSILON);

    // Neuron 2 only sees the post-synaptic bump
    assert_eq!(potentials2[3_479 + delay], 0.0);
    assert!((potentials2[3_480 + delay] - 0.1).abs() < EPSILON);
    assert!(potentials2[3_481 + delay] < potentials2[3_480 + delay]);
    assert!(neurons[2].spike_times().is_empty());
}

#[test]
fn inhibitory_source_lowers_target_potential() {
    // One excitatory (0) and one inhibitory (1) neuron, wired by hand
    let config = BrunelConfig {
        n_excitatory: 1,
        n_inhibitory: 1,
        c_excitatory: 0,
        c_inhibitory: 0,
        ..BrunelConfig::default()
    };
    let options = NetworkOptions::default()
        .with_potential_recording(true)
        .with_population_split(true);
    let mut network = Network::new(2, config.clone(), options).unwrap();

    network.set_current(1.1, 1, 0.0, 100.0).unwrap();
    network.connect(1, 0).unwrap();
    assert_eq!(network.neuron(1).unwrap().connections()[0].amplitude, config.j_inhibitory());

    let neurons = network.run(500);
    assert_eq!(neurons[1].spike_times(), &[480]);
    assert!((neurons[0].potential_trace()[495] + 0.5).abs() < EPSILON);
}

#[test]
fn simultaneous_inputs_accumulate() {
    let mut network = recording_network(3);
    network.set_current(1.1, 0, 0.0, 100.0).unwrap();
    network.set_current(1.1, 1, 0.0, 100.0).unwrap();
    network.connect(0, 2).unwrap();
    network.connect(1, 2).unwrap();
    network.connect(1, 2).unwrap();

    network.run(481);
    assert!((network.neuron(2).unwrap().peek_buffered_at(495) - 0.3).abs() < 1e-12);

    let neurons = network.run(15);
    assert!((neurons[2].potential_trace()[495] - 0.3).abs() < 1e-12);
}
