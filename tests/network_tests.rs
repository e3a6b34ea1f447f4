//! Integration tests for the network engine and its text format.

use proptest::prelude::*;

use rust_forkdrive::core::SimRng;
use rust_forkdrive::nn::Network;

// =============================================================================
// Strategies
// =============================================================================

/// A topology of 2 to 5 layers, each 1 to 8 units wide, plus a matching input.
///
/// Widths stay small enough that no pre-activation reaches the range where
/// `f32` tanh rounds to exactly ±1.
fn topology_and_input() -> impl Strategy<Value = (Vec<usize>, Vec<f32>, u64)> {
    prop::collection::vec(1usize..=8, 2..=5).prop_flat_map(|topology| {
        let width = topology[0];
        (
            Just(topology),
            prop::collection::vec(-1.0f32..=1.0, width),
            any::<u64>(),
        )
    })
}

proptest! {
    #[test]
    fn proptest_outputs_have_topology_width_and_stay_open_bounded(
        (topology, input, seed) in topology_and_input()
    ) {
        let mut net = Network::new(&topology, 0.02, &mut SimRng::new(seed)).unwrap();
        let output = net.feed_forward(&input).unwrap();
        prop_assert_eq!(output.len(), *topology.last().unwrap());
        prop_assert!(output.iter().all(|o| *o > -1.0 && *o < 1.0));
    }

    #[test]
    fn proptest_text_round_trip_is_exact(
        (topology, _input, seed) in topology_and_input(),
        generation in any::<u64>(),
    ) {
        let net = Network::new(&topology, 0.02, &mut SimRng::new(seed)).unwrap();
        let (parsed, parsed_generation) = Network::from_text(&net.to_text(generation), 0.02).unwrap();
        prop_assert_eq!(parsed_generation, generation);
        prop_assert_eq!(parsed.topology(), topology);
        prop_assert!(parsed.same_weights(&net));
    }

    #[test]
    fn proptest_small_step_does_not_increase_error(
        (topology, input, seed) in topology_and_input(),
        targets in prop::collection::vec(prop::bool::ANY, 8),
    ) {
        let width = *topology.last().unwrap();
        let expected: Vec<f32> = targets[..width].iter().map(|&t| if t { 1.0 } else { -1.0 }).collect();
        let mut net = Network::new(&topology, 0.001, &mut SimRng::new(seed)).unwrap();

        let before = net.squared_error(&input, &expected).unwrap();
        net.back_prop(&expected).unwrap();
        let after = net.squared_error(&input, &expected).unwrap();
        prop_assert!(after <= before + 1e-6, "before {} after {}", before, after);
    }
}

// =============================================================================
// Learning
// =============================================================================

#[test]
fn test_step_strictly_reduces_error() {
    let mut net = Network::new(&[18, 30, 30, 30, 10, 4], 0.02, &mut SimRng::new(3)).unwrap();
    let input: Vec<f32> = (0..18).map(|i| if i % 3 == 0 { 1.0 } else { -0.5 }).collect();
    let expected = [1.0, -1.0, 1.0, -1.0];

    let before = net.squared_error(&input, &expected).unwrap();
    net.back_prop(&expected).unwrap();
    let after = net.squared_error(&input, &expected).unwrap();
    assert!(after < before, "before {before} after {after}");
}

#[test]
fn test_xor_converges() {
    // No biases: (0,0) always maps to 0, so targets are 0/1 with threshold 0.5.
    let samples = [
        ([0.0, 0.0], 0.0),
        ([0.0, 1.0], 1.0),
        ([1.0, 0.0], 1.0),
        ([1.0, 1.0], 0.0),
    ];
    let mut net = Network::new(&[2, 4, 1], 0.2, &mut SimRng::new(42)).unwrap();

    for _ in 0..4000 {
        for (input, target) in &samples {
            net.feed_forward(input).unwrap();
            net.back_prop(&[*target]).unwrap();
        }
    }

    for (input, target) in &samples {
        let output = net.feed_forward(input).unwrap()[0];
        assert_eq!(output > 0.5, *target > 0.5, "{input:?} -> {output}");
    }
}

#[test]
fn test_learning_survives_round_trip() {
    let mut net = Network::new(&[4, 6, 2], 0.1, &mut SimRng::new(9)).unwrap();
    let input = [0.5, -1.0, 0.25, 1.0];
    for _ in 0..50 {
        net.feed_forward(&input).unwrap();
        net.back_prop(&[1.0, -1.0]).unwrap();
    }

    let (mut restored, generation) = Network::from_text(&net.to_text(3), 0.1).unwrap();
    assert_eq!(generation, 3);
    let original = net.feed_forward(&input).unwrap().to_vec();
    assert_eq!(restored.feed_forward(&input).unwrap(), original.as_slice());
}
