//! Feed-forward tanh network with single-sample back-propagation.
//!
//! ## Pass order
//!
//! `back_prop` trains toward a target for exactly the last input seen, so it
//! must follow a `feed_forward` on that input. The network tracks this
//! explicitly: a `back_prop` without a preceding forward pass fails with
//! [`NetworkError::BackPropWithoutForward`] instead of silently using stale
//! buffers.

use crate::core::SimRng;
use crate::error::{NetworkError, NetworkResult};

use super::layer::Layer;

/// Where the network is in the forward/backward protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pass {
    Idle,
    Forwarded,
}

/// Ordered chain of tanh layers.
///
/// ## Example
///
/// ```
/// use rust_forkdrive::core::SimRng;
/// use rust_forkdrive::nn::Network;
///
/// let mut rng = SimRng::new(1);
/// let mut net = Network::new(&[3, 5, 2], 0.05, &mut rng).unwrap();
/// let out = net.feed_forward(&[0.1, -0.2, 0.3]).unwrap().to_vec();
/// assert_eq!(out.len(), 2);
/// net.back_prop(&[1.0, -1.0]).unwrap();
/// ```
#[derive(Clone, Debug)]
pub struct Network {
    layers: Vec<Layer>,
    learning_rate: f32,
    pass: Pass,
}

impl Network {
    /// Build a randomly initialised network from layer widths `[n0, …, nk]`.
    pub fn new(topology: &[usize], learning_rate: f32, rng: &mut SimRng) -> NetworkResult<Self> {
        if topology.len() < 2 || topology.contains(&0) {
            return Err(NetworkError::InvalidTopology(topology.to_vec()));
        }
        let layers = topology
            .windows(2)
            .map(|w| Layer::new(w[0], w[1], rng))
            .collect();
        Self::from_layers(layers, learning_rate)
    }

    /// Assemble a network from already-built layers.
    ///
    /// Fails if `layers` is empty or consecutive widths do not chain.
    pub fn from_layers(layers: Vec<Layer>, learning_rate: f32) -> NetworkResult<Self> {
        if layers.is_empty() {
            return Err(NetworkError::InvalidTopology(Vec::new()));
        }
        if let Some(w) = layers
            .windows(2)
            .find(|w| w[0].num_outputs() != w[1].num_inputs())
        {
            return Err(NetworkError::ShapeMismatch {
                what: "layer chain",
                expected: w[0].num_outputs(),
                actual: w[1].num_inputs(),
            });
        }
        Ok(Self {
            layers,
            learning_rate,
            pass: Pass::Idle,
        })
    }

    /// Layer widths `[n0, n1, …, nk]`.
    #[must_use]
    pub fn topology(&self) -> Vec<usize> {
        let mut widths = Vec::with_capacity(self.layers.len() + 1);
        widths.push(self.input_width());
        widths.extend(self.layers.iter().map(Layer::num_outputs));
        widths
    }

    #[must_use]
    pub fn input_width(&self) -> usize {
        self.layers[0].num_inputs()
    }

    #[must_use]
    pub fn output_width(&self) -> usize {
        self.layers[self.layers.len() - 1].num_outputs()
    }

    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    #[must_use]
    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    /// Propagate `input` through every layer and return the final outputs.
    pub fn feed_forward(&mut self, input: &[f32]) -> NetworkResult<&[f32]> {
        let expected = self.input_width();
        if input.len() != expected {
            return Err(NetworkError::ShapeMismatch {
                what: "input",
                expected,
                actual: input.len(),
            });
        }

        self.layers[0].forward(input);
        for i in 1..self.layers.len() {
            let (done, rest) = self.layers.split_at_mut(i);
            rest[0].forward(done[i - 1].last_outputs());
        }
        self.pass = Pass::Forwarded;

        Ok(self.layers[self.layers.len() - 1].last_outputs())
    }

    /// One gradient step toward `expected` for the last forward input.
    ///
    /// All gradients are computed from the pre-update weights before any
    /// layer changes.
    pub fn back_prop(&mut self, expected: &[f32]) -> NetworkResult<()> {
        if self.pass != Pass::Forwarded {
            return Err(NetworkError::BackPropWithoutForward);
        }
        let width = self.output_width();
        if expected.len() != width {
            return Err(NetworkError::ShapeMismatch {
                what: "expected output",
                expected: width,
                actual: expected.len(),
            });
        }

        let last = self.layers.len() - 1;
        self.layers[last].back_prop_output(expected);
        for i in (0..last).rev() {
            let (head, tail) = self.layers.split_at_mut(i + 1);
            head[i].back_prop_hidden(&tail[0]);
        }

        for layer in &mut self.layers {
            layer.update_weights(self.learning_rate);
        }
        self.pass = Pass::Idle;
        Ok(())
    }

    /// Squared error between the network's output for `input` and `expected`.
    ///
    /// Runs a forward pass, so a `back_prop` may follow.
    pub fn squared_error(&mut self, input: &[f32], expected: &[f32]) -> NetworkResult<f32> {
        let width = self.output_width();
        if expected.len() != width {
            return Err(NetworkError::ShapeMismatch {
                what: "expected output",
                expected: width,
                actual: expected.len(),
            });
        }
        let output = self.feed_forward(input)?;
        Ok(output
            .iter()
            .zip(expected)
            .map(|(o, e)| (o - e) * (o - e))
            .sum())
    }

    /// Do two networks have identical shape and weights?
    #[must_use]
    pub fn same_weights(&self, other: &Network) -> bool {
        self.layers.len() == other.layers.len()
            && self
                .layers
                .iter()
                .zip(&other.layers)
                .all(|(a, b)| a.num_inputs() == b.num_inputs() && a.weights() == b.weights())
    }
}
