//! A single fully-connected tanh layer.
//!
//! The layer owns its weight matrix plus every scratch buffer the forward
//! and backward passes need. Buffers are sized once at construction and
//! reused on every call.

use crate::core::SimRng;
use crate::error::{NetworkError, NetworkResult};

/// Fully-connected layer computing `out[i] = tanh(Σ_j in[j] · w[i][j])`.
///
/// Weights are stored row-major: row `i` holds the input weights of output
/// unit `i`. There is no bias term.
#[derive(Clone, Debug)]
pub struct Layer {
    num_inputs: usize,
    num_outputs: usize,
    weights: Vec<f32>,
    last_inputs: Vec<f32>,
    last_outputs: Vec<f32>,
    gamma: Vec<f32>,
    weight_delta: Vec<f32>,
}

impl Layer {
    /// Create a layer with weights drawn uniformly from `[-0.5, 0.5)`.
    pub fn new(num_inputs: usize, num_outputs: usize, rng: &mut SimRng) -> Self {
        let weights = (0..num_inputs * num_outputs)
            .map(|_| rng.gen_f32() - 0.5)
            .collect();
        Self::with_buffers(num_inputs, num_outputs, weights)
    }

    /// Create a layer from explicit row-major weights.
    ///
    /// Fails unless `weights.len() == num_inputs * num_outputs`.
    pub fn from_weights(
        num_inputs: usize,
        num_outputs: usize,
        weights: Vec<f32>,
    ) -> NetworkResult<Self> {
        if weights.len() != num_inputs * num_outputs {
            return Err(NetworkError::ShapeMismatch {
                what: "layer weights",
                expected: num_inputs * num_outputs,
                actual: weights.len(),
            });
        }
        Ok(Self::with_buffers(num_inputs, num_outputs, weights))
    }

    fn with_buffers(num_inputs: usize, num_outputs: usize, weights: Vec<f32>) -> Self {
        Self {
            num_inputs,
            num_outputs,
            weights,
            last_inputs: vec![0.0; num_inputs],
            last_outputs: vec![0.0; num_outputs],
            gamma: vec![0.0; num_outputs],
            weight_delta: vec![0.0; num_inputs * num_outputs],
        }
    }

    #[must_use]
    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    #[must_use]
    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    /// Row-major weight matrix.
    #[must_use]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Input weights of one output unit.
    #[must_use]
    pub fn row(&self, output: usize) -> &[f32] {
        let start = output * self.num_inputs;
        &self.weights[start..start + self.num_inputs]
    }

    /// Weight from input `j` to output `i`.
    #[must_use]
    pub fn weight(&self, i: usize, j: usize) -> f32 {
        self.weights[i * self.num_inputs + j]
    }

    /// Outputs of the most recent forward pass.
    #[must_use]
    pub fn last_outputs(&self) -> &[f32] {
        &self.last_outputs
    }

    /// Error gradients of the most recent backward pass.
    #[must_use]
    pub fn gamma(&self) -> &[f32] {
        &self.gamma
    }

    /// Forward pass. The caller guarantees `input.len() == num_inputs`.
    pub(crate) fn forward(&mut self, input: &[f32]) -> &[f32] {
        debug_assert_eq!(input.len(), self.num_inputs);
        self.last_inputs.copy_from_slice(input);
        for (out, row) in self
            .last_outputs
            .iter_mut()
            .zip(self.weights.chunks_exact(self.num_inputs))
        {
            let sum: f32 = row.iter().zip(input).map(|(w, x)| w * x).sum();
            *out = sum.tanh();
        }
        &self.last_outputs
    }

    /// Gradients for the output layer against the expected vector.
    pub(crate) fn back_prop_output(&mut self, expected: &[f32]) {
        debug_assert_eq!(expected.len(), self.num_outputs);
        for ((gamma, &out), &exp) in self
            .gamma
            .iter_mut()
            .zip(&self.last_outputs)
            .zip(expected)
        {
            *gamma = (out - exp) * tanh_derivative(out);
        }
        self.compute_deltas();
    }

    /// Gradients for a hidden layer from the downstream layer's gradients.
    ///
    /// Uses the downstream weights as they are now, so this must run before
    /// any layer applies its update.
    pub(crate) fn back_prop_hidden(&mut self, downstream: &Layer) {
        debug_assert_eq!(downstream.num_inputs, self.num_outputs);
        for (i, gamma) in self.gamma.iter_mut().enumerate() {
            let sum: f32 = downstream
                .gamma
                .iter()
                .enumerate()
                .map(|(k, g)| g * downstream.weight(k, i))
                .sum();
            *gamma = sum * tanh_derivative(self.last_outputs[i]);
        }
        self.compute_deltas();
    }

    fn compute_deltas(&mut self) {
        for (row, &gamma) in self
            .weight_delta
            .chunks_exact_mut(self.num_inputs)
            .zip(&self.gamma)
        {
            for (delta, &x) in row.iter_mut().zip(&self.last_inputs) {
                *delta = gamma * x;
            }
        }
    }

    /// Apply `w -= learning_rate * delta`.
    pub(crate) fn update_weights(&mut self, learning_rate: f32) {
        for (w, d) in self.weights.iter_mut().zip(&self.weight_delta) {
            *w -= learning_rate * d;
        }
    }
}

/// Derivative of tanh, evaluated at the post-activation value.
#[inline]
fn tanh_derivative(activated: f32) -> f32 {
    1.0 - activated * activated
}
