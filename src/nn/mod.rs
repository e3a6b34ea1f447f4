//! Neural network engine for the driving policy.
//!
//! A plain multilayer perceptron: tanh activations, no biases, one
//! stochastic-gradient step per `back_prop` call on the last input seen.
//!
//! ## Overview
//!
//! - **Layer**: one fully-connected transform with reusable scratch buffers
//! - **Network**: the layer chain, forward inference and back-propagation
//! - **Persistence**: loss-less text format with a generation counter,
//!   plus `load_or_init` for recoverable start-up
//!
//! ## Usage
//!
//! ```rust
//! use rust_forkdrive::core::SimRng;
//! use rust_forkdrive::nn::Network;
//!
//! let mut rng = SimRng::new(42);
//! let mut net = Network::new(&[2, 4, 1], 0.1, &mut rng).unwrap();
//!
//! net.feed_forward(&[1.0, 0.0]).unwrap();
//! net.back_prop(&[1.0]).unwrap();
//!
//! let text = net.to_text(1);
//! let (restored, generation) = Network::from_text(&text, 0.1).unwrap();
//! assert_eq!(generation, 1);
//! assert!(restored.same_weights(&net));
//! ```

pub mod layer;
pub mod network;
pub mod persist;

pub use layer::Layer;
pub use network::Network;
pub use persist::{load_or_init, LoadedNetwork, NetworkOrigin, TopologyPolicy};
