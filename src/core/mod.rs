//! Core value types: actions, modes, RNG, configuration.
//!
//! These are shared by the network engine, the world interface and the
//! training controller.

pub mod action;
pub mod config;
pub mod mode;
pub mod rng;

pub use action::{Action, ACTION_WIDTH};
pub use config::{SensorConfig, TrainerConfig, EXTRA_SENSOR_INPUTS};
pub use mode::Mode;
pub use rng::SimRng;
