//! # rust-forkdrive
//!
//! Online training of a small tanh network that drives a vehicle, embedded
//! in a fixed-step simulation loop.
//!
//! ## Design Principles
//!
//! 1. **Engine-Agnostic**: Physics, collision and rendering stay with the
//!    host. The trainer sees the world only through the `Simulation` trait.
//!
//! 2. **Explicit State**: All controller state lives in one
//!    `TimelineTrainer` value. No globals, no hidden timers.
//!
//! 3. **Deterministic**: Fixed tick length and seeded per-context RNG
//!    streams, so a run can be replayed exactly.
//!
//! ## Architecture
//!
//! - **Timeline Fork**: Snapshot the vehicle, drive the policy for a random
//!   interval (timeline A), rewind, drive again with a perturbed first
//!   action followed by A's replayed actions (timeline B), and nudge the
//!   network toward the perturbation if B got further along the track.
//!
//! - **Reused Buffers**: Layers keep their activations and gradients in
//!   buffers allocated once at construction.
//!
//! ## Modules
//!
//! - `core`: Actions, modes, RNG, configuration
//! - `error`: Error types
//! - `nn`: Layers, network, text persistence
//! - `world`: Simulation trait, kinematics, track progress, sensors
//! - `training`: The timeline-fork controller and checkpoint stores
//! - `tracks`: Reference worlds for headless runs and tests

pub mod core;
pub mod error;
pub mod nn;
pub mod tracks;
pub mod training;
pub mod world;

// Re-export commonly used types
pub use crate::core::{Action, Mode, SensorConfig, SimRng, TrainerConfig, ACTION_WIDTH};

pub use crate::error::{ConfigError, NetworkError, PersistError, TrainerError};

pub use crate::nn::{load_or_init, Layer, LoadedNetwork, Network, NetworkOrigin, TopologyPolicy};

pub use crate::world::{
    SensorEncoder, Simulation, Track, TrackReading, TrackTracker, Vec2, VehicleState,
};

pub use crate::training::{
    CheckpointStore, CycleReport, Episode, FaultReason, FileStore, MemoryStore, Phase,
    TickReport, TimelineTrainer, TrainerStats, TrainingEvent,
};

pub use crate::tracks::simple::{SimpleTrackBuilder, SimpleTrackWorld};
