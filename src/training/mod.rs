//! Online training of the driving policy.
//!
//! ## Overview
//!
//! - **TimelineTrainer**: the per-tick state machine that forks the world,
//!   compares a policy timeline against a perturbed one and learns from the
//!   better of the two
//! - **Episode**: the mutable record of the fork in flight
//! - **CheckpointStore**: where the generation-stamped network text is kept
//!
//! ## Usage
//!
//! ```rust
//! use rust_forkdrive::core::{Action, Mode, TrainerConfig};
//! use rust_forkdrive::tracks::simple::SimpleTrackBuilder;
//! use rust_forkdrive::training::{MemoryStore, TimelineTrainer};
//!
//! let config = TrainerConfig::default()
//!     .with_hidden_layers(vec![8])
//!     .with_split_range(160, 320);
//! let mut world = SimpleTrackBuilder::new().build();
//! let mut trainer = TimelineTrainer::new(config, MemoryStore::new()).unwrap();
//! trainer.select_mode(Mode::Training);
//!
//! for _ in 0..100 {
//!     trainer.tick(&mut world, Action::IDLE).unwrap();
//!     world.step();
//! }
//! assert!(trainer.stats().cycles > 0);
//! ```

pub mod checkpoint;
pub mod controller;
pub mod episode;

pub use checkpoint::{CheckpointStore, FileStore, MemoryStore};
pub use controller::{
    CycleReport, FaultReason, TickEvents, TickReport, TimelineTrainer, TrainerStats, TrainingEvent,
};
pub use episode::{Episode, Phase};
