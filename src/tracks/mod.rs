//! Reference worlds implementing [`Simulation`](crate::world::Simulation).
//!
//! Real hosts bring their own physics; these exist so the trainer can be
//! exercised headless, in tests and in benchmarks.

pub mod simple;
