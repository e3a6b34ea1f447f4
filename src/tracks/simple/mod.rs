//! Minimal closed-circuit driving world.
//!
//! - A closed polyline track with a wall on each side
//! - One car: heading-projected velocity, a central drive force, steering
//!   torque, linear and angular damping, explicit Euler integration
//! - Ray casts against the wall segments
//! - No contact resolution: a move that would cross a wall is cancelled and
//!   the car stopped

mod world;

pub use world::{SimpleTrackBuilder, SimpleTrackWorld, Wall};
