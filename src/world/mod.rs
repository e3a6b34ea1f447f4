//! The simulation side of the controller.
//!
//! ## Overview
//!
//! - **Simulation**: the capability trait a host world implements
//! - **Kinematics**: `Vec2` and the snapshot-able `VehicleState`
//! - **Track**: closed polyline geometry and the progress cursor
//! - **Sensors**: encodes rays and vehicle state into the network input

pub mod kinematics;
pub mod sensors;
pub mod track;
pub mod traits;

pub use kinematics::{Vec2, VehicleState};
pub use sensors::SensorEncoder;
pub use track::{Track, TrackTracker};
pub use traits::{Simulation, TrackReading};
