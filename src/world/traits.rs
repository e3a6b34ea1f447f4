//! The capability interface the controller needs from a simulation.
//!
//! The physics engine, collision detection and track geometry are external.
//! The controller only casts rays, reads and restores the vehicle, asks for
//! track progress and sends actuation commands.

use crate::core::Action;

use super::kinematics::{Vec2, VehicleState};

/// Track progress reported for one position.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TrackReading {
    /// Signed progress along the track. Within a lap it grows from 0 toward 1
    /// when driving forward and goes negative when driving backward across
    /// the start line.
    pub progress: f32,

    /// `true` on the update where the vehicle crossed the start line going
    /// forward.
    pub lap_completed: bool,

    /// Unit direction of forward travel along the current track segment.
    pub track_direction: Vec2,
}

/// Simulation capabilities consumed by the training controller.
///
/// ## Implementation Notes
///
/// - `cast_ray`: `None` when nothing lies within the query range
/// - `snapshot`: taken once per fork; any state the world keeps alongside
///   the vehicle (such as a track progress cursor) belongs to the snapshot
/// - `restore_vehicle`: must reproduce the snapshot exactly, including the
///   force and torque accumulators and, for a value returned by `snapshot`,
///   the progress cursor
/// - `track_progress`: may keep internal cursor state; the controller calls
///   it once per tick with the current position
/// - `actuate`: called exactly once per tick
pub trait Simulation {
    /// Distance to the nearest obstacle along a ray.
    fn cast_ray(&self, origin: Vec2, direction: Vec2) -> Option<f32>;

    /// Current kinematic state of the controlled vehicle.
    fn vehicle(&self) -> VehicleState;

    /// Capture the vehicle as a fork point.
    ///
    /// Worlds whose [`track_progress`](Self::track_progress) keeps cursor
    /// state save it here and put it back when the returned state is passed
    /// to [`restore_vehicle`](Self::restore_vehicle).
    fn snapshot(&mut self) -> VehicleState {
        self.vehicle()
    }

    /// Overwrite the vehicle's kinematic state.
    fn restore_vehicle(&mut self, snapshot: &VehicleState);

    /// Progress along the track at `position`.
    fn track_progress(&mut self, position: Vec2) -> TrackReading;

    /// Apply this tick's actuation commands.
    fn actuate(&mut self, action: Action);

    /// Positions the vehicle may be teleported to when training stalls.
    fn waypoints(&self) -> &[Vec2] {
        &[]
    }
}
