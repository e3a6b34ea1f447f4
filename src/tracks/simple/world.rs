//! Simple track world implementation.

use crate::core::Action;
use crate::world::{Simulation, Track, TrackReading, TrackTracker, Vec2, VehicleState};

/// One straight wall segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Wall {
    pub a: Vec2,
    pub b: Vec2,
}

impl Wall {
    /// Parameter `t` where `origin + t * direction` meets the wall, if it
    /// does so at `t >= 0`.
    #[must_use]
    pub fn intersect(&self, origin: Vec2, direction: Vec2) -> Option<f32> {
        let edge = self.b - self.a;
        let denom = direction.cross(edge);
        if denom.abs() < f32::EPSILON {
            return None;
        }
        let offset = self.a - origin;
        let t = offset.cross(edge) / denom;
        let s = offset.cross(direction) / denom;
        (t >= 0.0 && (0.0..=1.0).contains(&s)).then_some(t)
    }
}

/// Car handling constants.
#[derive(Clone, Copy, Debug)]
struct CarParams {
    drive_force: f32,
    forward_damping: f32,
    brake_damping: f32,
    steer_factor: f32,
    angular_damping: f32,
    angular_inertia: f32,
}

impl Default for CarParams {
    fn default() -> Self {
        Self {
            drive_force: 150.0,
            forward_damping: 0.25,
            brake_damping: 0.5,
            steer_factor: 15.0,
            angular_damping: 2.0,
            angular_inertia: 60.0,
        }
    }
}

/// Builder for creating a [`SimpleTrackWorld`].
#[derive(Clone, Debug)]
pub struct SimpleTrackBuilder {
    points: Vec<Vec2>,
    widths: Vec<f32>,
    time_step_ms: u32,
    sight_range: f32,
    params: CarParams,
}

impl Default for SimpleTrackBuilder {
    fn default() -> Self {
        Self {
            points: vec![
                Vec2::new(950.0, 200.0),
                Vec2::new(1500.0, 500.0),
                Vec2::new(950.0, 900.0),
                Vec2::new(400.0, 500.0),
            ],
            widths: vec![180.0, 250.0, 180.0, 250.0],
            time_step_ms: 16,
            sight_range: 2000.0,
            params: CarParams::default(),
        }
    }
}

impl SimpleTrackBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Center-line points and the half-width of the road at each point.
    pub fn track(mut self, points: Vec<Vec2>, widths: Vec<f32>) -> Self {
        assert!(points.len() >= 3, "Track needs at least 3 points");
        assert_eq!(points.len(), widths.len(), "One width per track point");
        assert!(widths.iter().all(|&w| w > 0.0), "Track widths must be positive");
        self.points = points;
        self.widths = widths;
        self
    }

    pub fn time_step_ms(mut self, ms: u32) -> Self {
        assert!(ms > 0, "Time step must be positive");
        self.time_step_ms = ms;
        self
    }

    pub fn sight_range(mut self, range: f32) -> Self {
        self.sight_range = range;
        self
    }

    /// Rotational inertia of the car; higher values steer more sluggishly.
    pub fn angular_inertia(mut self, inertia: f32) -> Self {
        assert!(inertia > 0.0, "Inertia must be positive");
        self.params.angular_inertia = inertia;
        self
    }

    pub fn build(self) -> SimpleTrackWorld {
        let track = Track::new(self.points);
        let n = track.len();

        let mut walls = Vec::with_capacity(2 * n);
        for side in [1.0f32, -1.0] {
            for i in 0..n {
                let j = (i + 1) % n;
                walls.push(Wall {
                    a: track.point(i) + track.normal(i) * (side * self.widths[i]),
                    b: track.point(j) + track.normal(j) * (side * self.widths[j]),
                });
            }
        }

        let start_rotation = {
            let dir = track.segment_direction(0);
            dir.y.atan2(dir.x)
        };
        let start = VehicleState::at_rest(track.point(0), start_rotation);

        SimpleTrackWorld {
            track,
            walls,
            tracker: TrackTracker::new(),
            fork: None,
            state: start,
            start,
            params: self.params,
            dt: self.time_step_ms as f32 / 1000.0,
            sight_range: self.sight_range,
            collisions: 0,
            laps: 0,
        }
    }
}

/// A single car on a walled closed track.
#[derive(Clone, Debug)]
pub struct SimpleTrackWorld {
    track: Track,
    walls: Vec<Wall>,
    tracker: TrackTracker,
    /// Last fork point and the progress cursor at that moment.
    fork: Option<(VehicleState, TrackTracker)>,
    state: VehicleState,
    start: VehicleState,
    params: CarParams,
    dt: f32,
    sight_range: f32,
    collisions: u64,
    laps: u64,
}

impl SimpleTrackWorld {
    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    /// Number of moves cancelled by a wall.
    pub fn collisions(&self) -> u64 {
        self.collisions
    }

    /// Forward laps completed, counted across rewinds.
    pub fn laps(&self) -> u64 {
        self.laps
    }

    /// Put the car back at the start line, at rest.
    pub fn reset(&mut self) {
        self.state = self.start;
        self.tracker = TrackTracker::new();
        self.fork = None;
    }

    /// The progress cursor.
    pub fn tracker(&self) -> &TrackTracker {
        &self.tracker
    }

    fn crosses_wall(&self, from: Vec2, to: Vec2) -> bool {
        let delta = to - from;
        self.walls
            .iter()
            .any(|w| w.intersect(from, delta).is_some_and(|t| t <= 1.0))
    }

    /// Integrate one time step using the forces applied since the last step.
    pub fn step(&mut self) {
        let p = self.params;
        let dt = self.dt;
        let mut s = self.state;

        // A net force against the heading means the brake is held.
        let damping = if s.force_accumulator.dot(s.heading()) < 0.0 {
            p.brake_damping
        } else {
            p.forward_damping
        };
        s.linear_velocity += (s.force_accumulator - s.linear_velocity * damping) * dt;
        s.angular_velocity +=
            (s.torque_accumulator / p.angular_inertia - s.angular_velocity * p.angular_damping) * dt;
        s.rotation += s.angular_velocity * dt;

        let target = s.position + s.linear_velocity * dt;
        if self.crosses_wall(s.position, target) {
            s.linear_velocity = Vec2::ZERO;
            self.collisions += 1;
        } else {
            s.position = target;
        }

        s.force_accumulator = Vec2::ZERO;
        s.torque_accumulator = 0.0;

        // No lateral slip: the car only rolls along its heading.
        let heading = s.heading();
        s.linear_velocity = heading * s.linear_velocity.dot(heading);

        self.state = s;
    }
}

impl Simulation for SimpleTrackWorld {
    fn cast_ray(&self, origin: Vec2, direction: Vec2) -> Option<f32> {
        let direction = direction.normalized();
        self.walls
            .iter()
            .filter_map(|w| w.intersect(origin, direction))
            .filter(|&t| t <= self.sight_range)
            .min_by(f32::total_cmp)
    }

    fn vehicle(&self) -> VehicleState {
        self.state
    }

    fn snapshot(&mut self) -> VehicleState {
        self.fork = Some((self.state, self.tracker));
        self.state
    }

    fn restore_vehicle(&mut self, snapshot: &VehicleState) {
        self.state = *snapshot;
        match self.fork {
            Some((state, tracker)) if state == *snapshot => self.tracker = tracker,
            _ => self.tracker.relocate(&self.track, snapshot.position),
        }
    }

    fn track_progress(&mut self, position: Vec2) -> TrackReading {
        let reading = self.tracker.update(&self.track, position);
        if reading.lap_completed {
            self.laps += 1;
        }
        reading
    }

    fn actuate(&mut self, action: Action) {
        let p = self.params;
        let heading = self.state.heading();
        let drive = heading * p.drive_force;

        if action.accelerate {
            self.state.force_accumulator += drive;
        }
        if action.brake {
            self.state.force_accumulator += -drive;
        }

        let direction = if self.state.moving_forward() { 1.0 } else { -1.0 };
        let torque = direction * self.state.speed().sqrt() * p.steer_factor;
        if action.steer_left {
            self.state.torque_accumulator += torque;
        }
        if action.steer_right {
            self.state.torque_accumulator -= torque;
        }
    }

    fn waypoints(&self) -> &[Vec2] {
        self.track.points()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_build_default() {
        let world = SimpleTrackBuilder::new().build();
        assert_eq!(world.track().len(), 4);
        assert_eq!(world.walls().len(), 8);
        assert_eq!(world.waypoints().len(), 4);
        assert_eq!(world.vehicle().position, Vec2::new(950.0, 200.0));
    }

    #[test]
    fn test_ray_hits_wall() {
        let world = SimpleTrackBuilder::new().build();
        // The wall from (950, 20) to (1750, 500) passes (1000, 50).
        let d = world.cast_ray(Vec2::new(1000.0, 200.0), Vec2::new(0.0, -1.0)).unwrap();
        assert!((d - 150.0).abs() < 1e-2, "{d}");
    }

    #[test]
    fn test_ray_beyond_sight_range() {
        let world = SimpleTrackBuilder::new().sight_range(100.0).build();
        assert_eq!(world.cast_ray(Vec2::new(1000.0, 200.0), Vec2::new(0.0, -1.0)), None);
    }

    #[test]
    fn test_accelerate_along_track() {
        let mut world = SimpleTrackBuilder::new().build();
        let start = world.track_progress(world.vehicle().position);
        for _ in 0..50 {
            world.actuate(Action::new(true, false, false, false));
            world.step();
        }
        let state = world.vehicle();
        assert!(state.speed() > 50.0);
        assert!(state.moving_forward());
        assert_eq!(world.collisions(), 0);
        let later = world.track_progress(state.position);
        assert!(later.progress > start.progress);
    }

    #[test]
    fn test_wall_stops_car() {
        let mut world = SimpleTrackBuilder::new().build();
        world.restore_vehicle(&VehicleState::at_rest(Vec2::new(1000.0, 200.0), -FRAC_PI_2));
        for _ in 0..200 {
            world.actuate(Action::new(true, false, false, false));
            world.step();
        }
        assert!(world.collisions() > 0);
        assert!(world.vehicle().position.y > 50.0);
    }

    #[test]
    fn test_restore_is_deterministic() {
        let mut world = SimpleTrackBuilder::new().build();
        let drive = [
            Action::new(true, false, false, false),
            Action::new(true, false, true, false),
            Action::new(false, true, false, true),
        ];
        for action in drive {
            world.actuate(action);
            world.step();
        }
        let snapshot = world.vehicle();

        let run = |world: &mut SimpleTrackWorld| {
            world.restore_vehicle(&snapshot);
            assert_eq!(world.vehicle(), snapshot);
            for i in 0..30 {
                world.actuate(drive[i % drive.len()]);
                world.step();
            }
            world.vehicle()
        };
        let first = run(&mut world);
        let second = run(&mut world);
        assert_eq!(first, second);
    }

    #[test]
    fn test_restore_brings_back_progress_cursor() {
        let mut world = SimpleTrackBuilder::new().build();
        let ahead = Vec2::new(960.0, 205.0);
        let behind = Vec2::new(940.0, 205.0);

        // Back over the start line and fork there.
        world.track_progress(ahead);
        let at_fork = world.track_progress(behind);
        assert!(!world.tracker().is_forward());
        assert!(at_fork.progress < 0.0);
        let snapshot = world.snapshot();

        // Cross the start line forward again, then rewind.
        let crossed = world.track_progress(ahead);
        assert!(world.tracker().is_forward());
        assert!(crossed.progress > 0.0);
        world.restore_vehicle(&snapshot);

        assert_eq!(world.vehicle(), snapshot);
        assert!(!world.tracker().is_forward());
        let again = world.track_progress(behind);
        assert_eq!(again, at_fork);
    }

    #[test]
    fn test_restore_of_other_state_relocates() {
        let mut world = SimpleTrackBuilder::new().build();
        world.snapshot();
        let target = world.track().point(2);
        let moved = world.vehicle().with_position(target);
        world.restore_vehicle(&moved);
        assert_eq!(world.tracker().segment(), world.track().nearest_segment(target));
        assert!(world.tracker().is_forward());
    }
}
