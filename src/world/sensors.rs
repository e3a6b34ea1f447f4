//! Sensor vector encoding.
//!
//! Layout (width `ray_count + 8`):
//!
//! | index | value |
//! |---|---|
//! | `0..ray_count` | ray distances, clamped and scaled to `[-1, 1]` |
//! | `ray_count` | speed scaled to `[-1, 1]` |
//! | `+1` | moving forward, ±1 |
//! | `+2..+6` | previous action, 4 × ±1 |
//! | `+6` | heading along the track direction, ±1 |
//! | `+7` | velocity along the track direction, ±1 |

use std::f32::consts::TAU;

use crate::core::{Action, SensorConfig};

use super::kinematics::VehicleState;
use super::traits::{Simulation, TrackReading};

fn sign(flag: bool) -> f32 {
    if flag {
        1.0
    } else {
        -1.0
    }
}

/// Builds the network input for one tick into a reused buffer.
#[derive(Clone, Debug)]
pub struct SensorEncoder {
    config: SensorConfig,
    values: Vec<f32>,
}

impl SensorEncoder {
    pub fn new(config: SensorConfig) -> Self {
        let values = vec![0.0; config.input_width()];
        Self { config, values }
    }

    #[must_use]
    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// Width of the encoded vector.
    #[must_use]
    pub fn width(&self) -> usize {
        self.values.len()
    }

    /// The most recently encoded vector.
    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Cast the ray fan and encode the full sensor vector.
    ///
    /// Returns how many rays came back undefined.
    pub fn encode<S: Simulation + ?Sized>(
        &mut self,
        sim: &S,
        vehicle: &VehicleState,
        reading: &TrackReading,
        last_action: Action,
    ) -> usize {
        let cfg = &self.config;
        let half_range = cfg.max_sight_range / 2.0;
        let heading = vehicle.heading();
        let step = TAU / cfg.ray_count as f32;

        let mut undefined = 0;
        for i in 0..cfg.ray_count {
            let direction = heading.rotated(step * i as f32);
            let distance = match sim.cast_ray(vehicle.position, direction) {
                Some(d) if d.is_finite() => d,
                _ => {
                    undefined += 1;
                    cfg.undefined_ray_distance
                }
            };
            self.values[i] = distance.min(cfg.max_sight_range) / half_range - 1.0;
        }

        let base = cfg.ray_count;
        self.values[base] = vehicle.speed() / (cfg.max_velocity / 2.0) - 1.0;
        self.values[base + 1] = sign(vehicle.moving_forward());
        self.values[base + 2..base + 6].copy_from_slice(&last_action.to_signed());
        self.values[base + 6] = sign(heading.dot(reading.track_direction) > 0.0);
        self.values[base + 7] = sign(vehicle.linear_velocity.dot(reading.track_direction) > 0.0);

        undefined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Vec2;

    /// Walls at fixed distances along ±x, nothing along ±y.
    struct Corridor;

    impl Simulation for Corridor {
        fn cast_ray(&self, _origin: Vec2, direction: Vec2) -> Option<f32> {
            if direction.x > 0.9 {
                Some(500.0)
            } else if direction.x < -0.9 {
                Some(5000.0)
            } else {
                None
            }
        }
        fn vehicle(&self) -> VehicleState {
            VehicleState::default()
        }
        fn restore_vehicle(&mut self, _snapshot: &VehicleState) {}
        fn track_progress(&mut self, _position: Vec2) -> TrackReading {
            TrackReading::default()
        }
        fn actuate(&mut self, _action: Action) {}
    }

    #[test]
    fn test_layout() {
        let mut encoder = SensorEncoder::new(SensorConfig::default().with_ray_count(4));
        assert_eq!(encoder.width(), 12);

        let mut vehicle = VehicleState::at_rest(Vec2::ZERO, 0.0);
        vehicle.linear_velocity = Vec2::new(-300.5, 0.0);
        let reading = TrackReading {
            progress: 0.0,
            lap_completed: false,
            track_direction: Vec2::new(1.0, 0.0),
        };
        let undefined = encoder.encode(&Corridor, &vehicle, &reading, Action::new(true, false, false, true));

        assert_eq!(undefined, 2);
        let v = encoder.values();
        assert!((v[0] - (-0.5)).abs() < 1e-6); // 500 / 1000 - 1
        assert_eq!(v[1], -1.0); // undefined
        assert!((v[2] - 1.0).abs() < 1e-6); // clamped to range
        assert_eq!(v[3], -1.0);
        assert!(v[4].abs() < 1e-6); // speed at half of max
        assert_eq!(v[5], -1.0); // rolling backwards
        assert_eq!(&v[6..10], &[1.0, -1.0, -1.0, 1.0]);
        assert_eq!(v[10], 1.0);
        assert_eq!(v[11], -1.0);
    }

    #[test]
    fn test_values_stay_in_range() {
        let mut encoder = SensorEncoder::new(SensorConfig::default());
        let mut vehicle = VehicleState::at_rest(Vec2::ZERO, 1.0);
        vehicle.linear_velocity = Vec2::new(100.0, 50.0);
        encoder.encode(&Corridor, &vehicle, &TrackReading::default(), Action::IDLE);
        assert!(encoder.values().iter().all(|v| (-1.0..=1.0).contains(v)));
    }
}
