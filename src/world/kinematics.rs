//! Kinematic value types exchanged with the simulation.

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Plain 2D vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing at `angle` radians from the +x axis.
    #[must_use]
    pub fn from_angle(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(cos, sin)
    }

    #[must_use]
    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// z-component of the 3D cross product.
    #[must_use]
    pub fn cross(self, other: Vec2) -> f32 {
        self.x * other.y - self.y * other.x
    }

    #[must_use]
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    #[must_use]
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Unit vector in the same direction, or zero for a zero vector.
    #[must_use]
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len > 0.0 {
            self * (1.0 / len)
        } else {
            Vec2::ZERO
        }
    }

    /// Rotate counter-clockwise by `angle` radians.
    #[must_use]
    pub fn rotated(self, angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    /// Perpendicular `(y, -x)`.
    #[must_use]
    pub fn perp(self) -> Self {
        Self::new(self.y, -self.x)
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

/// Full kinematic state of the controlled vehicle.
///
/// Reading it gives the controller everything it senses about the car;
/// writing it back (via [`super::Simulation::restore_vehicle`]) is how a
/// timeline is rewound to the fork point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    pub position: Vec2,
    /// Orientation in radians; the heading is `Vec2::from_angle(rotation)`.
    pub rotation: f32,
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
    pub force_accumulator: Vec2,
    pub torque_accumulator: f32,
}

impl VehicleState {
    /// Vehicle at rest at `position`, facing `rotation`.
    #[must_use]
    pub fn at_rest(position: Vec2, rotation: f32) -> Self {
        Self {
            position,
            rotation,
            ..Self::default()
        }
    }

    /// Unit vector the vehicle is facing.
    #[must_use]
    pub fn heading(&self) -> Vec2 {
        Vec2::from_angle(self.rotation)
    }

    #[must_use]
    pub fn speed(&self) -> f32 {
        self.linear_velocity.length()
    }

    /// Is the vehicle rolling in the direction it faces (or standing still)?
    #[must_use]
    pub fn moving_forward(&self) -> bool {
        self.linear_velocity.dot(self.heading()) >= 0.0
    }

    /// Does every component hold a finite value?
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.rotation.is_finite()
            && self.linear_velocity.is_finite()
            && self.angular_velocity.is_finite()
            && self.force_accumulator.is_finite()
            && self.torque_accumulator.is_finite()
    }

    /// Copy with a different position, everything else unchanged.
    #[must_use]
    pub fn with_position(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_vector_ops() {
        let a = Vec2::new(3.0, 4.0);
        assert_eq!(a.length(), 5.0);
        assert_eq!(a.dot(Vec2::new(1.0, 0.0)), 3.0);
        assert_eq!(a - a, Vec2::ZERO);
        assert_eq!(-a * 2.0, Vec2::new(-6.0, -8.0));
        assert_eq!(Vec2::ZERO.normalized(), Vec2::ZERO);
        assert!((a.normalized().length() - 1.0).abs() < 1e-6);
        assert_eq!(Vec2::new(1.0, 0.0).cross(Vec2::new(0.0, 1.0)), 1.0);
    }

    #[test]
    fn test_rotation() {
        let r = Vec2::new(1.0, 0.0).rotated(FRAC_PI_2);
        assert!(r.x.abs() < 1e-6 && (r.y - 1.0).abs() < 1e-6);
        let h = Vec2::from_angle(FRAC_PI_2);
        assert!((h - r).length() < 1e-6);
    }

    #[test]
    fn test_vehicle_direction_flags() {
        let mut state = VehicleState::at_rest(Vec2::new(1.0, 2.0), 0.0);
        assert!(state.moving_forward());
        state.linear_velocity = Vec2::new(-5.0, 0.0);
        assert!(!state.moving_forward());
        assert_eq!(state.speed(), 5.0);
        assert!(state.is_finite());
        state.angular_velocity = f32::NAN;
        assert!(!state.is_finite());
    }
}
