//! Actuation commands: four independent booleans per tick.
//!
//! The policy network has one output per command. An output above zero
//! switches the command on. The supervised target for a command is its
//! signed encoding: `+1` for on, `-1` for off.

use serde::{Deserialize, Serialize};

/// Number of actuation commands (and of network outputs).
pub const ACTION_WIDTH: usize = 4;

/// One tick's actuation commands.
///
/// ## Example
///
/// ```
/// use rust_forkdrive::core::Action;
///
/// let action = Action::from_outputs(&[0.3, -0.1, 0.0, 0.9]);
/// assert!(action.accelerate && !action.brake && !action.steer_left && action.steer_right);
/// assert_eq!(action.to_signed(), [1.0, -1.0, -1.0, 1.0]);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    pub accelerate: bool,
    pub brake: bool,
    pub steer_left: bool,
    pub steer_right: bool,
}

impl Action {
    /// All commands off.
    pub const IDLE: Action = Action {
        accelerate: false,
        brake: false,
        steer_left: false,
        steer_right: false,
    };

    /// Create an action from the four command flags.
    #[must_use]
    pub const fn new(accelerate: bool, brake: bool, steer_left: bool, steer_right: bool) -> Self {
        Self {
            accelerate,
            brake,
            steer_left,
            steer_right,
        }
    }

    /// Build an action from a flag array in output order.
    #[must_use]
    pub const fn from_flags(flags: [bool; ACTION_WIDTH]) -> Self {
        Self::new(flags[0], flags[1], flags[2], flags[3])
    }

    /// Threshold network outputs at zero.
    ///
    /// Missing outputs count as off; extra outputs are ignored.
    #[must_use]
    pub fn from_outputs(outputs: &[f32]) -> Self {
        let mut flags = [false; ACTION_WIDTH];
        for (flag, &out) in flags.iter_mut().zip(outputs) {
            *flag = out > 0.0;
        }
        Self::from_flags(flags)
    }

    /// Flags in output order.
    #[must_use]
    pub const fn flags(self) -> [bool; ACTION_WIDTH] {
        [self.accelerate, self.brake, self.steer_left, self.steer_right]
    }

    /// Signed (`±1`) encoding, used both as sensor input and training target.
    #[must_use]
    pub fn to_signed(self) -> [f32; ACTION_WIDTH] {
        self.flags().map(|on| if on { 1.0 } else { -1.0 })
    }

    /// Return a copy with the command at `index` inverted.
    ///
    /// # Panics
    ///
    /// Panics if `index >= ACTION_WIDTH`.
    #[must_use]
    pub fn flipped(self, index: usize) -> Self {
        let mut flags = self.flags();
        flags[index] = !flags[index];
        Self::from_flags(flags)
    }

    /// Number of commands that differ from `other`.
    #[must_use]
    pub fn distance(self, other: Action) -> usize {
        self.flags()
            .iter()
            .zip(other.flags())
            .filter(|(a, b)| **a != *b)
            .count()
    }
}
