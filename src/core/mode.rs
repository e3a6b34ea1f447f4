//! Operating mode of the controller.

use serde::{Deserialize, Serialize};

/// Which source drives the vehicle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Commands come from the host's input devices. No inference, no learning.
    #[default]
    Manual,
    /// The policy network drives. No learning.
    Autonomous,
    /// The policy drives while the timeline-fork trainer learns.
    Training,
}

impl Mode {
    /// Map the host's numeric mode selector (`1`, `2`, `3`).
    #[must_use]
    pub const fn from_selector(selector: u8) -> Option<Self> {
        match selector {
            1 => Some(Mode::Manual),
            2 => Some(Mode::Autonomous),
            3 => Some(Mode::Training),
            _ => None,
        }
    }

    /// Numeric selector for this mode.
    #[must_use]
    pub const fn selector(self) -> u8 {
        match self {
            Mode::Manual => 1,
            Mode::Autonomous => 2,
            Mode::Training => 3,
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Mode::Manual => "manual",
            Mode::Autonomous => "autonomous",
            Mode::Training => "training",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_round_trip() {
        for mode in [Mode::Manual, Mode::Autonomous, Mode::Training] {
            assert_eq!(Mode::from_selector(mode.selector()), Some(mode));
        }
        assert_eq!(Mode::from_selector(0), None);
        assert_eq!(Mode::from_selector(4), None);
    }
}
