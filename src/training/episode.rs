//! Per-cycle record of one timeline fork.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::{Action, ACTION_WIDTH};
use crate::world::VehicleState;

/// Where the training cycle currently is.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Driving on the policy until the next fork.
    #[default]
    Baseline,
    /// First timeline: unmodified policy, actions recorded.
    TimelineA,
    /// Second timeline: perturbed first action, then delayed replay of A.
    TimelineB,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Baseline => write!(f, "baseline"),
            Phase::TimelineA => write!(f, "timeline A"),
            Phase::TimelineB => write!(f, "timeline B"),
        }
    }
}

/// Mutable state of the cycle in flight.
///
/// Timeline A records one action per tick after its first tick; timeline B
/// pops one per tick after its first tick, so `recorded_actions` is empty
/// again when B ends.
#[derive(Clone, Debug)]
pub struct Episode {
    pub phase: Phase,

    /// Vehicle state captured at the fork, restored at the end of each timeline.
    pub split_snapshot: VehicleState,

    pub recorded_actions: VecDeque<Action>,

    /// Sensor vector observed on the first tick after the fork.
    pub inputs_at_split: Vec<f32>,

    /// ±1 encoding of the perturbed action, the training target.
    pub expected_outputs: [f32; ACTION_WIDTH],

    pub perturbed_action: Action,

    /// Summed speed per timeline.
    pub score_a: f32,
    pub score_b: f32,

    pub progress_at_start: f32,
    pub progress_after_a: f32,
    pub progress_after_b: f32,

    /// A lap was completed during the timeline.
    pub lap_a: bool,
    pub lap_b: bool,

    pub split_length_ms: u32,
    pub control_delay_ms: u32,
    pub timer_ms: u32,
    pub control_timer_ms: u32,

    /// `true` until the first tick of the current timeline has run.
    pub first_tick: bool,
}

impl Episode {
    /// Empty episode with buffers sized for `input_width` sensors and
    /// timelines of up to `max_ticks` ticks.
    pub fn new(input_width: usize, max_ticks: usize) -> Self {
        Self {
            phase: Phase::Baseline,
            split_snapshot: VehicleState::default(),
            recorded_actions: VecDeque::with_capacity(max_ticks),
            inputs_at_split: vec![0.0; input_width],
            expected_outputs: [0.0; ACTION_WIDTH],
            perturbed_action: Action::IDLE,
            score_a: 0.0,
            score_b: 0.0,
            progress_at_start: 0.0,
            progress_after_a: 0.0,
            progress_after_b: 0.0,
            lap_a: false,
            lap_b: false,
            split_length_ms: 0,
            control_delay_ms: 0,
            timer_ms: 0,
            control_timer_ms: 0,
            first_tick: true,
        }
    }

    /// Fork: remember where we are and enter timeline A.
    pub fn begin(
        &mut self,
        snapshot: VehicleState,
        progress: f32,
        split_length_ms: u32,
        control_delay_ms: u32,
    ) {
        self.phase = Phase::TimelineA;
        self.split_snapshot = snapshot;
        self.recorded_actions.clear();
        self.score_a = 0.0;
        self.score_b = 0.0;
        self.progress_at_start = progress;
        self.progress_after_a = progress;
        self.progress_after_b = progress;
        self.lap_a = false;
        self.lap_b = false;
        self.split_length_ms = split_length_ms;
        self.control_delay_ms = control_delay_ms;
        self.timer_ms = 0;
        self.control_timer_ms = 0;
        self.first_tick = true;
    }

    /// End of timeline A: the vehicle goes back to the fork for B.
    pub fn enter_timeline_b(&mut self, progress: f32) {
        self.progress_after_a = progress;
        self.phase = Phase::TimelineB;
        self.timer_ms = 0;
        self.first_tick = true;
    }

    /// Back to baseline, dropping whatever the cycle recorded.
    pub fn reset(&mut self) {
        self.phase = Phase::Baseline;
        self.recorded_actions.clear();
        self.timer_ms = 0;
        self.control_timer_ms = 0;
        self.first_tick = true;
    }

    /// Is a fork in flight?
    #[must_use]
    pub fn in_timeline(&self) -> bool {
        self.phase != Phase::Baseline
    }

    /// Has the current timeline run its full length?
    #[must_use]
    pub fn timeline_elapsed(&self) -> bool {
        self.timer_ms >= self.split_length_ms
    }

    /// Is timeline B still holding the perturbed action?
    #[must_use]
    pub fn in_control_delay(&self) -> bool {
        self.control_timer_ms < self.control_delay_ms
    }

    #[must_use]
    pub fn delta_a(&self) -> f32 {
        self.progress_after_a - self.progress_at_start
    }

    #[must_use]
    pub fn delta_b(&self) -> f32 {
        self.progress_after_b - self.progress_at_start
    }

    /// Did the perturbed timeline do better than the policy timeline?
    ///
    /// B wins when it made strictly more, and positive, progress, or when it
    /// completed a lap that A did not.
    #[must_use]
    pub fn perturbed_won(&self) -> bool {
        let (da, db) = (self.delta_a(), self.delta_b());
        (da < db && db > 0.0) || (!self.lap_a && self.lap_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decided(start: f32, after_a: f32, after_b: f32, lap_a: bool, lap_b: bool) -> bool {
        let mut episode = Episode::new(4, 8);
        episode.begin(VehicleState::default(), start, 100, 0);
        episode.enter_timeline_b(after_a);
        episode.progress_after_b = after_b;
        episode.lap_a = lap_a;
        episode.lap_b = lap_b;
        episode.perturbed_won()
    }

    #[test]
    fn test_decision_rule() {
        assert!(decided(0.1, 0.2, 0.3, false, false));
        assert!(!decided(0.1, 0.3, 0.2, false, false));
        assert!(!decided(0.1, 0.3, 0.3, false, false));
        // More progress than A but still behind the start.
        assert!(!decided(0.5, 0.2, 0.4, false, false));
        // Lap completion wins even with less progress.
        assert!(decided(0.9, 0.95, 0.05, false, true));
        assert!(!decided(0.9, 0.05, 0.05, true, true));
    }

    #[test]
    fn test_lifecycle() {
        let mut episode = Episode::new(3, 4);
        assert_eq!(episode.phase, Phase::Baseline);
        assert!(!episode.in_timeline());

        episode.begin(VehicleState::default(), 0.25, 48, 16);
        assert_eq!(episode.phase, Phase::TimelineA);
        assert!(episode.first_tick);
        assert!(!episode.timeline_elapsed());
        assert!(episode.in_control_delay());

        episode.recorded_actions.push_back(Action::IDLE);
        episode.timer_ms = 48;
        assert!(episode.timeline_elapsed());

        episode.enter_timeline_b(0.3);
        assert_eq!(episode.phase, Phase::TimelineB);
        assert_eq!(episode.timer_ms, 0);
        assert!((episode.delta_a() - 0.05).abs() < 1e-6);

        episode.reset();
        assert_eq!(episode.phase, Phase::Baseline);
        assert!(episode.recorded_actions.is_empty());
    }
}
