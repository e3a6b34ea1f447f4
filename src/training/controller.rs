//! The timeline-fork training controller.
//!
//! Each training cycle forks the world at a snapshot. Timeline A drives the
//! unmodified policy and records its actions. Timeline B starts from the
//! same snapshot, applies a perturbed first action, keeps it for a random
//! control delay and then replays A's recording. If B made more track
//! progress, the network takes one gradient step toward the perturbed action
//! for the sensor vector seen at the fork.
//!
//! ## Tick order
//!
//! 1. finish a cycle abandoned by a mode switch
//! 2. read the vehicle and its track progress
//! 3. choose and apply the action for the current mode and phase
//! 4. phase bookkeeping: fork, rewind, decide, checkpoint
//!
//! The host steps its physics after [`TimelineTrainer::tick`] returns.

use smallvec::SmallVec;
use tracing::{debug, error, info, trace, warn};

use serde::{Deserialize, Serialize};

use crate::core::{Action, Mode, SimRng, TrainerConfig, ACTION_WIDTH};
use crate::error::{NetworkError, TrainerError};
use crate::nn::{load_or_init, Network};
use crate::world::{SensorEncoder, Simulation, TrackReading, Vec2, VehicleState};

use super::checkpoint::CheckpointStore;
use super::episode::{Episode, Phase};

/// Why the controller stopped training.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultReason {
    /// Rays came back undefined for this many consecutive ticks.
    UndefinedRays { ticks: u32 },
    /// The vehicle state held NaN or infinity.
    NonFiniteState,
}

impl std::fmt::Display for FaultReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FaultReason::UndefinedRays { ticks } => {
                write!(f, "undefined ray casts for {ticks} consecutive ticks")
            }
            FaultReason::NonFiniteState => write!(f, "non-finite vehicle state"),
        }
    }
}

/// Summary of one completed fork.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    /// Zero-based index of the cycle since the trainer was created.
    pub cycle: u64,
    pub delta_a: f32,
    pub delta_b: f32,
    pub lap_a: bool,
    pub lap_b: bool,
    /// Summed speed per timeline.
    pub score_a: f32,
    pub score_b: f32,
    pub split_length_ms: u32,
    pub control_delay_ms: u32,
    pub perturbed_action: Action,
    /// Whether the network was updated toward the perturbed action.
    pub learned: bool,
}

/// Something notable that happened during a tick.
#[derive(Clone, Debug, PartialEq)]
pub enum TrainingEvent {
    SplitStarted,
    TimelineAEnded,
    CycleCompleted(CycleReport),
    Checkpointed { generation: u64, saved: bool },
    Teleported { waypoint: Vec2 },
    Faulted(FaultReason),
    CycleAbandoned,
}

/// Events of a single tick; rarely more than two.
pub type TickEvents = SmallVec<[TrainingEvent; 4]>;

/// What one call to [`TimelineTrainer::tick`] did.
#[derive(Clone, Debug)]
pub struct TickReport {
    /// Mode in effect at the end of the tick.
    pub mode: Mode,
    /// Phase at the end of the tick.
    pub phase: Phase,
    /// Action sent to the simulation.
    pub action: Action,
    pub events: TickEvents,
}

impl TickReport {
    /// The completed cycle, if this tick finished one.
    pub fn cycle(&self) -> Option<&CycleReport> {
        self.events.iter().find_map(|e| match e {
            TrainingEvent::CycleCompleted(report) => Some(report),
            _ => None,
        })
    }
}

/// Running totals since the trainer was created.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainerStats {
    pub ticks: u64,
    pub cycles: u64,
    pub learning_events: u64,
    pub checkpoints: u64,
    pub failed_checkpoints: u64,
    pub teleports: u64,
    pub faults: u64,
    pub abandoned_cycles: u64,
}

/// Online trainer for the driving policy.
///
/// Owns the network, the generation counter and the checkpoint store. A
/// host calls [`tick`](Self::tick) once per fixed simulation step.
pub struct TimelineTrainer<C: CheckpointStore> {
    config: TrainerConfig,
    network: Network,
    generation: u64,
    store: C,
    encoder: SensorEncoder,
    episode: Episode,
    mode: Mode,
    last_action: Action,
    rng: SimRng,
    cycles_since_save: u32,
    learned_since_save: bool,
    undefined_ray_ticks: u32,
    fault: Option<FaultReason>,
    abandon_pending: bool,
    stats: TrainerStats,
}

impl<C: CheckpointStore> TimelineTrainer<C> {
    /// Load the network from `store` (or start a fresh one) and build a trainer.
    pub fn new(config: TrainerConfig, store: C) -> Result<Self, TrainerError> {
        let mut weights_rng = SimRng::new(config.seed).for_context("weights");
        let loaded = load_or_init(
            &store,
            &config.topology(),
            config.learning_rate,
            config.topology_policy,
            &mut weights_rng,
        )?;
        info!(
            store = %store.describe(),
            generation = loaded.generation,
            origin = ?loaded.origin,
            topology = ?loaded.network.topology(),
            "policy network ready"
        );
        Ok(Self::from_network(config, loaded.network, loaded.generation, store))
    }

    /// Build a trainer around an existing network.
    pub fn from_network(config: TrainerConfig, network: Network, generation: u64, store: C) -> Self {
        let encoder = SensorEncoder::new(config.sensors.clone());
        let episode = Episode::new(encoder.width(), config.max_ticks_per_timeline());
        let rng = SimRng::new(config.seed).for_context("trainer");
        Self {
            config,
            network,
            generation,
            store,
            encoder,
            episode,
            mode: Mode::Manual,
            last_action: Action::IDLE,
            rng,
            cycles_since_save: 0,
            learned_since_save: false,
            undefined_ray_ticks: 0,
            fault: None,
            abandon_pending: false,
            stats: TrainerStats::default(),
        }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn episode(&self) -> &Episode {
        &self.episode
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn stats(&self) -> &TrainerStats {
        &self.stats
    }

    pub fn store(&self) -> &C {
        &self.store
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The action applied on the previous tick.
    pub fn last_action(&self) -> Action {
        self.last_action
    }

    /// Set while a fault is active; the host should pause its physics.
    pub fn is_faulted(&self) -> bool {
        self.fault.is_some()
    }

    pub fn fault(&self) -> Option<FaultReason> {
        self.fault
    }

    /// Switch modes.
    ///
    /// Leaving Training while a fork is in flight abandons the cycle: on the
    /// next tick the vehicle is put back at the fork snapshot and nothing is
    /// learned. Selecting Training clears a fault.
    pub fn select_mode(&mut self, mode: Mode) {
        if mode != Mode::Training && self.episode.in_timeline() {
            self.abandon_pending = true;
        }
        if mode == Mode::Training && self.fault.take().is_some() {
            self.undefined_ray_ticks = 0;
            info!("fault cleared, training resumed");
        }
        if mode != self.mode {
            debug!(from = %self.mode, to = %mode, "mode changed");
        }
        self.mode = mode;
    }

    /// Write the current network to the store now.
    ///
    /// Periodic checkpoints happen automatically; this is for hosts that
    /// want to save on shutdown. The generation counter is not advanced.
    pub fn save(&mut self) -> Result<(), crate::error::PersistError> {
        self.store.save(&self.network.to_text(self.generation))
    }

    /// Advance the controller by one fixed tick.
    ///
    /// `manual` is the host's input, applied only in [`Mode::Manual`].
    pub fn tick<S: Simulation + ?Sized>(
        &mut self,
        sim: &mut S,
        manual: Action,
    ) -> Result<TickReport, TrainerError> {
        self.stats.ticks += 1;
        let mut events = TickEvents::new();

        if self.abandon_pending {
            self.abandon_pending = false;
            self.abandon_cycle(sim, &mut events);
        }

        let vehicle = sim.vehicle();
        let reading = sim.track_progress(vehicle.position);

        if self.fault.is_none() && !vehicle.is_finite() {
            self.raise_fault(sim, FaultReason::NonFiniteState, &mut events);
        }

        let action = match self.mode {
            Mode::Manual => {
                self.apply(sim, manual);
                manual
            }
            Mode::Autonomous => match self.policy_action(sim, &vehicle, &reading, &mut events)? {
                Some(action) => {
                    self.apply(sim, action);
                    action
                }
                None => self.apply_idle(sim),
            },
            Mode::Training => self.training_tick(sim, &vehicle, &reading, &mut events)?,
        };

        Ok(TickReport {
            mode: self.mode,
            phase: self.episode.phase,
            action,
            events,
        })
    }

    fn apply<S: Simulation + ?Sized>(&mut self, sim: &mut S, action: Action) {
        sim.actuate(action);
        self.last_action = action;
    }

    fn apply_idle<S: Simulation + ?Sized>(&mut self, sim: &mut S) -> Action {
        self.apply(sim, Action::IDLE);
        Action::IDLE
    }

    /// Encode the sensors and track the undefined-ray streak.
    ///
    /// Returns `false` when the streak reached the limit; the fault has then
    /// been raised.
    fn observe<S: Simulation + ?Sized>(
        &mut self,
        sim: &mut S,
        vehicle: &VehicleState,
        reading: &TrackReading,
        events: &mut TickEvents,
    ) -> bool {
        let undefined = self
            .encoder
            .encode(&*sim, vehicle, reading, self.last_action);
        if undefined == 0 {
            self.undefined_ray_ticks = 0;
            return true;
        }
        self.undefined_ray_ticks += 1;
        trace!(undefined, streak = self.undefined_ray_ticks, "undefined ray casts");
        if self.undefined_ray_ticks >= self.config.max_undefined_ray_ticks {
            let ticks = self.undefined_ray_ticks;
            self.raise_fault(sim, FaultReason::UndefinedRays { ticks }, events);
            return false;
        }
        true
    }

    /// Encode the sensors and run the policy.
    ///
    /// Returns `None` when a fault was raised instead.
    fn policy_action<S: Simulation + ?Sized>(
        &mut self,
        sim: &mut S,
        vehicle: &VehicleState,
        reading: &TrackReading,
        events: &mut TickEvents,
    ) -> Result<Option<Action>, TrainerError> {
        if !self.observe(sim, vehicle, reading, events) {
            return Ok(None);
        }

        let expected = self.network.input_width();
        let actual = self.encoder.width();
        if expected != actual {
            return Err(TrainerError::SensorWidth { expected, actual });
        }
        let outputs = self.network.feed_forward(self.encoder.values())?;
        if outputs.len() != ACTION_WIDTH {
            return Err(NetworkError::ShapeMismatch {
                what: "policy outputs",
                expected: ACTION_WIDTH,
                actual: outputs.len(),
            }
            .into());
        }
        Ok(Some(Action::from_outputs(outputs)))
    }

    fn training_tick<S: Simulation + ?Sized>(
        &mut self,
        sim: &mut S,
        vehicle: &VehicleState,
        reading: &TrackReading,
        events: &mut TickEvents,
    ) -> Result<Action, TrainerError> {
        self.episode.timer_ms += self.config.tick_ms;

        match self.episode.phase {
            Phase::Baseline => {
                let Some(action) = self.policy_action(sim, vehicle, reading, events)? else {
                    return Ok(self.apply_idle(sim));
                };
                self.apply(sim, action);
                if self.episode.timer_ms >= self.config.time_between_splits_ms {
                    self.start_split(sim, reading.progress);
                    events.push(TrainingEvent::SplitStarted);
                }
                Ok(action)
            }
            Phase::TimelineA => {
                let Some(action) = self.policy_action(sim, vehicle, reading, events)? else {
                    return Ok(self.apply_idle(sim));
                };
                self.apply(sim, action);
                if self.episode.first_tick {
                    self.episode.inputs_at_split.clear();
                    self.episode
                        .inputs_at_split
                        .extend_from_slice(self.encoder.values());
                    self.episode.first_tick = false;
                } else {
                    self.episode.recorded_actions.push_back(action);
                    self.episode.score_a += vehicle.speed();
                }
                self.episode.lap_a |= reading.lap_completed;

                if self.episode.timeline_elapsed() {
                    sim.restore_vehicle(&self.episode.split_snapshot);
                    self.episode.enter_timeline_b(reading.progress);
                    trace!(
                        progress = self.episode.delta_a(),
                        recorded = self.episode.recorded_actions.len(),
                        "timeline A finished"
                    );
                    events.push(TrainingEvent::TimelineAEnded);
                }
                Ok(action)
            }
            Phase::TimelineB => {
                let action = if self.episode.first_tick {
                    let Some(policy) = self.policy_action(sim, vehicle, reading, events)? else {
                        return Ok(self.apply_idle(sim));
                    };
                    let perturbed = self.perturb(policy);
                    self.episode.perturbed_action = perturbed;
                    self.episode.expected_outputs = perturbed.to_signed();
                    self.episode.first_tick = false;
                    perturbed
                } else {
                    // No inference while replaying, but the rays are still checked.
                    if !self.observe(sim, vehicle, reading, events) {
                        return Ok(self.apply_idle(sim));
                    }
                    self.episode.score_b += vehicle.speed();
                    let recorded = self.episode.recorded_actions.pop_front();
                    if self.episode.in_control_delay() {
                        self.episode.control_timer_ms += self.config.tick_ms;
                        self.episode.perturbed_action
                    } else {
                        recorded.unwrap_or(self.last_action)
                    }
                };
                self.apply(sim, action);
                self.episode.lap_b |= reading.lap_completed;

                if self.episode.timeline_elapsed() {
                    self.episode.progress_after_b = reading.progress;
                    self.finish_cycle(sim, events)?;
                }
                Ok(action)
            }
        }
    }

    fn start_split<S: Simulation + ?Sized>(&mut self, sim: &mut S, progress: f32) {
        let split = self
            .rng
            .gen_range_u32(self.config.min_split_ms..self.config.max_split_ms);
        let delay = self.rng.gen_range_u32(0..self.config.max_control_delay_ms);
        self.episode.begin(sim.snapshot(), progress, split, delay);
        trace!(split_ms = split, control_delay_ms = delay, progress, "timeline split");
    }

    /// Flip one command, or with the remaining probability redraw all four.
    fn perturb(&mut self, action: Action) -> Action {
        if self.rng.gen_bool(self.config.flip_probability) {
            action.flipped(self.rng.gen_range_usize(0..ACTION_WIDTH))
        } else {
            let rng = &mut self.rng;
            Action::from_flags(std::array::from_fn(|_| rng.gen_bool(0.5)))
        }
    }

    fn finish_cycle<S: Simulation + ?Sized>(
        &mut self,
        sim: &mut S,
        events: &mut TickEvents,
    ) -> Result<(), TrainerError> {
        let learned = self.episode.perturbed_won();
        if learned {
            self.network.feed_forward(&self.episode.inputs_at_split)?;
            self.network.back_prop(&self.episode.expected_outputs)?;
            self.stats.learning_events += 1;
            self.learned_since_save = true;
        }

        let report = CycleReport {
            cycle: self.stats.cycles,
            delta_a: self.episode.delta_a(),
            delta_b: self.episode.delta_b(),
            lap_a: self.episode.lap_a,
            lap_b: self.episode.lap_b,
            score_a: self.episode.score_a,
            score_b: self.episode.score_b,
            split_length_ms: self.episode.split_length_ms,
            control_delay_ms: self.episode.control_delay_ms,
            perturbed_action: self.episode.perturbed_action,
            learned,
        };
        debug!(
            cycle = report.cycle,
            delta_a = report.delta_a,
            delta_b = report.delta_b,
            lap_a = report.lap_a,
            lap_b = report.lap_b,
            learned,
            "cycle decided"
        );

        sim.restore_vehicle(&self.episode.split_snapshot);
        self.episode.reset();
        self.stats.cycles += 1;
        events.push(TrainingEvent::CycleCompleted(report));

        self.cycles_since_save += 1;
        if self.cycles_since_save >= self.config.saving_interval {
            self.checkpoint(sim, events);
        }
        Ok(())
    }

    fn checkpoint<S: Simulation + ?Sized>(&mut self, sim: &mut S, events: &mut TickEvents) {
        self.generation += 1;
        self.cycles_since_save = 0;

        let text = self.network.to_text(self.generation);
        let saved = match self.store.save(&text) {
            Ok(()) => {
                self.stats.checkpoints += 1;
                info!(generation = self.generation, store = %self.store.describe(), "checkpoint saved");
                true
            }
            Err(err) => {
                self.stats.failed_checkpoints += 1;
                error!(generation = self.generation, store = %self.store.describe(), error = %err, "checkpoint failed");
                false
            }
        };
        events.push(TrainingEvent::Checkpointed {
            generation: self.generation,
            saved,
        });

        if !self.learned_since_save {
            if let Some(waypoint) = self.rng.choose(sim.waypoints()).copied() {
                let moved = sim.vehicle().with_position(waypoint);
                sim.restore_vehicle(&moved);
                self.stats.teleports += 1;
                info!(x = waypoint.x, y = waypoint.y, "nothing learned since last checkpoint, teleporting");
                events.push(TrainingEvent::Teleported { waypoint });
            }
        }
        self.learned_since_save = false;
    }

    fn abandon_cycle<S: Simulation + ?Sized>(&mut self, sim: &mut S, events: &mut TickEvents) {
        if !self.episode.in_timeline() {
            return;
        }
        sim.restore_vehicle(&self.episode.split_snapshot);
        debug!(phase = %self.episode.phase, "cycle abandoned");
        self.episode.reset();
        self.stats.abandoned_cycles += 1;
        events.push(TrainingEvent::CycleAbandoned);
    }

    fn raise_fault<S: Simulation + ?Sized>(
        &mut self,
        sim: &mut S,
        reason: FaultReason,
        events: &mut TickEvents,
    ) {
        warn!(%reason, mode = %self.mode, "controller fault, dropping to manual");
        self.abandon_cycle(sim, events);
        self.abandon_pending = false;
        self.fault = Some(reason);
        self.mode = Mode::Manual;
        self.undefined_ray_ticks = 0;
        self.stats.faults += 1;
        events.push(TrainingEvent::Faulted(reason));
    }
}
