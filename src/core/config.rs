//! Trainer configuration.
//!
//! Every constant the controller and the sensor encoder use lives here:
//! - `SensorConfig`: ray fan and normalisation ranges
//! - `TrainerConfig`: tick length, split timing, checkpoint cadence,
//!   perturbation odds, network shape and learning rate
//!
//! Configurations are plain serde structs so they can be loaded from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::action::ACTION_WIDTH;
use crate::error::ConfigError;
use crate::nn::TopologyPolicy;

/// Number of non-ray sensor inputs: speed, direction of travel, the previous
/// action (4) and two track-alignment flags.
pub const EXTRA_SENSOR_INPUTS: usize = 8;

/// Sensor encoding parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Rays fanned evenly over a full turn, starting at the heading.
    pub ray_count: usize,

    /// Distances are clamped to this range before normalisation.
    pub max_sight_range: f32,

    /// Speed that maps to `+1`.
    pub max_velocity: f32,

    /// Distance reported for a ray that hit nothing.
    pub undefined_ray_distance: f32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            ray_count: 10,
            max_sight_range: 2000.0,
            max_velocity: 601.0,
            undefined_ray_distance: 0.0,
        }
    }
}

impl SensorConfig {
    /// Width of the sensor vector.
    #[must_use]
    pub fn input_width(&self) -> usize {
        self.ray_count + EXTRA_SENSOR_INPUTS
    }

    /// Set the number of rays.
    #[must_use]
    pub fn with_ray_count(mut self, count: usize) -> Self {
        self.ray_count = count;
        self
    }
}

/// Training controller configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Fixed simulated tick length, independent of host frame time.
    pub tick_ms: u32,

    /// Time spent in the baseline phase before the next fork.
    pub time_between_splits_ms: u32,

    /// Lower bound (inclusive) of the sampled timeline length.
    pub min_split_ms: u32,

    /// Upper bound (exclusive) of the sampled timeline length.
    pub max_split_ms: u32,

    /// Upper bound (exclusive) of the sampled control delay in timeline B.
    pub max_control_delay_ms: u32,

    /// Completed cycles between checkpoints.
    pub saving_interval: u32,

    /// Probability of flipping a single command instead of redrawing all four.
    pub flip_probability: f64,

    /// Step size of the weight update.
    pub learning_rate: f32,

    /// Hidden layer widths; input and output widths are derived.
    pub hidden_layers: Vec<usize>,

    /// Sensor encoding.
    pub sensors: SensorConfig,

    /// Consecutive ticks with undefined rays before the controller faults.
    pub max_undefined_ray_ticks: u32,

    /// What to do when a persisted network has a different shape.
    pub topology_policy: TopologyPolicy,

    /// Seed for weight initialisation and all sampling.
    pub seed: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            tick_ms: 16,
            time_between_splits_ms: 0,
            min_split_ms: 3000,
            max_split_ms: 8000,
            max_control_delay_ms: 3000,
            saving_interval: 1000,
            flip_probability: 0.9,
            learning_rate: 0.02,
            hidden_layers: vec![30, 30, 30, 10],
            sensors: SensorConfig::default(),
            max_undefined_ray_ticks: 3,
            topology_policy: TopologyPolicy::Adopt,
            seed: 42,
        }
    }
}

impl TrainerConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Full layer-width list: sensors, hidden layers, actions.
    #[must_use]
    pub fn topology(&self) -> Vec<usize> {
        let mut widths = Vec::with_capacity(self.hidden_layers.len() + 2);
        widths.push(self.sensors.input_width());
        widths.extend_from_slice(&self.hidden_layers);
        widths.push(ACTION_WIDTH);
        widths
    }

    /// Longest possible timeline in ticks, used to size the action recording.
    #[must_use]
    pub fn max_ticks_per_timeline(&self) -> usize {
        (self.max_split_ms / self.tick_ms.max(1)) as usize + 1
    }

    /// Check internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_ms == 0 {
            return Err(ConfigError::invalid("tick_ms must be positive"));
        }
        if self.min_split_ms >= self.max_split_ms {
            return Err(ConfigError::invalid(format!(
                "min_split_ms ({}) must be below max_split_ms ({})",
                self.min_split_ms, self.max_split_ms
            )));
        }
        if self.saving_interval == 0 {
            return Err(ConfigError::invalid("saving_interval must be positive"));
        }
        if !(0.0..=1.0).contains(&self.flip_probability) {
            return Err(ConfigError::invalid("flip_probability must lie in [0, 1]"));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ConfigError::invalid("learning_rate must be positive"));
        }
        if self.hidden_layers.contains(&0) {
            return Err(ConfigError::invalid("hidden layer widths must be positive"));
        }
        if self.sensors.ray_count == 0 {
            return Err(ConfigError::invalid("sensors.ray_count must be positive"));
        }
        if self.sensors.max_sight_range <= 0.0 || self.sensors.max_velocity <= 0.0 {
            return Err(ConfigError::invalid(
                "sensor normalisation ranges must be positive",
            ));
        }
        if self.max_undefined_ray_ticks == 0 {
            return Err(ConfigError::invalid(
                "max_undefined_ray_ticks must be positive",
            ));
        }
        Ok(())
    }

    /// Set the tick length.
    #[must_use]
    pub fn with_tick_ms(mut self, tick_ms: u32) -> Self {
        self.tick_ms = tick_ms;
        self
    }

    /// Set the sampled timeline length range `[min, max)`.
    #[must_use]
    pub fn with_split_range(mut self, min_ms: u32, max_ms: u32) -> Self {
        self.min_split_ms = min_ms;
        self.max_split_ms = max_ms;
        self
    }

    /// Set the upper bound of the control delay.
    #[must_use]
    pub fn with_max_control_delay(mut self, max_ms: u32) -> Self {
        self.max_control_delay_ms = max_ms;
        self
    }

    /// Set the baseline wait between cycles.
    #[must_use]
    pub fn with_time_between_splits(mut self, ms: u32) -> Self {
        self.time_between_splits_ms = ms;
        self
    }

    /// Set the checkpoint cadence in cycles.
    #[must_use]
    pub fn with_saving_interval(mut self, cycles: u32) -> Self {
        self.saving_interval = cycles;
        self
    }

    /// Set the hidden layer widths.
    #[must_use]
    pub fn with_hidden_layers(mut self, widths: Vec<usize>) -> Self {
        self.hidden_layers = widths;
        self
    }

    /// Set the learning rate.
    #[must_use]
    pub fn with_learning_rate(mut self, rate: f32) -> Self {
        self.learning_rate = rate;
        self
    }

    /// Set the sensor configuration.
    #[must_use]
    pub fn with_sensors(mut self, sensors: SensorConfig) -> Self {
        self.sensors = sensors;
        self
    }

    /// Set the topology policy.
    #[must_use]
    pub fn with_topology_policy(mut self, policy: TopologyPolicy) -> Self {
        self.topology_policy = policy;
        self
    }

    /// Set the seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TrainerConfig::default();
        assert_eq!(config.tick_ms, 16);
        assert_eq!(config.saving_interval, 1000);
        assert_eq!(config.topology(), vec![18, 30, 30, 30, 10, 4]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = TrainerConfig::default()
            .with_split_range(100, 200)
            .with_hidden_layers(vec![6])
            .with_sensors(SensorConfig::default().with_ray_count(4))
            .with_seed(7);

        assert_eq!(config.min_split_ms, 100);
        assert_eq!(config.max_split_ms, 200);
        assert_eq!(config.topology(), vec![12, 6, 4]);
        assert_eq!(config.seed, 7);
        assert_eq!(config.max_ticks_per_timeline(), 13);
    }

    #[test]
    fn test_validation_rejects_bad_ranges() {
        assert!(TrainerConfig::default().with_split_range(500, 500).validate().is_err());
        assert!(TrainerConfig::default().with_tick_ms(0).validate().is_err());
        assert!(TrainerConfig::default().with_saving_interval(0).validate().is_err());
        assert!(TrainerConfig::default().with_hidden_layers(vec![4, 0]).validate().is_err());
        assert!(TrainerConfig::default().with_learning_rate(-1.0).validate().is_err());
    }

    #[test]
    fn test_serialization() {
        let config = TrainerConfig::default().with_seed(99);
        let json = serde_json::to_string(&config).unwrap();
        let deserialized = TrainerConfig::from_json_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = TrainerConfig::from_json_str(r#"{"saving_interval": 5, "sensors": {"ray_count": 6}}"#)
            .unwrap();
        assert_eq!(config.saving_interval, 5);
        assert_eq!(config.sensors.ray_count, 6);
        assert_eq!(config.sensors.max_sight_range, 2000.0);
        assert_eq!(config.tick_ms, 16);
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        assert!(matches!(
            TrainerConfig::from_json_str(r#"{"min_split_ms": 9000}"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            TrainerConfig::from_json_str("not json"),
            Err(ConfigError::Json(_))
        ));
    }
}
