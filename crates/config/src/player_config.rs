//! Player configuration section

use crate::validation::{ConfigSection, ValidationError, Validator};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Player tuning and transport behavior
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    /// Speed shown before the player reports one (0.5 - 2.0)
    pub default_speed: f32,

    /// Lowest selectable speed
    pub min_speed: f32,

    /// Highest selectable speed
    pub max_speed: f32,

    /// Speed change per step
    pub speed_step: f32,

    /// One-tap speed choices
    pub speed_presets: Vec<f32>,

    /// Distance of a backward skip in milliseconds
    pub seek_backward_ms: u64,

    /// Distance of a forward skip in milliseconds
    pub seek_forward_ms: u64,

    /// How often the live position is sampled from the player
    pub position_poll_ms: u64,

    /// Capacity of the one-shot event queue
    pub event_buffer: usize,

    /// Screen refresh rate in milliseconds
    pub ui_refresh_ms: u64,
}

impl PlayerConfig {
    /// Position sampling cadence as a `Duration`
    pub fn position_poll_interval(&self) -> Duration {
        Duration::from_millis(self.position_poll_ms)
    }

    /// Screen refresh cadence as a `Duration`
    pub fn ui_refresh_interval(&self) -> Duration {
        Duration::from_millis(self.ui_refresh_ms)
    }

    /// Keeps a requested speed inside the configured bounds
    pub fn clamp_speed(&self, speed: f32) -> f32 {
        speed.max(self.min_speed).min(self.max_speed)
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            default_speed: 1.0,
            min_speed: 0.5,
            max_speed: 2.0,
            speed_step: 0.1,
            speed_presets: vec![0.8, 1.0, 1.2, 1.5],
            seek_backward_ms: 5_000,
            seek_forward_ms: 10_000,
            position_poll_ms: 1_000,
            event_buffer: 16,
            ui_refresh_ms: 250,
        }
    }
}

impl ConfigSection for PlayerConfig {
    fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut results = vec![
            Validator::in_range(self.min_speed, 0.25, 1.0, "player.min_speed"),
            Validator::in_range(self.max_speed, 1.0, 4.0, "player.max_speed"),
            Validator::in_range(
                self.default_speed,
                self.min_speed,
                self.max_speed,
                "player.default_speed",
            ),
            Validator::in_range(self.speed_step, 0.05, 0.5, "player.speed_step"),
            Validator::in_range(self.seek_backward_ms, 1_000, 60_000, "player.seek_backward_ms"),
            Validator::in_range(self.seek_forward_ms, 1_000, 120_000, "player.seek_forward_ms"),
            Validator::in_range(self.position_poll_ms, 50, 5_000, "player.position_poll_ms"),
            Validator::in_range(self.event_buffer, 1, 1_024, "player.event_buffer"),
            Validator::in_range(self.ui_refresh_ms, 16, 1_000, "player.ui_refresh_ms"),
        ];

        for (index, preset) in self.speed_presets.iter().enumerate() {
            results.push(Validator::in_range(
                *preset,
                self.min_speed,
                self.max_speed,
                &format!("player.speed_presets[{}]", index),
            ));
        }

        Validator::collect_errors(results)
    }

    fn merge(&mut self, other: Self) {
        self.default_speed = other.default_speed;
        self.min_speed = other.min_speed;
        self.max_speed = other.max_speed;
        self.speed_step = other.speed_step;
        self.speed_presets = other.speed_presets;
        self.seek_backward_ms = other.seek_backward_ms;
        self.seek_forward_ms = other.seek_forward_ms;
        self.position_poll_ms = other.position_poll_ms;
        self.event_buffer = other.event_buffer;
        self.ui_refresh_ms = other.ui_refresh_ms;
    }

    fn section_name(&self) -> &'static str {
        "player"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PlayerConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_seek_intervals() {
        let config = PlayerConfig::default();
        assert_eq!(config.seek_backward_ms, 5_000);
        assert_eq!(config.seek_forward_ms, 10_000);
        assert_eq!(config.position_poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_invalid_speed() {
        let mut config = PlayerConfig::default();
        config.default_speed = 3.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_preset_outside_bounds() {
        let mut config = PlayerConfig::default();
        config.speed_presets.push(2.5);
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "player.speed_presets[4]");
    }

    #[test]
    fn test_clamp_speed() {
        let config = PlayerConfig::default();
        assert_eq!(config.clamp_speed(3.0), 2.0);
        assert_eq!(config.clamp_speed(0.1), 0.5);
        assert_eq!(config.clamp_speed(1.2), 1.2);
    }

    #[test]
    fn test_merge() {
        let mut base = PlayerConfig::default();
        let other = PlayerConfig {
            seek_forward_ms: 15_000,
            speed_presets: vec![1.0, 2.0],
            ..Default::default()
        };

        base.merge(other);
        assert_eq!(base.seek_forward_ms, 15_000);
        assert_eq!(base.speed_presets, vec![1.0, 2.0]);
    }

    #[test]
    fn test_multiple_validation_errors() {
        let config = PlayerConfig {
            seek_backward_ms: 0,
            position_poll_ms: 0,
            event_buffer: 0,
            ..Default::default()
        };

        let result = config.validate();
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().len(), 3);
    }
}
