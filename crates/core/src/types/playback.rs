//! Playback-related domain models

use crate::types::KeyPointId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Slowest speed offered to the listener
pub const MIN_SPEED: f32 = 0.5;

/// Fastest speed offered to the listener
pub const MAX_SPEED: f32 = 2.0;

/// Speeds offered as one-tap choices
pub const SPEED_PRESETS: [f32; 4] = [0.8, 1.0, 1.2, 1.5];

/// Snapshot of what the player is doing right now
///
/// Produced continuously while a session is open. `duration_ms` stays 0
/// until the player has measured the current track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackStatus {
    pub position_ms: u64,
    pub duration_ms: u64,
    pub current_key_point_id: Option<KeyPointId>,
    pub speed: f32,
}

impl PlaybackStatus {
    /// Returns true once the player has reported a track duration
    pub fn has_duration(&self) -> bool {
        self.duration_ms > 0
    }
}

impl Default for PlaybackStatus {
    fn default() -> Self {
        Self {
            position_ms: 0,
            duration_ms: 0,
            current_key_point_id: None,
            speed: 1.0,
        }
    }
}

/// Coarse state of a playback session
///
/// `Initial -> {Playing, Paused} -> Error -> {Playing, Paused}`. Leaving
/// `Error` only happens when the listener moves to another track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Initial,
    Playing,
    Paused,
    Error,
}

impl SessionState {
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initial => write!(f, "initial"),
            Self::Playing => write!(f, "playing"),
            Self::Paused => write!(f, "paused"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Adds `delta` to `current`, rounds to one decimal and keeps the result
/// inside `[MIN_SPEED, MAX_SPEED]`
pub fn step_speed(current: f32, delta: f32) -> f32 {
    let stepped = ((current + delta) * 10.0).round() / 10.0;
    stepped.clamp(MIN_SPEED, MAX_SPEED)
}
