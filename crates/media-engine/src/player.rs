//! Boundary to the platform media player
//!
//! The session controller only talks to the player through these traits, so
//! a real platform binding and [`crate::SimulatedPlayer`] are interchangeable.

use crate::error::EngineResult;
use crate::media_item::MediaItem;
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by the player while playing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct PlayerFailure {
    pub message: String,
}

impl PlayerFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// What the player reports alongside a batch of events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerSnapshot {
    /// Media id of the current item, if any
    pub current_media_id: Option<String>,
    /// Duration of the current item once known
    pub duration_ms: Option<u64>,
}

/// Callbacks raised by a player
///
/// Implementations may be called from whichever thread drives the player and
/// must not call back into it.
pub trait PlayerListener: Send + Sync {
    fn on_player_error(&self, failure: &PlayerFailure);

    fn on_is_playing_changed(&self, is_playing: bool);

    fn on_playback_parameters_changed(&self, speed: f32);

    fn on_events(&self, snapshot: &PlayerSnapshot);
}

/// Capabilities the session needs from a connected media player
pub trait MediaPlayer: Send {
    fn add_listener(&mut self, listener: Arc<dyn PlayerListener>);

    fn is_connected(&self) -> bool;

    fn clear_media_items(&mut self);

    /// Replaces the queue and positions it on `start_index`
    fn set_media_items(&mut self, items: Vec<MediaItem>, start_index: usize);

    fn prepare(&mut self);

    fn set_play_when_ready(&mut self, play_when_ready: bool);

    fn play(&mut self);

    fn pause(&mut self);

    fn set_playback_speed(&mut self, speed: f32);

    fn seek_to_previous(&mut self);

    fn seek_to_next(&mut self);

    /// Seeks within the current item
    fn seek_to(&mut self, position_ms: u64);

    fn current_position(&self) -> u64;

    /// Frees the player. No callbacks are raised afterwards.
    fn release(&mut self);
}

/// Connects a fresh player for each session
pub trait PlayerFactory: Send + Sync {
    fn connect(&self) -> EngineResult<Box<dyn MediaPlayer>>;
}
