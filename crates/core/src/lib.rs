//! Keypoint core - domain model shared by every playback layer
//!
//! A [`Book`] is a narrated summary split into ordered [`KeyPoint`]s. The
//! player reports [`PlaybackStatus`] snapshots and a [`SessionState`]; the
//! screen layer turns those into its own view state.

pub mod error;
pub mod sample;
pub mod types;

// Re-export commonly used types
pub use error::{ErrorSeverity, PlaybackError, RecoveryAction, Result};
pub use sample::sample_book;
pub use types::{
    format_speed, format_time, step_speed, AudioRef, Book, BookId, CoverRef, KeyPoint,
    KeyPointId, PlaybackStatus, SessionState, Validator, MAX_SPEED, MIN_SPEED, SPEED_PRESETS,
};
