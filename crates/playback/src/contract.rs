//! Data exchanged between the playback screen and its view model

use keypoint_core::{Book, CoverRef};

/// Everything the playback screen renders
///
/// Replaced as a whole on every change; never patched in place.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenState {
    pub book_logo: CoverRef,
    /// 1-based number of the current key point
    pub key_point_number: usize,
    pub total_key_points: usize,
    pub key_point_title: String,
    /// Milliseconds into the current key point
    pub playback_position: u64,
    /// Length of the current key point in milliseconds, 0 while unknown
    pub duration: u64,
    pub speed: f32,
    pub is_playing: bool,
}

impl ScreenState {
    /// State shown before the player reports anything
    pub fn for_book(book: &Book, speed: f32) -> Self {
        Self {
            book_logo: book.cover.clone(),
            key_point_number: 1,
            total_key_points: book.total_key_points(),
            key_point_title: book
                .first_key_point()
                .map(|key_point| key_point.title.clone())
                .unwrap_or_default(),
            playback_position: 0,
            duration: 0,
            speed,
            is_playing: false,
        }
    }

    /// Fraction of the current key point already played, in `[0, 1]`
    pub fn progress(&self) -> f64 {
        if self.duration == 0 {
            return 0.0;
        }
        (self.playback_position as f64 / self.duration as f64).min(1.0)
    }

    pub fn has_previous(&self) -> bool {
        self.key_point_number > 1
    }

    pub fn has_next(&self) -> bool {
        self.key_point_number < self.total_key_points
    }
}

/// A request to change playback
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackIntent {
    /// Start a session on the key point with this position
    Init(u32),
    Play,
    Pause,
    Next,
    Previous,
    SeekBackward,
    SeekForward,
    /// Seek to an absolute position in milliseconds
    SeekTrack(u64),
    ChangeSpeed(f32),
}

/// One-shot notification for the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    Error,
}

impl PlaybackEvent {
    /// Text for a transient on-screen message
    pub fn message(&self) -> &'static str {
        match self {
            Self::Error => "Something went wrong with playback. Try the next key point.",
        }
    }
}
