//! Domain types for Keypoint
//!
//! - `book`: Book and KeyPoint types
//! - `playback`: player status snapshots, session state and speed rules
//! - `common`: validation trait and display formatting

mod book;
mod common;
mod playback;

pub use book::{AudioRef, Book, BookId, CoverRef, KeyPoint, KeyPointId};
pub use common::{format_speed, format_time, Validator};
pub use playback::{
    step_speed, PlaybackStatus, SessionState, MAX_SPEED, MIN_SPEED, SPEED_PRESETS,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_types_are_exported() {
        let _book_id = BookId::new(1);
        let _key_point_id = KeyPointId::new(10);
        let _status = PlaybackStatus::default();
        let _state = SessionState::Initial;
    }

    #[test]
    fn test_format_time_exported() {
        assert_eq!(format_time(61_000), "01:01");
    }
}
