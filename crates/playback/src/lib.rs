//! Keypoint playback - the playback screen's state and intent loop
//!
//! [`PlaybackViewModel`] turns [`PlaybackIntent`]s into repository commands
//! and folds what the player reports into a [`ScreenState`].

pub mod contract;
pub mod repository;
pub mod view_model;

pub use contract::{PlaybackEvent, PlaybackIntent, ScreenState};
pub use repository::{BookPlaybackRepository, PlaybackRepository};
pub use view_model::PlaybackViewModel;
