//! Media Engine - player boundary and playback session control for Keypoint

mod error;
mod media_item;
mod player;
mod session;
mod simulated;

pub use error::{EngineError, EngineResult};
pub use media_item::{track_list, MediaItem, MediaMetadata, MediaType};
pub use player::{MediaPlayer, PlayerFactory, PlayerFailure, PlayerListener, PlayerSnapshot};
pub use session::{SessionController, DEFAULT_POSITION_POLL};
pub use simulated::{
    PlayerCommand, SimulatedPlayer, SimulatedPlayerFactory, DEFAULT_TRACK_DURATION,
};
