// FILE: crates/media-engine/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Player not connected: {0}")]
    NotConnected(String),

    #[error("Player unavailable: {0}")]
    PlayerUnavailable(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
