//! Error types and recovery strategies for Keypoint
//!
//! Every playback failure falls into one of three severity tiers:
//! - **Recoverable**: handled where it happens, playback carries on
//! - **Degraded**: playback is stuck until the listener acts
//! - **Fatal**: the session cannot start
//!
//! Only player failures are shown to the listener; everything else is logged.

use crate::types::{BookId, KeyPointId};
use std::fmt;
use thiserror::Error;

/// Recovery actions that can be taken when an error occurs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Continue with a substitute value (e.g. start from the first key point)
    Substitute,
    /// Drop the offending update and keep the current state
    DropUpdate,
    /// Wait for the listener to move to another track
    AwaitTrackChange,
    /// Abort the operation and report to the caller
    Abort,
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Substitute => write!(f, "Substituting a default"),
            Self::DropUpdate => write!(f, "Dropping update"),
            Self::AwaitTrackChange => write!(f, "Waiting for track change"),
            Self::Abort => write!(f, "Aborting"),
        }
    }
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Error is recovered locally
    Recoverable,
    /// Playback degraded until the listener acts
    Degraded,
    /// The session cannot continue
    Fatal,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recoverable => write!(f, "Recoverable"),
            Self::Degraded => write!(f, "Degraded"),
            Self::Fatal => write!(f, "Fatal"),
        }
    }
}

/// Main error type for the playback layers
#[derive(Error, Debug)]
pub enum PlaybackError {
    /// The book has nothing to play
    #[error("Invalid argument: book {book_id} has an empty key point list")]
    InvalidArgument { book_id: BookId },

    /// Requested start position does not name a key point
    #[error("Invalid key point position {requested} in book {book_id}")]
    InvalidPosition { book_id: BookId, requested: u32 },

    /// The underlying player reported a failure
    #[error("Player error: {message}")]
    PlayerError { message: String },

    /// A status update referenced a key point the book does not contain
    #[error("Unknown key point id {key_point_id}")]
    LookupFailure { key_point_id: KeyPointId },

    /// The session controller could not carry out a request
    #[error("Engine error: {message}")]
    Engine {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PlaybackError {
    /// Wraps a lower-level error raised by the session controller
    pub fn engine<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Engine {
            message: error.to_string(),
            source: Some(Box::new(error)),
        }
    }

    /// Returns the severity level of this error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::InvalidPosition { .. } | Self::LookupFailure { .. } => {
                ErrorSeverity::Recoverable
            }
            Self::PlayerError { .. } => ErrorSeverity::Degraded,
            Self::InvalidArgument { .. } | Self::Engine { .. } => ErrorSeverity::Fatal,
        }
    }

    /// Returns the recommended recovery action for this error
    pub fn recovery_action(&self) -> RecoveryAction {
        match self {
            Self::InvalidPosition { .. } => RecoveryAction::Substitute,
            Self::LookupFailure { .. } => RecoveryAction::DropUpdate,
            Self::PlayerError { .. } => RecoveryAction::AwaitTrackChange,
            Self::InvalidArgument { .. } | Self::Engine { .. } => RecoveryAction::Abort,
        }
    }

    /// Returns true if the listener should be notified
    pub fn is_user_visible(&self) -> bool {
        matches!(self, Self::PlayerError { .. })
    }
}

/// Result type alias for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_tiers() {
        let invalid = PlaybackError::InvalidArgument {
            book_id: BookId::new(1),
        };
        assert_eq!(invalid.severity(), ErrorSeverity::Fatal);

        let position = PlaybackError::InvalidPosition {
            book_id: BookId::new(1),
            requested: 9,
        };
        assert_eq!(position.severity(), ErrorSeverity::Recoverable);
        assert_eq!(position.recovery_action(), RecoveryAction::Substitute);

        let player = PlaybackError::PlayerError {
            message: "source error".to_string(),
        };
        assert_eq!(player.severity(), ErrorSeverity::Degraded);
        assert_eq!(player.recovery_action(), RecoveryAction::AwaitTrackChange);
    }

    #[test]
    fn test_only_player_errors_are_user_visible() {
        let player = PlaybackError::PlayerError {
            message: "boom".to_string(),
        };
        let lookup = PlaybackError::LookupFailure {
            key_point_id: KeyPointId::new(3),
        };
        assert!(player.is_user_visible());
        assert!(!lookup.is_user_visible());
    }

    #[test]
    fn test_engine_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotConnected, "no session");
        let error = PlaybackError::engine(io);
        assert!(error.to_string().contains("no session"));
        assert!(std::error::Error::source(&error).is_some());
    }

    #[test]
    fn test_severity_ordering() {
        assert!(ErrorSeverity::Recoverable < ErrorSeverity::Degraded);
        assert!(ErrorSeverity::Degraded < ErrorSeverity::Fatal);
    }

    #[test]
    fn test_display_messages() {
        let error = PlaybackError::InvalidArgument {
            book_id: BookId::new(42),
        };
        assert!(error.to_string().contains("42"));
        assert!(error.to_string().contains("empty key point list"));
    }
}
