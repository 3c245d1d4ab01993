//! Playback repository
//!
//! Narrow facade over the session controller exposing exactly what the view
//! model drives. It validates the book before a session starts and keeps no
//! state of its own.

use futures::stream::{self, BoxStream, StreamExt};
use keypoint_config::PlayerConfig;
use keypoint_core::{Book, PlaybackError, PlaybackStatus, Result, SessionState};
use media_engine::{EngineError, PlayerFactory, SessionController};
use std::sync::Arc;
use tokio::sync::watch;

const LOG_TARGET: &str = "keypoint::repository";

/// Operations the playback view model needs from the player side
pub trait PlaybackRepository: Send + Sync {
    /// Starts playing `book` from the key point at `position`
    ///
    /// Fails with [`PlaybackError::InvalidArgument`] when the book has no key
    /// points, and with [`PlaybackError::PlayerError`] when no player can be
    /// reached. An unknown `position` falls back to the first key point.
    fn init_playing(&self, book: &Book, position: u32)
        -> Result<BoxStream<'static, PlaybackStatus>>;

    fn play(&self);

    fn pause(&self);

    /// Session state, starting with the current one
    fn playing_state(&self) -> BoxStream<'static, SessionState>;

    fn change_speed(&self, speed: f32);

    fn previous_track(&self);

    fn next_track(&self);

    fn seek_track(&self, position_ms: u64);

    /// Ends the session and releases the player
    fn cancel_playing(&self);
}

/// [`PlaybackRepository`] backed by a [`SessionController`]
pub struct BookPlaybackRepository {
    controller: SessionController,
}

impl BookPlaybackRepository {
    pub fn new(controller: SessionController) -> Self {
        Self { controller }
    }

    /// Builds the controller from a player factory and the player settings
    pub fn with_factory(factory: Arc<dyn PlayerFactory>, config: &PlayerConfig) -> Self {
        Self::new(SessionController::with_poll_interval(
            factory,
            config.position_poll_interval(),
        ))
    }
}

impl PlaybackRepository for BookPlaybackRepository {
    fn init_playing(
        &self,
        book: &Book,
        position: u32,
    ) -> Result<BoxStream<'static, PlaybackStatus>> {
        log::debug!(
            target: LOG_TARGET,
            "Book for playing: {} \"{}\" ({} key points)",
            book.id,
            book.title,
            book.total_key_points()
        );

        let first = book
            .first_key_point()
            .ok_or(PlaybackError::InvalidArgument { book_id: book.id })?;

        let position = if book.key_point_at_position(position).is_some() {
            position
        } else {
            let error = PlaybackError::InvalidPosition {
                book_id: book.id,
                requested: position,
            };
            log::error!(
                target: LOG_TARGET,
                "{} ({}: first key point)",
                error,
                error.recovery_action()
            );
            first.position
        };

        let statuses = self
            .controller
            .init_session(book, position)
            .map_err(session_error)?;
        Ok(statuses.boxed())
    }

    fn play(&self) {
        self.controller.play();
    }

    fn pause(&self) {
        self.controller.pause();
    }

    fn playing_state(&self) -> BoxStream<'static, SessionState> {
        watch_stream(self.controller.state_stream())
    }

    fn change_speed(&self, speed: f32) {
        self.controller.change_speed(speed);
    }

    fn previous_track(&self) {
        self.controller.previous_track();
    }

    fn next_track(&self) {
        self.controller.next_track();
    }

    fn seek_track(&self, position_ms: u64) {
        self.controller.seek_track(position_ms);
    }

    fn cancel_playing(&self) {
        self.controller.remove_session();
    }
}

/// A player that cannot be reached is a player failure; anything else is an engine fault
fn session_error(error: EngineError) -> PlaybackError {
    match error {
        EngineError::PlayerUnavailable(message) | EngineError::NotConnected(message) => {
            PlaybackError::PlayerError { message }
        }
        other => PlaybackError::engine(other),
    }
}

/// Yields the current value, then every change, until the sender is gone
fn watch_stream<T>(receiver: watch::Receiver<T>) -> BoxStream<'static, T>
where
    T: Clone + Send + Sync + 'static,
{
    stream::unfold((receiver, true), |(mut receiver, first)| async move {
        if !first {
            receiver.changed().await.ok()?;
        }
        let value = receiver.borrow_and_update().clone();
        Some((value, (receiver, false)))
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use keypoint_core::{sample_book, BookId, CoverRef};
    use media_engine::{PlayerCommand, SimulatedPlayerFactory};
    use std::time::Duration;

    fn repository() -> (Arc<SimulatedPlayerFactory>, BookPlaybackRepository) {
        let factory = Arc::new(SimulatedPlayerFactory::new(Duration::from_secs(60)));
        let repository = BookPlaybackRepository::with_factory(factory.clone(), &PlayerConfig::default());
        (factory, repository)
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_book_is_invalid_argument() {
        let (factory, repository) = repository();
        let empty = Book::new(BookId::new(3), "Nothing", CoverRef::new("raw/none"), Vec::new());

        let result = repository.init_playing(&empty, 0);
        assert!(matches!(
            result,
            Err(PlaybackError::InvalidArgument { book_id }) if book_id == BookId::new(3)
        ));
        assert_eq!(factory.connections(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_position_starts_first_key_point() {
        let (factory, repository) = repository();
        let _statuses = repository.init_playing(&sample_book(), 17).unwrap();

        let player = factory.last_player().unwrap();
        assert!(player.commands().contains(&PlayerCommand::SetMediaItems {
            count: 5,
            start_index: 0
        }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_player_is_player_error() {
        let factory = Arc::new(SimulatedPlayerFactory::unavailable());
        let repository = BookPlaybackRepository::with_factory(factory, &PlayerConfig::default());

        let error = repository.init_playing(&sample_book(), 0).err().unwrap();
        assert!(matches!(error, PlaybackError::PlayerError { .. }));
        assert!(error.is_user_visible());
    }

    #[test]
    fn test_invalid_input_stays_engine_error() {
        let error = session_error(EngineError::InvalidInput("no key points".to_string()));
        assert!(matches!(error, PlaybackError::Engine { .. }));
        assert!(!error.is_user_visible());
    }

    #[tokio::test(start_paused = true)]
    async fn test_playing_state_starts_with_current_value() {
        let (_factory, repository) = repository();
        let _statuses = repository.init_playing(&sample_book(), 0).unwrap();

        let mut states = repository.playing_state();
        assert_eq!(states.next().await, Some(SessionState::Playing));

        repository.pause();
        assert_eq!(states.next().await, Some(SessionState::Paused));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_playing_releases_player() {
        let (factory, repository) = repository();
        let mut statuses = repository.init_playing(&sample_book(), 0).unwrap();

        repository.cancel_playing();

        assert!(factory.last_player().unwrap().is_released());
        assert!(statuses.next().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_reach_player() {
        let (factory, repository) = repository();
        let _statuses = repository.init_playing(&sample_book(), 0).unwrap();

        repository.change_speed(1.2);
        repository.next_track();
        repository.previous_track();
        repository.seek_track(3_000);

        let commands = factory.last_player().unwrap().commands();
        assert!(commands.ends_with(&[
            PlayerCommand::SetPlaybackSpeed(1.2),
            PlayerCommand::SeekToNext,
            PlayerCommand::SeekToPrevious,
            PlayerCommand::SeekTo(3_000),
        ]));
    }
}
