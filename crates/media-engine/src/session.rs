//! Playback session controller
//!
//! Owns at most one connected player. Player callbacks are folded into a
//! [`PlaybackStatus`] and a [`SessionState`] published through watch
//! channels; the status stream combines the former with the player position
//! sampled on a fixed interval.

use crate::error::{EngineError, EngineResult};
use crate::media_item::track_list;
use crate::player::{MediaPlayer, PlayerFactory, PlayerFailure, PlayerListener, PlayerSnapshot};
use futures::stream::{self, Stream};
use keypoint_core::{Book, KeyPointId, PlaybackStatus, SessionState};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

const LOG_TARGET: &str = "keypoint::session";

/// How often the player position is sampled
pub const DEFAULT_POSITION_POLL: Duration = Duration::from_secs(1);

struct ActiveSession {
    generation: u64,
    player: Box<dyn MediaPlayer>,
}

struct Shared {
    slot: Mutex<Option<ActiveSession>>,
    /// Bumped whenever a session starts or ends
    generation: AtomicU64,
    status: watch::Sender<PlaybackStatus>,
    state: watch::Sender<SessionState>,
}

impl Shared {
    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn sample_position(&self, generation: u64) -> Option<u64> {
        let slot = self.slot.lock();
        match slot.as_ref() {
            Some(session) if session.generation == generation => {
                Some(session.player.current_position())
            }
            _ => None,
        }
    }
}

/// Drives one playback session at a time
pub struct SessionController {
    factory: Arc<dyn PlayerFactory>,
    shared: Arc<Shared>,
    poll_interval: Duration,
}

impl SessionController {
    pub fn new(factory: Arc<dyn PlayerFactory>) -> Self {
        Self::with_poll_interval(factory, DEFAULT_POSITION_POLL)
    }

    pub fn with_poll_interval(factory: Arc<dyn PlayerFactory>, poll_interval: Duration) -> Self {
        let (status, _) = watch::channel(PlaybackStatus::default());
        let (state, _) = watch::channel(SessionState::Initial);

        Self {
            factory,
            shared: Arc::new(Shared {
                slot: Mutex::new(None),
                generation: AtomicU64::new(0),
                status,
                state,
            }),
            poll_interval: poll_interval.max(Duration::from_millis(1)),
        }
    }

    /// Starts a session for `book`, replacing any running one
    ///
    /// The queue holds every key point in order and starts on the one whose
    /// position is `start_position`, or on the first key point when no key
    /// point has that position. The returned stream ends when the session is
    /// removed or replaced.
    pub fn init_session(
        &self,
        book: &Book,
        start_position: u32,
    ) -> EngineResult<impl Stream<Item = PlaybackStatus> + Send + 'static> {
        if book.is_empty() {
            return Err(EngineError::InvalidInput(format!(
                "book {} has no key points",
                book.id
            )));
        }

        let start_index = book.index_of_position(start_position).unwrap_or_else(|| {
            log::warn!(
                target: LOG_TARGET,
                "No key point at position {} in book {}, starting from the first one",
                start_position,
                book.id
            );
            0
        });

        self.remove_session();
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.state.send_replace(SessionState::Initial);
        self.shared.status.send_replace(PlaybackStatus::default());

        let mut player = self.factory.connect()?;
        if !player.is_connected() {
            player.release();
            return Err(EngineError::NotConnected(format!(
                "player for book {} is not connected",
                book.id
            )));
        }

        player.add_listener(Arc::new(SessionListener {
            generation,
            shared: Arc::downgrade(&self.shared),
        }));
        player.clear_media_items();
        player.set_media_items(track_list(book), start_index);
        player.prepare();
        player.set_play_when_ready(true);
        player.play();

        *self.shared.slot.lock() = Some(ActiveSession { generation, player });
        log::debug!(
            target: LOG_TARGET,
            "Session {} started for book {} at index {}",
            generation,
            book.id,
            start_index
        );

        Ok(self.status_stream(generation))
    }

    fn status_stream(&self, generation: u64) -> impl Stream<Item = PlaybackStatus> + Send + 'static {
        let mut ticker = interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let feed = StatusFeed {
            shared: Arc::clone(&self.shared),
            status: self.shared.status.subscribe(),
            ticker,
            generation,
            position_ms: None,
        };

        stream::unfold(feed, |mut feed| async move {
            let status = feed.next_status().await?;
            Some((status, feed))
        })
    }

    /// Session state changes, starting from the current state
    pub fn state_stream(&self) -> watch::Receiver<SessionState> {
        self.shared.state.subscribe()
    }

    pub fn current_state(&self) -> SessionState {
        *self.shared.state.borrow()
    }

    pub fn has_session(&self) -> bool {
        self.shared.slot.lock().is_some()
    }

    pub fn play(&self) {
        self.with_player("play", |player| player.play());
    }

    pub fn pause(&self) {
        self.with_player("pause", |player| player.pause());
    }

    pub fn change_speed(&self, speed: f32) {
        self.with_player("change_speed", |player| player.set_playback_speed(speed));
    }

    pub fn seek_track(&self, position_ms: u64) {
        self.with_player("seek_track", |player| player.seek_to(position_ms));
    }

    /// Moves to the previous item, resuming playback if the player had failed
    pub fn previous_track(&self) {
        self.change_track("previous_track", |player| player.seek_to_previous());
    }

    /// Moves to the next item, resuming playback if the player had failed
    pub fn next_track(&self) {
        self.change_track("next_track", |player| player.seek_to_next());
    }

    /// Pauses and releases the player. Does nothing without a session.
    pub fn remove_session(&self) {
        let session = self.shared.slot.lock().take();
        if let Some(mut session) = session {
            self.shared.generation.fetch_add(1, Ordering::SeqCst);
            session.player.pause();
            session.player.release();
            log::debug!(target: LOG_TARGET, "Session {} removed", session.generation);
        }
    }

    fn change_track(&self, name: &str, seek: impl FnOnce(&mut dyn MediaPlayer)) {
        let recovering = self.current_state().is_error();
        if !self.with_player(name, seek) {
            return;
        }

        if recovering {
            log::debug!(target: LOG_TARGET, "Resuming after player error");
            self.shared.state.send_replace(SessionState::Paused);
            self.play();
        }
    }

    fn with_player(&self, name: &str, f: impl FnOnce(&mut dyn MediaPlayer)) -> bool {
        let mut slot = self.shared.slot.lock();
        match slot.as_mut() {
            Some(session) => {
                f(session.player.as_mut());
                true
            }
            None => {
                log::debug!(target: LOG_TARGET, "Ignoring {}: no active session", name);
                false
            }
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.remove_session();
    }
}

struct StatusFeed {
    shared: Arc<Shared>,
    status: watch::Receiver<PlaybackStatus>,
    ticker: Interval,
    generation: u64,
    position_ms: Option<u64>,
}

impl StatusFeed {
    async fn next_status(&mut self) -> Option<PlaybackStatus> {
        loop {
            tokio::select! {
                changed = self.status.changed() => {
                    changed.ok()?;
                    if !self.shared.is_current(self.generation) {
                        return None;
                    }
                    // Nothing is emitted before the first position sample
                    if let Some(position_ms) = self.position_ms {
                        return Some(self.combine(position_ms));
                    }
                }
                _ = self.ticker.tick() => {
                    let position_ms = self.shared.sample_position(self.generation)?;
                    self.position_ms = Some(position_ms);
                    return Some(self.combine(position_ms));
                }
            }
        }
    }

    fn combine(&mut self, position_ms: u64) -> PlaybackStatus {
        PlaybackStatus {
            position_ms,
            ..*self.status.borrow_and_update()
        }
    }
}

struct SessionListener {
    generation: u64,
    shared: Weak<Shared>,
}

impl SessionListener {
    fn live(&self) -> Option<Arc<Shared>> {
        let shared = self.shared.upgrade()?;
        shared.is_current(self.generation).then_some(shared)
    }
}

impl PlayerListener for SessionListener {
    fn on_player_error(&self, failure: &PlayerFailure) {
        if let Some(shared) = self.live() {
            log::error!(target: LOG_TARGET, "Player error: {}", failure);
            shared.state.send_replace(SessionState::Error);
        }
    }

    fn on_is_playing_changed(&self, is_playing: bool) {
        let Some(shared) = self.live() else {
            return;
        };
        let next = if is_playing {
            SessionState::Playing
        } else {
            SessionState::Paused
        };

        // Only a track change leaves the error state
        shared.state.send_if_modified(|state| {
            if state.is_error() || *state == next {
                return false;
            }
            *state = next;
            true
        });
    }

    fn on_playback_parameters_changed(&self, speed: f32) {
        if let Some(shared) = self.live() {
            shared.status.send_modify(|status| status.speed = speed);
        }
    }

    fn on_events(&self, snapshot: &PlayerSnapshot) {
        let Some(shared) = self.live() else {
            return;
        };
        let Some(media_id) = snapshot.current_media_id.as_deref() else {
            return;
        };

        match media_id.parse::<KeyPointId>() {
            Ok(key_point_id) => shared.status.send_modify(|status| {
                status.current_key_point_id = Some(key_point_id);
                status.duration_ms = snapshot.duration_ms.unwrap_or(0);
            }),
            Err(_) => log::warn!(target: LOG_TARGET, "Unrecognized media id {}", media_id),
        }
    }
}
