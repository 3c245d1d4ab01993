//! In-process player that plays silence on tokio's clock
//!
//! Position advances lazily: every call first catches the clock up, scaled by
//! the current speed, and rolls over into the next item when a track ends.
//! Listener callbacks are raised after the internal lock is released.

use crate::error::{EngineError, EngineResult};
use crate::media_item::MediaItem;
use crate::player::{MediaPlayer, PlayerFactory, PlayerFailure, PlayerListener, PlayerSnapshot};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Track length used when none is given
pub const DEFAULT_TRACK_DURATION: Duration = Duration::from_secs(90);

/// Past this point "previous" restarts the current item instead
const RESTART_THRESHOLD_MS: f64 = 3_000.0;

/// A call made on the player, in the order it was made
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    ClearMediaItems,
    SetMediaItems { count: usize, start_index: usize },
    Prepare,
    SetPlayWhenReady(bool),
    Play,
    Pause,
    SetPlaybackSpeed(f32),
    SeekToPrevious,
    SeekToNext,
    SeekTo(u64),
    Release,
}

enum Notice {
    Events(PlayerSnapshot),
    IsPlaying(bool),
    Speed(f32),
    Error(PlayerFailure),
}

struct SimState {
    items: Vec<MediaItem>,
    index: usize,
    /// Milliseconds into the current item
    position: f64,
    anchor: Instant,
    track_duration_ms: u64,
    speed: f32,
    prepared: bool,
    playing: bool,
    failed: bool,
    released: bool,
    commands: Vec<PlayerCommand>,
    listeners: Vec<Arc<dyn PlayerListener>>,
}

impl SimState {
    fn new(track_duration: Duration) -> Self {
        Self {
            items: Vec::new(),
            index: 0,
            position: 0.0,
            anchor: Instant::now(),
            track_duration_ms: (track_duration.as_millis() as u64).max(1),
            speed: 1.0,
            prepared: false,
            playing: false,
            failed: false,
            released: false,
            commands: Vec::new(),
            listeners: Vec::new(),
        }
    }

    fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            current_media_id: self.items.get(self.index).map(|item| item.media_id.clone()),
            duration_ms: (self.prepared && !self.items.is_empty()).then_some(self.track_duration_ms),
        }
    }

    fn advance(&mut self, now: Instant, notices: &mut Vec<Notice>) {
        let elapsed = now.saturating_duration_since(self.anchor);
        self.anchor = now;
        if !self.playing {
            return;
        }

        self.position += elapsed.as_secs_f64() * 1000.0 * f64::from(self.speed);
        let duration = self.track_duration_ms as f64;
        let mut track_changed = false;
        while self.position >= duration {
            if self.index + 1 < self.items.len() {
                self.position -= duration;
                self.index += 1;
                track_changed = true;
            } else {
                self.position = duration;
                self.stop(notices);
                break;
            }
        }

        if track_changed {
            notices.push(Notice::Events(self.snapshot()));
        }
    }

    fn start(&mut self, notices: &mut Vec<Notice>) {
        if self.playing || self.failed || !self.prepared || self.items.is_empty() {
            return;
        }
        self.playing = true;
        notices.push(Notice::IsPlaying(true));
    }

    fn stop(&mut self, notices: &mut Vec<Notice>) {
        if self.playing {
            self.playing = false;
            notices.push(Notice::IsPlaying(false));
        }
    }

    // Moving to another item re-prepares a failed player
    fn recover(&mut self) {
        if self.failed {
            self.failed = false;
            self.prepared = !self.items.is_empty();
        }
    }
}

/// Simulated [`MediaPlayer`]
///
/// Clones share the same player, so a clone kept by a test or by the
/// terminal front end can inspect it and inject failures.
#[derive(Clone)]
pub struct SimulatedPlayer {
    inner: Arc<Mutex<SimState>>,
}

impl SimulatedPlayer {
    pub fn new(track_duration: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SimState::new(track_duration))),
        }
    }

    fn apply<R>(&self, f: impl FnOnce(&mut SimState, &mut Vec<Notice>) -> R) -> R {
        let mut notices = Vec::new();
        let (result, listeners) = {
            let mut state = self.inner.lock();
            state.advance(Instant::now(), &mut notices);
            let result = f(&mut state, &mut notices);
            (result, state.listeners.clone())
        };

        for notice in &notices {
            for listener in &listeners {
                match notice {
                    Notice::Events(snapshot) => listener.on_events(snapshot),
                    Notice::IsPlaying(is_playing) => listener.on_is_playing_changed(*is_playing),
                    Notice::Speed(speed) => listener.on_playback_parameters_changed(*speed),
                    Notice::Error(failure) => listener.on_player_error(failure),
                }
            }
        }
        result
    }

    fn command(&self, command: PlayerCommand, f: impl FnOnce(&mut SimState, &mut Vec<Notice>)) {
        self.apply(|state, notices| {
            if state.released {
                log::debug!("Ignoring {:?} on a released player", command);
                return;
            }
            state.commands.push(command);
            f(state, notices);
        })
    }

    /// Makes the player fail as a broken stream would
    pub fn fail(&self, message: impl Into<String>) {
        let failure = PlayerFailure::new(message);
        self.apply(|state, notices| {
            if state.released {
                return;
            }
            state.failed = true;
            state.stop(notices);
            notices.push(Notice::Error(failure));
        })
    }

    /// Every command received so far
    pub fn commands(&self) -> Vec<PlayerCommand> {
        self.inner.lock().commands.clone()
    }

    pub fn is_released(&self) -> bool {
        self.inner.lock().released
    }

    pub fn is_playing(&self) -> bool {
        self.apply(|state, _| state.playing)
    }

    pub fn is_failed(&self) -> bool {
        self.inner.lock().failed
    }

    /// Index of the current item in the queue
    pub fn current_index(&self) -> usize {
        self.apply(|state, _| state.index)
    }

    pub fn speed(&self) -> f32 {
        self.inner.lock().speed
    }

    pub fn listener_count(&self) -> usize {
        self.inner.lock().listeners.len()
    }
}

impl MediaPlayer for SimulatedPlayer {
    fn add_listener(&mut self, listener: Arc<dyn PlayerListener>) {
        self.apply(|state, _| {
            if !state.released {
                state.listeners.push(listener);
            }
        })
    }

    fn is_connected(&self) -> bool {
        !self.inner.lock().released
    }

    fn clear_media_items(&mut self) {
        self.command(PlayerCommand::ClearMediaItems, |state, notices| {
            state.stop(notices);
            state.items.clear();
            state.index = 0;
            state.position = 0.0;
            state.prepared = false;
        })
    }

    fn set_media_items(&mut self, items: Vec<MediaItem>, start_index: usize) {
        let command = PlayerCommand::SetMediaItems {
            count: items.len(),
            start_index,
        };
        self.command(command, |state, _| {
            state.index = start_index.min(items.len().saturating_sub(1));
            state.items = items;
            state.position = 0.0;
            state.prepared = false;
        })
    }

    fn prepare(&mut self) {
        self.command(PlayerCommand::Prepare, |state, notices| {
            state.prepared = !state.items.is_empty();
            state.failed = false;
            notices.push(Notice::Events(state.snapshot()));
        })
    }

    fn set_play_when_ready(&mut self, play_when_ready: bool) {
        self.command(PlayerCommand::SetPlayWhenReady(play_when_ready), |_, _| {})
    }

    fn play(&mut self) {
        self.command(PlayerCommand::Play, |state, notices| state.start(notices))
    }

    fn pause(&mut self) {
        self.command(PlayerCommand::Pause, |state, notices| state.stop(notices))
    }

    fn set_playback_speed(&mut self, speed: f32) {
        self.command(PlayerCommand::SetPlaybackSpeed(speed), |state, notices| {
            state.speed = speed;
            notices.push(Notice::Speed(speed));
        })
    }

    fn seek_to_previous(&mut self) {
        self.command(PlayerCommand::SeekToPrevious, |state, notices| {
            if state.position <= RESTART_THRESHOLD_MS && state.index > 0 {
                state.index -= 1;
            }
            state.position = 0.0;
            state.recover();
            notices.push(Notice::Events(state.snapshot()));
        })
    }

    fn seek_to_next(&mut self) {
        self.command(PlayerCommand::SeekToNext, |state, notices| {
            if state.index + 1 < state.items.len() {
                state.index += 1;
                state.position = 0.0;
            }
            state.recover();
            notices.push(Notice::Events(state.snapshot()));
        })
    }

    fn seek_to(&mut self, position_ms: u64) {
        self.command(PlayerCommand::SeekTo(position_ms), |state, _| {
            state.position = position_ms.min(state.track_duration_ms) as f64;
        })
    }

    fn current_position(&self) -> u64 {
        self.apply(|state, _| state.position as u64)
    }

    fn release(&mut self) {
        self.command(PlayerCommand::Release, |state, _| {
            state.playing = false;
            state.released = true;
            state.listeners.clear();
        })
    }
}

/// Hands out [`SimulatedPlayer`]s and keeps a handle on each one
pub struct SimulatedPlayerFactory {
    track_duration: Duration,
    available: bool,
    players: Mutex<Vec<SimulatedPlayer>>,
}

impl SimulatedPlayerFactory {
    pub fn new(track_duration: Duration) -> Self {
        Self {
            track_duration,
            available: true,
            players: Mutex::new(Vec::new()),
        }
    }

    /// A factory whose connection attempts always fail
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::default()
        }
    }

    /// Most recently connected player
    pub fn last_player(&self) -> Option<SimulatedPlayer> {
        self.players.lock().last().cloned()
    }

    /// Number of players handed out so far
    pub fn connections(&self) -> usize {
        self.players.lock().len()
    }
}

impl Default for SimulatedPlayerFactory {
    fn default() -> Self {
        Self::new(DEFAULT_TRACK_DURATION)
    }
}

impl PlayerFactory for SimulatedPlayerFactory {
    fn connect(&self) -> EngineResult<Box<dyn MediaPlayer>> {
        if !self.available {
            return Err(EngineError::PlayerUnavailable(
                "simulated player service is offline".to_string(),
            ));
        }

        let player = SimulatedPlayer::new(self.track_duration);
        self.players.lock().push(player.clone());
        log::debug!("Connected simulated player #{}", self.connections());
        Ok(Box::new(player))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media_item::track_list;
    use keypoint_core::sample_book;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl PlayerListener for Recorder {
        fn on_player_error(&self, failure: &PlayerFailure) {
            self.events.lock().push(format!("error:{}", failure));
        }

        fn on_is_playing_changed(&self, is_playing: bool) {
            self.events.lock().push(format!("playing:{}", is_playing));
        }

        fn on_playback_parameters_changed(&self, speed: f32) {
            self.events.lock().push(format!("speed:{}", speed));
        }

        fn on_events(&self, snapshot: &PlayerSnapshot) {
            let id = snapshot.current_media_id.clone().unwrap_or_default();
            self.events.lock().push(format!("track:{}", id));
        }
    }

    fn started_player(track_secs: u64) -> (SimulatedPlayer, Arc<Recorder>) {
        let mut player = SimulatedPlayer::new(Duration::from_secs(track_secs));
        let recorder = Arc::new(Recorder::default());
        player.add_listener(recorder.clone());
        player.set_media_items(track_list(&sample_book()), 0);
        player.prepare();
        player.play();
        (player, recorder)
    }

    #[tokio::test(start_paused = true)]
    async fn test_position_follows_clock_and_speed() {
        let (mut player, _recorder) = started_player(60);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(player.current_position(), 2_000);

        player.set_playback_speed(1.5);
        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(player.current_position(), 5_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rolls_over_to_next_track() {
        let (player, recorder) = started_player(10);

        tokio::time::advance(Duration::from_secs(12)).await;
        assert_eq!(player.current_index(), 1);
        assert_eq!(player.current_position(), 2_000);
        assert_eq!(
            recorder.events.lock().last().map(String::as_str),
            Some("track:1733085502")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_at_end_of_queue() {
        let (player, recorder) = started_player(10);

        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(!player.is_playing());
        assert_eq!(player.current_index(), 4);
        assert!(recorder.events.lock().contains(&"playing:false".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_blocks_play_until_track_change() {
        let (mut player, recorder) = started_player(60);

        player.fail("decoder exploded");
        assert!(!player.is_playing());
        assert!(recorder
            .events
            .lock()
            .contains(&"error:decoder exploded".to_string()));

        player.play();
        assert!(!player.is_playing());

        player.seek_to_next();
        player.play();
        assert!(player.is_playing());
        assert_eq!(player.current_index(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_previous_restarts_after_threshold() {
        let (mut player, _recorder) = started_player(60);
        player.seek_to_next();

        tokio::time::advance(Duration::from_secs(5)).await;
        player.seek_to_previous();
        assert_eq!(player.current_index(), 1);
        assert_eq!(player.current_position(), 0);

        player.seek_to_previous();
        assert_eq!(player.current_index(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_silences_listeners() {
        let (mut player, recorder) = started_player(60);
        let before = recorder.events.lock().len();

        player.release();
        player.play();
        player.fail("late");

        assert!(player.is_released());
        assert!(!player.is_connected());
        assert_eq!(recorder.events.lock().len(), before);
        assert_eq!(player.commands().last(), Some(&PlayerCommand::Release));
    }

    #[tokio::test(start_paused = true)]
    async fn test_seek_to_clamps_to_track() {
        let (mut player, _recorder) = started_player(10);
        player.pause();
        player.seek_to(25_000);
        assert_eq!(player.current_position(), 10_000);
    }

    #[test]
    fn test_unavailable_factory() {
        let factory = SimulatedPlayerFactory::unavailable();
        assert!(matches!(
            factory.connect(),
            Err(EngineError::PlayerUnavailable(_))
        ));
        assert_eq!(factory.connections(), 0);
    }
}
