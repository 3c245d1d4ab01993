//! Playback screen view model
//!
//! Intents go through one unbounded FIFO queue drained by a single task, so
//! the repository sees commands in exactly the order they were sent. Two
//! observer tasks started by [`PlaybackIntent::Init`] fold player status and
//! session state into the [`ScreenState`] published on a watch channel.
//!
//! Every write checks the closed flag while holding the channel's write
//! lock. [`PlaybackViewModel::teardown`] raises the flag and then takes the
//! read lock once, so nothing is published after it returns.

use crate::contract::{PlaybackEvent, PlaybackIntent, ScreenState};
use crate::repository::PlaybackRepository;
use futures::stream::{BoxStream, StreamExt};
use keypoint_config::PlayerConfig;
use keypoint_core::{Book, PlaybackError, PlaybackStatus, Result, SessionState};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

const LOG_TARGET: &str = "keypoint::view_model";

/// Speed the player starts a session with
const PLAYER_DEFAULT_SPEED: f32 = 1.0;

struct Inner {
    book: Book,
    repository: Arc<dyn PlaybackRepository>,
    state: watch::Sender<ScreenState>,
    events: mpsc::Sender<PlaybackEvent>,
    closed: AtomicBool,
    /// Held while an intent is handled and while the session is cancelled
    dispatch: Mutex<()>,
    observers: Mutex<Vec<JoinHandle<()>>>,
    default_speed: f32,
    seek_backward_ms: u64,
    seek_forward_ms: u64,
}

impl Inner {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn handle(self: &Arc<Self>, intent: PlaybackIntent) {
        log::debug!(target: LOG_TARGET, "Handling {:?}", intent);
        match intent {
            PlaybackIntent::Init(position) => self.init_session(position),
            PlaybackIntent::Play => self.repository.play(),
            PlaybackIntent::Pause => self.repository.pause(),
            PlaybackIntent::Next => self.repository.next_track(),
            PlaybackIntent::Previous => self.repository.previous_track(),
            PlaybackIntent::SeekBackward => self.seek_backward(),
            PlaybackIntent::SeekForward => self.seek_forward(),
            PlaybackIntent::SeekTrack(position_ms) => self.seek_track(position_ms),
            PlaybackIntent::ChangeSpeed(speed) => self.repository.change_speed(speed),
        }
    }

    fn init_session(self: &Arc<Self>, position: u32) {
        self.abort_observers();

        let statuses = match self.repository.init_playing(&self.book, position) {
            Ok(statuses) => statuses,
            Err(error) => {
                log::error!(
                    target: LOG_TARGET,
                    "Could not start playback ({}): {}",
                    error.severity(),
                    error
                );
                if error.is_user_visible() {
                    self.publish_event(PlaybackEvent::Error);
                }
                return;
            }
        };

        let start = self
            .book
            .key_point_at_position(position)
            .or_else(|| self.book.first_key_point());
        if let Some(start) = start {
            let number = self.book.number_of(start.id).unwrap_or(1);
            let title = start.title.clone();
            self.publish(|current| ScreenState {
                key_point_number: number,
                key_point_title: title,
                playback_position: 0,
                duration: 0,
                is_playing: false,
                ..current.clone()
            });
        }

        if self.default_speed != PLAYER_DEFAULT_SPEED {
            self.repository.change_speed(self.default_speed);
        }

        let status_task = tokio::spawn(observe_status(Arc::clone(self), statuses));
        let state_task = tokio::spawn(observe_session_state(
            Arc::clone(self),
            self.repository.playing_state(),
        ));
        self.observers.lock().extend([status_task, state_task]);

        if self.is_closed() {
            self.abort_observers();
        }
    }

    fn seek_backward(&self) {
        let position = self.state.borrow().playback_position;
        self.repository
            .seek_track(position.saturating_sub(self.seek_backward_ms));
    }

    fn seek_forward(&self) {
        let (position, duration) = {
            let state = self.state.borrow();
            (state.playback_position, state.duration)
        };
        if duration == 0 {
            log::debug!(target: LOG_TARGET, "Duration unknown, skipping seek forward");
            return;
        }
        self.repository
            .seek_track(position.saturating_add(self.seek_forward_ms).min(duration));
    }

    fn seek_track(&self, position_ms: u64) {
        let duration = self.state.borrow().duration;
        let target = if duration > 0 {
            position_ms.min(duration)
        } else {
            position_ms
        };
        self.repository.seek_track(target);
    }

    fn apply_status(&self, status: PlaybackStatus) {
        let Some(key_point_id) = status.current_key_point_id else {
            log::debug!(target: LOG_TARGET, "Status without a current key point");
            return;
        };
        let Some(number) = self.book.number_of(key_point_id) else {
            log::error!(
                target: LOG_TARGET,
                "{}",
                PlaybackError::LookupFailure { key_point_id }
            );
            return;
        };

        let title = self.book.key_points[number - 1].title.clone();
        let position = if status.has_duration() {
            status.position_ms.min(status.duration_ms)
        } else {
            status.position_ms
        };
        self.publish(|current| ScreenState {
            key_point_number: number,
            key_point_title: title,
            playback_position: position,
            duration: status.duration_ms,
            speed: status.speed,
            ..current.clone()
        });
    }

    fn apply_session_state(&self, state: SessionState) {
        match state {
            SessionState::Initial => {}
            SessionState::Playing | SessionState::Paused => {
                let is_playing = state.is_playing();
                self.publish(|current| ScreenState {
                    is_playing,
                    ..current.clone()
                });
            }
            SessionState::Error => {
                log::error!(target: LOG_TARGET, "Player reported an error");
                self.state.send_if_modified(|current| {
                    if self.is_closed() {
                        return false;
                    }
                    self.try_emit(PlaybackEvent::Error);
                    if !current.is_playing {
                        return false;
                    }
                    *current = ScreenState {
                        is_playing: false,
                        ..current.clone()
                    };
                    true
                });
            }
        }
    }

    /// Replaces the screen state with `derive(current)` unless closed
    fn publish(&self, derive: impl FnOnce(&ScreenState) -> ScreenState) {
        self.state.send_if_modified(|current| {
            if self.is_closed() {
                return false;
            }
            let next = derive(current);
            if next == *current {
                return false;
            }
            *current = next;
            true
        });
    }

    fn publish_event(&self, event: PlaybackEvent) {
        // Holding the write lock keeps the event ordered against teardown
        self.state.send_if_modified(|_| {
            if !self.is_closed() {
                self.try_emit(event);
            }
            false
        });
    }

    fn try_emit(&self, event: PlaybackEvent) {
        if let Err(error) = self.events.try_send(event) {
            log::warn!(target: LOG_TARGET, "Dropping {:?}: {}", event, error);
        }
    }

    fn abort_observers(&self) {
        for task in self.observers.lock().drain(..) {
            task.abort();
        }
    }
}

async fn run_intents(inner: Arc<Inner>, mut intents: mpsc::UnboundedReceiver<PlaybackIntent>) {
    while let Some(intent) = intents.recv().await {
        let _dispatch = inner.dispatch.lock();
        if inner.is_closed() {
            break;
        }
        inner.handle(intent);
    }
    log::debug!(target: LOG_TARGET, "Intent queue closed");
}

async fn observe_status(inner: Arc<Inner>, mut statuses: BoxStream<'static, PlaybackStatus>) {
    while let Some(status) = statuses.next().await {
        if inner.is_closed() {
            break;
        }
        inner.apply_status(status);
    }
}

async fn observe_session_state(inner: Arc<Inner>, mut states: BoxStream<'static, SessionState>) {
    while let Some(state) = states.next().await {
        if inner.is_closed() {
            break;
        }
        inner.apply_session_state(state);
    }
}

/// State holder and intent processor for the playback screen
pub struct PlaybackViewModel {
    inner: Arc<Inner>,
    intents: mpsc::UnboundedSender<PlaybackIntent>,
    pending_intents: Mutex<Option<mpsc::UnboundedReceiver<PlaybackIntent>>>,
    event_receiver: Mutex<Option<mpsc::Receiver<PlaybackEvent>>>,
    consumer: Mutex<Option<JoinHandle<()>>>,
}

impl PlaybackViewModel {
    /// Creates the view model for `book`
    ///
    /// Nothing runs until [`init`](Self::init) is called.
    pub fn new(
        book: Book,
        repository: Arc<dyn PlaybackRepository>,
        config: &PlayerConfig,
    ) -> Result<Self> {
        if book.is_empty() {
            return Err(PlaybackError::InvalidArgument { book_id: book.id });
        }

        let (state, _) = watch::channel(ScreenState::for_book(&book, PLAYER_DEFAULT_SPEED));
        let (events, event_receiver) = mpsc::channel(config.event_buffer.max(1));
        let (intents, pending_intents) = mpsc::unbounded_channel();

        let inner = Arc::new(Inner {
            book,
            repository,
            state,
            events,
            closed: AtomicBool::new(false),
            dispatch: Mutex::new(()),
            observers: Mutex::new(Vec::new()),
            default_speed: config.default_speed,
            seek_backward_ms: config.seek_backward_ms,
            seek_forward_ms: config.seek_forward_ms,
        });

        Ok(Self {
            inner,
            intents,
            pending_intents: Mutex::new(Some(pending_intents)),
            event_receiver: Mutex::new(Some(event_receiver)),
            consumer: Mutex::new(None),
        })
    }

    /// Starts the intent loop and queues `Init(start_position)`
    ///
    /// Must be called from within a tokio runtime.
    pub fn init(&self, start_position: u32) {
        if let Some(pending) = self.pending_intents.lock().take() {
            let handle = tokio::spawn(run_intents(Arc::clone(&self.inner), pending));
            *self.consumer.lock() = Some(handle);
        }
        self.send_intent(PlaybackIntent::Init(start_position));
    }

    /// Queues an intent. Returns false once the view model is torn down.
    pub fn send_intent(&self, intent: PlaybackIntent) -> bool {
        if self.inner.is_closed() {
            log::debug!(target: LOG_TARGET, "Ignoring {:?} after teardown", intent);
            return false;
        }
        self.intents.send(intent).is_ok()
    }

    /// Subscribes to screen state snapshots
    pub fn state(&self) -> watch::Receiver<ScreenState> {
        self.inner.state.subscribe()
    }

    /// Latest screen state
    pub fn current_state(&self) -> ScreenState {
        self.inner.state.borrow().clone()
    }

    /// Takes the one-shot event receiver; only the first call gets it
    pub fn take_events(&self) -> Option<mpsc::Receiver<PlaybackEvent>> {
        self.event_receiver.lock().take()
    }

    pub fn book(&self) -> &Book {
        &self.inner.book
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Stops every task and ends the playback session
    ///
    /// Safe to call more than once; also runs on drop.
    pub fn teardown(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        // Waits out a publish that started before the flag was raised
        drop(self.inner.state.borrow());

        if let Some(consumer) = self.consumer.lock().take() {
            consumer.abort();
        }
        self.inner.abort_observers();

        let _dispatch = self.inner.dispatch.lock();
        self.inner.repository.cancel_playing();
        log::debug!(target: LOG_TARGET, "Playback screen torn down");
    }
}

impl Drop for PlaybackViewModel {
    fn drop(&mut self) {
        self.teardown();
    }
}
