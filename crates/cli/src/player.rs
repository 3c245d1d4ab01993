use anyhow::{Context, Result};
use console::{style, Key, Term};
use keypoint_config::{Config, PlayerConfig};
use keypoint_core::{format_speed, format_time, step_speed, Book};
use keypoint_playback::{
    BookPlaybackRepository, PlaybackEvent, PlaybackIntent, PlaybackViewModel, ScreenState,
};
use media_engine::SimulatedPlayerFactory;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, Instant};

const NOTICE_DURATION: Duration = Duration::from_secs(3);
const PROGRESS_WIDTH: usize = 40;
const MIN_REFRESH: Duration = Duration::from_millis(16);

/// What a key press asks the screen to do
#[derive(Debug, Clone, Copy, PartialEq)]
enum KeyAction {
    Intent(PlaybackIntent),
    InjectFailure,
    Quit,
    Ignore,
}

struct Notice {
    message: &'static str,
    shown_at: Instant,
}

pub async fn start_playback(
    book: Book,
    position: u32,
    config: &Config,
    track_length: Duration,
) -> Result<()> {
    let factory = Arc::new(SimulatedPlayerFactory::new(track_length));
    let repository = Arc::new(BookPlaybackRepository::with_factory(
        factory.clone(),
        &config.player,
    ));
    let view_model = PlaybackViewModel::new(book, repository, &config.player)
        .context("Failed to open playback screen")?;
    let events = view_model
        .take_events()
        .context("Playback events already taken")?;

    view_model.init(position);

    let term = Term::stdout();
    warn_on_failure(term.hide_cursor(), "hide cursor");

    let result = screen_loop(&term, &view_model, events, &factory, &config.player).await;

    view_model.teardown();
    warn_on_failure(term.show_cursor(), "show cursor");

    result
}

async fn screen_loop(
    term: &Term,
    view_model: &PlaybackViewModel,
    mut events: mpsc::Receiver<PlaybackEvent>,
    factory: &SimulatedPlayerFactory,
    config: &PlayerConfig,
) -> Result<()> {
    let mut keys = spawn_key_reader(term.clone());
    let mut refresh = interval(config.ui_refresh_interval().max(MIN_REFRESH));
    let mut notice: Option<Notice> = None;

    loop {
        tokio::select! {
            _ = refresh.tick() => {
                if notice.as_ref().is_some_and(|n| n.shown_at.elapsed() > NOTICE_DURATION) {
                    notice = None;
                }
                draw_screen(term, view_model.book(), &view_model.current_state(), notice.as_ref())
                    .context("Failed to draw playback screen")?;
            }
            Some(event) = events.recv() => {
                notice = Some(Notice {
                    message: event.message(),
                    shown_at: Instant::now(),
                });
            }
            key = keys.recv() => {
                let Some(key) = key else {
                    break;
                };
                match map_key(&key, &view_model.current_state(), config) {
                    KeyAction::Intent(intent) => {
                        view_model.send_intent(intent);
                    }
                    KeyAction::InjectFailure => {
                        if let Some(player) = factory.last_player() {
                            player.fail("Simulated playback failure");
                        }
                    }
                    KeyAction::Quit => break,
                    KeyAction::Ignore => {}
                }
            }
        }
    }

    Ok(())
}

/// Prints a warning for a terminal call that failed; returns true if it did
fn warn_on_failure(result: std::io::Result<()>, action: &str) -> bool {
    match result {
        Ok(()) => false,
        Err(error) => {
            eprintln!("Warning: Failed to {}: {}", action, error);
            true
        }
    }
}

/// Reads keys on a plain thread; `read_key` blocks
fn spawn_key_reader(term: Term) -> mpsc::UnboundedReceiver<Key> {
    let (sender, receiver) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        while let Ok(key) = term.read_key() {
            if sender.send(key).is_err() {
                break;
            }
        }
    });
    receiver
}

fn map_key(key: &Key, state: &ScreenState, config: &PlayerConfig) -> KeyAction {
    match key {
        Key::Char(' ') => {
            if state.is_playing {
                KeyAction::Intent(PlaybackIntent::Pause)
            } else {
                KeyAction::Intent(PlaybackIntent::Play)
            }
        }
        Key::Char('n') => KeyAction::Intent(PlaybackIntent::Next),
        Key::Char('p') => KeyAction::Intent(PlaybackIntent::Previous),
        Key::ArrowLeft => KeyAction::Intent(PlaybackIntent::SeekBackward),
        Key::ArrowRight => KeyAction::Intent(PlaybackIntent::SeekForward),
        Key::Char('+') | Key::Char('=') => KeyAction::Intent(PlaybackIntent::ChangeSpeed(
            config.clamp_speed(step_speed(state.speed, config.speed_step)),
        )),
        Key::Char('-') | Key::Char('_') => KeyAction::Intent(PlaybackIntent::ChangeSpeed(
            config.clamp_speed(step_speed(state.speed, -config.speed_step)),
        )),
        Key::Char(c @ '1'..='9') => {
            let index = *c as usize - '1' as usize;
            match config.speed_presets.get(index) {
                Some(speed) => KeyAction::Intent(PlaybackIntent::ChangeSpeed(*speed)),
                None => KeyAction::Ignore,
            }
        }
        Key::Char('e') => KeyAction::InjectFailure,
        Key::Char('q') | Key::Escape => KeyAction::Quit,
        _ => KeyAction::Ignore,
    }
}

fn progress_bar(state: &ScreenState) -> String {
    let filled = (state.progress() * PROGRESS_WIDTH as f64).round() as usize;
    format!(
        "[{}{}]",
        "#".repeat(filled),
        "-".repeat(PROGRESS_WIDTH - filled.min(PROGRESS_WIDTH))
    )
}

fn draw_screen(
    term: &Term,
    book: &Book,
    state: &ScreenState,
    notice: Option<&Notice>,
) -> std::io::Result<()> {
    term.clear_screen()?;

    term.write_line(&format!("{}", style(&book.title).bold().cyan()))?;
    term.write_line(&format!("{}", style(state.book_logo.as_str()).dim()))?;
    term.write_line(&"=".repeat(60))?;
    term.write_line("")?;
    term.write_line(&format!(
        "KEY POINT {} OF {}",
        state.key_point_number, state.total_key_points
    ))?;
    term.write_line(&format!("{}", style(&state.key_point_title).bold()))?;
    term.write_line("")?;
    term.write_line(&format!(
        "{} {} / {}",
        progress_bar(state),
        format_time(state.playback_position),
        format_time(state.duration)
    ))?;

    let status = if state.is_playing {
        style("▶ Playing").green()
    } else {
        style("⏸ Paused").yellow()
    };
    term.write_line(&format!("{}   Speed {}x", status, format_speed(state.speed)))?;
    term.write_line("")?;

    if let Some(notice) = notice {
        term.write_line(&format!("{}", style(notice.message).red().bold()))?;
        term.write_line("")?;
    }

    term.write_line(&format!(
        "{}",
        style("space play/pause  n/p next/previous  ←/→ seek  +/- speed  1-4 presets  e fail  q quit")
            .dim()
    ))?;

    Ok(())
}
