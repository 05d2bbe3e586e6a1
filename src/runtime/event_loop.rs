use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind,
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::debug;

use crate::app::{App, Flow, Input};
use crate::audio::MediaEngine;
use crate::config;
use crate::mpris::{ControlCmd, MprisHandle};
use crate::runtime::mpris_sync::MprisSync;
use crate::ui;

/// State tracked by the foreground loop across iterations.
#[derive(Default)]
pub struct EventLoopState {
    /// Last seek key event, fired or swallowed. Most terminals report a held
    /// key as a stream of presses, so seek presses closer together than
    /// `ui.seek_repeat_ms` count as one held key. A release event, where the
    /// terminal sends one, ends the hold at once.
    last_seek: Option<Instant>,
    last_wheel: Option<Instant>,
    mpris: MprisSync,
}

impl EventLoopState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Foreground loop: follows playback, keeps MPRIS in sync, draws, then
/// drains remote commands and terminal input. Returns when quit is requested.
pub fn run<E: MediaEngine>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App<E>,
    mpris: &MprisHandle,
    control_rx: &mpsc::Receiver<ControlCmd>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    let tick = Duration::from_millis(settings.ui.tick_ms);
    let wheel_cooldown = Duration::from_millis(settings.ui.mouse_cooldown_ms);
    let seek_repeat = Duration::from_millis(settings.ui.seek_repeat_ms);

    loop {
        // The monitor may have advanced on its own since the last tick.
        app.follow_playback();
        state.mpris.update(mpris, &app.snapshot());

        terminal.draw(|f| ui::draw(f, app, &settings.ui, settings.playback.seek_seconds))?;

        while let Ok(cmd) = control_rx.try_recv() {
            if handle_control_cmd(cmd, app) == Flow::Quit {
                return Ok(());
            }
        }

        if !event::poll(tick)? {
            continue;
        }

        let input = match event::read()? {
            Event::Key(key) => key_input(key, state, seek_repeat, Instant::now()),
            Event::Mouse(mouse) => wheel_input(mouse, state, wheel_cooldown, Instant::now()),
            _ => None,
        };
        if let Some(input) = input
            && app.handle(input) == Flow::Quit
        {
            return Ok(());
        }
    }
}

fn handle_control_cmd<E: MediaEngine>(cmd: ControlCmd, app: &mut App<E>) -> Flow {
    debug!(?cmd, "remote command");
    match cmd {
        ControlCmd::Quit => return Flow::Quit,
        ControlCmd::Play => app.resume(),
        ControlCmd::Pause => app.pause(),
        ControlCmd::PlayPause => app.toggle_current(),
        ControlCmd::Stop => {
            app.handle(Input::Stop);
        }
        ControlCmd::Next => {
            app.handle(Input::Next);
        }
        ControlCmd::Prev => {
            app.handle(Input::Previous);
        }
    }
    Flow::Continue
}

fn key_input(
    key: KeyEvent,
    state: &mut EventLoopState,
    seek_repeat: Duration,
    now: Instant,
) -> Option<Input> {
    match key.kind {
        KeyEventKind::Press => {}
        KeyEventKind::Release => {
            if matches!(key.code, KeyCode::Left | KeyCode::Right) {
                state.last_seek = None;
            }
            return None;
        }
        KeyEventKind::Repeat => return None,
    }

    let input = map_key(key.code)?;
    if matches!(input, Input::SeekForward | Input::SeekBackward) {
        let held = state
            .last_seek
            .is_some_and(|last| now.duration_since(last) < seek_repeat);
        state.last_seek = Some(now);
        if held {
            return None;
        }
    }
    Some(input)
}

fn map_key(code: KeyCode) -> Option<Input> {
    let input = match code {
        KeyCode::Up | KeyCode::Char('k') => Input::Up,
        KeyCode::Down | KeyCode::Char('j') => Input::Down,
        KeyCode::Left => Input::SeekBackward,
        KeyCode::Right => Input::SeekForward,
        KeyCode::Char(' ') => Input::TogglePlay,
        KeyCode::Enter => Input::Enter,
        KeyCode::Char('b') | KeyCode::Backspace => Input::Back,
        KeyCode::Char('+') | KeyCode::Char('=') => Input::VolumeUp,
        KeyCode::Char('-') => Input::VolumeDown,
        KeyCode::Char('r') => Input::CycleRepeat,
        KeyCode::Char('n') => Input::Next,
        KeyCode::Char('p') => Input::Previous,
        KeyCode::Char('s') => Input::Stop,
        KeyCode::Char('d') => Input::Rescan,
        KeyCode::Char('q') | KeyCode::Esc => Input::Quit,
        _ => return None,
    };
    Some(input)
}

fn wheel_input(
    mouse: MouseEvent,
    state: &mut EventLoopState,
    cooldown: Duration,
    now: Instant,
) -> Option<Input> {
    let input = match mouse.kind {
        MouseEventKind::ScrollUp => Input::Up,
        MouseEventKind::ScrollDown => Input::Down,
        _ => return None,
    };
    if let Some(last) = state.last_wheel
        && now.duration_since(last) < cooldown
    {
        return None;
    }
    state.last_wheel = Some(now);
    Some(input)
}
