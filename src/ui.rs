//! UI rendering for the terminal user interface, using `ratatui`.

use std::time::Instant;

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style, Stylize},
    text::Line,
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Padding, Paragraph, Wrap},
};

use crate::app::App;
use crate::audio::{MediaEngine, PlaybackState, SessionSnapshot};
use crate::config::UiSettings;
use crate::library::folder_name;
use crate::nav::{Entry, PAGE_SIZE};

/// Render the controls help text.
fn controls_text(seek_seconds: u64) -> String {
    [
        "[↑/↓ j/k] navigate".to_string(),
        "[space] play/pause".to_string(),
        "[enter] open folder".to_string(),
        "[b] back".to_string(),
        format!("[←/→] seek -/+{seek_seconds}s"),
        "[+/-] volume".to_string(),
        "[n/p] next/prev".to_string(),
        "[s] stop".to_string(),
        "[r] repeat".to_string(),
        "[d] discover".to_string(),
        "[q] quit".to_string(),
    ]
    .join(" | ")
}

/// Format milliseconds as `MM:SS`. Unknown (negative) times render as `--:--`.
fn format_mmss(ms: i64) -> String {
    if ms < 0 {
        return "--:--".to_string();
    }
    let secs = ms / 1000;
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Ten-cell volume bar, one filled cell per 10%.
fn volume_bar(volume: u8) -> String {
    let filled = usize::from(volume.min(100) / 10);
    format!("{}{}", "█".repeat(filled), "░".repeat(10 - filled))
}

fn progress_ratio(position_ms: i64, length_ms: i64) -> Option<f64> {
    if length_ms <= 0 || position_ms < 0 {
        return None;
    }
    Some((position_ms as f64 / length_ms as f64).clamp(0.0, 1.0))
}

fn status_lines<E: MediaEngine>(
    app: &App<E>,
    snap: &SessionSnapshot,
    now: Instant,
) -> Vec<Line<'static>> {
    let dir = match app.nav().current_directory() {
        Some(d) => format!("Dir: {}", folder_name(d)),
        None => "Dir: music directories".to_string(),
    };

    let mut playing = snap.state.label().to_string();
    if snap.state != PlaybackState::Stopped
        && let Some(track) = &snap.track
    {
        playing.push_str(": ");
        playing.push_str(&track.display);
    }

    let mut lines = vec![
        Line::from(dir),
        Line::from(playing),
        Line::from(format!(
            "Volume {} {:>3}% • Repeat: {}",
            volume_bar(snap.volume),
            snap.volume,
            snap.repeat_mode.label()
        )),
    ];
    if let Some(msg) = app.status_message(now) {
        lines.push(Line::from(msg).style(Style::default().fg(Color::Red)));
    }
    lines
}

/// Render the entire UI into `frame`.
pub fn draw<E: MediaEngine>(frame: &mut Frame, app: &App<E>, ui: &UiSettings, seek_seconds: u64) {
    let snap = app.snapshot();
    let now = Instant::now();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(6),
            Constraint::Min(PAGE_SIZE as u16 + 2),
            Constraint::Length(3),
            Constraint::Length(4),
        ])
        .split(frame.area());

    // Header
    let header = Paragraph::new(ui.header_text.as_str())
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, chunks[0]);

    // Status box
    let status = Paragraph::new(status_lines(app, &snap, now))
        .block(
            Block::bordered()
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                })
                .title(" status "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(status, chunks[1]);

    // Current page of folders and tracks
    {
        let nav = app.nav();
        let playing_here = snap.state != PlaybackState::Stopped
            && snap.playlist_dir.is_some()
            && snap.playlist_dir.as_deref() == nav.current_directory();
        let folder_count = nav.folder_count();

        let rows = nav.visible();
        let items: Vec<ListItem> = rows
            .iter()
            .map(|(row, entry)| match entry {
                Entry::Folder(dir) => ListItem::new(format!("[+] {}", folder_name(dir))).bold(),
                Entry::Track(track) => {
                    let is_current =
                        playing_here && snap.current_track == Some(row - folder_count);
                    let marker = if is_current { "♪ " } else { "  " };
                    ListItem::new(format!("{marker}{}", track.display))
                }
            })
            .collect();

        let title = format!(" page {}/{} ", nav.page() + 1, nav.page_count());
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ListState::default();
        if nav.total() > 0 {
            state.select(Some(nav.selected() - nav.page() * PAGE_SIZE));
        }
        frame.render_stateful_widget(list, chunks[2], &mut state);
    }

    // Progress
    let ratio = if snap.state == PlaybackState::Stopped {
        None
    } else {
        progress_ratio(snap.position_ms, snap.length_ms)
    };
    let label = match ratio {
        Some(_) => format!(
            "{} / {}",
            format_mmss(snap.position_ms),
            format_mmss(snap.length_ms)
        ),
        None => String::new(),
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL))
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(ratio.unwrap_or(0.0))
        .label(label);
    frame.render_widget(gauge, chunks[3]);

    let footer = Paragraph::new(controls_text(seek_seconds))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[4]);
}
