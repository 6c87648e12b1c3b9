//! Single-threaded runtime loop: key events in, session events in, frames
//! out. Redraws happen on change or on the meter tick, not continuously.

use crate::app::App;
use crate::ui;
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use liveguide::case::Page;
use ratatui::backend::Backend;
use ratatui::Terminal;
use std::time::{Duration, Instant};

const EVENT_POLL_MS: u64 = 50;
const METER_UPDATE_MS: u64 = 80;

pub fn run_event_loop<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let mut last_meter_sample = Instant::now();
    let mut dirty = true;

    while !app.should_quit {
        if dirty {
            terminal.draw(|frame| ui::draw(frame, app))?;
            dirty = false;
        }

        if event::poll(Duration::from_millis(EVENT_POLL_MS))? {
            match event::read()? {
                Event::Key(key) => {
                    if handle_key(app, key) {
                        dirty = true;
                    }
                }
                Event::Resize(_, _) => dirty = true,
                _ => {}
            }
        }

        if app.drain_session_events() {
            dirty = true;
        }

        if last_meter_sample.elapsed() >= Duration::from_millis(METER_UPDATE_MS) {
            app.sample_meters();
            last_meter_sample = Instant::now();
            dirty = true;
        }
    }

    Ok(())
}

/// Returns true when the screen needs a redraw.
fn handle_key(app: &mut App, key: KeyEvent) -> bool {
    if key.kind == KeyEventKind::Release {
        return false;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.quit();
        return true;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),
        KeyCode::Char('c') => app.connect(),
        KeyCode::Char('d') => app.disconnect(),
        KeyCode::Char('m') => app.toggle_mute(),
        KeyCode::Char('1') => app.show_page(Page::Dashboard),
        KeyCode::Char('2') => app.show_page(Page::Tasks),
        KeyCode::Char('3') => app.show_page(Page::Evidence),
        KeyCode::Char('4') => app.show_page(Page::Contacts),
        KeyCode::Char('5') => app.show_page(Page::Expenses),
        _ => return false,
    }
    true
}
