//! LiveGuide terminal entrypoint: one screen, one voice session, one case.
//!
//! # Architecture
//!
//! - UI thread: owns the terminal, polls key events, drains session events
//! - Session worker (spawned on connect): owns microphone, speaker, socket
//! - Event channel: the only path from the worker back to the screen

mod app;
mod event_loop;
mod ui;

use anyhow::Result;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use liveguide::audio::CaptureStream;
use liveguide::case::{CaseContext, CaseStore};
use liveguide::config::AppConfig;
use liveguide::{init_observability, log_debug, log_panic};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io;
use std::sync::Arc;

use crate::app::App;
use crate::event_loop::run_event_loop;

/// Puts the terminal back even when the event loop errors out; a broken
/// shell would be a cruel way to end a session.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode()?;
        io::stdout().execute(EnterAlternateScreen)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = io::stdout().execute(LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

fn main() -> Result<()> {
    let config = AppConfig::parse_args()?;
    init_observability(&config);

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        log_panic(info);
        previous_hook(info);
    }));

    if config.list_input_devices {
        match CaptureStream::list_devices() {
            Ok(devices) => {
                println!("Detected audio input devices:");
                if devices.is_empty() {
                    println!("  (none)");
                }
                for name in devices {
                    println!("  {name}");
                }
            }
            Err(err) => println!("Failed to list audio input devices: {err:#}"),
        }
        return Ok(());
    }

    let context = match &config.case_file {
        Some(path) => CaseContext::load(path)?,
        None => CaseContext::default(),
    };
    let store = Arc::new(CaseStore::open(&config.resolved_data_dir())?);
    log_debug("startup|store_open");

    let guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    terminal.clear()?;

    let mut app = App::new(config, context, store);
    let result = run_event_loop(&mut terminal, &mut app);

    drop(guard);
    result
}
