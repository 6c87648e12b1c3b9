//! UI-side state: the session handle, the rolling logs, and the view the
//! assistant (or the user) last navigated to.

use crossbeam_channel::{unbounded, Receiver, Sender};
use liveguide::case::{CaseContext, CaseSnapshot, CaseStore, Page};
use liveguide::config::AppConfig;
use liveguide::live::{ActionLog, LiveSession, SessionEvent, SessionState};
use liveguide::log_debug;
use std::collections::VecDeque;
use std::sync::Arc;

pub const METER_HISTORY_MAX: usize = 120;
const STATUS_LOG_MAX: usize = 6;

pub struct App {
    pub config: AppConfig,
    pub context: CaseContext,
    pub store: Arc<CaseStore>,
    pub snapshot: CaseSnapshot,
    pub page: Page,
    pub session: Option<LiveSession>,
    pub session_state: SessionState,
    pub status_log: VecDeque<String>,
    pub action_log: ActionLog,
    pub meter_history: VecDeque<u64>,
    pub should_quit: bool,
    events_tx: Sender<SessionEvent>,
    events_rx: Receiver<SessionEvent>,
}

impl App {
    pub fn new(config: AppConfig, context: CaseContext, store: Arc<CaseStore>) -> Self {
        let (events_tx, events_rx) = unbounded();
        let snapshot = store.snapshot();
        Self {
            config,
            context,
            store,
            snapshot,
            page: Page::Dashboard,
            session: None,
            session_state: SessionState::Disconnected,
            status_log: VecDeque::new(),
            action_log: ActionLog::default(),
            meter_history: VecDeque::new(),
            should_quit: false,
            events_tx,
            events_rx,
        }
    }

    pub fn push_status(&mut self, line: impl Into<String>) {
        self.status_log.push_back(line.into());
        while self.status_log.len() > STATUS_LOG_MAX {
            self.status_log.pop_front();
        }
    }

    /// Start a session unless one is already running.
    pub fn connect(&mut self) {
        if self.session.is_some() && self.session_state != SessionState::Disconnected {
            self.push_status("Already connected.");
            return;
        }
        let session_config = match self.config.session_config() {
            Ok(session_config) => session_config,
            Err(err) => {
                self.push_status(format!("{err:#}"));
                return;
            }
        };
        log_debug("ui|connect_requested");
        self.session = Some(LiveSession::connect(
            session_config,
            self.context.clone(),
            self.store.clone(),
            self.events_tx.clone(),
        ));
    }

    pub fn disconnect(&mut self) {
        if let Some(mut session) = self.session.take() {
            log_debug("ui|disconnect_requested");
            session.disconnect();
        }
    }

    pub fn toggle_mute(&mut self) {
        match &self.session {
            Some(session) => {
                let muted = session.toggle_muted();
                self.push_status(if muted { "Microphone muted." } else { "Microphone live." });
            }
            None => self.push_status("Not connected."),
        }
    }

    /// Drain worker events; returns true when anything changed on screen.
    pub fn drain_session_events(&mut self) -> bool {
        let mut dirty = false;
        while let Ok(event) = self.events_rx.try_recv() {
            dirty = true;
            match event {
                SessionEvent::State(state) => {
                    self.session_state = state;
                    if state == SessionState::Disconnected {
                        // The worker is done; drop the handle so the user
                        // can connect again.
                        self.session = None;
                    }
                }
                SessionEvent::Status(line) => self.push_status(line),
                SessionEvent::Action(entry) => {
                    self.action_log.push(entry);
                    self.snapshot = self.store.snapshot();
                }
                SessionEvent::Navigate(page) => {
                    self.page = page;
                }
            }
        }
        dirty
    }

    /// Sample both meters into the waveform history.
    pub fn sample_meters(&mut self) {
        let level = match &self.session {
            Some(session) => session
                .mic_meter()
                .level_unit()
                .max(session.voice_meter().level_unit()),
            None => 0.0,
        };
        self.meter_history.push_back((level * 100.0) as u64);
        while self.meter_history.len() > METER_HISTORY_MAX {
            self.meter_history.pop_front();
        }
    }

    pub fn show_page(&mut self, page: Page) {
        self.page = page;
        self.snapshot = self.store.snapshot();
    }

    pub fn quit(&mut self) {
        self.disconnect();
        self.should_quit = true;
    }
}
