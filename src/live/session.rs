//! Live session lifecycle: one websocket, one microphone, one speaker.
//!
//! All of the session's resources live on a dedicated worker thread running
//! a current-thread tokio runtime, because the CPAL stream handles are not
//! `Send` and the socket wants async. The UI talks to the worker through an
//! atomic mute flag, a oneshot shutdown signal, and a bounded event channel
//! coming back. Inbound socket messages are handled strictly in arrival
//! order; per-message failures are logged and swallowed so one malformed
//! frame can never end a call.

use crate::audio::{pcm, CaptureStream, LiveMeter, PlaybackHandle};
use crate::case::{CaseContext, CaseStore, Page};
use crate::config::SessionConfig;
use crate::live::declarations;
use crate::live::protocol::{
    FunctionOutput, FunctionResponse, RealtimeInputMessage, ServerMessage, SetupMessage,
    ToolResponseMessage,
};
use crate::live::tools::{ActionLogEntry, Dispatcher};
use crate::{log_debug, log_swallowed};
use crossbeam_channel::Sender;
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const STATUS_CONNECTED: &str = "Connected. Tell me what's going on.";
const STATUS_CONNECT_FAILED: &str = "Failed to connect. Check microphone permissions.";
const STATUS_CONNECTION_ERROR: &str = "Connection error.";
const STATUS_SESSION_ENDED: &str = "Session ended.";

/// Coarse session state for the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Connected,
    Disconnected,
}

/// Everything the worker reports back to the UI thread.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    State(SessionState),
    Status(String),
    Action(ActionLogEntry),
    Navigate(Page),
}

/// Handle to one live voice session.
///
/// Construction never blocks: device and socket setup happen on the worker,
/// and a setup failure reports `Status` + `State(Disconnected)` over the
/// event channel without leaving anything half-open, so the user can simply
/// connect again. At most one session should exist per UI instance; the UI
/// drops the handle once it sees `Disconnected`.
pub struct LiveSession {
    muted: Arc<AtomicBool>,
    mic_meter: LiveMeter,
    voice_meter: LiveMeter,
    shutdown: Option<oneshot::Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl LiveSession {
    pub fn connect(
        config: SessionConfig,
        context: CaseContext,
        store: Arc<CaseStore>,
        events: Sender<SessionEvent>,
    ) -> Self {
        let muted = Arc::new(AtomicBool::new(false));
        let mic_meter = LiveMeter::new();
        let voice_meter = LiveMeter::new();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let _ = events.send(SessionEvent::State(SessionState::Connecting));

        let worker = {
            let muted = muted.clone();
            let mic_meter = mic_meter.clone();
            let voice_meter = voice_meter.clone();
            std::thread::spawn(move || {
                worker_main(
                    config,
                    context,
                    store,
                    events,
                    muted,
                    mic_meter,
                    voice_meter,
                    shutdown_rx,
                );
            })
        };

        Self {
            muted,
            mic_meter,
            voice_meter,
            shutdown: Some(shutdown_tx),
            worker: Some(worker),
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }

    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Relaxed);
    }

    pub fn toggle_muted(&self) -> bool {
        let muted = !self.is_muted();
        self.set_muted(muted);
        muted
    }

    pub fn mic_meter(&self) -> LiveMeter {
        self.mic_meter.clone()
    }

    pub fn voice_meter(&self) -> LiveMeter {
        self.voice_meter.clone()
    }

    /// Tear the session down. Safe to call repeatedly, and safe to call when
    /// the connect attempt already failed on its own.
    pub fn disconnect(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[allow(clippy::too_many_arguments)]
fn worker_main(
    config: SessionConfig,
    context: CaseContext,
    store: Arc<CaseStore>,
    events: Sender<SessionEvent>,
    muted: Arc<AtomicBool>,
    mic_meter: LiveMeter,
    voice_meter: LiveMeter,
    shutdown_rx: oneshot::Receiver<()>,
) {
    // Microphone first: a session that cannot hear the user is pointless,
    // and this is the failure users actually hit (permissions).
    let (capture, frames) = match CaptureStream::open(
        config.input_device.as_deref(),
        config.capture_frame_samples,
        config.frame_channel_capacity,
        muted,
        mic_meter.clone(),
    ) {
        Ok(pair) => pair,
        Err(err) => {
            log_debug(&format!("session_setup_failed|stage=capture|error={err:#}"));
            fail_connect(&events);
            return;
        }
    };

    let playback = match PlaybackHandle::open(config.playback_gain, voice_meter.clone()) {
        Ok(handle) => handle,
        Err(err) => {
            log_debug(&format!("session_setup_failed|stage=playback|error={err:#}"));
            fail_connect(&events);
            return;
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            log_debug(&format!("session_setup_failed|stage=runtime|error={err}"));
            fail_connect(&events);
            return;
        }
    };

    runtime.block_on(run_session(
        config,
        context,
        store,
        &events,
        capture,
        frames,
        &playback,
        shutdown_rx,
    ));

    // Teardown is unconditional: flush queued audio, quiet the meters, and
    // let the stream handles drop with the worker.
    playback.interrupt();
    mic_meter.reset();
    voice_meter.reset();
    let _ = events.send(SessionEvent::State(SessionState::Disconnected));
    log_debug("session_closed");
}

fn fail_connect(events: &Sender<SessionEvent>) {
    let _ = events.send(SessionEvent::Status(STATUS_CONNECT_FAILED.to_string()));
    let _ = events.send(SessionEvent::State(SessionState::Disconnected));
}

#[allow(clippy::too_many_arguments)]
async fn run_session(
    config: SessionConfig,
    context: CaseContext,
    store: Arc<CaseStore>,
    events: &Sender<SessionEvent>,
    capture: CaptureStream,
    mut frames: mpsc::Receiver<Vec<f32>>,
    playback: &PlaybackHandle,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    // The handshake races the shutdown signal so a user who disconnects
    // while still connecting is not held hostage by a slow endpoint.
    let url = config.endpoint_url();
    let mut ws: WsStream = tokio::select! {
        result = connect_async(url.as_str()) => match result {
            Ok((ws, _response)) => ws,
            Err(err) => {
                log_debug(&format!("session_setup_failed|stage=socket|error={err}"));
                let _ = events.send(SessionEvent::Status(STATUS_CONNECT_FAILED.to_string()));
                return;
            }
        },
        _ = &mut shutdown_rx => {
            let _ = events.send(SessionEvent::Status(STATUS_SESSION_ENDED.to_string()));
            return;
        }
    };

    let instruction = declarations::system_instruction(&context, &store.open_task_summary(5));
    let setup = SetupMessage::new(
        config.model.clone(),
        config.temperature,
        instruction,
        declarations::function_declarations(),
    );
    let setup_text = match serde_json::to_string(&setup) {
        Ok(text) => text,
        Err(err) => {
            log_swallowed("serialize_setup", &err);
            let _ = events.send(SessionEvent::Status(STATUS_CONNECT_FAILED.to_string()));
            return;
        }
    };
    if ws.send(Message::Text(setup_text)).await.is_err() {
        let _ = events.send(SessionEvent::Status(STATUS_CONNECT_FAILED.to_string()));
        return;
    }

    let _ = events.send(SessionEvent::State(SessionState::Connected));
    let _ = events.send(SessionEvent::Status(STATUS_CONNECTED.to_string()));
    log_debug(&format!("session_open|model={}", config.model));

    let dispatcher = Dispatcher::new(store);

    loop {
        tokio::select! {
            maybe_msg = ws.next() => match maybe_msg {
                Some(Ok(Message::Text(text))) => {
                    handle_server_text(&text, &mut ws, &dispatcher, playback, events).await;
                }
                Some(Ok(Message::Binary(bytes))) => {
                    // Raw frames carry the same PCM16@24000 payload as the
                    // inline variant, minus the JSON wrapper.
                    playback.schedule_wire(pcm::decode_binary_audio(&bytes));
                }
                Some(Ok(Message::Close(_))) | None => {
                    let _ = events.send(SessionEvent::Status(STATUS_SESSION_ENDED.to_string()));
                    break;
                }
                Some(Ok(_)) => {} // ping/pong handled by the transport
                Some(Err(err)) => {
                    log_swallowed("socket_read", &err);
                    let _ = events.send(SessionEvent::Status(STATUS_CONNECTION_ERROR.to_string()));
                    break;
                }
            },
            Some(frame) = frames.recv() => {
                let wire = capture.to_wire_frame(frame);
                let message = RealtimeInputMessage::audio_frame(pcm::encode_frame(&wire));
                match serde_json::to_string(&message) {
                    Ok(text) => {
                        if ws.send(Message::Text(text)).await.is_err() {
                            let _ = events.send(
                                SessionEvent::Status(STATUS_CONNECTION_ERROR.to_string()),
                            );
                            break;
                        }
                    }
                    Err(err) => log_swallowed("serialize_audio_frame", &err),
                }
            },
            _ = &mut shutdown_rx => {
                let _ = ws.close(None).await;
                let _ = events.send(SessionEvent::Status(STATUS_SESSION_ENDED.to_string()));
                break;
            }
        }
    }

    let metrics = capture.metrics();
    log_debug(&format!(
        "session_capture_metrics|frames_dropped={}|callback_errors={}",
        metrics.frames_dropped, metrics.callback_errors
    ));
}

/// Demultiplex one text message. Order matters: barge-in is honored before
/// any new audio in the same message is scheduled, and a tool-call envelope
/// is answered with exactly one response entry per invocation.
async fn handle_server_text(
    text: &str,
    ws: &mut WsStream,
    dispatcher: &Dispatcher,
    playback: &PlaybackHandle,
    events: &Sender<SessionEvent>,
) {
    let message = match ServerMessage::parse(text) {
        Ok(message) => message,
        Err(err) => {
            log_swallowed("parse_server_message", &err);
            return;
        }
    };

    if message.is_interrupted() {
        let discarded = playback.interrupt();
        log_debug(&format!("barge_in|buffers_discarded={discarded}"));
    }

    for payload in message.audio_payloads() {
        match pcm::decode_base64_audio(payload) {
            Ok(samples) => playback.schedule_wire(samples),
            Err(err) => log_swallowed("decode_inline_audio", &err),
        }
    }

    if let Some(envelope) = &message.tool_call {
        let mut responses = Vec::with_capacity(envelope.function_calls.len());
        for call in &envelope.function_calls {
            let outcome = dispatcher.dispatch(call);
            let _ = events.send(SessionEvent::Action(outcome.action.clone()));
            if let Some(page) = outcome.navigate {
                let _ = events.send(SessionEvent::Navigate(page));
            }
            responses.push(FunctionResponse {
                id: call.id.clone(),
                name: call.name.clone(),
                response: FunctionOutput {
                    output: outcome.output,
                },
            });
        }
        if !responses.is_empty() {
            match serde_json::to_string(&ToolResponseMessage::new(responses)) {
                Ok(reply) => {
                    if ws.send(Message::Text(reply)).await.is_err() {
                        log_debug("tool_response_send_failed");
                    }
                }
                Err(err) => log_swallowed("serialize_tool_response", &err),
            }
        }
    }

    if message.setup_complete.is_some() {
        log_debug("setup_complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> SessionConfig {
        SessionConfig {
            model: "models/test".to_string(),
            endpoint_base: "ws://127.0.0.1:1".to_string(),
            api_key: "test-key".to_string(),
            temperature: 0.8,
            capture_frame_samples: 4096,
            frame_channel_capacity: 8,
            playback_gain: 1.0,
            input_device: None,
        }
    }

    #[test]
    fn disconnect_is_idempotent_even_when_connect_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(CaseStore::open(dir.path()).unwrap());
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut session =
            LiveSession::connect(test_config(), CaseContext::default(), store, tx);

        // Whatever happens on the worker (no mic in CI, unreachable
        // endpoint otherwise), disconnect must be safe, twice.
        session.disconnect();
        session.disconnect();

        let events: Vec<SessionEvent> = rx.try_iter().collect();
        assert!(
            events
                .iter()
                .any(|e| matches!(e, SessionEvent::State(SessionState::Disconnected))),
            "worker must always report Disconnected, got {events:?}"
        );
    }

    #[test]
    fn mute_flag_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(CaseStore::open(dir.path()).unwrap());
        let (tx, _rx) = crossbeam_channel::unbounded();
        let mut session =
            LiveSession::connect(test_config(), CaseContext::default(), store, tx);
        assert!(!session.is_muted());
        assert!(session.toggle_muted());
        assert!(session.is_muted());
        session.set_muted(false);
        assert!(!session.is_muted());
        session.disconnect();
    }
}
