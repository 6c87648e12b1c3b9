//! Default values shared by the CLI surface and the validation layer.

/// Model identifier the live endpoint expects in the setup message.
pub const DEFAULT_MODEL: &str = "models/gemini-2.0-flash-exp";

/// Websocket base for the bidirectional generate-content service. The API key
/// is appended as a query parameter at connect time.
pub const DEFAULT_ENDPOINT_BASE: &str = "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1alpha.GenerativeService.BidiGenerateContent";

pub const DEFAULT_TEMPERATURE: f32 = 0.8;

/// Outbound capture block size in samples at 16 kHz mono (~256 ms).
pub const DEFAULT_CAPTURE_FRAME_SAMPLES: usize = 4096;
pub const MIN_CAPTURE_FRAME_SAMPLES: usize = 256;
pub const MAX_CAPTURE_FRAME_SAMPLES: usize = 65_536;

/// Frames buffered between the capture callback and the session loop before
/// frames start being dropped.
pub const DEFAULT_FRAME_CHANNEL_CAPACITY: usize = 8;

pub const DEFAULT_PLAYBACK_GAIN: f32 = 1.0;
