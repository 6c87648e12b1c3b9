pub mod audio;
pub mod case;
pub mod config;
pub mod live;
mod logging;
mod telemetry;

pub use logging::{
    crash_log_path, init_logging, log_debug, log_debug_content, log_file_path, log_panic,
    log_swallowed,
};

/// Initialize the debug log and the tracing sink from CLI flags.
pub fn init_observability(config: &config::AppConfig) {
    logging::init_logging(config);
    telemetry::init_tracing(config);
}
