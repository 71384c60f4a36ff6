//! Tracing/logging setup shared by the stockpulse binaries.

pub mod tracing;

pub use tracing::{LogConfig, LogFormat, ParseLogFormatError};

/// Initialize process-wide tracing with JSON output.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Initialize process-wide tracing with an explicit configuration.
pub fn init_with(config: &LogConfig) {
    tracing::init_with(config);
}
