//! Tracing and logging setup shared by the lineup binaries.

pub mod subscriber;

pub use subscriber::{LogFormat, UnknownLogFormat};

/// Initialize process-wide tracing/logging.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init(format: LogFormat) {
    subscriber::init(format);
}
