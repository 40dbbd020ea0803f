//! Injected diagnostics sink for the Opus sessions.
//!
//! Sessions never report failures beyond their return values; the detail
//! goes to a [`Logger`] handed to them at creation time.

use std::sync::Arc;

/// Logger interface used by encoder, decoder and bridge.
pub trait Logger: Send + Sync {
    fn error(&self, msg: &str);
    fn warn(&self, msg: &str);
    fn info(&self, msg: &str);
    fn debug(&self, msg: &str);
}

/// Returns a `tracing`-backed logger tagged with `component`.
pub fn default_logger(component: &'static str) -> Arc<dyn Logger> {
    Arc::new(TracingLogger::new(component))
}

/// Logger that forwards to `tracing`, honoring whatever subscriber the
/// process installed.
#[derive(Debug, Clone, Copy)]
pub struct TracingLogger {
    component: &'static str,
}

impl TracingLogger {
    /// Creates a logger that tags events with `component`.
    pub const fn new(component: &'static str) -> Self {
        Self { component }
    }

    /// Returns the component tag.
    pub fn component(&self) -> &'static str {
        self.component
    }
}

impl Logger for TracingLogger {
    fn error(&self, msg: &str) {
        tracing::error!(component = self.component, "{}", msg);
    }

    fn warn(&self, msg: &str) {
        tracing::warn!(component = self.component, "{}", msg);
    }

    fn info(&self, msg: &str) {
        tracing::info!(component = self.component, "{}", msg);
    }

    fn debug(&self, msg: &str) {
        tracing::debug!(component = self.component, "{}", msg);
    }
}

/// Logger that discards everything.
pub struct NopLogger;

impl Logger for NopLogger {
    fn error(&self, _msg: &str) {}
    fn warn(&self, _msg: &str) {}
    fn info(&self, _msg: &str) {}
    fn debug(&self, _msg: &str) {}
}

/// Formats a message and sends it to `logger.error`.
#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)*) => {
        $logger.error(&format!($($arg)*))
    };
}

/// Formats a message and sends it to `logger.warn`.
#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => {
        $logger.warn(&format!($($arg)*))
    };
}

/// Formats a message and sends it to `logger.info`.
#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $logger.info(&format!($($arg)*))
    };
}

/// Formats a message and sends it to `logger.debug`.
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.debug(&format!($($arg)*))
    };
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Logger;
    use std::sync::{Arc, Mutex};

    /// Records every message with its level.
    #[derive(Default)]
    pub struct CapturingLogger {
        messages: Mutex<Vec<(&'static str, String)>>,
    }

    impl CapturingLogger {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        pub fn messages(&self) -> Vec<(&'static str, String)> {
            self.messages.lock().unwrap().clone()
        }

        pub fn errors(&self) -> Vec<String> {
            self.messages()
                .into_iter()
                .filter(|(level, _)| *level == "error")
                .map(|(_, msg)| msg)
                .collect()
        }

        fn push(&self, level: &'static str, msg: &str) {
            self.messages.lock().unwrap().push((level, msg.to_string()));
        }
    }

    impl Logger for CapturingLogger {
        fn error(&self, msg: &str) {
            self.push("error", msg);
        }
        fn warn(&self, msg: &str) {
            self.push("warn", msg);
        }
        fn info(&self, msg: &str) {
            self.push("info", msg);
        }
        fn debug(&self, msg: &str) {
            self.push("debug", msg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::CapturingLogger;
    use super::*;

    #[test]
    fn test_macros_format_messages() {
        let logger = CapturingLogger::new();
        log_error!(logger, "encode error: {}", -3);
        log_warn!(logger, "stale handle {:#x}", 0x1_0000_0001u64);
        log_info!(logger, "created");
        log_debug!(logger, "frame samples={}", 960);

        let msgs = logger.messages();
        assert_eq!(msgs.len(), 4);
        assert_eq!(msgs[0], ("error", "encode error: -3".to_string()));
        assert_eq!(msgs[1], ("warn", "stale handle 0x100000001".to_string()));
        assert_eq!(msgs[2], ("info", "created".to_string()));
        assert_eq!(msgs[3], ("debug", "frame samples=960".to_string()));
    }

    #[test]
    fn test_nop_logger() {
        let logger = NopLogger;
        logger.error("dropped");
        logger.debug("dropped");
    }

    #[test]
    fn test_default_logger_component() {
        let logger = TracingLogger::new("opus_encoder");
        assert_eq!(logger.component(), "opus_encoder");
        default_logger("opus_decoder").info("no subscriber installed");
    }
}
