//! Logging infrastructure for the silica HAL

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{Config, LogLevel};

/// Initialize the logging system based on configuration
pub fn init(config: &Config) {
    let level = match config.debug.log_level {
        LogLevel::Off => return,
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}

/// Initialize logging with default settings (for tests and quick starts)
pub fn init_default() {
    let filter = EnvFilter::from_default_env().add_directive(Level::INFO.into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init();
}

// Convenience macros for component-specific logging

/// Log a shader-linkage trace message
#[macro_export]
macro_rules! link_trace {
    ($($arg:tt)*) => {
        tracing::trace!(target: "link", $($arg)*)
    };
}

/// Log a shader-linkage debug message
#[macro_export]
macro_rules! link_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: "link", $($arg)*)
    };
}

/// Log a binding-translation trace message
#[macro_export]
macro_rules! binding_trace {
    ($($arg:tt)*) => {
        tracing::trace!(target: "binding", $($arg)*)
    };
}

/// Log a binding-translation debug message
#[macro_export]
macro_rules! binding_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: "binding", $($arg)*)
    };
}

/// Log a device-selection trace message
#[macro_export]
macro_rules! device_trace {
    ($($arg:tt)*) => {
        tracing::trace!(target: "device", $($arg)*)
    };
}

/// Log a device-selection debug message
#[macro_export]
macro_rules! device_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: "device", $($arg)*)
    };
}
