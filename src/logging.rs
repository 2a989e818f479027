//! Injectable log sinks.
//!
//! Components receive an `Arc<dyn Logger>` instead of writing to a global
//! logger, so tests can swap in [`NullLogger`] or their own recorder.

use std::fmt;

use colored::Colorize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Warn,
}

pub trait Logger: Send + Sync {
    fn log(&self, level: Level, message: fmt::Arguments<'_>);

    fn debug(&self, message: fmt::Arguments<'_>) {
        self.log(Level::Debug, message);
    }

    fn info(&self, message: fmt::Arguments<'_>) {
        self.log(Level::Info, message);
    }

    fn warn(&self, message: fmt::Arguments<'_>) {
        self.log(Level::Warn, message);
    }
}

/// Writes colored, prefixed lines to stderr.
///
/// Debug lines are dropped unless `verbose` is set.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleLogger {
    verbose: bool,
}

impl ConsoleLogger {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Logger for ConsoleLogger {
    fn log(&self, level: Level, message: fmt::Arguments<'_>) {
        match level {
            Level::Debug if self.verbose => eprintln!("[{}] {}", "·".dimmed(), message),
            Level::Debug => {}
            Level::Info => eprintln!("[{}] {}", "o".blue().bold(), message),
            Level::Warn => eprintln!("[{}] {}", "!".yellow().bold(), message),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _level: Level, _message: fmt::Arguments<'_>) {}
}
