/*!
 * Progress reporting for a generation run
 */

use std::fmt;

use indicatif::ProgressBar;

/// Stages of one generation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing started yet
    Idle,
    /// Walking the directory tree
    Scanning,
    /// Writing the report file
    Writing,
    /// Report written in full
    Completed,
    /// Stop request honoured
    Stopped,
    /// Aborted by a fatal error
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Idle => "Idle",
            Phase::Scanning => "Scanning",
            Phase::Writing => "Writing",
            Phase::Completed => "Completed",
            Phase::Stopped => "Stopped",
            Phase::Failed => "Failed",
        };
        f.write_str(label)
    }
}

/// Sink for human-readable status messages.
///
/// Messages are advisory; nothing a sink does can change the outcome of a run.
pub trait ProgressSink: Send + Sync {
    /// Called with a status line
    fn report(&self, message: &str);

    /// Called when the run moves to another phase
    fn phase(&self, _phase: Phase) {}
}

// Implement ProgressSink for closures
impl<F> ProgressSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn report(&self, message: &str) {
        self(message)
    }
}

impl ProgressSink for ProgressBar {
    fn report(&self, message: &str) {
        self.set_message(message.to_string());
    }

    fn phase(&self, phase: Phase) {
        self.set_prefix(phase.to_string());
    }
}

/// Sink that drops every message
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn report(&self, _message: &str) {}
}
