//! User-facing diagnostics.
//!
//! The baker reports configuration problems to whoever embeds it through a
//! [`DiagnosticsSink`] rather than a global logger, so the host can route them
//! to its own console or collect them in tests.

use parking_lot::Mutex;

/// Receiver of user-visible error and warning messages.
pub trait DiagnosticsSink: Send + Sync {
    /// Report an error.
    fn report_error(&self, message: &str);

    /// Report a warning.
    fn report_warning(&self, message: &str);
}

/// Forwards diagnostics to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl DiagnosticsSink for LogDiagnostics {
    fn report_error(&self, message: &str) {
        log::error!("{message}");
    }

    fn report_warning(&self, message: &str) {
        log::warn!("{message}");
    }
}

/// Severity of a collected diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

/// Stores every diagnostic it receives.
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    entries: Mutex<Vec<(Severity, String)>>,
}

impl CollectingDiagnostics {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// All reported errors, in order.
    pub fn errors(&self) -> Vec<String> {
        self.with_severity(Severity::Error)
    }

    /// All reported warnings, in order.
    pub fn warnings(&self) -> Vec<String> {
        self.with_severity(Severity::Warning)
    }

    /// Total number of diagnostics received.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing has been reported.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop everything collected so far.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    fn with_severity(&self, severity: Severity) -> Vec<String> {
        self.entries
            .lock()
            .iter()
            .filter(|(s, _)| *s == severity)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl DiagnosticsSink for CollectingDiagnostics {
    fn report_error(&self, message: &str) {
        self.entries.lock().push((Severity::Error, message.to_string()));
    }

    fn report_warning(&self, message: &str) {
        self.entries
            .lock()
            .push((Severity::Warning, message.to_string()));
    }
}
