use tracing::trace;

use super::errors::{Error, Severity};

/// Sink for every diagnostic produced while checking a unit.
///
/// A suppressed engine swallows everything it is handed, which is what the
/// speculative entry points (completion, type-location checks) run with.
#[derive(Debug, Default)]
pub struct DiagnosticEngine {
    diagnostics: Vec<Error>,
    suppressed: bool,
}

impl DiagnosticEngine {
    pub fn new() -> Self {
        DiagnosticEngine::default()
    }

    pub fn suppressed() -> Self {
        DiagnosticEngine {
            diagnostics: vec![],
            suppressed: true,
        }
    }

    pub fn diagnose(&mut self, error: Error) {
        trace!(name = error.get_error_name(), position = error.get_position().0, "diagnostic");
        if !self.suppressed {
            self.diagnostics.push(error);
        }
    }

    pub fn had_error(&self) -> bool {
        self.diagnostics.iter().any(|d| d.get_severity() == Severity::Error)
    }

    pub fn diagnostics(&self) -> &[Error] {
        &self.diagnostics
    }

    /// Number of diagnostics with the given name, counting notes too.
    pub fn count(&self, name: &str) -> usize {
        self.diagnostics.iter().filter(|d| d.get_error_name() == name).count()
    }

    pub fn take(&mut self) -> Vec<Error> {
        std::mem::take(&mut self.diagnostics)
    }
}
