//! Collects the outcome of best-effort steps.

use crate::core::output;

use super::error::ExecuteError;
use super::util::last_line;

/// Warnings gathered during a run.
///
/// Best-effort steps report their failures here instead of aborting.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Report {
    warnings: Vec<String>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Print and record a warning.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        output::warning(&message);
        self.warnings.push(message);
    }

    /// Downgrade a failure to a warning, returning the value on success.
    pub fn best_effort<T>(&mut self, what: &str, result: Result<T, ExecuteError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                let reason = match err.stderr() {
                    Some(stderr) if !last_line(stderr).is_empty() => last_line(stderr).to_string(),
                    _ => err.to_string(),
                };
                self.warn(format!("{} failed (continuing): {}", what, reason));
                None
            }
        }
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}
