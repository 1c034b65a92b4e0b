//! Diagnostic reports attached to HAL objects.
//!
//! Native drivers often hand back a usable-looking object together with a
//! failure log (a GL program handle can exist even when the link failed).
//! The HAL mirrors that: diagnostics attach to the object as a `Report`
//! rather than unwinding the creation call. An object exposing
//! `Option<&Report>` returns `None` on success, never an empty report, so
//! callers can use the null check as the fast path.

use std::fmt;

/// Human-readable multi-line diagnostic record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    text: String,
    has_errors: bool,
}

impl Report {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a report that already carries an error line.
    pub fn error(text: impl Into<String>) -> Self {
        let mut report = Self::new();
        report.errorf(text);
        report
    }

    /// Append an informational line.
    pub fn printf(&mut self, line: impl Into<String>) {
        self.push_line(line.into());
    }

    /// Append an error line and mark the report as failed.
    pub fn errorf(&mut self, line: impl Into<String>) {
        self.push_line(line.into());
        self.has_errors = true;
    }

    /// The accumulated diagnostic text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether any error line was recorded.
    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    /// Whether the report carries no text at all.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    fn push_line(&mut self, line: String) {
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.text.push('\n');
        }
        self.text.push_str(&line);
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
