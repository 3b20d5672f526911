//! Severity-tagged update messages

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Action,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "INFO",
            Severity::Action => "ACTION",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportMessage {
    pub severity: Severity,
    pub message: String,
}

impl ReportMessage {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
        }
    }
}

impl fmt::Display for ReportMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// Receiver of update messages, in the order the pass produces them
pub trait Reporter {
    fn report(&mut self, message: &str, severity: Severity);

    /// Summary lines emitted after the pass body. Defaults to `report`.
    fn report_tail(&mut self, message: &str, severity: Severity) {
        self.report(message, severity);
    }
}

/// Collects every message in memory
#[derive(Debug, Clone, Default, Serialize)]
pub struct MessageLog {
    messages: Vec<ReportMessage>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ReportMessage] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<ReportMessage> {
        self.messages
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.messages.iter().filter(|m| m.severity == severity).count()
    }

    /// Messages of the given severities, in order
    pub fn filtered(&self, severities: &[Severity]) -> Vec<&ReportMessage> {
        self.messages
            .iter()
            .filter(|m| severities.contains(&m.severity))
            .collect()
    }

    pub fn contains(&self, text: &str) -> bool {
        self.messages.iter().any(|m| m.message.contains(text))
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl Reporter for MessageLog {
    fn report(&mut self, message: &str, severity: Severity) {
        self.messages.push(ReportMessage::new(severity, message));
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&mut self, _message: &str, _severity: Severity) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_log_keeps_order() {
        let mut log = MessageLog::new();
        log.report("Add R1 (footprint \"R:R\").", Severity::Action);
        log.report("Cannot add C1 (no footprint assigned).", Severity::Error);
        log.report_tail("Total warnings: 0, errors: 1.", Severity::Info);

        assert_eq!(log.messages().len(), 3);
        assert_eq!(log.count(Severity::Error), 1);
        assert_eq!(log.messages()[2].severity, Severity::Info);
        assert_eq!(log.filtered(&[Severity::Action, Severity::Error]).len(), 2);
        assert!(log.contains("Total warnings"));
    }

    #[test]
    fn test_display() {
        let msg = ReportMessage::new(Severity::Warning, "Via connected to unknown net (X).");
        assert_eq!(msg.to_string(), "WARNING: Via connected to unknown net (X).");
        assert!(Severity::Error > Severity::Warning);
    }
}
