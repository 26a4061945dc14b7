//! Event type catalog.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Event types a destination can subscribe to.
///
/// The wire names are fixed; receivers match on them exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WebhookEvent {
    /// A resume finished parsing.
    #[serde(rename = "resume.parsed")]
    ResumeParsed,
    /// A resume failed to parse.
    #[serde(rename = "resume.parse_failed")]
    ResumeParseFailed,
    /// An ATS compatibility check completed.
    #[serde(rename = "ats.check_completed")]
    AtsCheckCompleted,
    /// An ATS compatibility check failed.
    #[serde(rename = "ats.check_failed")]
    AtsCheckFailed,
    /// Resume tailoring completed.
    #[serde(rename = "tailoring.completed")]
    TailoringCompleted,
    /// Resume tailoring failed.
    #[serde(rename = "tailoring.failed")]
    TailoringFailed,
    /// A long-running operation was cancelled.
    #[serde(rename = "operation.cancelled")]
    OperationCancelled,
}

impl WebhookEvent {
    /// Every subscribable event, in catalog order.
    pub const ALL: [WebhookEvent; 7] = [
        WebhookEvent::ResumeParsed,
        WebhookEvent::ResumeParseFailed,
        WebhookEvent::AtsCheckCompleted,
        WebhookEvent::AtsCheckFailed,
        WebhookEvent::TailoringCompleted,
        WebhookEvent::TailoringFailed,
        WebhookEvent::OperationCancelled,
    ];

    /// Returns the wire name of the event.
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookEvent::ResumeParsed => "resume.parsed",
            WebhookEvent::ResumeParseFailed => "resume.parse_failed",
            WebhookEvent::AtsCheckCompleted => "ats.check_completed",
            WebhookEvent::AtsCheckFailed => "ats.check_failed",
            WebhookEvent::TailoringCompleted => "tailoring.completed",
            WebhookEvent::TailoringFailed => "tailoring.failed",
            WebhookEvent::OperationCancelled => "operation.cancelled",
        }
    }

    /// Returns the wire names of every subscribable event.
    pub fn names() -> Vec<String> {
        Self::ALL.iter().map(|e| e.as_str().to_string()).collect()
    }
}

/// Event name used by test deliveries. Not subscribable.
pub const TEST_EVENT: &str = "webhook.test";

impl fmt::Display for WebhookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown event name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEvent(pub String);

impl fmt::Display for UnknownEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown webhook event: {}", self.0)
    }
}

impl std::error::Error for UnknownEvent {}

impl FromStr for WebhookEvent {
    type Err = UnknownEvent;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|e| e.as_str() == s)
            .copied()
            .ok_or_else(|| UnknownEvent(s.to_string()))
    }
}
