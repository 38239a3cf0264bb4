//! Jasmine lifecycle and wire message types
//!
//! Lifecycle payloads follow the shapes Jasmine hands to reporters
//! (`jasmineStarted`, `suiteDone`, `specDone`, ...). Fields we do not model
//! are kept in `extra` so nothing the framework reports is lost.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// === Wire Messages ===

/// Request sent to a framework process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestMessage {
    pub seq: i64,
    #[serde(rename = "type")]
    pub message_type: String,
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

/// Response from a framework process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub seq: i64,
    #[serde(rename = "type")]
    pub message_type: String,
    pub request_seq: i64,
    pub success: bool,
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

/// Event pushed by a framework process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub seq: i64,
    #[serde(rename = "type")]
    pub message_type: String,
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

// === Lifecycle Payloads ===

/// Outcome of a single spec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecStatus {
    Passed,
    Failed,
    /// Filtered out, e.g. by a focused `fdescribe`/`fit` elsewhere
    Excluded,
    /// Marked pending with `xit` or `pending()`
    Pending,
    #[serde(other)]
    Unknown,
}

/// One failed expectation attached to a spec
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    #[serde(default)]
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FailureRecord {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: None,
            extra: Map::new(),
        }
    }
}

/// `jasmineStarted` payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JasmineStartedInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_specs_defined: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `jasmineDone` payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JasmineDoneInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incomplete_reason: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// `suiteStarted` / `suiteDone` payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SuiteInfo {
    pub fn named(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }
}

/// `specStarted` / `specDone` payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    /// Only present on `specDone`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SpecStatus>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_expectations: Vec<FailureRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SpecInfo {
    /// Build a finished spec payload
    pub fn done(
        description: impl Into<String>,
        status: SpecStatus,
        failed_expectations: Vec<FailureRecord>,
    ) -> Self {
        Self {
            description: description.into(),
            status: Some(status),
            failed_expectations,
            ..Default::default()
        }
    }
}

// === Lifecycle Events ===

/// The six reporter callbacks Jasmine invokes during a run
pub const LIFECYCLE_TAGS: [&str; 6] = [
    "jasmineStarted",
    "jasmineDone",
    "suiteStarted",
    "suiteDone",
    "specStarted",
    "specDone",
];

/// A lifecycle event as recorded by the reporter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum LifecycleEvent {
    JasmineStarted(JasmineStartedInfo),
    JasmineDone(JasmineDoneInfo),
    SuiteStarted(SuiteInfo),
    SuiteDone(SuiteInfo),
    SpecStarted(SpecInfo),
    SpecDone(SpecInfo),
}

impl LifecycleEvent {
    /// Reporter callback name for this event
    pub fn tag(&self) -> &'static str {
        match self {
            Self::JasmineStarted(_) => "jasmineStarted",
            Self::JasmineDone(_) => "jasmineDone",
            Self::SuiteStarted(_) => "suiteStarted",
            Self::SuiteDone(_) => "suiteDone",
            Self::SpecStarted(_) => "specStarted",
            Self::SpecDone(_) => "specDone",
        }
    }

    /// `jasmineDone` ends the stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::JasmineDone(_))
    }

    /// Parse a lifecycle event from an EventMessage
    ///
    /// Returns `None` for event names outside the six lifecycle callbacks.
    pub fn from_message(msg: &EventMessage) -> Option<serde_json::Result<Self>> {
        if !LIFECYCLE_TAGS.contains(&msg.event.as_str()) {
            return None;
        }

        let data = msg
            .body
            .clone()
            .unwrap_or_else(|| Value::Object(Map::new()));
        let tagged = serde_json::json!({ "type": msg.event, "data": data });
        Some(serde_json::from_value(tagged))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event_message(event: &str, body: Option<Value>) -> EventMessage {
        EventMessage {
            seq: 1,
            message_type: "event".to_string(),
            event: event.to_string(),
            body,
        }
    }

    #[test]
    fn test_spec_done_from_reporter_payload() {
        let msg = event_message(
            "specDone",
            Some(json!({
                "id": "spec3",
                "description": "adds numbers",
                "fullName": "math adds numbers",
                "status": "failed",
                "failedExpectations": [
                    { "message": "Expected 3 to be 4.", "stack": "at <anonymous>", "matcherName": "toBe" }
                ],
                "duration": 4
            })),
        );

        let event = LifecycleEvent::from_message(&msg).unwrap().unwrap();
        let LifecycleEvent::SpecDone(spec) = event else {
            panic!("expected specDone, got {:?}", event);
        };
        assert_eq!(spec.description, "adds numbers");
        assert_eq!(spec.status, Some(SpecStatus::Failed));
        assert_eq!(spec.failed_expectations.len(), 1);
        assert_eq!(spec.failed_expectations[0].extra["matcherName"], json!("toBe"));
        assert_eq!(spec.extra["duration"], json!(4));
    }

    #[test]
    fn test_unknown_status_is_preserved_as_unknown() {
        let status: SpecStatus = serde_json::from_value(json!("incomplete")).unwrap();
        assert_eq!(status, SpecStatus::Unknown);
    }

    #[test]
    fn test_non_lifecycle_events_are_ignored() {
        let msg = event_message("suiteSkipped", Some(json!({ "description": "x" })));
        assert!(LifecycleEvent::from_message(&msg).is_none());
    }

    #[test]
    fn test_jasmine_done_without_body() {
        let msg = event_message("jasmineDone", None);
        let event = LifecycleEvent::from_message(&msg).unwrap().unwrap();
        assert!(event.is_terminal());
        assert_eq!(event.tag(), "jasmineDone");
    }

    #[test]
    fn test_recorded_event_shape() {
        let event = LifecycleEvent::SuiteStarted(SuiteInfo::named("math"));
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value, json!({ "type": "suiteStarted", "data": { "description": "math" } }));
    }
}
