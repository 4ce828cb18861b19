//! Analytics payload types — the event taxonomy, the per-event page details,
//! and the wire payload handed to a transport.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Closed classification applied to every tracked event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EventType {
    #[serde(rename = "Navigate")]
    Navigation,
    Outbound,
    Inbound,
    Link,
    Error,
    UserInput,
    Other,
}

impl EventType {
    /// Wire value of the variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Navigation => "Navigate",
            EventType::Outbound => "Outbound",
            EventType::Inbound => "Inbound",
            EventType::Link => "Link",
            EventType::Error => "Error",
            EventType::UserInput => "UserInput",
            EventType::Other => "Other",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Page context captured for every dispatched interaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    pub page_url: String,
    pub page_title: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EventDetails {
    pub fn new(page_url: impl Into<String>, page_title: impl Into<String>) -> Self {
        Self {
            page_url: page_url.into(),
            page_title: page_title.into(),
            extra: Map::new(),
        }
    }

    /// Flatten into a JSON object, extra keys after the page fields.
    pub fn into_map(self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("pageUrl".into(), Value::String(self.page_url));
        map.insert("pageTitle".into(), Value::String(self.page_title));
        map.extend(self.extra);
        map
    }
}

/// Merge JSON objects left to right; later keys win on collision.
pub fn merge_payload<'a, I>(layers: I) -> Map<String, Value>
where
    I: IntoIterator<Item = &'a Map<String, Value>>,
{
    let mut merged = Map::new();
    for layer in layers {
        for (key, value) in layer {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// The unit handed to a dispatch transport.
///
/// Serializes as `{ "EventType", "Target", "ErrorMessage", "AdditionalPayload" }`;
/// absent optional fields are omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AnalyticsPayload {
    pub event_type: EventType,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_payload: Option<Map<String, Value>>,
}

impl AnalyticsPayload {
    pub fn new(
        event_type: EventType,
        target: impl Into<String>,
        error_message: Option<String>,
        additional_payload: Option<Map<String, Value>>,
    ) -> Self {
        Self {
            event_type,
            target: target.into(),
            error_message,
            additional_payload,
        }
    }
}
