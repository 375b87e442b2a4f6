//! Event domain models

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// CloudEvents version produced by [`Event::new`].
pub const SPEC_VERSION: &str = "0.2";

/// One received CloudEvent.
///
/// Serializes to the CloudEvents JSON format: attributes at top level,
/// extensions flattened next to them, absent optionals omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub source: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(rename = "specversion")]
    pub spec_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contenttype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schemaurl: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

impl Event {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        event_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            event_type: event_type.into(),
            spec_version: SPEC_VERSION.to_string(),
            time: None,
            contenttype: None,
            schemaurl: None,
            data: None,
            extensions: BTreeMap::new(),
        }
    }

    pub fn with_spec_version(mut self, spec_version: impl Into<String>) -> Self {
        self.spec_version = spec_version.into();
        self
    }

    pub fn with_time(mut self, time: DateTime<FixedOffset>) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_contenttype(mut self, contenttype: impl Into<String>) -> Self {
        self.contenttype = Some(contenttype.into());
        self
    }

    pub fn with_schemaurl(mut self, schemaurl: impl Into<String>) -> Self {
        self.schemaurl = Some(schemaurl.into());
        self
    }

    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_extension(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extensions.insert(name.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_listing_form_flattens_extensions() {
        let event = Event::new("A234-1234-1234", "https://example.org/test", "knative.eventing.test")
            .with_extension("traceparent", "0");

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "A234-1234-1234",
                "source": "https://example.org/test",
                "type": "knative.eventing.test",
                "specversion": "0.2",
                "traceparent": "0"
            })
        );
    }

    #[test]
    fn test_listing_form_keeps_time_offset() {
        let time = DateTime::parse_from_rfc3339("2019-10-09T21:23:08-05:00").unwrap();
        let event = Event::new("1", "src", "t").with_time(time);

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["time"], "2019-10-09T21:23:08-05:00");
    }

    #[test]
    fn test_unknown_fields_become_extensions() {
        let event: Event = serde_json::from_value(json!({
            "id": "1",
            "source": "src",
            "type": "t",
            "specversion": "0.2",
            "tracestate": "congo=4"
        }))
        .unwrap();

        assert_eq!(event.extensions.get("tracestate"), Some(&json!("congo=4")));
        assert!(event.time.is_none());
        assert!(event.data.is_none());
    }
}
