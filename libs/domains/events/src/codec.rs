//! Mapping between [`Event`] and its stored document layout.
//!
//! Documents nest the CloudEvents attributes under `attributes`, keep the
//! payload under `data` and the extensions under `extensions`:
//!
//! ```json
//! {"attributes": {"id": "...", "source": "...", "specversion": "0.2", "type": "...",
//!                 "time": "2019-10-09T21:23:08-05:00"},
//!  "data": {"test": "value"},
//!  "extensions": {"traceparent": "0"}}
//! ```
//!
//! Older documents carry `time` as a structured date-time object; those are
//! still decoded, with the offset rounded down to whole hours.

use crate::error::Result;
use crate::models::Event;
use chrono::{DateTime, FixedOffset};
use database::Document;
use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Serialize, Deserialize)]
struct EventDocument {
    attributes: Attributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    extensions: BTreeMap<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Attributes {
    id: String,
    source: String,
    specversion: String,
    #[serde(rename = "type")]
    event_type: String,
    #[serde(
        default,
        deserialize_with = "deserialize_time",
        skip_serializing_if = "Option::is_none"
    )]
    time: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    contenttype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schemaurl: Option<String>,
}

/// Encode an event into the document written to the store.
pub fn to_document(event: &Event) -> Result<Document> {
    let document = EventDocument {
        attributes: Attributes {
            id: event.id.clone(),
            source: event.source.clone(),
            specversion: event.spec_version.clone(),
            event_type: event.event_type.clone(),
            time: event.time,
            contenttype: event.contenttype.clone(),
            schemaurl: event.schemaurl.clone(),
        },
        data: event.data.clone(),
        extensions: event.extensions.clone(),
    };

    Ok(serde_json::to_value(document)?)
}

/// Decode a stored document. Store metadata (`_id`, `_rev`) is ignored.
pub fn from_document(document: Document) -> Result<Event> {
    let EventDocument {
        attributes,
        data,
        extensions,
    } = serde_json::from_value(document)?;

    Ok(Event {
        id: attributes.id,
        source: attributes.source,
        event_type: attributes.event_type,
        spec_version: attributes.specversion,
        time: attributes.time,
        contenttype: attributes.contenttype,
        schemaurl: attributes.schemaurl,
        data,
        extensions,
    })
}

fn deserialize_time<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<FixedOffset>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    decode_time(value.unwrap_or(Value::Null)).map_err(de::Error::custom)
}

fn decode_time(value: Value) -> std::result::Result<Option<DateTime<FixedOffset>>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(text) => parse_time(&text).map(Some),
        Value::Array(items) => match items.as_slice() {
            [Value::String(text)] => parse_time(text).map(Some),
            _ => Err(format!("unsupported time array: {}", Value::Array(items))),
        },
        Value::Object(_) => parse_time(&compose_structured_time(&value)?).map(Some),
        other => Err(format!("unsupported time value: {}", other)),
    }
}

fn parse_time(text: &str) -> std::result::Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_rfc3339(text).map_err(|e| format!("invalid time '{}': {}", text, e))
}

/// Rebuilds an RFC 3339 string from the structured form
/// `{"dateTime":{"date":{..},"time":{..}},"offset":{"totalSeconds":..}}`.
///
/// Nanoseconds and the zone id are dropped and offset minutes are always `00`.
fn compose_structured_time(value: &Value) -> std::result::Result<String, String> {
    let field = |pointer: &str| {
        value
            .pointer(pointer)
            .and_then(Value::as_i64)
            .ok_or_else(|| format!("structured time is missing {}", pointer))
    };

    let year = field("/dateTime/date/year")?;
    let month = field("/dateTime/date/month")?;
    let day = field("/dateTime/date/day")?;
    let hour = field("/dateTime/time/hour")?;
    let minute = field("/dateTime/time/minute")?;
    let second = field("/dateTime/time/second")?;
    let total_seconds = field("/offset/totalSeconds")?;

    let sign = if total_seconds < 0 { '-' } else { '+' };
    let hours = total_seconds.abs() / 3600;

    Ok(format!(
        "{}-{:02}-{:02}T{:02}:{:02}:{:02}{}{:02}:00",
        year, month, day, hour, minute, second, sign, hours
    ))
}
