use chrono::{DateTime, FixedOffset, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Display;

pub const DEFAULT_LEVEL: &str = "INFO";
pub const NO_MESSAGE: &str = "No message";
pub const MISSING: &str = "-";

const ROW_TIME_FORMAT: &str = "%-m/%-d/%Y, %I:%M:%S %p";
const DETAIL_TIME_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S%.3f %p";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Unknown,
}

impl Severity {
    pub fn from_level(level: &str) -> Self {
        match level.trim().to_uppercase().as_str() {
            "FINEST" | "FINER" | "TRACE" => Severity::Trace,
            "FINE" | "CONFIG" | "DEBUG" => Severity::Debug,
            "INFO" => Severity::Info,
            "WARN" | "WARNING" => Severity::Warn,
            "ERROR" | "SEVERE" | "FATAL" => Severity::Error,
            _ => Severity::Unknown,
        }
    }
}

/// A log record exactly as the query endpoint returned it.
///
/// Every field is optional; fields this viewer does not know about are kept
/// in `other` so the raw JSON view shows the whole record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stacktrace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logger_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

// Empty strings count as absent, the same way the endpoint's own clients treat them.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl LogRecord {
    pub fn time(&self) -> Option<&str> {
        present(&self.time)
    }

    pub fn level_label(&self) -> &str {
        present(&self.level).unwrap_or(DEFAULT_LEVEL)
    }

    pub fn severity(&self) -> Severity {
        Severity::from_level(self.level_label())
    }

    pub fn message(&self) -> Option<&str> {
        present(&self.message)
    }

    pub fn error(&self) -> Option<&str> {
        present(&self.error)
    }

    pub fn stacktrace(&self) -> Option<&str> {
        present(&self.stacktrace)
    }

    pub fn session_id(&self) -> &str {
        present(&self.session_id).unwrap_or(MISSING)
    }

    pub fn client_id(&self) -> &str {
        present(&self.client_id).unwrap_or(MISSING)
    }

    pub fn source(&self) -> &str {
        present(&self.source).unwrap_or(MISSING)
    }

    /// Text shown in a list row: message, then error, then a placeholder.
    pub fn display_message(&self) -> &str {
        self.message().or_else(|| self.error()).unwrap_or(NO_MESSAGE)
    }

    /// Text placed on the clipboard by the detail view's copy action.
    pub fn copy_text(&self) -> String {
        match self.message().or_else(|| self.error()) {
            Some(text) => text.to_string(),
            None => serde_json::to_string(self).unwrap_or_default(),
        }
    }

    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

// Scalars become text; arrays and objects stay as JSON under their own key.
fn take_text(map: &mut Map<String, Value>, other: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        value => {
            other.insert(key.to_string(), value);
            None
        }
    }
}

fn take_sequence(map: &mut Map<String, Value>, other: &mut Map<String, Value>) -> Option<u64> {
    let value = map.remove("sequence")?;
    let parsed = match &value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    if parsed.is_none() && !value.is_null() {
        other.insert("sequence".to_string(), value);
    }
    parsed
}

fn take_value(map: &mut Map<String, Value>, key: &str) -> Option<Value> {
    map.remove(key).filter(|v| !v.is_null())
}

impl LogRecord {
    /// Builds a record from one element of a response array without
    /// rejecting fields of an unexpected type.
    pub fn from_value(value: Value) -> Self {
        let mut map = match value {
            Value::Object(map) => map,
            Value::Null => return LogRecord::default(),
            Value::String(s) => {
                return LogRecord {
                    message: Some(s),
                    ..Default::default()
                }
            }
            value => {
                let mut other = Map::new();
                other.insert("value".to_string(), value);
                return LogRecord {
                    other,
                    ..Default::default()
                };
            }
        };
        let mut other = Map::new();
        LogRecord {
            time: take_text(&mut map, &mut other, "time"),
            level: take_text(&mut map, &mut other, "level"),
            message: take_text(&mut map, &mut other, "message"),
            error: take_text(&mut map, &mut other, "error"),
            stacktrace: take_text(&mut map, &mut other, "stacktrace"),
            session_id: take_text(&mut map, &mut other, "session_id"),
            client_id: take_text(&mut map, &mut other, "client_id"),
            source: take_text(&mut map, &mut other, "source"),
            logger_name: take_text(&mut map, &mut other, "logger_name"),
            sequence: take_sequence(&mut map, &mut other),
            client_ip: take_text(&mut map, &mut other, "client_ip"),
            object: take_value(&mut map, "object"),
            extra: take_value(&mut map, "extra"),
            other: {
                other.extend(map);
                other
            },
        }
    }
}

/// Decodes a query response body. A JSON `null` is an empty result set.
///
/// Only a body that is not JSON, or not an array or `null`, is an error.
/// Individual records are converted leniently by [`LogRecord::from_value`].
pub fn decode_records(bytes: &[u8]) -> Result<Vec<LogRecord>, serde_json::Error> {
    let parsed: Option<Vec<Value>> = serde_json::from_slice(bytes)?;
    Ok(parsed
        .unwrap_or_default()
        .into_iter()
        .map(LogRecord::from_value)
        .collect())
}

fn parse_time(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed);
    }
    // Numeric timestamps are milliseconds since the epoch.
    let millis: i64 = raw.parse().ok()?;
    Utc.timestamp_millis_opt(millis).single().map(|t| t.fixed_offset())
}

fn format_time_in<Tz>(raw: Option<&str>, tz: &Tz, format: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let Some(raw) = raw else {
        return MISSING.to_string();
    };
    match parse_time(raw) {
        Some(parsed) => parsed.with_timezone(tz).format(format).to_string(),
        // Keep the row readable when the endpoint sends something odd.
        None => raw.to_string(),
    }
}

pub fn format_row_time_in<Tz>(raw: Option<&str>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format_time_in(raw, tz, ROW_TIME_FORMAT)
}

pub fn format_detail_time_in<Tz>(raw: Option<&str>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format_time_in(raw, tz, DETAIL_TIME_FORMAT)
}

pub fn format_row_time(raw: Option<&str>) -> String {
    format_row_time_in(raw, &Local)
}

pub fn format_detail_time(raw: Option<&str>) -> String {
    format_detail_time_in(raw, &Local)
}
