//! Feed parser: raw modem output → [`MessagePart`]s.
//!
//! The feed is a JSON object with a `msg` array. Records are read leniently:
//! a missing or mistyped field falls back to zero / empty instead of
//! rejecting the record, and numeric fields also accept numeric strings.

use serde_json::{Map, Value};
use smsfwd_core::error::FeedError;
use smsfwd_core::message::MessagePart;
use tracing::warn;

/// Name of the array holding the stored messages.
pub const MESSAGE_LIST_FIELD: &str = "msg";

/// Parse a raw feed into parts, in feed order.
pub fn parse_feed(raw: &str) -> Result<Vec<MessagePart>, FeedError> {
    let root: Value =
        serde_json::from_str(raw.trim()).map_err(|e| FeedError::Malformed(e.to_string()))?;

    let Value::Object(root) = root else {
        return Err(FeedError::Malformed("feed root is not an object".into()));
    };

    let list = match root.get(MESSAGE_LIST_FIELD) {
        None => return Err(FeedError::MissingMessageList),
        Some(Value::Array(list)) => list,
        Some(_) => return Err(FeedError::MessageListNotArray),
    };

    let parts = list
        .iter()
        .enumerate()
        .filter_map(|(position, entry)| match entry {
            Value::Object(record) => Some(part_from_record(record)),
            other => {
                warn!(position, kind = value_kind(other), "Skipping non-object feed entry");
                None
            }
        })
        .collect();

    Ok(parts)
}

fn part_from_record(record: &Map<String, Value>) -> MessagePart {
    MessagePart {
        index: int_field(record, "index"),
        sender: string_field(record, "sender"),
        timestamp: int_field(record, "timestamp"),
        content: string_field(record, "content"),
        reference: int_field(record, "reference"),
        total: int_field(record, "total"),
        part: int_field(record, "part"),
    }
    .bounded()
}

fn int_field(record: &Map<String, Value>, key: &str) -> i64 {
    match record.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        Some(Value::Bool(b)) => i64::from(*b),
        _ => 0,
    }
}

fn string_field(record: &Map<String, Value>, key: &str) -> String {
    match record.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
