//! Message domain types.
//!
//! These are the cycle-scoped values that flow through the pipeline:
//! Modem feed → `MessagePart`s → reassembly → `LogicalMessage` → forwarders.
//! Nothing here outlives a single poll cycle.

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};

/// Longest sender kept from the feed, in bytes. Longer values are truncated.
pub const MAX_SENDER_BYTES: usize = 63;

/// Longest content kept for a single part, in bytes. Longer values are truncated.
pub const MAX_PART_CONTENT_BYTES: usize = 511;

/// Format used for the human-readable message time (local timezone).
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One raw segment from the modem feed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePart {
    /// Modem-local storage slot, used for deletion
    pub index: i64,

    /// Sender address as reported by the modem
    pub sender: String,

    /// Receive time, epoch seconds
    pub timestamp: i64,

    /// Text fragment
    pub content: String,

    /// Concatenation reference; meaningless when `total <= 1`
    pub reference: i64,

    /// Number of parts in the group
    pub total: i64,

    /// 1-based position within the group
    pub part: i64,
}

impl MessagePart {
    /// Whether this part belongs to a multi-part group.
    pub fn is_multipart(&self) -> bool {
        self.total > 1
    }

    /// The key multi-part groups are assembled by.
    pub fn group_key(&self) -> GroupKey {
        GroupKey {
            reference: self.reference,
            sender: self.sender.clone(),
            total: self.total,
        }
    }

    /// Apply the sender/content size bounds, truncating on a char boundary.
    pub fn bounded(mut self) -> Self {
        truncate_in_place(&mut self.sender, MAX_SENDER_BYTES);
        truncate_in_place(&mut self.content, MAX_PART_CONTENT_BYTES);
        self
    }
}

/// Grouping key for multi-part messages.
///
/// `total` is part of the key so two unrelated messages that happen to reuse a
/// reference number are never merged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub reference: i64,
    pub sender: String,
    pub total: i64,
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.sender, self.reference, self.total)
    }
}

/// A complete, user-visible message after reassembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalMessage {
    /// Part contents concatenated in `part` order
    pub content: String,

    /// Sender of the lowest-numbered part
    pub sender: String,

    /// Timestamp of the lowest-numbered part, epoch seconds
    pub timestamp: i64,

    /// Storage indices of every part, in `part` order
    pub source_indices: Vec<i64>,
}

impl LogicalMessage {
    /// Build a message from a single, self-contained part.
    pub fn from_single(part: &MessagePart) -> Self {
        Self {
            content: part.content.clone(),
            sender: part.sender.clone(),
            timestamp: part.timestamp,
            source_indices: vec![part.index],
        }
    }

    /// The receive time rendered in local time, e.g. `2024-05-01 13:37:00`.
    ///
    /// Falls back to the raw epoch value when it is out of chrono's range.
    pub fn formatted_time(&self) -> String {
        format_timestamp(self.timestamp)
    }
}

/// Render epoch seconds as local time using [`TIME_FORMAT`].
pub fn format_timestamp(timestamp: i64) -> String {
    match Local.timestamp_opt(timestamp, 0).earliest() {
        Some(dt) => dt.format(TIME_FORMAT).to_string(),
        None => timestamp.to_string(),
    }
}

/// Truncate `s` to at most `max_bytes` bytes without splitting a character.
pub fn truncate_utf8(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

fn truncate_in_place(s: &mut String, max_bytes: usize) {
    let keep = truncate_utf8(s, max_bytes).len();
    s.truncate(keep);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part(index: i64, total: i64, part: i64) -> MessagePart {
        MessagePart {
            index,
            sender: "+8613800000000".into(),
            timestamp: 1_700_000_000,
            content: "hello".into(),
            reference: 42,
            total,
            part,
        }
    }

    #[test]
    fn multipart_detection() {
        assert!(!part(1, 0, 0).is_multipart());
        assert!(!part(1, 1, 1).is_multipart());
        assert!(part(1, 2, 1).is_multipart());
    }

    #[test]
    fn group_key_includes_total() {
        assert_ne!(part(1, 2, 1).group_key(), part(2, 3, 1).group_key());
        assert_eq!(part(1, 2, 1).group_key(), part(2, 2, 2).group_key());
    }

    #[test]
    fn truncate_keeps_char_boundary() {
        // "短信" is 6 bytes; cutting at 4 must back off to 3
        assert_eq!(truncate_utf8("短信", 4), "短");
        assert_eq!(truncate_utf8("abc", 10), "abc");
        assert_eq!(truncate_utf8("abcdef", 3), "abc");
    }

    #[test]
    fn bounded_truncates_overlong_fields() {
        let p = MessagePart {
            sender: "x".repeat(100),
            content: "y".repeat(600),
            ..MessagePart::default()
        }
        .bounded();
        assert_eq!(p.sender.len(), MAX_SENDER_BYTES);
        assert_eq!(p.content.len(), MAX_PART_CONTENT_BYTES);
    }

    #[test]
    fn logical_from_single() {
        let msg = LogicalMessage::from_single(&part(9, 1, 1));
        assert_eq!(msg.source_indices, vec![9]);
        assert_eq!(msg.content, "hello");
    }

    #[test]
    fn formatted_time_shape() {
        let msg = LogicalMessage::from_single(&part(1, 1, 1));
        let time = msg.formatted_time();
        assert_eq!(time.len(), 19);
        assert_eq!(&time[4..5], "-");
        assert_eq!(&time[13..14], ":");
    }
}
