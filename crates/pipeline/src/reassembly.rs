//! Multi-part reassembly.
//!
//! Parts with `total <= 1` pass straight through. The rest are grouped by
//! `(reference, sender, total)`; a group becomes a message only when it holds
//! exactly `total` parts. Anything else is dropped for this cycle and stays
//! on the modem, so a later poll can complete it.
//!
//! Output order: single-part messages in feed order, then multi-part
//! messages in the order their first part appeared in the feed.

use std::collections::HashMap;

use smsfwd_core::message::{GroupKey, LogicalMessage, MessagePart};
use tracing::debug;

/// A multi-part group that could not be assembled this cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncompleteGroup {
    pub key: GroupKey,
    /// Parts present in the feed
    pub found: usize,
}

/// Result of one reassembly pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reassembled {
    pub messages: Vec<LogicalMessage>,
    pub incomplete: Vec<IncompleteGroup>,
}

/// Assemble `parts` into logical messages.
pub fn reassemble(parts: &[MessagePart]) -> Vec<LogicalMessage> {
    reassemble_detailed(parts).messages
}

/// Like [`reassemble`], also reporting the groups that were dropped.
pub fn reassemble_detailed(parts: &[MessagePart]) -> Reassembled {
    let mut out = Reassembled::default();

    out.messages.extend(
        parts
            .iter()
            .filter(|p| !p.is_multipart())
            .map(LogicalMessage::from_single),
    );

    // Groups in order of first appearance
    let mut order: Vec<GroupKey> = Vec::new();
    let mut groups: HashMap<GroupKey, Vec<&MessagePart>> = HashMap::new();
    for part in parts.iter().filter(|p| p.is_multipart()) {
        let key = part.group_key();
        let members = groups.entry(key.clone()).or_insert_with(|| {
            order.push(key);
            Vec::new()
        });
        members.push(part);
    }

    for key in order {
        let Some(mut members) = groups.remove(&key) else {
            continue;
        };

        if i64::try_from(members.len()).ok() != Some(key.total) {
            debug!(
                group = %key,
                found = members.len(),
                expected = key.total,
                "Dropping incomplete multi-part group"
            );
            out.incomplete.push(IncompleteGroup {
                found: members.len(),
                key,
            });
            continue;
        }

        // Stable: equal `part` numbers keep feed order
        members.sort_by_key(|p| p.part);
        out.messages.push(assemble(&members));
    }

    out
}

fn assemble(members: &[&MessagePart]) -> LogicalMessage {
    let first = members[0];
    LogicalMessage {
        content: members.iter().map(|p| p.content.as_str()).collect(),
        sender: first.sender.clone(),
        timestamp: first.timestamp,
        source_indices: members.iter().map(|p| p.index).collect(),
    }
}
