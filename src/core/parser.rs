//! Forgiving `key：value, key：value` grammar for model replies.
//!
//! The model is asked to answer in this shape but nothing guarantees it does,
//! so parsing is total: a segment that does not fit is skipped and the field
//! keeps its empty default. Unknown keys never reach the record and a repeated
//! key keeps its last value.

use crate::domain::model::{Record, Schema, KEY_SEPARATOR, PAIR_SEPARATOR};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub matched: usize,
    pub unknown: usize,
    pub malformed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutcome {
    pub record: Record,
    pub stats: ParseStats,
}

enum Segment<'a> {
    Blank,
    Malformed,
    Pair { key: &'a str, value: &'a str },
}

fn split_segment(segment: &str) -> Segment<'_> {
    if segment.trim().is_empty() {
        return Segment::Blank;
    }

    match segment.split_once(KEY_SEPARATOR) {
        Some((key, value)) => {
            let key = key.trim();
            let value = value.trim();
            if key.is_empty() || value.is_empty() {
                Segment::Malformed
            } else {
                Segment::Pair { key, value }
            }
        }
        None => Segment::Malformed,
    }
}

pub fn parse_reply(schema: &Schema, reply: &str) -> Record {
    parse_reply_detailed(schema, reply).record
}

/// Same record as [`parse_reply`], plus per-segment counts for logging.
pub fn parse_reply_detailed(schema: &Schema, reply: &str) -> ParseOutcome {
    let mut record = schema.empty_record();
    let mut stats = ParseStats::default();

    for segment in reply.split(PAIR_SEPARATOR) {
        match split_segment(segment) {
            Segment::Blank => {}
            Segment::Malformed => stats.malformed += 1,
            Segment::Pair { key, value } => {
                if record.set(key, value) {
                    stats.matched += 1;
                } else {
                    stats.unknown += 1;
                }
            }
        }
    }

    ParseOutcome { record, stats }
}
