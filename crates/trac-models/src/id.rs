use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// The kind of object a [`TagHeader`] or [`ObjectDefinition`](crate::object::ObjectDefinition)
/// refers to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ObjectType {
    Data,
    File,
    Storage,
    Schema,
    Model,
    Flow,
    Job,
    Custom,
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ObjectType::Data => "DATA",
            ObjectType::File => "FILE",
            ObjectType::Storage => "STORAGE",
            ObjectType::Schema => "SCHEMA",
            ObjectType::Model => "MODEL",
            ObjectType::Flow => "FLOW",
            ObjectType::Job => "JOB",
            ObjectType::Custom => "CUSTOM",
        };
        f.write_str(s)
    }
}

/// Identity triple plus time for one committed tag.
///
/// `objectVersion` and `tagVersion` are both 1-based; `tagVersion` restarts
/// at 1 for every new `objectVersion` (invariant 3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagHeader {
    pub object_type: ObjectType,
    pub object_id: String,
    pub object_version: u32,
    pub tag_version: u32,
    pub object_timestamp: DateTime<Utc>,
    pub tag_timestamp: DateTime<Utc>,
}

impl TagHeader {
    /// Builds the header for the first version/tag of a brand new object.
    pub fn new_object(object_type: ObjectType, now: DateTime<Utc>) -> Self {
        TagHeader {
            object_type,
            object_id: new_object_id(),
            object_version: 1,
            tag_version: 1,
            object_timestamp: truncate_to_micros(now),
            tag_timestamp: truncate_to_micros(now),
        }
    }

    /// Advances this header to the next object version (invariant 2), and
    /// resets `tagVersion` to 1 (invariant 3).
    pub fn next_object_header(&self, now: DateTime<Utc>) -> Self {
        TagHeader {
            object_type: self.object_type,
            object_id: self.object_id.clone(),
            object_version: self.object_version + 1,
            tag_version: 1,
            object_timestamp: truncate_to_micros(now),
            tag_timestamp: truncate_to_micros(now),
        }
    }

    /// Advances this header to the next tag version of the same object
    /// version (invariant 3); `objectTimestamp` is unchanged.
    pub fn next_tag_header(&self, now: DateTime<Utc>) -> Self {
        TagHeader {
            object_type: self.object_type,
            object_id: self.object_id.clone(),
            object_version: self.object_version,
            tag_version: self.tag_version + 1,
            object_timestamp: self.object_timestamp,
            tag_timestamp: truncate_to_micros(now),
        }
    }
}

/// Truncates a timestamp to microsecond precision: "Timestamps
/// are UTC with microsecond precision."
pub fn truncate_to_micros(ts: DateTime<Utc>) -> DateTime<Utc> {
    let micros = ts.timestamp_subsec_micros();
    ts.with_nanosecond(micros * 1_000).unwrap_or(ts)
}

use chrono::Timelike;

/// Generates a new random (v4) object id.
pub fn new_object_id() -> String {
    Uuid::new_v4().to_string()
}

/// Validates that a string is a well-formed UUID, used when ids arrive from
/// the wire rather than being generated locally.
pub fn parse_object_id(raw: &str) -> Result<String> {
    Uuid::parse_str(raw)
        .map(|u| u.to_string())
        .map_err(|_| Error::invalid_argument(format!("object id is not a valid UUID: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_id_round_trips_as_uuid() {
        let id = new_object_id();
        assert!(parse_object_id(&id).is_ok());
    }

    #[test]
    fn next_object_header_resets_tag_version() {
        let now = Utc::now();
        let header = TagHeader::new_object(ObjectType::Data, now);
        let later = header.next_object_header(now + chrono::Duration::seconds(1));
        assert_eq!(later.object_version, 2);
        assert_eq!(later.tag_version, 1);
        assert_eq!(later.object_id, header.object_id);
    }

    #[test]
    fn next_tag_header_preserves_object_version_and_timestamp() {
        let now = Utc::now();
        let header = TagHeader::new_object(ObjectType::Data, now);
        let tagged = header.next_tag_header(now + chrono::Duration::seconds(5));
        assert_eq!(tagged.object_version, header.object_version);
        assert_eq!(tagged.tag_version, 2);
        assert_eq!(tagged.object_timestamp, header.object_timestamp);
    }

    #[test]
    fn timestamps_truncate_to_microseconds() {
        let ts = DateTime::parse_from_rfc3339("2024-01-01T00:00:00.123456789Z")
            .unwrap()
            .with_timezone(&Utc);
        let truncated = truncate_to_micros(ts);
        assert_eq!(truncated.timestamp_subsec_nanos(), 123_456_000);
    }
}
