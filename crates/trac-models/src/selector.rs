use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{ObjectType, TagHeader};

/// Which object version a selector pins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectCriteria {
    Version(u32),
    LatestObject,
    AsOf(DateTime<Utc>),
}

/// Which tag version a selector pins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TagCriteria {
    Version(u32),
    LatestTag,
    AsOf(DateTime<Utc>),
}

/// A query for one object, by explicit version, latest flag, or as-of time,
/// crossed with the same choice on the tag side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagSelector {
    pub object_type: ObjectType,
    pub object_id: String,
    pub object_criteria: ObjectCriteria,
    pub tag_criteria: TagCriteria,
}

impl TagSelector {
    /// A selector pinned to an exact (objectVersion, tagVersion).
    pub fn pinned(header: &TagHeader) -> Self {
        TagSelector {
            object_type: header.object_type,
            object_id: header.object_id.clone(),
            object_criteria: ObjectCriteria::Version(header.object_version),
            tag_criteria: TagCriteria::Version(header.tag_version),
        }
    }

    /// A selector that always resolves to the latest object and tag
    /// version. Used for DATA/FILE → STORAGE back-references.
    pub fn latest(object_type: ObjectType, object_id: impl Into<String>) -> Self {
        TagSelector {
            object_type,
            object_id: object_id.into(),
            object_criteria: ObjectCriteria::LatestObject,
            tag_criteria: TagCriteria::LatestTag,
        }
    }

    pub fn is_latest_object(&self) -> bool {
        matches!(self.object_criteria, ObjectCriteria::LatestObject)
    }

    pub fn is_pinned_version(&self) -> bool {
        matches!(self.object_criteria, ObjectCriteria::Version(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ObjectType;

    #[test]
    fn pinned_selector_matches_header_exactly() {
        let header = TagHeader {
            object_type: ObjectType::Data,
            object_id: "x".into(),
            object_version: 3,
            tag_version: 2,
            object_timestamp: Utc::now(),
            tag_timestamp: Utc::now(),
        };
        let sel = TagSelector::pinned(&header);
        assert_eq!(sel.object_criteria, ObjectCriteria::Version(3));
        assert_eq!(sel.tag_criteria, TagCriteria::Version(2));
    }

    #[test]
    fn latest_selector_uses_latest_flags() {
        let sel = TagSelector::latest(ObjectType::Storage, "y");
        assert!(sel.is_latest_object());
        assert!(!sel.is_pinned_version());
    }
}
