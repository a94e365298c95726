//! Selector resolution shared by every [`crate::MetadataDal`] backend:
//!
//! > explicit `objectVersion`, else `objectAsOf`, else `latestObject` → max
//! > objectVersion committed at/before now. `tagAsOf` resolves to max
//! > tagVersion whose tagTimestamp ≤ asOf within the chosen objectVersion.

use chrono::{DateTime, Utc};
use trac_models::{ObjectCriteria, TagCriteria, TagSelector};

use crate::error::{DalError, DalResult};

/// One committed (objectVersion, objectTimestamp) row, as seen by the
/// resolver; backends adapt their storage representation into this shape.
#[derive(Debug, Clone, Copy)]
pub struct ObjectVersionRow {
    pub object_version: u32,
    pub object_timestamp: DateTime<Utc>,
}

/// One committed (tagVersion, tagTimestamp) row within an object version.
#[derive(Debug, Clone, Copy)]
pub struct TagVersionRow {
    pub tag_version: u32,
    pub tag_timestamp: DateTime<Utc>,
}

/// Resolves the `objectVersion` criterion of a selector against the known
/// committed object versions (ascending order is not required; the rows are
/// scanned in full).
pub fn resolve_object_version(
    selector: &TagSelector,
    versions: &[ObjectVersionRow],
    as_of_now: DateTime<Utc>,
) -> DalResult<u32> {
    match &selector.object_criteria {
        ObjectCriteria::Version(v) => {
            if versions.iter().any(|row| row.object_version == *v) {
                Ok(*v)
            } else {
                Err(DalError::NotFound(format!(
                    "object {} version {v} does not exist",
                    selector.object_id
                )))
            }
        }
        ObjectCriteria::AsOf(as_of) => versions
            .iter()
            .filter(|row| row.object_timestamp <= *as_of)
            .max_by_key(|row| row.object_version)
            .map(|row| row.object_version)
            .ok_or_else(|| {
                DalError::NotFound(format!(
                    "object {} has no version committed at or before {as_of}",
                    selector.object_id
                ))
            }),
        ObjectCriteria::LatestObject => versions
            .iter()
            .filter(|row| row.object_timestamp <= as_of_now)
            .max_by_key(|row| row.object_version)
            .map(|row| row.object_version)
            .ok_or_else(|| DalError::NotFound(format!("object {} not found", selector.object_id))),
    }
}

/// Resolves the `tagVersion` criterion within the already-resolved object
/// version.
pub fn resolve_tag_version(
    selector: &TagSelector,
    tags: &[TagVersionRow],
    as_of_now: DateTime<Utc>,
) -> DalResult<u32> {
    match &selector.tag_criteria {
        TagCriteria::Version(v) => {
            if tags.iter().any(|row| row.tag_version == *v) {
                Ok(*v)
            } else {
                Err(DalError::NotFound(format!(
                    "object {} has no tag version {v}",
                    selector.object_id
                )))
            }
        }
        TagCriteria::AsOf(as_of) => tags
            .iter()
            .filter(|row| row.tag_timestamp <= *as_of)
            .max_by_key(|row| row.tag_version)
            .map(|row| row.tag_version)
            .ok_or_else(|| {
                DalError::NotFound(format!(
                    "object {} has no tag committed at or before {as_of}",
                    selector.object_id
                ))
            }),
        TagCriteria::LatestTag => tags
            .iter()
            .filter(|row| row.tag_timestamp <= as_of_now)
            .max_by_key(|row| row.tag_version)
            .map(|row| row.tag_version)
            .ok_or_else(|| DalError::NotFound(format!("object {} has no tags", selector.object_id))),
    }
}
