//! Builds and extends `STORAGE` object definitions: on create, emits a new
//! STORAGE object with one Incarnation/Copy; on update, appends a new
//! StorageItem entry for the new dataItem into the existing STORAGE object,
//! producing a new STORAGE version.

use chrono::{DateTime, Utc};
use trac_models::{Copy, CopyStatus, Incarnation, IncarnationStatus, StorageDefinition, StorageItem};

fn single_copy_item(storage_key: &str, storage_path: &str, storage_format: &str, now: DateTime<Utc>) -> StorageItem {
    StorageItem {
        incarnations: vec![Incarnation {
            incarnation_index: 0,
            incarnation_timestamp: now,
            incarnation_status: IncarnationStatus::Available,
            copies: vec![Copy {
                storage_key: storage_key.to_string(),
                storage_path: storage_path.to_string(),
                storage_format: storage_format.to_string(),
                copy_timestamp: now,
                copy_status: CopyStatus::Available,
            }],
        }],
    }
}

/// A brand-new STORAGE definition holding exactly one data item, for a
/// create.
pub fn new_storage_definition(
    data_item: &str,
    storage_key: &str,
    storage_path: &str,
    storage_format: &str,
    now: DateTime<Utc>,
) -> StorageDefinition {
    let mut data_items = std::collections::BTreeMap::new();
    data_items.insert(data_item.to_string(), single_copy_item(storage_key, storage_path, storage_format, now));
    StorageDefinition { data_items }
}

/// Extends an existing STORAGE definition with one more data item, for an
/// update. Prior entries are kept so earlier DATA/FILE versions remain
/// readable through the same STORAGE object lineage.
pub fn append_data_item(
    mut prior: StorageDefinition,
    data_item: &str,
    storage_key: &str,
    storage_path: &str,
    storage_format: &str,
    now: DateTime<Utc>,
) -> StorageDefinition {
    prior
        .data_items
        .insert(data_item.to_string(), single_copy_item(storage_key, storage_path, storage_format, now));
    prior
}

/// Marks every copy of `data_item` EXPUNGED, used on the asynchronous
/// partial-failure rollback path: if the owning DATA/FILE commit fails
/// after the storage copy is already written, the storage copy is marked
/// EXPUNGED asynchronously rather than blocking the failed request on it.
pub fn expunge_data_item(mut storage: StorageDefinition, data_item: &str) -> StorageDefinition {
    if let Some(item) = storage.data_items.get_mut(data_item) {
        for incarnation in &mut item.incarnations {
            incarnation.incarnation_status = IncarnationStatus::Expunged;
            for copy in &mut incarnation.copies {
                copy.copy_status = CopyStatus::Expunged;
            }
        }
    }
    storage
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_storage_definition_has_one_available_copy() {
        let def = new_storage_definition("data/table/x/snap-0/delta-0-xabc", "default", "acme/data/table/x/snap-0/delta-0-xabc", "ARROW_FILE", Utc::now());
        assert!(def.has_any_available_copy());
        assert_eq!(def.data_items.len(), 1);
    }

    #[test]
    fn append_keeps_prior_entries() {
        let now = Utc::now();
        let first = new_storage_definition("item-0", "default", "path-0", "ARROW_FILE", now);
        let second = append_data_item(first, "item-1", "default", "path-1", "ARROW_FILE", now);
        assert_eq!(second.data_items.len(), 2);
        assert!(second.data_items.contains_key("item-0"));
        assert!(second.data_items.contains_key("item-1"));
    }

    #[test]
    fn expunge_marks_every_copy_unavailable() {
        let now = Utc::now();
        let def = new_storage_definition("item-0", "default", "path-0", "ARROW_FILE", now);
        let expunged = expunge_data_item(def, "item-0");
        assert!(!expunged.has_any_available_copy());
    }
}
