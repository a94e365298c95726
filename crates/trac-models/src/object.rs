use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::ObjectType;
use crate::schema::SchemaDefinition;
use crate::selector::TagSelector;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IncarnationStatus {
    Available,
    Expunged,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CopyStatus {
    Available,
    Expunged,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Copy {
    pub storage_key: String,
    pub storage_path: String,
    pub storage_format: String,
    pub copy_timestamp: DateTime<Utc>,
    pub copy_status: CopyStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incarnation {
    pub incarnation_index: u32,
    pub incarnation_timestamp: DateTime<Utc>,
    pub incarnation_status: IncarnationStatus,
    pub copies: Vec<Copy>,
}

impl Incarnation {
    pub fn first_available_copy(&self) -> Option<&Copy> {
        if self.incarnation_status != IncarnationStatus::Available {
            return None;
        }
        self.copies.iter().find(|c| c.copy_status == CopyStatus::Available)
    }
}

/// One logical storage item: the ordered incarnation history of a single
/// `dataItem` path token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StorageItem {
    pub incarnations: Vec<Incarnation>,
}

impl StorageItem {
    /// Picks the first AVAILABLE incarnation's first AVAILABLE copy, the
    /// copy a read resolves to.
    pub fn first_available_copy(&self) -> Option<&Copy> {
        self.incarnations.iter().find_map(Incarnation::first_available_copy)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StorageDefinition {
    pub data_items: BTreeMap<String, StorageItem>,
}

impl StorageDefinition {
    /// Invariant 9: every DATA/FILE version must resolve to a STORAGE object
    /// with at least one available copy somewhere.
    pub fn has_any_available_copy(&self) -> bool {
        self.data_items
            .values()
            .any(|item| item.first_available_copy().is_some())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaRef {
    pub delta_index: u32,
    pub data_item: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snap {
    pub snap_index: u32,
    pub deltas: Vec<DeltaRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub part_key: String,
    pub snap: Snap,
}

/// Exactly one of `schema`/`schema_id` is populated: a DATA object either
/// embeds its schema directly or points at a separate SCHEMA object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SchemaSpec {
    Embedded(SchemaDefinition),
    External(TagSelector),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataDefinition {
    pub schema: SchemaSpec,
    pub storage_id: TagSelector,
    pub parts: BTreeMap<String, Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDefinition {
    pub name: String,
    pub extension: String,
    pub mime_type: String,
    pub size: u64,
    pub storage_id: TagSelector,
    pub data_item: String,
}

/// Opaque payload types validated only for basic well-formedness by the data
/// core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpaquePayload {
    pub payload: serde_json::Value,
}

/// The tagged union over `objectType`: every metadata object in the
/// platform is one of these variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "objectType")]
pub enum ObjectDefinition {
    Data(DataDefinition),
    File(FileDefinition),
    Storage(StorageDefinition),
    Schema(SchemaDefinition),
    Model(OpaquePayload),
    Flow(OpaquePayload),
    Job(OpaquePayload),
    Custom(OpaquePayload),
}

impl ObjectDefinition {
    pub fn object_type(&self) -> ObjectType {
        match self {
            ObjectDefinition::Data(_) => ObjectType::Data,
            ObjectDefinition::File(_) => ObjectType::File,
            ObjectDefinition::Storage(_) => ObjectType::Storage,
            ObjectDefinition::Schema(_) => ObjectType::Schema,
            ObjectDefinition::Model(_) => ObjectType::Model,
            ObjectDefinition::Flow(_) => ObjectType::Flow,
            ObjectDefinition::Job(_) => ObjectType::Job,
            ObjectDefinition::Custom(_) => ObjectType::Custom,
        }
    }

    pub fn as_data(&self) -> Option<&DataDefinition> {
        match self {
            ObjectDefinition::Data(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileDefinition> {
        match self {
            ObjectDefinition::File(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_storage(&self) -> Option<&StorageDefinition> {
        match self {
            ObjectDefinition::Storage(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn copy(status: CopyStatus) -> Copy {
        Copy {
            storage_key: "default".into(),
            storage_path: "data/table/x/snap-0/delta-0-xabc".into(),
            storage_format: "ARROW_FILE".into(),
            copy_timestamp: Utc::now(),
            copy_status: status,
        }
    }

    #[test]
    fn storage_item_picks_first_available_copy() {
        let item = StorageItem {
            incarnations: vec![Incarnation {
                incarnation_index: 0,
                incarnation_timestamp: Utc::now(),
                incarnation_status: IncarnationStatus::Available,
                copies: vec![copy(CopyStatus::Expunged), copy(CopyStatus::Available)],
            }],
        };
        assert!(item.first_available_copy().is_some());
    }

    #[test]
    fn expunged_incarnation_has_no_available_copy() {
        let item = StorageItem {
            incarnations: vec![Incarnation {
                incarnation_index: 0,
                incarnation_timestamp: Utc::now(),
                incarnation_status: IncarnationStatus::Expunged,
                copies: vec![copy(CopyStatus::Available)],
            }],
        };
        assert!(item.first_available_copy().is_none());
    }

    #[test]
    fn storage_definition_detects_no_available_copy() {
        let def = StorageDefinition::default();
        assert!(!def.has_any_available_copy());
    }
}
