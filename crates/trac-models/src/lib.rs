//! Canonical in-memory representation of TRAC's metadata objects: tags,
//! selectors, typed values, and the path-naming scheme that ties a DATA/FILE
//! version to its physical bytes.
//!
//! This crate has no I/O; it is shared between the DAL, the storage
//! abstraction, the data service, and the gateway so that every layer speaks
//! the same Rust types for the platform's wire model.

pub mod error;
pub mod id;
pub mod object;
pub mod path;
pub mod schema;
pub mod selector;
pub mod tag;
pub mod validate;
pub mod value;

pub use error::{Error, Result};
pub use id::{new_object_id, ObjectType, TagHeader};
pub use object::{
    Copy, CopyStatus, DataDefinition, DeltaRef, FileDefinition, Incarnation, IncarnationStatus,
    ObjectDefinition, OpaquePayload, Part, SchemaSpec, Snap, StorageDefinition, StorageItem,
};
pub use schema::{FieldSchema, SchemaDefinition, SchemaType, TableSchema};
pub use selector::{ObjectCriteria, TagCriteria, TagSelector};
pub use tag::{Tag, TagOperation, TagUpdate};
pub use value::{decode_value, encode_date, encode_datetime, encode_value, BasicType, Native, Value};
