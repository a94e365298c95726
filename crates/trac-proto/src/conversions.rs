//! Conversions between generated protobuf messages and `trac-models` types.
//! Wire → model conversions are fallible (`TryFrom`); model → wire
//! conversions are infallible (`From`), since every in-process value is
//! already well-formed.

use std::collections::BTreeMap;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};

use trac_models as m;

use crate::metadata as p;

/// Failures converting a wire message into its in-process counterpart. Every
/// variant maps onto an `INVALID_ARGUMENT` at the service boundary.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    #[error("invalid enum value {value} for field '{field}'")]
    InvalidEnum { field: &'static str, value: i32 },

    #[error(transparent)]
    Model(#[from] m::Error),
}

pub type ConversionResult<T> = std::result::Result<T, ConversionError>;

// ---------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------

pub fn timestamp_to_chrono(ts: prost_types::Timestamp) -> ConversionResult<DateTime<Utc>> {
    DateTime::from_timestamp(ts.seconds, ts.nanos as u32)
        .ok_or(ConversionError::MissingField("timestamp"))
}

pub fn chrono_to_timestamp(dt: DateTime<Utc>) -> prost_types::Timestamp {
    prost_types::Timestamp { seconds: dt.timestamp(), nanos: dt.timestamp_subsec_nanos() as i32 }
}

// ---------------------------------------------------------------------
// ObjectType / BasicType
// ---------------------------------------------------------------------

impl TryFrom<i32> for ObjectTypeWire {
    type Error = ConversionError;

    fn try_from(value: i32) -> ConversionResult<Self> {
        let object_type = match p::ObjectType::try_from(value)
            .map_err(|_| ConversionError::InvalidEnum { field: "object_type", value })?
        {
            p::ObjectType::Data => m::ObjectType::Data,
            p::ObjectType::File => m::ObjectType::File,
            p::ObjectType::Storage => m::ObjectType::Storage,
            p::ObjectType::Schema => m::ObjectType::Schema,
            p::ObjectType::Model => m::ObjectType::Model,
            p::ObjectType::Flow => m::ObjectType::Flow,
            p::ObjectType::Job => m::ObjectType::Job,
            p::ObjectType::Custom => m::ObjectType::Custom,
            p::ObjectType::Unknown => {
                return Err(ConversionError::InvalidEnum { field: "object_type", value })
            }
        };
        Ok(ObjectTypeWire(object_type))
    }
}

/// Newtype wrapper so the blanket `TryFrom<i32>` above does not collide with
/// any future `TryFrom<i32>` impl on `trac_models::ObjectType` itself.
pub struct ObjectTypeWire(pub m::ObjectType);

pub fn object_type_to_wire(object_type: m::ObjectType) -> i32 {
    let wire = match object_type {
        m::ObjectType::Data => p::ObjectType::Data,
        m::ObjectType::File => p::ObjectType::File,
        m::ObjectType::Storage => p::ObjectType::Storage,
        m::ObjectType::Schema => p::ObjectType::Schema,
        m::ObjectType::Model => p::ObjectType::Model,
        m::ObjectType::Flow => p::ObjectType::Flow,
        m::ObjectType::Job => p::ObjectType::Job,
        m::ObjectType::Custom => p::ObjectType::Custom,
    };
    wire as i32
}

pub fn basic_type_from_wire(value: i32) -> ConversionResult<m::BasicType> {
    Ok(match p::BasicType::try_from(value)
        .map_err(|_| ConversionError::InvalidEnum { field: "basic_type", value })?
    {
        p::BasicType::Boolean => m::BasicType::Boolean,
        p::BasicType::Integer => m::BasicType::Integer,
        p::BasicType::Float => m::BasicType::Float,
        p::BasicType::Decimal => m::BasicType::Decimal,
        p::BasicType::String => m::BasicType::String,
        p::BasicType::Date => m::BasicType::Date,
        p::BasicType::Datetime => m::BasicType::Datetime,
        p::BasicType::Unknown => {
            return Err(ConversionError::InvalidEnum { field: "basic_type", value })
        }
    })
}

pub fn basic_type_to_wire(basic_type: m::BasicType) -> i32 {
    (match basic_type {
        m::BasicType::Boolean => p::BasicType::Boolean,
        m::BasicType::Integer => p::BasicType::Integer,
        m::BasicType::Float => p::BasicType::Float,
        m::BasicType::Decimal => p::BasicType::Decimal,
        m::BasicType::String => p::BasicType::String,
        m::BasicType::Date => p::BasicType::Date,
        m::BasicType::Datetime => p::BasicType::Datetime,
    }) as i32
}

// ---------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------

pub fn value_from_wire(value: p::Value) -> ConversionResult<m::Value> {
    use p::value::Native;
    Ok(match value.native {
        None | Some(Native::NullValue(_)) => m::Value::Null,
        Some(Native::BooleanValue(b)) => m::Value::Boolean(b),
        Some(Native::IntegerValue(i)) => m::Value::Integer(i),
        Some(Native::FloatValue(f)) => m::Value::Float(f),
        Some(Native::DecimalValue(s)) => m::Value::Decimal(s),
        Some(Native::StringValue(s)) => m::Value::String(s),
        Some(Native::DateValue(s)) => {
            let date = NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .map_err(|_| ConversionError::InvalidEnum { field: "date_value", value: 0 })?;
            m::Value::Date(date)
        }
        Some(Native::DatetimeValue(ts)) => m::Value::Datetime(timestamp_to_chrono(ts)?),
        Some(Native::ArrayValue(arr)) => {
            let items = arr
                .items
                .into_iter()
                .map(value_from_wire)
                .collect::<ConversionResult<Vec<_>>>()?;
            m::Value::Array(items)
        }
    })
}

pub fn value_to_wire(value: &m::Value) -> p::Value {
    use p::value::Native;
    let basic_type = value.basic_type().map(basic_type_to_wire).unwrap_or(0);
    let native = match value {
        m::Value::Boolean(b) => Some(Native::BooleanValue(*b)),
        m::Value::Integer(i) => Some(Native::IntegerValue(*i)),
        m::Value::Float(f) => Some(Native::FloatValue(*f)),
        m::Value::Decimal(s) => Some(Native::DecimalValue(s.clone())),
        m::Value::String(s) => Some(Native::StringValue(s.clone())),
        m::Value::Date(d) => Some(Native::DateValue(d.format("%Y-%m-%d").to_string())),
        m::Value::Datetime(dt) => Some(Native::DatetimeValue(chrono_to_timestamp(*dt))),
        m::Value::Array(items) => Some(Native::ArrayValue(p::ValueArray {
            items: items.iter().map(value_to_wire).collect(),
        })),
        m::Value::Null => Some(Native::NullValue(true)),
    };
    p::Value { basic_type, native }
}

/// Parses a decimal literal the same way `trac_models::decode_value` would,
/// used by service code validating wire `Value`s before they reach the DAL.
pub fn validate_decimal_literal(s: &str) -> ConversionResult<()> {
    BigDecimal::from_str(s)
        .map(|_| ())
        .map_err(|e| ConversionError::Model(m::Error::data_loss(format!("invalid decimal literal '{s}': {e}"))))
}

// ---------------------------------------------------------------------
// TagHeader
// ---------------------------------------------------------------------

pub fn tag_header_from_wire(header: p::TagHeader) -> ConversionResult<m::TagHeader> {
    Ok(m::TagHeader {
        object_type: ObjectTypeWire::try_from(header.object_type)?.0,
        object_id: m::id::parse_object_id(&header.object_id)?,
        object_version: header.object_version,
        tag_version: header.tag_version,
        object_timestamp: timestamp_to_chrono(
            header.object_timestamp.ok_or(ConversionError::MissingField("object_timestamp"))?,
        )?,
        tag_timestamp: timestamp_to_chrono(
            header.tag_timestamp.ok_or(ConversionError::MissingField("tag_timestamp"))?,
        )?,
    })
}

pub fn tag_header_to_wire(header: &m::TagHeader) -> p::TagHeader {
    p::TagHeader {
        object_type: object_type_to_wire(header.object_type),
        object_id: header.object_id.clone(),
        object_version: header.object_version,
        tag_version: header.tag_version,
        object_timestamp: Some(chrono_to_timestamp(header.object_timestamp)),
        tag_timestamp: Some(chrono_to_timestamp(header.tag_timestamp)),
    }
}

// ---------------------------------------------------------------------
// Selectors
// ---------------------------------------------------------------------

pub fn tag_selector_from_wire(selector: p::TagSelector) -> ConversionResult<m::TagSelector> {
    use p::object_criteria::Criteria as OC;
    use p::tag_criteria::Criteria as TC;

    let object_criteria = match selector.object_criteria.and_then(|c| c.criteria) {
        Some(OC::LatestObject(_)) => m::ObjectCriteria::LatestObject,
        Some(OC::ObjectVersion(v)) => m::ObjectCriteria::Version(v),
        Some(OC::ObjectAsOf(ts)) => m::ObjectCriteria::AsOf(timestamp_to_chrono(ts)?),
        None => return Err(ConversionError::MissingField("object_criteria")),
    };
    let tag_criteria = match selector.tag_criteria.and_then(|c| c.criteria) {
        Some(TC::LatestTag(_)) => m::TagCriteria::LatestTag,
        Some(TC::TagVersion(v)) => m::TagCriteria::Version(v),
        Some(TC::TagAsOf(ts)) => m::TagCriteria::AsOf(timestamp_to_chrono(ts)?),
        None => return Err(ConversionError::MissingField("tag_criteria")),
    };

    Ok(m::TagSelector {
        object_type: ObjectTypeWire::try_from(selector.object_type)?.0,
        object_id: m::id::parse_object_id(&selector.object_id)?,
        object_criteria,
        tag_criteria,
    })
}

pub fn tag_selector_to_wire(selector: &m::TagSelector) -> p::TagSelector {
    use p::object_criteria::Criteria as OC;
    use p::tag_criteria::Criteria as TC;

    let object_criteria = match selector.object_criteria {
        m::ObjectCriteria::LatestObject => OC::LatestObject(true),
        m::ObjectCriteria::Version(v) => OC::ObjectVersion(v),
        m::ObjectCriteria::AsOf(ts) => OC::ObjectAsOf(chrono_to_timestamp(ts)),
    };
    let tag_criteria = match selector.tag_criteria {
        m::TagCriteria::LatestTag => TC::LatestTag(true),
        m::TagCriteria::Version(v) => TC::TagVersion(v),
        m::TagCriteria::AsOf(ts) => TC::TagAsOf(chrono_to_timestamp(ts)),
    };

    p::TagSelector {
        object_type: object_type_to_wire(selector.object_type),
        object_id: selector.object_id.clone(),
        object_criteria: Some(p::ObjectCriteria { criteria: Some(object_criteria) }),
        tag_criteria: Some(p::TagCriteria { criteria: Some(tag_criteria) }),
    }
}

// ---------------------------------------------------------------------
// Tag updates
// ---------------------------------------------------------------------

pub fn tag_update_from_wire(update: p::TagUpdate) -> ConversionResult<m::TagUpdate> {
    let operation = match p::TagOperation::try_from(update.operation)
        .map_err(|_| ConversionError::InvalidEnum { field: "operation", value: update.operation })?
    {
        p::TagOperation::CreateAttr => m::TagOperation::CreateAttr,
        p::TagOperation::ReplaceAttr => m::TagOperation::ReplaceAttr,
        p::TagOperation::AppendAttr => m::TagOperation::AppendAttr,
        p::TagOperation::DeleteAttr => m::TagOperation::DeleteAttr,
        p::TagOperation::ClearAllAttr => m::TagOperation::ClearAllAttr,
        p::TagOperation::Unknown => {
            return Err(ConversionError::InvalidEnum { field: "operation", value: update.operation })
        }
    };
    Ok(m::TagUpdate {
        attr_name: update.attr_name,
        operation,
        value: update.value.map(value_from_wire).transpose()?,
    })
}

pub fn tag_update_to_wire(update: &m::TagUpdate) -> p::TagUpdate {
    let operation = match update.operation {
        m::TagOperation::CreateAttr => p::TagOperation::CreateAttr,
        m::TagOperation::ReplaceAttr => p::TagOperation::ReplaceAttr,
        m::TagOperation::AppendAttr => p::TagOperation::AppendAttr,
        m::TagOperation::DeleteAttr => p::TagOperation::DeleteAttr,
        m::TagOperation::ClearAllAttr => p::TagOperation::ClearAllAttr,
    };
    p::TagUpdate {
        operation: operation as i32,
        attr_name: update.attr_name.clone(),
        value: update.value.as_ref().map(value_to_wire),
    }
}

// ---------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------

pub fn field_schema_from_wire(field: p::FieldSchema) -> ConversionResult<m::FieldSchema> {
    Ok(m::FieldSchema {
        field_name: field.field_name,
        field_order: field.field_order,
        field_type: basic_type_from_wire(field.field_type)?,
        business_key: field.business_key,
        categorical: field.categorical,
        nullable: !field.not_null,
        label: (!field.label.is_empty()).then_some(field.label),
        format_code: (!field.format_code.is_empty()).then_some(field.format_code),
    })
}

pub fn field_schema_to_wire(field: &m::FieldSchema) -> p::FieldSchema {
    p::FieldSchema {
        field_name: field.field_name.clone(),
        field_order: field.field_order,
        field_type: basic_type_to_wire(field.field_type),
        business_key: field.business_key,
        categorical: field.categorical,
        not_null: !field.nullable,
        label: field.label.clone().unwrap_or_default(),
        format_code: field.format_code.clone().unwrap_or_default(),
    }
}

pub fn schema_definition_from_wire(schema: p::SchemaDefinition) -> ConversionResult<m::SchemaDefinition> {
    let table = schema.table.ok_or(ConversionError::MissingField("table"))?;
    Ok(m::SchemaDefinition {
        schema_type: m::SchemaType::Table,
        table: m::TableSchema {
            fields: table
                .fields
                .into_iter()
                .map(field_schema_from_wire)
                .collect::<ConversionResult<Vec<_>>>()?,
        },
    })
}

pub fn schema_definition_to_wire(schema: &m::SchemaDefinition) -> p::SchemaDefinition {
    p::SchemaDefinition {
        schema_type: p::schema_definition::SchemaType::Table as i32,
        table: Some(p::TableSchema {
            fields: schema.table.fields.iter().map(field_schema_to_wire).collect(),
        }),
    }
}

pub fn schema_spec_from_wire(spec: p::SchemaSpec) -> ConversionResult<m::SchemaSpec> {
    use p::schema_spec::Spec;
    match spec.spec {
        Some(Spec::Embedded(schema)) => Ok(m::SchemaSpec::Embedded(schema_definition_from_wire(schema)?)),
        Some(Spec::External(selector)) => Ok(m::SchemaSpec::External(tag_selector_from_wire(selector)?)),
        None => Err(ConversionError::MissingField("schema_spec")),
    }
}

pub fn schema_spec_to_wire(spec: &m::SchemaSpec) -> p::SchemaSpec {
    use p::schema_spec::Spec;
    let inner = match spec {
        m::SchemaSpec::Embedded(schema) => Spec::Embedded(schema_definition_to_wire(schema)),
        m::SchemaSpec::External(selector) => Spec::External(tag_selector_to_wire(selector)),
    };
    p::SchemaSpec { spec: Some(inner) }
}

// ---------------------------------------------------------------------
// Data / File / Storage definitions
// ---------------------------------------------------------------------

pub fn delta_ref_from_wire(delta: p::DeltaRef) -> m::DeltaRef {
    m::DeltaRef { delta_index: delta.delta_index, data_item: delta.data_item }
}

pub fn delta_ref_to_wire(delta: &m::DeltaRef) -> p::DeltaRef {
    p::DeltaRef { delta_index: delta.delta_index, data_item: delta.data_item.clone() }
}

pub fn snap_from_wire(snap: p::Snap) -> m::Snap {
    m::Snap {
        snap_index: snap.snap_index,
        deltas: snap.deltas.into_iter().map(delta_ref_from_wire).collect(),
    }
}

pub fn snap_to_wire(snap: &m::Snap) -> p::Snap {
    p::Snap {
        snap_index: snap.snap_index,
        deltas: snap.deltas.iter().map(delta_ref_to_wire).collect(),
    }
}

pub fn part_from_wire(key: String, part: p::Part) -> ConversionResult<(String, m::Part)> {
    let snap = part.snap.ok_or(ConversionError::MissingField("snap"))?;
    Ok((key, m::Part { part_key: part.part_key, snap: snap_from_wire(snap) }))
}

pub fn part_to_wire(part: &m::Part) -> p::Part {
    p::Part { part_key: part.part_key.clone(), snap: Some(snap_to_wire(&part.snap)) }
}

pub fn data_definition_from_wire(data: p::DataDefinition) -> ConversionResult<m::DataDefinition> {
    let schema = data.schema.ok_or(ConversionError::MissingField("schema"))?;
    let storage_id = data.storage_id.ok_or(ConversionError::MissingField("storage_id"))?;
    let parts = data
        .parts
        .into_iter()
        .map(|(k, v)| part_from_wire(k, v))
        .collect::<ConversionResult<BTreeMap<_, _>>>()?;
    Ok(m::DataDefinition {
        schema: schema_spec_from_wire(schema)?,
        storage_id: tag_selector_from_wire(storage_id)?,
        parts,
    })
}

pub fn data_definition_to_wire(data: &m::DataDefinition) -> p::DataDefinition {
    p::DataDefinition {
        schema: Some(schema_spec_to_wire(&data.schema)),
        storage_id: Some(tag_selector_to_wire(&data.storage_id)),
        parts: data.parts.iter().map(|(k, v)| (k.clone(), part_to_wire(v))).collect(),
    }
}

pub fn file_definition_from_wire(file: p::FileDefinition) -> ConversionResult<m::FileDefinition> {
    let storage_id = file.storage_id.ok_or(ConversionError::MissingField("storage_id"))?;
    Ok(m::FileDefinition {
        name: file.name,
        extension: file.extension,
        mime_type: file.mime_type,
        size: file.size,
        storage_id: tag_selector_from_wire(storage_id)?,
        data_item: file.data_item,
    })
}

pub fn file_definition_to_wire(file: &m::FileDefinition) -> p::FileDefinition {
    p::FileDefinition {
        name: file.name.clone(),
        extension: file.extension.clone(),
        mime_type: file.mime_type.clone(),
        size: file.size,
        storage_id: Some(tag_selector_to_wire(&file.storage_id)),
        data_item: file.data_item.clone(),
    }
}

pub fn copy_status_from_wire(value: i32) -> ConversionResult<m::CopyStatus> {
    Ok(match p::CopyStatus::try_from(value)
        .map_err(|_| ConversionError::InvalidEnum { field: "copy_status", value })?
    {
        p::CopyStatus::Available => m::CopyStatus::Available,
        p::CopyStatus::Expunged => m::CopyStatus::Expunged,
        p::CopyStatus::Unknown => {
            return Err(ConversionError::InvalidEnum { field: "copy_status", value })
        }
    })
}

pub fn copy_status_to_wire(status: m::CopyStatus) -> i32 {
    (match status {
        m::CopyStatus::Available => p::CopyStatus::Available,
        m::CopyStatus::Expunged => p::CopyStatus::Expunged,
    }) as i32
}

pub fn incarnation_status_from_wire(value: i32) -> ConversionResult<m::IncarnationStatus> {
    Ok(match p::IncarnationStatus::try_from(value)
        .map_err(|_| ConversionError::InvalidEnum { field: "incarnation_status", value })?
    {
        p::IncarnationStatus::Available => m::IncarnationStatus::Available,
        p::IncarnationStatus::Expunged => m::IncarnationStatus::Expunged,
        p::IncarnationStatus::Unknown => {
            return Err(ConversionError::InvalidEnum { field: "incarnation_status", value })
        }
    })
}

pub fn incarnation_status_to_wire(status: m::IncarnationStatus) -> i32 {
    (match status {
        m::IncarnationStatus::Available => p::IncarnationStatus::Available,
        m::IncarnationStatus::Expunged => p::IncarnationStatus::Expunged,
    }) as i32
}

pub fn storage_copy_from_wire(copy: p::StorageCopy) -> ConversionResult<m::Copy> {
    Ok(m::Copy {
        storage_key: copy.storage_key,
        storage_path: copy.storage_path,
        storage_format: copy.storage_format,
        copy_timestamp: timestamp_to_chrono(copy.copy_timestamp.ok_or(ConversionError::MissingField("copy_timestamp"))?)?,
        copy_status: copy_status_from_wire(copy.copy_status)?,
    })
}

pub fn storage_copy_to_wire(copy: &m::Copy) -> p::StorageCopy {
    p::StorageCopy {
        storage_key: copy.storage_key.clone(),
        storage_path: copy.storage_path.clone(),
        storage_format: copy.storage_format.clone(),
        copy_status: copy_status_to_wire(copy.copy_status),
        copy_timestamp: Some(chrono_to_timestamp(copy.copy_timestamp)),
    }
}

pub fn incarnation_from_wire(inc: p::StorageIncarnation) -> ConversionResult<m::Incarnation> {
    Ok(m::Incarnation {
        incarnation_index: inc.incarnation_index,
        incarnation_timestamp: timestamp_to_chrono(
            inc.incarnation_timestamp.ok_or(ConversionError::MissingField("incarnation_timestamp"))?,
        )?,
        incarnation_status: incarnation_status_from_wire(inc.incarnation_status)?,
        copies: inc.copies.into_iter().map(storage_copy_from_wire).collect::<ConversionResult<Vec<_>>>()?,
    })
}

pub fn incarnation_to_wire(inc: &m::Incarnation) -> p::StorageIncarnation {
    p::StorageIncarnation {
        incarnation_index: inc.incarnation_index,
        copies: inc.copies.iter().map(storage_copy_to_wire).collect(),
        incarnation_status: incarnation_status_to_wire(inc.incarnation_status),
        incarnation_timestamp: Some(chrono_to_timestamp(inc.incarnation_timestamp)),
    }
}

pub fn storage_item_from_wire(item: p::StorageItem) -> ConversionResult<m::StorageItem> {
    Ok(m::StorageItem {
        incarnations: item
            .incarnations
            .into_iter()
            .map(incarnation_from_wire)
            .collect::<ConversionResult<Vec<_>>>()?,
    })
}

pub fn storage_item_to_wire(item: &m::StorageItem) -> p::StorageItem {
    p::StorageItem { incarnations: item.incarnations.iter().map(incarnation_to_wire).collect() }
}

pub fn storage_definition_from_wire(storage: p::StorageDefinition) -> ConversionResult<m::StorageDefinition> {
    let data_items = storage
        .data_items
        .into_iter()
        .map(|(k, v)| storage_item_from_wire(v).map(|item| (k, item)))
        .collect::<ConversionResult<BTreeMap<_, _>>>()?;
    Ok(m::StorageDefinition { data_items })
}

pub fn storage_definition_to_wire(storage: &m::StorageDefinition) -> p::StorageDefinition {
    p::StorageDefinition {
        data_items: storage.data_items.iter().map(|(k, v)| (k.clone(), storage_item_to_wire(v))).collect(),
    }
}

// ---------------------------------------------------------------------
// ObjectDefinition / Tag
// ---------------------------------------------------------------------

fn opaque_from_wire(payload: p::OpaquePayload) -> ConversionResult<m::OpaquePayload> {
    let value = serde_json::from_slice(&payload.json_payload)
        .map_err(|e| ConversionError::Model(m::Error::invalid_argument(format!("invalid JSON payload: {e}"))))?;
    Ok(m::OpaquePayload { payload: value })
}

fn opaque_to_wire(payload: &m::OpaquePayload) -> p::OpaquePayload {
    p::OpaquePayload {
        json_payload: serde_json::to_vec(&payload.payload).unwrap_or_default(),
    }
}

pub fn object_definition_from_wire(def: p::ObjectDefinition) -> ConversionResult<m::ObjectDefinition> {
    use p::object_definition::Definition;
    Ok(match def.definition.ok_or(ConversionError::MissingField("definition"))? {
        Definition::Data(data) => m::ObjectDefinition::Data(data_definition_from_wire(data)?),
        Definition::File(file) => m::ObjectDefinition::File(file_definition_from_wire(file)?),
        Definition::Storage(storage) => m::ObjectDefinition::Storage(storage_definition_from_wire(storage)?),
        Definition::Schema(schema) => m::ObjectDefinition::Schema(schema_definition_from_wire(schema)?),
        Definition::Model(payload) => m::ObjectDefinition::Model(opaque_from_wire(payload)?),
        Definition::Flow(payload) => m::ObjectDefinition::Flow(opaque_from_wire(payload)?),
        Definition::Job(payload) => m::ObjectDefinition::Job(opaque_from_wire(payload)?),
        Definition::Custom(payload) => m::ObjectDefinition::Custom(opaque_from_wire(payload)?),
    })
}

pub fn object_definition_to_wire(def: &m::ObjectDefinition) -> p::ObjectDefinition {
    use p::object_definition::Definition;
    let definition = match def {
        m::ObjectDefinition::Data(data) => Definition::Data(data_definition_to_wire(data)),
        m::ObjectDefinition::File(file) => Definition::File(file_definition_to_wire(file)),
        m::ObjectDefinition::Storage(storage) => Definition::Storage(storage_definition_to_wire(storage)),
        m::ObjectDefinition::Schema(schema) => Definition::Schema(schema_definition_to_wire(schema)),
        m::ObjectDefinition::Model(payload) => Definition::Model(opaque_to_wire(payload)),
        m::ObjectDefinition::Flow(payload) => Definition::Flow(opaque_to_wire(payload)),
        m::ObjectDefinition::Job(payload) => Definition::Job(opaque_to_wire(payload)),
        m::ObjectDefinition::Custom(payload) => Definition::Custom(opaque_to_wire(payload)),
    };
    p::ObjectDefinition { object_type: object_type_to_wire(def.object_type()), definition: Some(definition) }
}

pub fn tag_from_wire(tag: p::Tag) -> ConversionResult<m::Tag> {
    let header = tag.header.ok_or(ConversionError::MissingField("header"))?;
    let definition = tag.definition.ok_or(ConversionError::MissingField("definition"))?;
    let attrs = tag
        .attrs
        .into_iter()
        .map(|(k, v)| value_from_wire(v).map(|v| (k, v)))
        .collect::<ConversionResult<BTreeMap<_, _>>>()?;
    Ok(m::Tag {
        header: tag_header_from_wire(header)?,
        definition: object_definition_from_wire(definition)?,
        attrs,
    })
}

pub fn tag_to_wire(tag: &m::Tag) -> p::Tag {
    p::Tag {
        header: Some(tag_header_to_wire(&tag.header)),
        definition: Some(object_definition_to_wire(&tag.definition)),
        attrs: tag.attrs.iter().map(|(k, v)| (k.clone(), value_to_wire(v))).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn timestamp_round_trips_through_chrono() {
        let now = m::id::truncate_to_micros(Utc::now());
        let wire = chrono_to_timestamp(now);
        let back = timestamp_to_chrono(wire).unwrap();
        assert_eq!(back, now);
    }

    #[test]
    fn tag_header_round_trips() {
        let header = m::TagHeader::new_object(m::ObjectType::Data, Utc::now());
        let wire = tag_header_to_wire(&header);
        let back = tag_header_from_wire(wire).unwrap();
        assert_eq!(back, header);
    }

    #[test]
    fn selector_round_trips_latest() {
        let selector = m::TagSelector::latest(m::ObjectType::Storage, m::new_object_id());
        let wire = tag_selector_to_wire(&selector);
        let back = tag_selector_from_wire(wire).unwrap();
        assert_eq!(back, selector);
    }

    #[test]
    fn value_array_round_trips() {
        let value = m::Value::Array(vec![m::Value::Integer(1), m::Value::String("x".into())]);
        let wire = value_to_wire(&value);
        let back = value_from_wire(wire).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn unknown_object_type_is_rejected() {
        let err = ObjectTypeWire::try_from(0);
        assert!(err.is_err());
    }
}
