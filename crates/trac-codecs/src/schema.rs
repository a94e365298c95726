use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use trac_models::{BasicType, SchemaDefinition};

use crate::error::{CodecError, CodecResult};

/// Maps one TRAC [`BasicType`] onto its canonical Arrow representation.
/// DECIMAL is carried as UTF-8 text (arbitrary precision, per )
/// rather than Arrow's fixed-scale `Decimal128`, so scale differences never
/// cause a spurious schema-drift failure on read-back ("decimals
/// compared by numeric value not scale").
pub fn basic_type_to_arrow(basic_type: BasicType) -> DataType {
    match basic_type {
        BasicType::Boolean => DataType::Boolean,
        BasicType::Integer => DataType::Int64,
        BasicType::Float => DataType::Float64,
        BasicType::Decimal => DataType::Utf8,
        BasicType::String => DataType::Utf8,
        BasicType::Date => DataType::Date32,
        BasicType::Datetime => DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into())),
    }
}

/// Converts a declared TRAC schema into an Arrow [`SchemaRef`], in field
/// order.
pub fn to_arrow_schema(schema: &SchemaDefinition) -> SchemaRef {
    let fields: Vec<Field> = schema
        .table
        .fields
        .iter()
        .map(|f| Field::new(&f.field_name, basic_type_to_arrow(f.field_type), f.nullable))
        .collect();
    Arc::new(Schema::new(fields))
}

/// Validates that `candidate` exactly matches `expected` in field name,
/// order, and logical type. Arrow stream and Arrow file formats require an
/// exact schema match; any drift fails with DATA_LOSS.
pub fn assert_exact_schema_match(expected: &Schema, candidate: &Schema) -> CodecResult<()> {
    if expected.fields().len() != candidate.fields().len() {
        return Err(CodecError::DataLoss(format!(
            "schema field count mismatch: expected {}, found {}",
            expected.fields().len(),
            candidate.fields().len()
        )));
    }
    for (expected_field, candidate_field) in expected.fields().iter().zip(candidate.fields().iter())
    {
        if expected_field.name() != candidate_field.name() {
            return Err(CodecError::DataLoss(format!(
                "schema field name mismatch: expected '{}', found '{}'",
                expected_field.name(),
                candidate_field.name()
            )));
        }
        if expected_field.data_type() != candidate_field.data_type() {
            return Err(CodecError::DataLoss(format!(
                "schema field '{}' type mismatch: expected {:?}, found {:?}",
                expected_field.name(),
                expected_field.data_type(),
                candidate_field.data_type()
            )));
        }
    }
    Ok(())
}

/// Validates that `candidate` is a schema-compatible *subset or exact match*
/// of fields present in `expected`, used by the JSON/CSV decoders where
/// extra unknown columns are a DATA_LOSS error but missing columns become
/// nulls.
pub fn reject_unknown_columns(expected: &Schema, candidate_names: &[String]) -> CodecResult<()> {
    for name in candidate_names {
        if expected.field_with_name(name).is_err() {
            return Err(CodecError::DataLoss(format!(
                "unknown column '{name}' is not part of the declared schema"
            )));
        }
    }
    Ok(())
}

pub fn require_field<'a>(schema: &'a Schema, name: &str) -> CodecResult<&'a Field> {
    schema
        .field_with_name(name)
        .map_err(|_| CodecError::InvalidArgument(format!("no such field '{name}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use trac_models::{FieldSchema, SchemaType, TableSchema};

    fn schema() -> SchemaDefinition {
        SchemaDefinition {
            schema_type: SchemaType::Table,
            table: TableSchema {
                fields: vec![FieldSchema {
                    field_name: "integer_field".into(),
                    field_order: 0,
                    field_type: BasicType::Integer,
                    business_key: false,
                    categorical: false,
                    nullable: false,
                    label: None,
                    format_code: None,
                }],
            },
        }
    }

    #[test]
    fn integer_field_maps_to_int64() {
        let arrow_schema = to_arrow_schema(&schema());
        assert_eq!(arrow_schema.field(0).data_type(), &DataType::Int64);
    }

    #[test]
    fn exact_match_detects_type_drift() {
        let expected = to_arrow_schema(&schema());
        let drifted = Schema::new(vec![Field::new("integer_field", DataType::Utf8, false)]);
        assert!(assert_exact_schema_match(&expected, &drifted).is_err());
    }

    #[test]
    fn unknown_column_is_rejected() {
        let expected = to_arrow_schema(&schema());
        let err = reject_unknown_columns(&expected, &["mystery".to_string()]);
        assert!(err.is_err());
    }
}
