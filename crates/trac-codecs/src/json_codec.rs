//! JSON-records codec: "array of objects; missing columns
//! → null; extra unknown columns → DATA_LOSS; unknown format yields
//! UNIMPLEMENTED."

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, BooleanArray, Date32Array, Float64Array, Int64Array, StringArray, TimestampMicrosecondArray};
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use serde_json::Value as Json;
use trac_models::{BasicType, SchemaDefinition};

use crate::error::{CodecError, CodecResult};
use crate::schema::to_arrow_schema;

/// Decodes one JSON array-of-objects document into a single [`RecordBatch`].
/// Large arrays are not chunked by this function; callers that need
/// incremental decoding should split the document at top-level array
/// element boundaries before calling this (the data service does so via
/// `trac-pipeline`'s byte-stream stage).
pub fn decode_records(trac_schema: &SchemaDefinition, bytes: &[u8]) -> CodecResult<RecordBatch> {
    let arrow_schema = to_arrow_schema(trac_schema);
    let parsed: Json = serde_json::from_slice(bytes)
        .map_err(|e| CodecError::DataLoss(format!("invalid JSON: {e}")))?;
    let records = match parsed {
        Json::Array(items) => items,
        other => vec![other],
    };

    for record in &records {
        if let Json::Object(map) = record {
            let unknown: Vec<String> = map
                .keys()
                .filter(|k| trac_schema.field(k).is_none())
                .cloned()
                .collect();
            if !unknown.is_empty() {
                return Err(CodecError::DataLoss(format!(
                    "unknown column(s) not in declared schema: {}",
                    unknown.join(", ")
                )));
            }
        } else {
            return Err(CodecError::DataLoss("expected a JSON object per record".to_string()));
        }
    }

    let mut columns: Vec<ArrayRef> = Vec::with_capacity(trac_schema.table.fields.len());
    for field in &trac_schema.table.fields {
        columns.push(build_column(field.field_type, &records, &field.field_name)?);
    }

    RecordBatch::try_new(arrow_schema, columns).map_err(CodecError::from)
}

fn build_column(basic_type: BasicType, records: &[Json], name: &str) -> CodecResult<ArrayRef> {
    let values: Vec<&Json> = records
        .iter()
        .map(|r| r.get(name).unwrap_or(&Json::Null))
        .collect();

    Ok(match basic_type {
        BasicType::Boolean => Arc::new(BooleanArray::from(
            values.iter().map(|v| v.as_bool()).collect::<Vec<_>>(),
        )),
        BasicType::Integer => Arc::new(Int64Array::from(
            values
                .iter()
                .map(|v| match v {
                    Json::Null => Ok(None),
                    Json::Number(n) => n
                        .as_i64()
                        .map(Some)
                        .ok_or_else(|| CodecError::DataLoss(format!("field '{name}' is not an integer"))),
                    _ => Err(CodecError::DataLoss(format!("field '{name}' is not an integer"))),
                })
                .collect::<CodecResult<Vec<_>>>()?,
        )),
        BasicType::Float => Arc::new(Float64Array::from(
            values
                .iter()
                .map(|v| match v {
                    Json::Null => Ok(None),
                    Json::Number(n) => n
                        .as_f64()
                        .map(Some)
                        .ok_or_else(|| CodecError::DataLoss(format!("field '{name}' is not a float"))),
                    _ => Err(CodecError::DataLoss(format!("field '{name}' is not a float"))),
                })
                .collect::<CodecResult<Vec<_>>>()?,
        )),
        BasicType::Decimal => Arc::new(StringArray::from(
            values
                .iter()
                .map(|v| match v {
                    Json::Null => Ok(None),
                    Json::String(s) => {
                        s.parse::<bigdecimal::BigDecimal>().map_err(|_| {
                            CodecError::DataLoss(format!("field '{name}' is not a valid decimal"))
                        })?;
                        Ok(Some(s.clone()))
                    }
                    Json::Number(n) => Ok(Some(n.to_string())),
                    _ => Err(CodecError::DataLoss(format!("field '{name}' is not a decimal"))),
                })
                .collect::<CodecResult<Vec<_>>>()?,
        )),
        BasicType::String => Arc::new(StringArray::from(
            values
                .iter()
                .map(|v| match v {
                    Json::Null => None,
                    Json::String(s) => Some(s.clone()),
                    other => Some(other.to_string()),
                })
                .collect::<Vec<_>>(),
        )),
        BasicType::Date => Arc::new(Date32Array::from(
            values
                .iter()
                .map(|v| match v {
                    Json::Null => Ok(None),
                    Json::String(s) => {
                        let d = NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
                            CodecError::DataLoss(format!("field '{name}' is not a valid date"))
                        })?;
                        Ok(Some((d - NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()).num_days() as i32))
                    }
                    _ => Err(CodecError::DataLoss(format!("field '{name}' is not a date"))),
                })
                .collect::<CodecResult<Vec<_>>>()?,
        )),
        BasicType::Datetime => Arc::new(
            TimestampMicrosecondArray::from(
                values
                    .iter()
                    .map(|v| match v {
                        Json::Null => Ok(None),
                        Json::String(s) => chrono::DateTime::parse_from_rfc3339(s)
                            .map(|dt| Some(dt.timestamp_micros()))
                            .map_err(|_| {
                                CodecError::DataLoss(format!("field '{name}' is not a valid datetime"))
                            }),
                        _ => Err(CodecError::DataLoss(format!("field '{name}' is not a datetime"))),
                    })
                    .collect::<CodecResult<Vec<_>>>()?,
            )
            .with_timezone("UTC"),
        ),
    })
}

/// Encodes a [`RecordBatch`] into a JSON array-of-objects document.
pub fn encode_records(trac_schema: &SchemaDefinition, batch: &RecordBatch) -> CodecResult<Vec<u8>> {
    let mut rows = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let mut obj = serde_json::Map::new();
        for (col_idx, field) in trac_schema.table.fields.iter().enumerate() {
            let array = batch.column(col_idx);
            obj.insert(field.field_name.clone(), cell_to_json(field.field_type, array, row));
        }
        rows.push(Json::Object(obj));
    }
    serde_json::to_vec(&Json::Array(rows)).map_err(|e| CodecError::DataLoss(e.to_string()))
}

fn cell_to_json(basic_type: BasicType, array: &ArrayRef, row: usize) -> Json {
    if array.is_null(row) {
        return Json::Null;
    }
    match basic_type {
        BasicType::Boolean => Json::Bool(array.as_any().downcast_ref::<BooleanArray>().unwrap().value(row)),
        BasicType::Integer => Json::Number(array.as_any().downcast_ref::<Int64Array>().unwrap().value(row).into()),
        BasicType::Float => serde_json::Number::from_f64(
            array.as_any().downcast_ref::<Float64Array>().unwrap().value(row),
        )
        .map(Json::Number)
        .unwrap_or(Json::Null),
        BasicType::Decimal | BasicType::String => {
            Json::String(array.as_any().downcast_ref::<StringArray>().unwrap().value(row).to_string())
        }
        BasicType::Date => {
            let days = array.as_any().downcast_ref::<Date32Array>().unwrap().value(row);
            let date = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap() + chrono::Duration::days(days as i64);
            Json::String(date.format("%Y-%m-%d").to_string())
        }
        BasicType::Datetime => {
            let micros = array
                .as_any()
                .downcast_ref::<TimestampMicrosecondArray>()
                .unwrap()
                .value(row);
            let dt = chrono::DateTime::<chrono::Utc>::from_timestamp_micros(micros).unwrap_or_default();
            Json::String(dt.to_rfc3339_opts(chrono::SecondsFormat::Micros, true))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trac_models::{FieldSchema, SchemaType, TableSchema};

    fn schema() -> SchemaDefinition {
        SchemaDefinition {
            schema_type: SchemaType::Table,
            table: TableSchema {
                fields: vec![
                    FieldSchema { field_name: "a".into(), field_order: 0, field_type: BasicType::Integer, business_key: false, categorical: false, nullable: true, label: None, format_code: None },
                ],
            },
        }
    }

    #[test]
    fn missing_column_becomes_null() {
        let batch = decode_records(&schema(), br#"[{}]"#).unwrap();
        let col: &Int64Array = batch.column(0).as_any().downcast_ref().unwrap();
        assert!(col.is_null(0));
    }

    #[test]
    fn unknown_column_is_data_loss() {
        let err = decode_records(&schema(), br#"[{"a": 1, "b": 2}]"#);
        assert!(matches!(err.unwrap_err(), CodecError::DataLoss(_)));
    }

    #[test]
    fn encode_decode_round_trips() {
        let batch = decode_records(&schema(), br#"[{"a": 7}]"#).unwrap();
        let encoded = encode_records(&schema(), &batch).unwrap();
        let decoded = decode_records(&schema(), &encoded).unwrap();
        let col: &Int64Array = decoded.column(0).as_any().downcast_ref().unwrap();
        assert_eq!(col.value(0), 7);
    }
}
