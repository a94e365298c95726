//! Parquet codec built on the `parquet` crate's Arrow integration. Like the
//! Arrow file format, Parquet's footer lives at the end of the payload, so
//! decode requires the whole buffer up front.

use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::arrow_writer::ArrowWriter;
use parquet::file::properties::WriterProperties;
use trac_models::SchemaDefinition;

use crate::error::CodecResult;
use crate::schema::{assert_exact_schema_match, to_arrow_schema};

pub fn encode(trac_schema: &SchemaDefinition, batches: &[RecordBatch]) -> CodecResult<Vec<u8>> {
    let arrow_schema = to_arrow_schema(trac_schema);
    let props = WriterProperties::builder().build();
    let mut buf = Vec::new();
    {
        let mut writer = ArrowWriter::try_new(&mut buf, arrow_schema, Some(props))?;
        for batch in batches {
            writer.write(batch)?;
        }
        writer.close()?;
    }
    Ok(buf)
}

pub fn decode(trac_schema: &SchemaDefinition, bytes: Vec<u8>) -> CodecResult<Vec<RecordBatch>> {
    let expected = to_arrow_schema(trac_schema);
    let reader_builder = ParquetRecordBatchReaderBuilder::try_new(bytes::Bytes::from(bytes))?;
    assert_exact_schema_match(&expected, reader_builder.schema().as_ref())?;

    let reader = reader_builder.build()?;
    let mut batches = Vec::new();
    for batch in reader {
        batches.push(batch?);
    }
    Ok(batches)
}

/// Parquet requires the complete byte payload before its footer can be
/// parsed, so chunks arriving over the wire are buffered here exactly as
/// `ArrowFileAccumulator` buffers Arrow file chunks.
#[derive(Default)]
pub struct ParquetAccumulator {
    buf: Vec<u8>,
}

impl ParquetAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_chunk(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    pub fn finish(self, trac_schema: &SchemaDefinition) -> CodecResult<Vec<RecordBatch>> {
        decode(trac_schema, self.buf)
    }
}

pub fn arrow_schema_for(trac_schema: &SchemaDefinition) -> Arc<arrow::datatypes::Schema> {
    to_arrow_schema(trac_schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Int64Array;
    use trac_models::{BasicType, FieldSchema, SchemaType, TableSchema};

    fn schema() -> SchemaDefinition {
        SchemaDefinition {
            schema_type: SchemaType::Table,
            table: TableSchema {
                fields: vec![FieldSchema { field_name: "a".into(), field_order: 0, field_type: BasicType::Integer, business_key: false, categorical: false, nullable: false, label: None, format_code: None }],
            },
        }
    }

    #[test]
    fn round_trips_via_accumulator() {
        let trac_schema = schema();
        let arrow_schema = to_arrow_schema(&trac_schema);
        let batch = RecordBatch::try_new(arrow_schema, vec![Arc::new(Int64Array::from(vec![1, 2, 3]))]).unwrap();
        let bytes = encode(&trac_schema, &[batch]).unwrap();

        let mut acc = ParquetAccumulator::new();
        for chunk in bytes.chunks(64) {
            acc.push_chunk(chunk);
        }
        let decoded = acc.finish(&trac_schema).unwrap();
        assert_eq!(decoded.iter().map(|b| b.num_rows()).sum::<usize>(), 3);
    }

    #[test]
    fn schema_drift_is_data_loss() {
        let trac_schema = schema();
        let arrow_schema = to_arrow_schema(&trac_schema);
        let batch = RecordBatch::try_new(arrow_schema, vec![Arc::new(Int64Array::from(vec![1]))]).unwrap();
        let bytes = encode(&trac_schema, &[batch]).unwrap();

        let mut drifted_fields = trac_schema.table.fields.clone();
        drifted_fields[0].field_type = BasicType::String;
        let drifted = SchemaDefinition { schema_type: trac_schema.schema_type, table: TableSchema { fields: drifted_fields } };

        assert!(decode(&drifted, bytes).is_err());
    }
}
