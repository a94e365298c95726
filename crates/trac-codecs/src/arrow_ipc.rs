//! Arrow IPC stream and file codecs: "exact schema must
//! match; schema drift... fails with DATA_LOSS", and "the Arrow file seek
//! table is assembled at end-of-stream" — so the file codec must buffer the
//! whole payload, unlike the stream codec which can decode incrementally.

use std::io::Cursor;
use std::sync::Arc;

use arrow::datatypes::SchemaRef;
use arrow::ipc::reader::{FileReader, StreamReader};
use arrow::ipc::writer::{FileWriter, StreamWriter};
use arrow::record_batch::RecordBatch;
use trac_models::SchemaDefinition;

use crate::error::{CodecError, CodecResult};
use crate::schema::{assert_exact_schema_match, to_arrow_schema};

/// Encodes one [`RecordBatch`] per call into Arrow IPC *stream* framing; a
/// `StreamWriter` over an in-memory `Vec<u8>` is created fresh per call and
/// its bytes appended to the pipeline's outgoing byte-stream, since the
/// stream format has no separate "finish" requirement beyond an
/// end-of-stream marker the sink can append once at the very end via
/// [`finish_stream`].
pub fn encode_stream_batch(arrow_schema: &SchemaRef, batch: &RecordBatch) -> CodecResult<Vec<u8>> {
    let mut buf = Vec::new();
    {
        let mut writer = StreamWriter::try_new(&mut buf, arrow_schema)?;
        writer.write(batch)?;
        writer.finish()?;
    }
    Ok(buf)
}

/// Incremental Arrow-stream decoder: bytes accumulate until a complete
/// stream (including end-of-stream marker) is observed, then every batch in
/// it is returned. In practice each call to `encode_stream_batch` above
/// produces one complete, self-terminated stream, so `decode_stream` is
/// typically called once per upstream chunk.
pub fn decode_stream(trac_schema: &SchemaDefinition, bytes: &[u8]) -> CodecResult<Vec<RecordBatch>> {
    let expected = to_arrow_schema(trac_schema);
    let reader = StreamReader::try_new(Cursor::new(bytes), None)?;
    assert_exact_schema_match(&expected, reader.schema().as_ref())?;

    let mut batches = Vec::new();
    for batch in reader {
        batches.push(batch?);
    }
    Ok(batches)
}

/// Arrow *file* format requires the full payload before the footer/seek
/// table can be read, so this codec necessarily buffers.
pub fn encode_file(arrow_schema: &SchemaRef, batches: &[RecordBatch]) -> CodecResult<Vec<u8>> {
    let mut buf = Vec::new();
    {
        let mut writer = FileWriter::try_new(&mut buf, arrow_schema)?;
        for batch in batches {
            writer.write(batch)?;
        }
        writer.finish()?;
    }
    Ok(buf)
}

pub fn decode_file(trac_schema: &SchemaDefinition, bytes: &[u8]) -> CodecResult<Vec<RecordBatch>> {
    let expected = to_arrow_schema(trac_schema);
    let reader = FileReader::try_new(Cursor::new(bytes), None)?;
    assert_exact_schema_match(&expected, reader.schema().as_ref())?;

    let mut batches = Vec::new();
    for batch in reader {
        batches.push(batch?);
    }
    Ok(batches)
}

/// Accumulates chunks of an Arrow *file* payload until the stream closes,
/// since the format's seek table lives at the end.
#[derive(Default)]
pub struct ArrowFileAccumulator {
    buf: Vec<u8>,
}

impl ArrowFileAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_chunk(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    pub fn finish(self, trac_schema: &SchemaDefinition) -> CodecResult<Vec<RecordBatch>> {
        decode_file(trac_schema, &self.buf)
    }
}

pub fn arrow_schema_ref(trac_schema: &SchemaDefinition) -> Arc<arrow::datatypes::Schema> {
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
    fn stream_round_trips_one_batch() {
        let trac_schema = schema();
        let arrow_schema = to_arrow_schema(&trac_schema);
        let batch = RecordBatch::try_new(arrow_schema.clone(), vec![Arc::new(Int64Array::from(vec![1, 2, 3]))]).unwrap();
        let bytes = encode_stream_batch(&arrow_schema, &batch).unwrap();
        let decoded = decode_stream(&trac_schema, &bytes).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].num_rows(), 3);
    }

    #[test]
    fn file_round_trips_via_accumulator() {
        let trac_schema = schema();
        let arrow_schema = to_arrow_schema(&trac_schema);
        let batch = RecordBatch::try_new(arrow_schema.clone(), vec![Arc::new(Int64Array::from(vec![10, 20]))]).unwrap();
        let bytes = encode_file(&arrow_schema, &[batch]).unwrap();

        let mut acc = ArrowFileAccumulator::new();
        for chunk in bytes.chunks(3) {
            acc.push_chunk(chunk);
        }
        let decoded = acc.finish(&trac_schema).unwrap();
        assert_eq!(decoded[0].num_rows(), 2);
    }

    #[test]
    fn schema_drift_in_stream_is_data_loss() {
        let trac_schema = schema();
        let mut drifted_fields = trac_schema.table.fields.clone();
        drifted_fields[0].field_type = BasicType::String;
        let drifted = SchemaDefinition { schema_type: trac_schema.schema_type, table: TableSchema { fields: drifted_fields } };

        let arrow_schema = to_arrow_schema(&trac_schema);
        let batch = RecordBatch::try_new(arrow_schema.clone(), vec![Arc::new(Int64Array::from(vec![1]))]).unwrap();
        let bytes = encode_stream_batch(&arrow_schema, &batch).unwrap();

        let err = decode_stream(&drifted, &bytes);
        assert!(matches!(err.unwrap_err(), CodecError::DataLoss(_)));
    }
}
