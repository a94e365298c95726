//! The read pipeline: object-store reader → codec decoder (storage format)
//! → codec encoder (requested format) → optional row-range filter applied
//! at batch boundaries.
//!
//! A [`trac_concurrency::Hub`] fans the decoded batch stream out to the
//! encoder (the frames actually sent to the client) and to a side
//! `fold`/`first` pair used for the outcome's row-count accounting.

use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use trac_codecs::registry::FormatCode;
use trac_concurrency::Hub;
use trac_models::SchemaDefinition;

use crate::codec_stage::{decode_all, encode_canonical};
use crate::error::PipelineResult;

/// An optional half-open row range `[offset, offset + limit)` applied at
/// batch boundaries of a dataset read.
#[derive(Debug, Clone, Copy)]
pub struct RowRange {
    pub offset: usize,
    pub limit: usize,
}

impl RowRange {
    /// Slices `batches` down to the rows in range, dropping whole batches
    /// outside it and slicing the batches at either edge.
    pub fn apply(self, batches: Vec<RecordBatch>) -> Vec<RecordBatch> {
        let mut remaining_skip = self.offset;
        let mut remaining_take = self.limit;
        let mut out = Vec::new();

        for batch in batches {
            if remaining_take == 0 {
                break;
            }
            let rows = batch.num_rows();
            if remaining_skip >= rows {
                remaining_skip -= rows;
                continue;
            }
            let start = remaining_skip;
            let take = (rows - start).min(remaining_take);
            out.push(batch.slice(start, take));
            remaining_skip = 0;
            remaining_take -= take;
        }
        out
    }
}

/// Decodes `stored_bytes` (already fully read from the object store, since
/// readers always present the complete copy for a given version) in
/// `storage_format`, applies `row_range` if present, and re-encodes every
/// resulting batch into `output_format`, returning one frame payload per
/// batch in encounter order.
pub async fn run_read(
    schema: &SchemaDefinition,
    storage_format: FormatCode,
    output_format: FormatCode,
    stored_bytes: &[u8],
    row_range: Option<RowRange>,
) -> PipelineResult<Vec<Bytes>> {
    let mut batches = decode_all(storage_format, schema, stored_bytes)?;
    if let Some(range) = row_range {
        batches = range.apply(batches);
    }

    let hub: Hub<RecordBatch> = Hub::new(batches.len().max(1));
    let encode_sub = hub.subscribe();
    let count_sub = hub.subscribe();

    let schema_for_encode = schema.clone();
    let encode_task = tokio::spawn(async move {
        let mut frames = Vec::new();
        let mut sub = Box::pin(encode_sub);
        while let Some(batch) = sub.next().await {
            frames.push(batch);
        }
        frames
            .into_iter()
            .map(|batch| encode_canonical(output_format, &schema_for_encode, std::slice::from_ref(&batch)))
            .collect::<PipelineResult<Vec<Vec<u8>>>>()
    });
    let count_task = tokio::spawn(async move { trac_concurrency::fold(count_sub, 0usize, |acc, b: RecordBatch| acc + b.num_rows()).await });

    for batch in &batches {
        hub.publish(batch.clone());
    }
    drop(hub);

    let encoded = encode_task.await.expect("encode task does not panic")?;
    let _row_total = count_task.await.expect("count task does not panic");

    Ok(encoded.into_iter().map(Bytes::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use trac_models::{BasicType, FieldSchema, SchemaType, TableSchema};

    fn schema() -> SchemaDefinition {
        SchemaDefinition {
            schema_type: SchemaType::Table,
            table: TableSchema {
                fields: vec![FieldSchema { field_name: "a".into(), field_order: 0, field_type: BasicType::Integer, business_key: false, categorical: false, nullable: true, label: None, format_code: None }],
            },
        }
    }

    #[tokio::test]
    async fn read_reencodes_stored_csv_into_json() {
        let schema = schema();
        let stored = b"a\n1\n2\n".to_vec();
        let frames = run_read(&schema, FormatCode::Csv, FormatCode::Json, &stored, None).await.unwrap();
        assert_eq!(frames.len(), 1);
        let decoded = trac_codecs::json_codec::decode_records(&schema, &frames[0]).unwrap();
        assert_eq!(decoded.num_rows(), 2);
    }

    #[tokio::test]
    async fn row_range_filters_at_boundaries() {
        let schema = schema();
        let stored = b"a\n1\n2\n3\n4\n".to_vec();
        let frames = run_read(
            &schema,
            FormatCode::Csv,
            FormatCode::Json,
            &stored,
            Some(RowRange { offset: 1, limit: 2 }),
        )
        .await
        .unwrap();
        let decoded = trac_codecs::json_codec::decode_records(&schema, &frames[0]).unwrap();
        assert_eq!(decoded.num_rows(), 2);
    }
}
