//! The create/update ingest pipeline: source is the gRPC frame stream,
//! stage 1 is the codec decoder for the client's chosen format, stage 2 is
//! the codec re-encoder into the canonical on-disk format, and the sink is
//! the object-store writer. The pipeline simultaneously computes the byte
//! count of the content actually received.

use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use futures::Stream;
use futures::StreamExt;
use trac_codecs::registry::FormatCode;
use trac_models::SchemaDefinition;
use trac_storage::ObjectWriter;

use crate::cancel::{self, CancellationToken};
use crate::codec_stage::{encode_canonical, StreamingDecoder};
use crate::error::{PipelineError, PipelineResult};

/// Result of a successful ingest run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Total bytes read from the content frames, before decoding. Compared
    /// against the client's declared size.
    pub bytes_received: u64,
    pub row_count: usize,
}

/// Consumes `frames` to completion, decoding each chunk with `source_format`
/// and re-encoding the accumulated batches into `canonical_format` before
/// writing them through `writer`. On any error the writer is aborted and the
/// error is returned exactly once ("any stage's `onError`
/// terminates the pipeline exactly once").
pub async fn run_ingest<S>(
    schema: &SchemaDefinition,
    source_format: FormatCode,
    canonical_format: FormatCode,
    mut frames: S,
    mut writer: Box<dyn ObjectWriter>,
    token: &CancellationToken,
) -> PipelineResult<IngestOutcome>
where
    S: Stream<Item = PipelineResult<Bytes>> + Unpin,
{
    match run_ingest_inner(schema, source_format, canonical_format, &mut frames, &mut writer, token).await {
        Ok(outcome) => {
            writer.commit().await?;
            Ok(outcome)
        }
        Err(err) => {
            // Best-effort: abort failure does not shadow the original error.
            let _ = writer.abort().await;
            Err(err)
        }
    }
}

async fn run_ingest_inner<S>(
    schema: &SchemaDefinition,
    source_format: FormatCode,
    canonical_format: FormatCode,
    frames: &mut S,
    _writer: &mut Box<dyn ObjectWriter>,
    token: &CancellationToken,
) -> PipelineResult<IngestOutcome>
where
    S: Stream<Item = PipelineResult<Bytes>> + Unpin,
{
    let mut decoder = StreamingDecoder::new(source_format, schema.clone());
    let mut batches: Vec<RecordBatch> = Vec::new();
    let mut bytes_received: u64 = 0;

    while let Some(frame) = frames.next().await {
        cancel::check(token)?;
        let chunk = frame?;
        bytes_received += chunk.len() as u64;
        batches.extend(decoder.push_chunk(&chunk)?);
    }
    cancel::check(token)?;
    batches.extend(decoder.finish()?);

    let row_count = batches.iter().map(|b| b.num_rows()).sum();
    let encoded = encode_canonical(canonical_format, schema, &batches)?;
    _writer.write_all(Bytes::from(encoded)).await?;

    Ok(IngestOutcome { bytes_received, row_count })
}

/// Streams `frames` straight to `writer` with no codec stage: no decode, no
/// re-encode, just a byte-counted passthrough. Used for FILE content, which
/// is opaque -- a codec stage has no schema to decode it against and would
/// reject it as soon as it failed to match whatever format it was told to
/// expect. Shares `run_ingest`'s commit/abort-on-error and cancellation
/// discipline.
pub async fn run_passthrough<S>(
    mut frames: S,
    mut writer: Box<dyn ObjectWriter>,
    token: &CancellationToken,
) -> PipelineResult<IngestOutcome>
where
    S: Stream<Item = PipelineResult<Bytes>> + Unpin,
{
    match run_passthrough_inner(&mut frames, &mut writer, token).await {
        Ok(outcome) => {
            writer.commit().await?;
            Ok(outcome)
        }
        Err(err) => {
            let _ = writer.abort().await;
            Err(err)
        }
    }
}

async fn run_passthrough_inner<S>(
    frames: &mut S,
    writer: &mut Box<dyn ObjectWriter>,
    token: &CancellationToken,
) -> PipelineResult<IngestOutcome>
where
    S: Stream<Item = PipelineResult<Bytes>> + Unpin,
{
    let mut bytes_received: u64 = 0;
    while let Some(frame) = frames.next().await {
        cancel::check(token)?;
        let chunk = frame?;
        bytes_received += chunk.len() as u64;
        writer.write_all(chunk).await?;
    }
    cancel::check(token)?;
    Ok(IngestOutcome { bytes_received, row_count: 0 })
}

/// Validates the client's declared size against what was actually received.
/// A mismatch is **DATA_LOSS** and the write must already have been
/// aborted by the caller.
pub fn check_declared_size(declared: Option<u64>, outcome: &IngestOutcome) -> PipelineResult<()> {
    if let Some(declared) = declared {
        if declared != outcome.bytes_received {
            return Err(PipelineError::DataLoss(format!(
                "declared size {declared} does not match received {received} bytes",
                received = outcome.bytes_received
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use trac_models::{BasicType, FieldSchema, SchemaType, TableSchema};

    #[derive(Default)]
    struct RecordingWriter {
        committed: Arc<Mutex<Option<Vec<u8>>>>,
        aborted: Arc<Mutex<bool>>,
        buf: Vec<u8>,
    }

    #[async_trait]
    impl ObjectWriter for RecordingWriter {
        async fn write_all(&mut self, chunk: Bytes) -> trac_storage::StorageResult<()> {
            self.buf.extend_from_slice(&chunk);
            Ok(())
        }

        async fn commit(self: Box<Self>) -> trac_storage::StorageResult<()> {
            *self.committed.lock().unwrap() = Some(self.buf);
            Ok(())
        }

        async fn abort(self: Box<Self>) -> trac_storage::StorageResult<()> {
            *self.aborted.lock().unwrap() = true;
            Ok(())
        }
    }

    fn schema() -> SchemaDefinition {
        SchemaDefinition {
            schema_type: SchemaType::Table,
            table: TableSchema {
                fields: vec![FieldSchema { field_name: "a".into(), field_order: 0, field_type: BasicType::Integer, business_key: false, categorical: false, nullable: true, label: None, format_code: None }],
            },
        }
    }

    #[tokio::test]
    async fn ingest_commits_and_counts_bytes() {
        let committed = Arc::new(Mutex::new(None));
        let aborted = Arc::new(Mutex::new(false));
        let writer = Box::new(RecordingWriter { committed: committed.clone(), aborted: aborted.clone(), buf: Vec::new() });

        let csv = b"a\n1\n2\n3\n".to_vec();
        let expected_len = csv.len() as u64;
        let frames = futures::stream::iter(vec![Ok(Bytes::from(csv))]);
        let token = CancellationToken::new();

        let outcome = run_ingest(&schema(), FormatCode::Csv, FormatCode::ArrowFile, frames, writer, &token)
            .await
            .unwrap();

        assert_eq!(outcome.bytes_received, expected_len);
        assert_eq!(outcome.row_count, 3);
        assert!(committed.lock().unwrap().is_some());
        assert!(!*aborted.lock().unwrap());
    }

    #[tokio::test]
    async fn ingest_aborts_on_decode_error() {
        let committed = Arc::new(Mutex::new(None));
        let aborted = Arc::new(Mutex::new(false));
        let writer = Box::new(RecordingWriter { committed: committed.clone(), aborted: aborted.clone(), buf: Vec::new() });

        let frames = futures::stream::iter(vec![Ok(Bytes::from_static(b"a\nnot_an_integer\n"))]);
        let token = CancellationToken::new();

        let result = run_ingest(&schema(), FormatCode::Csv, FormatCode::ArrowFile, frames, writer, &token).await;

        assert!(result.is_err());
        assert!(committed.lock().unwrap().is_none());
        assert!(*aborted.lock().unwrap());
    }

    #[tokio::test]
    async fn ingest_respects_cancellation() {
        let committed = Arc::new(Mutex::new(None));
        let aborted = Arc::new(Mutex::new(false));
        let writer = Box::new(RecordingWriter { committed: committed.clone(), aborted: aborted.clone(), buf: Vec::new() });

        let frames = futures::stream::iter(vec![Ok(Bytes::from_static(b"a\n1\n"))]);
        let token = CancellationToken::new();
        token.cancel();

        let result = run_ingest(&schema(), FormatCode::Csv, FormatCode::ArrowFile, frames, writer, &token).await;
        assert!(matches!(result, Err(PipelineError::Cancelled)));
        assert!(*aborted.lock().unwrap());
    }

    #[test]
    fn declared_size_mismatch_is_data_loss() {
        let outcome = IngestOutcome { bytes_received: 10, row_count: 1 };
        let err = check_declared_size(Some(11), &outcome);
        assert!(matches!(err, Err(PipelineError::DataLoss(_))));
    }

    #[tokio::test]
    async fn passthrough_writes_opaque_bytes_unchanged() {
        let committed = Arc::new(Mutex::new(None));
        let aborted = Arc::new(Mutex::new(false));
        let writer = Box::new(RecordingWriter { committed: committed.clone(), aborted: aborted.clone(), buf: Vec::new() });

        let content = b"hello trac\x00\x01\xffworld".to_vec();
        let frames = futures::stream::iter(vec![Ok(Bytes::from(content.clone()))]);
        let token = CancellationToken::new();

        let outcome = run_passthrough(frames, writer, &token).await.unwrap();

        assert_eq!(outcome.bytes_received, content.len() as u64);
        assert_eq!(committed.lock().unwrap().as_deref(), Some(content.as_slice()));
        assert!(!*aborted.lock().unwrap());
    }

    #[tokio::test]
    async fn passthrough_respects_cancellation() {
        let committed = Arc::new(Mutex::new(None));
        let aborted = Arc::new(Mutex::new(false));
        let writer = Box::new(RecordingWriter { committed: committed.clone(), aborted: aborted.clone(), buf: Vec::new() });

        let frames = futures::stream::iter(vec![Ok(Bytes::from_static(b"abc"))]);
        let token = CancellationToken::new();
        token.cancel();

        let result = run_passthrough(frames, writer, &token).await;
        assert!(matches!(result, Err(PipelineError::Cancelled)));
        assert!(*aborted.lock().unwrap());
    }
}
