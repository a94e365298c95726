//! Streaming data pipeline: a byte-stream source is
//! bridged through a codec stage into the Arrow-columnar representation and
//! back out again, terminating at either an object-store sink (ingest) or a
//! frame stream back to the client (read).

pub mod cancel;
pub mod codec_stage;
pub mod error;
pub mod ingest;
pub mod read;

pub use cancel::CancellationToken;
pub use error::{PipelineError, PipelineResult};
pub use ingest::{check_declared_size, run_ingest, run_passthrough, IngestOutcome};
pub use read::{run_read, RowRange};
