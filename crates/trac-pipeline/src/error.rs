/// Pipeline failures: "any stage's `onError` terminates
/// the pipeline exactly once." A [`PipelineError`] is produced at most once
/// per pipeline run and always triggers the sink's abort path.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("cancelled")]
    Cancelled,

    #[error("data loss: {0}")]
    DataLoss(String),

    #[error(transparent)]
    Storage(#[from] trac_storage::StorageError),

    #[error(transparent)]
    Codec(#[from] trac_codecs::CodecError),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
