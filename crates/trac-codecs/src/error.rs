/// Codec failures: a schema or format mismatch is always `DataLoss`, an
/// unknown mime type or format variant is `Unimplemented`.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("data loss: {0}")]
    DataLoss(String),

    #[error("unimplemented: {0}")]
    Unimplemented(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}

pub type CodecResult<T> = std::result::Result<T, CodecError>;
