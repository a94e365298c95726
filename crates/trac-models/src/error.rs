/// Error conditions produced by the metadata model layer.
///
/// These map 1:1 onto gRPC status kinds; the data service and gateway
/// crates each have their own thin mapping onto `tonic::Status` / HTTP
/// status so the mapping table lives in exactly one place per protocol, but
/// the *kinds* originate here.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("failed precondition: {0}")]
    FailedPrecondition(String),

    #[error("wrong type: expected {expected}, found {found}")]
    WrongType { expected: String, found: String },

    #[error("unimplemented: {0}")]
    Unimplemented(String),

    #[error("data loss: {0}")]
    DataLoss(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }
    pub fn already_exists(msg: impl Into<String>) -> Self {
        Error::AlreadyExists(msg.into())
    }
    pub fn failed_precondition(msg: impl Into<String>) -> Self {
        Error::FailedPrecondition(msg.into())
    }
    pub fn data_loss(msg: impl Into<String>) -> Self {
        Error::DataLoss(msg.into())
    }
    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }
}
