/// DAL-layer failures, per 's failure model: "only 'not found',
/// 'already exists', 'invalid argument', 'failed precondition', 'wrong
/// type', and 'internal' (unexpected) are surfaced."
#[derive(Debug, thiserror::Error)]
pub enum DalError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("failed precondition: {0}")]
    FailedPrecondition(String),

    #[error("wrong type: expected {expected}, found {found}")]
    WrongType { expected: String, found: String },

    #[error("backend unavailable after retries: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type DalResult<T> = std::result::Result<T, DalError>;

impl From<trac_models::Error> for DalError {
    fn from(e: trac_models::Error) -> Self {
        match e {
            trac_models::Error::InvalidArgument(m) => DalError::InvalidArgument(m),
            trac_models::Error::NotFound(m) => DalError::NotFound(m),
            trac_models::Error::AlreadyExists(m) => DalError::AlreadyExists(m),
            trac_models::Error::FailedPrecondition(m) => DalError::FailedPrecondition(m),
            trac_models::Error::WrongType { expected, found } => {
                DalError::WrongType { expected, found }
            }
            trac_models::Error::Unimplemented(m) => DalError::Internal(m),
            trac_models::Error::DataLoss(m) => DalError::Internal(m),
            trac_models::Error::Internal(m) => DalError::Internal(m),
        }
    }
}

impl From<sqlx::Error> for DalError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => DalError::NotFound("no matching row".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DalError::AlreadyExists(db_err.message().to_string())
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => {
                DalError::Unavailable(e.to_string())
            }
            _ => DalError::Internal(e.to_string()),
        }
    }
}
