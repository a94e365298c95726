//! One shared mapping from every lower-layer error type onto `tonic::Status`
//! ., so `trac-gateway`'s HTTP table and this mapping can never
//! drift: both start from the same kind, never from ad hoc backend text.

use tonic::Status;
use trac_metadata_dal::DalError;
use trac_pipeline::PipelineError;
use trac_proto::ConversionError;
use trac_storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("failed precondition: {0}")]
    FailedPrecondition(String),

    #[error("unimplemented: {0}")]
    Unimplemented(String),

    #[error("data loss: {0}")]
    DataLoss(String),

    #[error("unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

impl ServiceError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        ServiceError::InvalidArgument(msg.into())
    }

    pub fn failed_precondition(msg: impl Into<String>) -> Self {
        ServiceError::FailedPrecondition(msg.into())
    }
}

impl From<trac_models::Error> for ServiceError {
    fn from(e: trac_models::Error) -> Self {
        use trac_models::Error as E;
        match e {
            E::InvalidArgument(m) => ServiceError::InvalidArgument(m),
            E::NotFound(m) => ServiceError::NotFound(m),
            E::AlreadyExists(m) => ServiceError::AlreadyExists(m),
            E::FailedPrecondition(m) => ServiceError::FailedPrecondition(m),
            E::WrongType { expected, found } => {
                ServiceError::InvalidArgument(format!("expected {expected}, found {found}"))
            }
            E::Unimplemented(m) => ServiceError::Unimplemented(m),
            E::DataLoss(m) => ServiceError::DataLoss(m),
            E::Internal(m) => ServiceError::Internal(m),
        }
    }
}

impl From<DalError> for ServiceError {
    fn from(e: DalError) -> Self {
        match e {
            DalError::NotFound(m) => ServiceError::NotFound(m),
            DalError::AlreadyExists(m) => ServiceError::AlreadyExists(m),
            DalError::InvalidArgument(m) => ServiceError::InvalidArgument(m),
            DalError::FailedPrecondition(m) => ServiceError::FailedPrecondition(m),
            DalError::WrongType { expected, found } => {
                ServiceError::InvalidArgument(format!("expected {expected}, found {found}"))
            }
            DalError::Unavailable(m) => ServiceError::Unavailable(m),
            DalError::Internal(m) => ServiceError::Internal(m),
        }
    }
}

impl From<StorageError> for ServiceError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(m) => ServiceError::NotFound(m),
            StorageError::AlreadyExists(m) => ServiceError::AlreadyExists(m),
            StorageError::InvalidArgument(m) => ServiceError::InvalidArgument(m),
            StorageError::Unimplemented(m) => ServiceError::Unimplemented(m),
            StorageError::Unavailable(m) => ServiceError::Unavailable(m),
            StorageError::Io(e) => ServiceError::Internal(e.to_string()),
        }
    }
}

impl From<PipelineError> for ServiceError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::Cancelled => ServiceError::Internal("cancelled".to_string()),
            PipelineError::DataLoss(m) => ServiceError::DataLoss(m),
            PipelineError::Storage(e) => e.into(),
            PipelineError::Codec(e) => codec_error_to_service(e),
            PipelineError::Arrow(e) => ServiceError::DataLoss(e.to_string()),
            PipelineError::Io(e) => ServiceError::Internal(e.to_string()),
        }
    }
}

fn codec_error_to_service(e: trac_codecs::CodecError) -> ServiceError {
    use trac_codecs::CodecError as C;
    match e {
        C::DataLoss(m) => ServiceError::DataLoss(m),
        C::Unimplemented(m) => ServiceError::Unimplemented(m),
        C::InvalidArgument(m) => ServiceError::InvalidArgument(m),
        C::Io(e) => ServiceError::Internal(e.to_string()),
        C::Arrow(e) => ServiceError::DataLoss(e.to_string()),
        C::Parquet(e) => ServiceError::DataLoss(e.to_string()),
    }
}

impl From<trac_codecs::CodecError> for ServiceError {
    fn from(e: trac_codecs::CodecError) -> Self {
        codec_error_to_service(e)
    }
}

impl From<ConversionError> for ServiceError {
    fn from(e: ConversionError) -> Self {
        match e {
            ConversionError::MissingField(f) => {
                ServiceError::InvalidArgument(format!("missing required field '{f}'"))
            }
            ConversionError::InvalidEnum { field, value } => ServiceError::InvalidArgument(
                format!("invalid enum value {value} for field '{field}'"),
            ),
            ConversionError::Model(e) => e.into(),
        }
    }
}

impl From<ServiceError> for Status {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::InvalidArgument(m) => Status::invalid_argument(m),
            ServiceError::NotFound(m) => Status::not_found(m),
            ServiceError::AlreadyExists(m) => Status::already_exists(m),
            ServiceError::FailedPrecondition(m) => Status::failed_precondition(m),
            ServiceError::Unimplemented(m) => Status::unimplemented(m),
            ServiceError::DataLoss(m) => Status::data_loss(m),
            ServiceError::Unavailable(m) => Status::unavailable(m),
            ServiceError::Internal(m) => Status::internal(m),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_not_found_status() {
        let status: Status = ServiceError::NotFound("x".into()).into();
        assert_eq!(status.code(), tonic::Code::NotFound);
    }

    #[test]
    fn data_loss_maps_to_data_loss_status() {
        let status: Status = ServiceError::DataLoss("x".into()).into();
        assert_eq!(status.code(), tonic::Code::DataLoss);
    }
}
