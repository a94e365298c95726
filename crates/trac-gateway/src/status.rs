//! gRPC status → HTTP status code table: OK=200, UNAUTHENTICATED=401,
//! PERMISSION_DENIED=403, INVALID_ARGUMENT=400, NOT_FOUND=404,
//! ALREADY_EXISTS=409, FAILED_PRECONDITION=412, UNAVAILABLE=503,
//! default=500.
//!
//! A pure function so `trac-data-svc`'s `ServiceError -> tonic::Status`
//! mapping and this table can never drift apart, and so a response never
//! leaks backend-specific error text through two independently maintained
//! mappings.

use http::StatusCode;
use tonic::Code;

pub fn grpc_to_http(code: Code) -> StatusCode {
    match code {
        Code::Ok => StatusCode::OK,
        Code::Unauthenticated => StatusCode::UNAUTHORIZED,
        Code::PermissionDenied => StatusCode::FORBIDDEN,
        Code::InvalidArgument => StatusCode::BAD_REQUEST,
        Code::NotFound => StatusCode::NOT_FOUND,
        Code::AlreadyExists => StatusCode::CONFLICT,
        Code::FailedPrecondition => StatusCode::PRECONDITION_FAILED,
        Code::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_spec_table_exactly() {
        let table = [
            (Code::Ok, StatusCode::OK),
            (Code::Unauthenticated, StatusCode::UNAUTHORIZED),
            (Code::PermissionDenied, StatusCode::FORBIDDEN),
            (Code::InvalidArgument, StatusCode::BAD_REQUEST),
            (Code::NotFound, StatusCode::NOT_FOUND),
            (Code::AlreadyExists, StatusCode::CONFLICT),
            (Code::FailedPrecondition, StatusCode::PRECONDITION_FAILED),
            (Code::Unavailable, StatusCode::SERVICE_UNAVAILABLE),
        ];
        for (code, expected) in table {
            assert_eq!(grpc_to_http(code), expected, "code {code:?}");
        }
    }

    #[test]
    fn unmapped_codes_default_to_internal_server_error() {
        for code in [Code::Internal, Code::Unknown, Code::DeadlineExceeded, Code::Cancelled, Code::DataLoss] {
            assert_eq!(grpc_to_http(code), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}
