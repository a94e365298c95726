//! Generated protobuf/gRPC types for the TRAC wire surface .,
//! plus conversions to and from the in-process `trac-models` types.

pub mod metadata {
    tonic::include_proto!("trac.metadata");
}

pub mod data {
    tonic::include_proto!("trac.data");
}

pub mod admin {
    tonic::include_proto!("trac.admin");
}

pub mod conversions;

pub use conversions::ConversionError;
