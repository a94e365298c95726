//! `TracDataApi`/`TracMetadataApi` gRPC service implementations: the
//! orchestration layer that wires the metadata DAL (`trac-metadata-dal`),
//! the object store (`trac-storage`), and the codec pipeline
//! (`trac-pipeline`/`trac-codecs`) behind the RPC surfaces declared in
//! `trac-proto` (, §6).

pub mod admin_service;
pub mod context;
pub mod data_service;
pub mod error;
pub mod metadata_service;
pub mod storage_obj;
pub mod validate;

pub use admin_service::AdminService;
pub use context::ServiceContext;
pub use data_service::DataService;
pub use error::{ServiceError, ServiceResult};
pub use metadata_service::MetadataService;
