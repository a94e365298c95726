//! Native gRPC + gRPC-Web server assembly: "a gRPC route
//! matching `/{FullyQualifiedService}/`." Tonic's generated `*Server` wrapper
//! types already implement `NamedService` with exactly that path, and
//! `tonic_web::GrpcWebLayer` transparently accepts gRPC-Web framing on top of
//! the same service -- so there is no hand-rolled path dispatch here, only
//! wiring.

use std::sync::Arc;

use tonic::transport::server::Router;
use tonic::transport::Server;

use trac_data_svc::{AdminService, DataService, MetadataService};
use trac_proto::admin::trac_admin_api_server::TracAdminApiServer;
use trac_proto::data::trac_data_api_server::TracDataApiServer;
use trac_proto::metadata::trac_metadata_api_server::TracMetadataApiServer;

/// Builds the gRPC (+gRPC-Web) router over the three core services. `serve`
/// is left to the caller (`tracd`'s `main`), since the listen address comes
/// from config, not from this crate.
pub fn build_router(metadata: Arc<MetadataService>, data: Arc<DataService>, admin: Arc<AdminService>) -> Router {
    Server::builder()
        .accept_http1(true)
        .layer(tonic_web::GrpcWebLayer::new())
        .add_service(TracMetadataApiServer::from_arc(metadata))
        .add_service(TracDataApiServer::from_arc(data))
        .add_service(TracAdminApiServer::from_arc(admin))
}
