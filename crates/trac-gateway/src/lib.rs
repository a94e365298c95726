//! Gateway Router: builds the route table, the REST↔gRPC translator, and
//! the native gRPC/gRPC-Web listener. One process binds one or more ports;
//! each binding multiplexes gRPC, gRPC-Web, and REST onto the same service
//! descriptors.

pub mod config;
pub mod error;
pub mod grpc;
pub mod rest;
pub mod routes;
pub mod translator;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use rest::AppState;
pub use routes::{RouteEntry, RouteTable};
