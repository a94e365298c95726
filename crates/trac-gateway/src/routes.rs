//! Route table construction: routes are built at boot from (a) built-in
//! service descriptors for the core APIs, plus (b) custom routes from
//! config, plus (c) redirect rules. For each service with a descriptor, two
//! routes are registered: a gRPC route matching `/{FullyQualifiedService}/`
//! and a REST route matching `{apiPrefix}{restPrefix}/`.
//!
//! This module builds the *descriptive* table (used for startup logging and
//! route-conflict detection); the live REST dispatch lives in
//! [`crate::rest`] and the live gRPC dispatch is tonic's own
//! `NamedService`-based routing, wired in [`crate::grpc`].

use http::Method;

use crate::config::{CustomRoute, GatewayConfig, RedirectRule};

#[derive(Debug, Clone, PartialEq)]
pub struct RouteEntry {
    pub service: &'static str,
    pub method: &'static str,
    /// gRPC route: `/{FullyQualifiedService}/{Method}`.
    pub grpc_path: String,
    pub rest_method: Method,
    /// REST route template, relative to `apiPrefix`.
    pub rest_path_template: String,
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    pub entries: Vec<RouteEntry>,
    pub redirects: Vec<RedirectRule>,
    pub custom_routes: Vec<CustomRoute>,
}

impl RouteTable {
    /// Builds the table from the built-in service descriptors plus whatever
    /// the config contributes. Built-in entries never change at runtime;
    /// only `redirects`/`custom_routes` are config-driven.
    pub fn build(config: &GatewayConfig) -> Self {
        RouteTable {
            entries: builtin_entries(&config.api_prefix),
            redirects: config.redirects.clone(),
            custom_routes: config.custom_routes.clone(),
        }
    }

    /// The first redirect whose `source` exactly matches `path`, if any.
    pub fn redirect_for(&self, path: &str) -> Option<&str> {
        self.redirects.iter().find(|r| r.source == path).map(|r| r.target.as_str())
    }
}

fn entry(
    service: &'static str,
    method: &'static str,
    rest_method: Method,
    rest_path: impl Into<String>,
) -> RouteEntry {
    RouteEntry {
        service,
        method,
        grpc_path: format!("/trac.{service}/{method}"),
        rest_method,
        rest_path_template: rest_path.into(),
    }
}

fn builtin_entries(api_prefix: &str) -> Vec<RouteEntry> {
    let p = |suffix: &str| format!("{api_prefix}{suffix}");
    vec![
        entry("metadata.TracMetadataApi", "CreateObject", Method::POST, p("/v1/{tenant}/metadata")),
        entry("metadata.TracMetadataApi", "UpdateObject", Method::POST, p("/v1/{tenant}/metadata/{object_type}/{object_id}")),
        entry(
            "metadata.TracMetadataApi",
            "UpdateTag",
            Method::POST,
            p("/v1/{tenant}/metadata/{object_type}/{object_id}/versions/{object_version}/tag"),
        ),
        entry(
            "metadata.TracMetadataApi",
            "ReadObject",
            Method::GET,
            p("/v1/{tenant}/metadata/{object_type}/{object_id}/versions/{object_version}/tags/{tag_version}"),
        ),
        entry("metadata.TracMetadataApi", "ReadBatch", Method::POST, p("/v1/{tenant}/metadata/batch/read")),
        entry("metadata.TracMetadataApi", "CreateObjectBatch", Method::POST, p("/v1/{tenant}/metadata/batch")),
        entry("metadata.TracMetadataApi", "Search", Method::POST, p("/v1/{tenant}/metadata/search")),
        entry("data.TracDataApi", "CreateDataset", Method::POST, p("/v1/{tenant}/data/dataset")),
        entry("data.TracDataApi", "UpdateDataset", Method::POST, p("/v1/{tenant}/data/dataset/{object_id}")),
        entry(
            "data.TracDataApi",
            "ReadDataset",
            Method::GET,
            p("/v1/{tenant}/data/dataset/{object_id}/versions/{object_version}"),
        ),
        entry("data.TracDataApi", "CreateFile", Method::POST, p("/v1/{tenant}/data/file")),
        entry("data.TracDataApi", "UpdateFile", Method::POST, p("/v1/{tenant}/data/file/{object_id}")),
        entry(
            "data.TracDataApi",
            "ReadFile",
            Method::GET,
            p("/v1/{tenant}/data/file/{object_id}/versions/{object_version}"),
        ),
        entry("admin.TracAdminApi", "CreateTenant", Method::POST, p("/v1/trac-admin/tenants")),
        entry("admin.TracAdminApi", "ListTenants", Method::GET, p("/v1/trac-admin/tenants")),
        entry("admin.TracAdminApi", "SetConfig", Method::POST, p("/v1/trac-admin/{tenant}/config/{config_key}")),
        entry("admin.TracAdminApi", "GetConfig", Method::GET, p("/v1/trac-admin/{tenant}/config/{config_key}")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_one_rest_and_grpc_route_per_method() {
        let table = RouteTable::build(&GatewayConfig::default());
        assert_eq!(table.entries.len(), 17);
        assert!(table.entries.iter().all(|e| e.grpc_path.starts_with("/trac.")));
        assert!(table.entries.iter().all(|e| e.rest_path_template.starts_with("/trac-api/v1/")));
    }

    #[test]
    fn redirect_lookup_matches_exact_source() {
        let config = GatewayConfig {
            redirects: vec![RedirectRule { source: "/".into(), target: "/index.html".into() }],
            ..GatewayConfig::default()
        };
        let table = RouteTable::build(&config);
        assert_eq!(table.redirect_for("/"), Some("/index.html"));
        assert_eq!(table.redirect_for("/other"), None);
    }

    #[test]
    fn custom_routes_pass_through_from_config() {
        let config = GatewayConfig {
            custom_routes: vec![CustomRoute { path: "/healthz".into(), target: "http://127.0.0.1:9000/healthz".into() }],
            ..GatewayConfig::default()
        };
        let table = RouteTable::build(&config);
        assert_eq!(table.custom_routes.len(), 1);
    }
}
