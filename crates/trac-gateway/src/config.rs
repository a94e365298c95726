//! The `gateway` section of the platform config: the API prefix, redirects,
//! and custom routes. Loaded by `tracd`; `${NAME}` substitution happens
//! before this struct is deserialized.

use serde::{Deserialize, Serialize};

fn default_api_prefix() -> String {
    "/trac-api".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Prefix every REST route is mounted under, e.g. `/trac-api`. Combined
    /// with each service's own `restPrefix` ("a REST route
    /// matching `{apiPrefix}{restPrefix}/`").
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,

    /// Static redirect rules evaluated before route matching.
    #[serde(default)]
    pub redirects: Vec<RedirectRule>,

    /// Additional routes beyond the built-in service descriptors.
    #[serde(default)]
    pub custom_routes: Vec<CustomRoute>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig { api_prefix: default_api_prefix(), redirects: Vec::new(), custom_routes: Vec::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectRule {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomRoute {
    pub path: String,
    pub target: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_api_prefix_is_trac_api() {
        assert_eq!(GatewayConfig::default().api_prefix, "/trac-api");
    }

    #[test]
    fn deserializes_redirects_and_custom_routes_from_yaml_shape() {
        let json = serde_json::json!({
            "apiPrefix": "/api",
            "redirects": [{ "source": "/", "target": "/index.html" }],
            "customRoutes": [{ "path": "/healthz", "target": "http://127.0.0.1:9000/healthz" }],
        });
        let cfg: GatewayConfig = serde_json::from_value(json).unwrap();
        assert_eq!(cfg.api_prefix, "/api");
        assert_eq!(cfg.redirects.len(), 1);
        assert_eq!(cfg.custom_routes.len(), 1);
    }
}
