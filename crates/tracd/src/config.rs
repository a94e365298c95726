//! The platform config file tracd loads at startup: a YAML document rooted
//! at a platform config with subsections for services, the metadata
//! database, storage plugins, tenants, authentication, and the gateway
//! (redirects, custom routes). `${NAME}` substitutions are permitted and
//! resolved from the environment.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use trac_gateway::GatewayConfig;
use trac_storage::StoragePluginsConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataDbConfig {
    /// `"postgres"` for `PgMetadataDal`, `"memory"` for `InMemoryMetadataDal`
    /// (`"memory"` is an addition beyond the platform's usual dialect list,
    /// needed so `tracd` has a runnable dev/test mode without a live
    /// Postgres).
    pub dialect: String,
    #[serde(default)]
    pub jdbc_url: String,
    #[serde(default)]
    pub pool_size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantConfig {
    pub tenant_code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    #[serde(default)]
    pub signing_key_alias: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformConfig {
    #[serde(default)]
    pub services: BTreeMap<String, ServiceConfig>,
    pub metadata_db: MetadataDbConfig,
    pub storage: StoragePluginsConfig,
    #[serde(default)]
    pub tenants: Vec<TenantConfig>,
    #[serde(default)]
    pub authentication: AuthConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl PlatformConfig {
    /// Loads and parses a platform config file, applying `${NAME}`
    /// env-substitution to the raw text first.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let substituted = substitute_env(&raw)?;
        Ok(serde_yaml::from_str(&substituted)?)
    }
}

/// Replaces every `${NAME}` occurrence with the value of the `NAME`
/// environment variable. Unset variables are an error: a config file that
/// references `${DATABASE_PASSWORD}` should fail loudly, not silently
/// substitute an empty string, if the variable is missing.
fn substitute_env(raw: &str) -> anyhow::Result<String> {
    let pattern = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap();
    let mut err = None;
    let replaced = pattern.replace_all(raw, |caps: &regex::Captures| {
        let name = &caps[1];
        match std::env::var(name) {
            Ok(value) => value,
            Err(_) => {
                err.get_or_insert(name.to_string());
                String::new()
            }
        }
    });
    if let Some(name) = err {
        anyhow::bail!("config references undefined environment variable '{name}'");
    }
    Ok(replaced.into_owned())
}
