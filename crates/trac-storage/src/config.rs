use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One entry of the `storage` section of the platform config: storage
/// plugins are keyed by `storageKey`, each carrying a type plus properties.
/// Only `LocalFs` is implemented by this workspace; the remote backends
/// are named here so
/// config loading and validation are complete even though this crate treats
/// them as external collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageConfig {
    LocalFs { root: String },
    S3 { bucket: String, properties: BTreeMap<String, String> },
    Gcs { bucket: String, properties: BTreeMap<String, String> },
    AzureBlob { container: String, properties: BTreeMap<String, String> },
}

impl StorageConfig {
    pub fn storage_format_hint(&self) -> &'static str {
        match self {
            StorageConfig::LocalFs { .. } => "local",
            StorageConfig::S3 { .. } => "s3",
            StorageConfig::Gcs { .. } => "gcs",
            StorageConfig::AzureBlob { .. } => "azure_blob",
        }
    }
}

/// The full `storage` config section: a map from `storageKey` to plugin
/// config, plus which key is the default for new STORAGE objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoragePluginsConfig {
    pub default_storage_key: String,
    pub plugins: BTreeMap<String, StorageConfig>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_local_fs_plugin_from_yaml_shape() {
        let json = serde_json::json!({
            "defaultStorageKey": "default",
            "plugins": {
                "default": { "type": "LOCAL_FS", "root": "/var/trac/data" }
            }
        });
        let parsed: StoragePluginsConfig = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.default_storage_key, "default");
        assert!(matches!(
            parsed.plugins.get("default"),
            Some(StorageConfig::LocalFs { .. })
        ));
    }
}
