//! Builders for ConfigMap snapshots.

#![allow(dead_code)]

use k8s_openapi::api::core::v1::ConfigMap;
use serde_json::{json, Map, Value};

pub const NAMESPACE: &str = "default";
pub const NAME: &str = "app-config";
pub const KEY: &str = "config.yaml";

/// Builds ConfigMaps the way the API server would return them.
pub struct ConfigMapBuilder {
    namespace: String,
    name: String,
    data: Map<String, Value>,
}

impl ConfigMapBuilder {
    /// A ConfigMap with the tracked identity and no data.
    pub fn new() -> Self {
        Self {
            namespace: NAMESPACE.to_string(),
            name: NAME.to_string(),
            data: Map::new(),
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn namespace(mut self, namespace: &str) -> Self {
        self.namespace = namespace.to_string();
        self
    }

    pub fn entry(mut self, key: &str, value: &str) -> Self {
        self.data.insert(key.to_string(), Value::String(value.to_string()));
        self
    }

    pub fn build(self) -> ConfigMap {
        serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": {
                "name": self.name,
                "namespace": self.namespace,
                "resourceVersion": "1",
            },
            "data": self.data,
        }))
        .expect("valid ConfigMap JSON")
    }
}

/// The tracked ConfigMap carrying `value` under the tracked key.
pub fn tracked(value: &str) -> ConfigMap {
    ConfigMapBuilder::new().entry(KEY, value).build()
}
