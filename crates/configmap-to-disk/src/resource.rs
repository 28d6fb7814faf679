//! The tracked ConfigMap and the identity it is matched against.

use std::collections::BTreeMap;
use std::fmt;

use k8s_openapi::api::core::v1::ConfigMap;
use thiserror::Error;

/// Namespace and name of the single ConfigMap this process mirrors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    pub namespace: String,
    pub name: String,
}

impl ResourceRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Field selector restricting a list/watch to this ConfigMap.
    pub fn field_selector(&self) -> String {
        format!("metadata.name={}", self.name)
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Reasons a ConfigMap snapshot is not the tracked resource.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("object has no name")]
    MissingName,

    #[error("object {found} is not the tracked ConfigMap {expected}")]
    Mismatch { expected: ResourceRef, found: String },
}

/// Read-only view of the tracked ConfigMap's data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedResource {
    pub reference: ResourceRef,
    pub data: BTreeMap<String, String>,
}

impl TrackedResource {
    /// Validates a snapshot against the expected identity.
    ///
    /// Objects without a namespace are taken to belong to the expected one,
    /// since they can only come from a namespaced API.
    pub fn from_config_map(
        config_map: &ConfigMap,
        expected: &ResourceRef,
    ) -> Result<Self, SnapshotError> {
        let name = config_map
            .metadata
            .name
            .as_deref()
            .ok_or(SnapshotError::MissingName)?;
        let namespace = config_map
            .metadata
            .namespace
            .as_deref()
            .unwrap_or(&expected.namespace);

        if name != expected.name || namespace != expected.namespace {
            return Err(SnapshotError::Mismatch {
                expected: expected.clone(),
                found: format!("{}/{}", namespace, name),
            });
        }

        Ok(Self {
            reference: expected.clone(),
            data: config_map.data.clone().unwrap_or_default(),
        })
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }
}
