//! Applies one notification to the local file.

use std::path::{Path, PathBuf};

use k8s_openapi::api::core::v1::ConfigMap;

use crate::metrics::ReconcileMetrics;
use crate::resource::{ResourceRef, TrackedResource};
use crate::storage::{FileArtifact, Removal};
use crate::watch::ResourceEvent;

/// What handling a single event did to the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The key's value was written.
    Written { bytes: usize },
    /// The file was deleted.
    Removed,
    /// The file should not exist and already did not.
    AlreadyAbsent,
    /// The write or delete failed; counted as an error.
    Failed,
    /// The payload was not the tracked ConfigMap; nothing was counted.
    Rejected,
}

/// Keeps one file in agreement with one key of one ConfigMap.
pub struct Reconciler {
    resource: ResourceRef,
    key: String,
    artifact: FileArtifact,
    metrics: ReconcileMetrics,
}

impl Reconciler {
    pub fn new(
        resource: ResourceRef,
        key: impl Into<String>,
        path: impl Into<PathBuf>,
        metrics: ReconcileMetrics,
    ) -> Self {
        Self {
            resource,
            key: key.into(),
            artifact: FileArtifact::new(path),
            metrics,
        }
    }

    pub fn resource(&self) -> &ResourceRef {
        &self.resource
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn path(&self) -> &Path {
        self.artifact.path()
    }

    pub fn metrics(&self) -> &ReconcileMetrics {
        &self.metrics
    }

    /// Handles one notification. Failures are logged and counted, never returned.
    pub fn handle(&self, event: &ResourceEvent) -> ReconcileOutcome {
        match event {
            ResourceEvent::Added(config_map) | ResourceEvent::Updated(config_map) => {
                self.apply(config_map, event.kind())
            }
            ResourceEvent::Deleted => {
                self.metrics.record_attempt();
                log::debug!("ConfigMap {} deleted, removing file", self.resource);
                self.remove()
            }
        }
    }

    fn apply(&self, config_map: &ConfigMap, kind: &str) -> ReconcileOutcome {
        let resource = match TrackedResource::from_config_map(config_map, &self.resource) {
            Ok(resource) => resource,
            Err(e) => {
                log::warn!("Ignoring {} notification: {}", kind, e);
                return ReconcileOutcome::Rejected;
            }
        };

        self.metrics.record_attempt();

        let Some(value) = resource.value(&self.key) else {
            log::debug!(
                "ConfigMap {} has no key {}, removing file",
                self.resource,
                self.key
            );
            return self.remove();
        };

        match self.artifact.write(value.as_bytes()) {
            Ok(()) => {
                log::debug!(
                    "Wrote key {} of ConfigMap {} to {}",
                    self.key,
                    self.resource,
                    self.path().display()
                );
                ReconcileOutcome::Written { bytes: value.len() }
            }
            Err(e) => {
                self.metrics.record_error();
                log::error!("{}", e);
                ReconcileOutcome::Failed
            }
        }
    }

    fn remove(&self) -> ReconcileOutcome {
        match self.artifact.remove() {
            Ok(Removal::Removed) => ReconcileOutcome::Removed,
            Ok(Removal::AlreadyAbsent) => ReconcileOutcome::AlreadyAbsent,
            Err(e) => {
                self.metrics.record_error();
                log::error!("{}", e);
                ReconcileOutcome::Failed
            }
        }
    }
}
