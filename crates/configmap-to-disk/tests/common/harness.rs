//! Test harness for isolated controller runs.

#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use configmap_to_disk::{
    Controller, EventSink, ReconcileMetrics, Reconciler, ResourceEvent, ResourceRef, WatchSource,
};

use super::builders::{KEY, NAME, NAMESPACE};

/// Isolated environment: a temp directory holding the target file, and
/// fresh metrics for every harness.
pub struct TestHarness {
    temp_dir: TempDir,
    /// Path of the mirrored file inside `temp_dir`.
    pub path: PathBuf,
    pub metrics: ReconcileMetrics,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join(KEY);
        Self {
            temp_dir,
            path,
            metrics: ReconcileMetrics::new().expect("Failed to create metrics"),
        }
    }

    /// Points the target at a directory that does not exist, so every write fails.
    pub fn with_unwritable_path() -> Self {
        let mut harness = Self::new();
        harness.path = harness.temp_dir.path().join("missing").join(KEY);
        harness
    }

    pub fn resource(&self) -> ResourceRef {
        ResourceRef::new(NAMESPACE, NAME)
    }

    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(self.resource(), KEY, &self.path, self.metrics.clone())
    }

    pub fn controller(&self, sync_timeout: Duration) -> Controller {
        Controller::new(self.reconciler(), sync_timeout)
    }

    pub fn contents(&self) -> Option<String> {
        std::fs::read_to_string(&self.path).ok()
    }

    pub fn file_exists(&self) -> bool {
        self.path.exists()
    }
}

/// A watch source that optionally completes its initial listing, replays a
/// fixed list of events, then idles until stopped.
pub struct ScriptedSource {
    sync: bool,
    events: Vec<ResourceEvent>,
}

impl ScriptedSource {
    pub fn synced(events: Vec<ResourceEvent>) -> Self {
        Self { sync: true, events }
    }

    /// Never completes the initial listing.
    pub fn never_synced() -> Self {
        Self {
            sync: false,
            events: Vec::new(),
        }
    }
}

#[async_trait]
impl WatchSource for ScriptedSource {
    async fn run(self, sink: EventSink, stop: CancellationToken) {
        if self.sync {
            sink.mark_synced();
        }
        for event in self.events {
            if !sink.send(event).await {
                return;
            }
        }
        stop.cancelled().await;
    }
}
