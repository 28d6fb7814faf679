//! Mirror one key of one Kubernetes ConfigMap to a local file.
//!
//! Two modes are supported: a long-running watch that keeps the file in
//! sync (with `/health` and `/metrics` endpoints), and a one-shot fetch
//! that writes the file once and exits.

pub mod app;
pub mod config;
pub mod controller;
pub mod error;
pub mod group;
pub mod logging;
pub mod metrics;
pub mod oneshot;
pub mod resource;
pub mod server;
pub mod storage;
pub mod watch;

pub use config::{ConfigError, LogLevel, Settings};
pub use controller::{Controller, ControllerState, ReconcileOutcome, Reconciler};
pub use error::{Error, Result};
pub use group::Group;
pub use metrics::ReconcileMetrics;
pub use oneshot::{OneShotSync, ResourceFetcher};
pub use resource::{ResourceRef, TrackedResource};
pub use storage::{FileArtifact, StorageError};
pub use watch::{EventFeed, EventSink, Informer, ResourceEvent, WatchSource};
