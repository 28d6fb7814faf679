use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;
use crate::resource::{ResourceRef, SnapshotError};

/// Fatal errors. Anything returned through this type ends the process.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("create Kubernetes config from '{path}': {source}")]
    Kubeconfig {
        path: PathBuf,
        #[source]
        source: kube::config::KubeconfigError,
    },

    #[error("create Kubernetes config: {0}")]
    InferConfig(#[from] kube::config::InferConfigError),

    #[error("create Kubernetes client: {0}")]
    Client(#[source] kube::Error),

    #[error("listen on {addr}: {source}")]
    Listen {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server exited unexpectedly: {0}")]
    Server(#[source] std::io::Error),

    #[error("sync peer cache: timed out after {0:?}")]
    CacheSyncTimeout(Duration),

    #[error("sync peer cache: stopped before the initial listing completed")]
    CacheSyncAborted,

    #[error("watch source closed unexpectedly")]
    WatchSourceClosed,

    #[error("Failed to retrieve ConfigMap {resource}: {source}")]
    Fetch {
        resource: ResourceRef,
        #[source]
        source: kube::Error,
    },

    #[error("Invalid ConfigMap: {0}")]
    InvalidSnapshot(#[from] SnapshotError),

    #[error("ConfigMap {resource} does not include specified key: {key}")]
    KeyNotFound { resource: ResourceRef, key: String },

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Failed to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, Error>;
