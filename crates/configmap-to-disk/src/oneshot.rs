//! One-shot mode: fetch the ConfigMap once, write the key, exit.

use std::path::PathBuf;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::Api;

use crate::error::{Error, Result};
use crate::resource::{ResourceRef, TrackedResource};
use crate::storage::FileArtifact;

/// Reads the current state of a ConfigMap directly, bypassing any watch.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(&self, resource: &ResourceRef) -> Result<ConfigMap>;
}

#[async_trait]
impl ResourceFetcher for Api<ConfigMap> {
    async fn fetch(&self, resource: &ResourceRef) -> Result<ConfigMap> {
        self.get(&resource.name)
            .await
            .map_err(|source| Error::Fetch {
                resource: resource.clone(),
                source,
            })
    }
}

pub struct OneShotSync {
    resource: ResourceRef,
    key: String,
    artifact: FileArtifact,
}

impl OneShotSync {
    pub fn new(resource: ResourceRef, key: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            resource,
            key: key.into(),
            artifact: FileArtifact::new(path),
        }
    }

    /// Performs a single fetch-and-write cycle.
    ///
    /// A failed fetch or a missing key is fatal. A failed write is only
    /// logged: the ConfigMap stays authoritative and the next invocation
    /// will try again.
    pub async fn run<F>(&self, fetcher: &F) -> Result<()>
    where
        F: ResourceFetcher + ?Sized,
    {
        let config_map = fetcher.fetch(&self.resource).await.map_err(|e| {
            log::error!("{}", e);
            e
        })?;
        let resource = TrackedResource::from_config_map(&config_map, &self.resource)?;

        let Some(value) = resource.value(&self.key) else {
            let err = Error::KeyNotFound {
                resource: self.resource.clone(),
                key: self.key.clone(),
            };
            log::error!("{}", err);
            return Err(err);
        };

        match self.artifact.write(value.as_bytes()) {
            Ok(()) => log::info!(
                "Synced key {} of ConfigMap {} to {}",
                self.key,
                self.resource,
                self.artifact.path().display()
            ),
            Err(e) => log::error!("{}", e),
        }
        Ok(())
    }
}
