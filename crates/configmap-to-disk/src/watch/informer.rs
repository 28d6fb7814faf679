//! Kubernetes-backed watch source.
//!
//! Wraps `kube::runtime::watcher` for a single ConfigMap, keeps the last
//! seen object in a local store, and turns raw watcher events into
//! added/updated/deleted notifications. The initial listing flips the sync
//! flag; a periodic resync re-delivers the cached object as an update.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use k8s_openapi::api::core::v1::ConfigMap;
use kube::runtime::{watcher, WatchStreamExt};
use kube::Api;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::event::{EventSink, ResourceEvent};
use super::WatchSource;
use crate::resource::ResourceRef;

pub struct Informer {
    api: Api<ConfigMap>,
    resource: ResourceRef,
    resync_interval: Duration,
}

impl Informer {
    pub fn new(api: Api<ConfigMap>, resource: ResourceRef, resync_interval: Duration) -> Self {
        Self {
            api,
            resource,
            resync_interval,
        }
    }
}

#[async_trait]
impl WatchSource for Informer {
    async fn run(self, sink: EventSink, stop: CancellationToken) {
        let config = watcher::Config::default().fields(&self.resource.field_selector());
        let stream = watcher(self.api, config).default_backoff();
        watch_events(stream, &self.resource, self.resync_interval, sink, stop).await;
    }
}

/// Drives raw watcher events into `sink` until `stop` fires, the stream
/// ends, or the feed is dropped.
async fn watch_events<S>(
    stream: S,
    resource: &ResourceRef,
    resync_interval: Duration,
    sink: EventSink,
    stop: CancellationToken,
) where
    S: Stream<Item = Result<watcher::Event<ConfigMap>, watcher::Error>> + Send,
{
    futures_util::pin_mut!(stream);

    let mut store = Store::default();
    let mut resync = tokio::time::interval(resync_interval);
    resync.set_missed_tick_behavior(MissedTickBehavior::Delay);
    resync.tick().await; // skip immediate first tick

    log::info!("Started watching ConfigMap {}", resource);

    loop {
        let notifications = tokio::select! {
            _ = stop.cancelled() => break,
            _ = resync.tick() => {
                if !sink.has_synced() {
                    continue;
                }
                log::debug!("Resyncing ConfigMap {}", resource);
                store.resync()
            }
            next = stream.next() => match next {
                Some(Ok(event)) => {
                    let listing_done = matches!(event, watcher::Event::InitDone);
                    let notifications = store.apply(event);
                    if listing_done && sink.mark_synced() {
                        log::info!("Initial listing of ConfigMap {} completed", resource);
                    }
                    notifications
                }
                Some(Err(e)) => {
                    log::warn!("Watch error for ConfigMap {}: {}", resource, e);
                    continue;
                }
                None => break,
            },
        };

        for notification in notifications {
            if !sink.send(notification).await {
                log::debug!("Event feed closed, stopping watch");
                return;
            }
        }
    }

    log::info!("Stopped watching ConfigMap {}", resource);
}

/// Last known state of the watched objects, keyed by name.
#[derive(Default)]
struct Store {
    objects: BTreeMap<String, ConfigMap>,
    /// Objects collected by a listing that has not completed yet.
    relist: Option<BTreeMap<String, ConfigMap>>,
}

fn object_name(config_map: &ConfigMap) -> String {
    config_map.metadata.name.clone().unwrap_or_default()
}

impl Store {
    /// Applies one watcher event and returns the notifications it produces.
    fn apply(&mut self, event: watcher::Event<ConfigMap>) -> Vec<ResourceEvent> {
        match event {
            watcher::Event::Init => {
                self.relist = Some(BTreeMap::new());
                Vec::new()
            }
            watcher::Event::InitApply(config_map) => match self.relist.as_mut() {
                Some(listed) => {
                    listed.insert(object_name(&config_map), config_map);
                    Vec::new()
                }
                None => self.upsert(config_map),
            },
            watcher::Event::InitDone => {
                let listed = self.relist.take().unwrap_or_default();
                let mut notifications = Vec::new();
                for name in self.objects.keys() {
                    if !listed.contains_key(name) {
                        notifications.push(ResourceEvent::Deleted);
                    }
                }
                for (name, config_map) in &listed {
                    if self.objects.contains_key(name) {
                        notifications.push(ResourceEvent::Updated(config_map.clone()));
                    } else {
                        notifications.push(ResourceEvent::Added(config_map.clone()));
                    }
                }
                self.objects = listed;
                notifications
            }
            watcher::Event::Apply(config_map) => self.upsert(config_map),
            watcher::Event::Delete(config_map) => {
                if self.objects.remove(&object_name(&config_map)).is_some() {
                    vec![ResourceEvent::Deleted]
                } else {
                    Vec::new()
                }
            }
        }
    }

    fn upsert(&mut self, config_map: ConfigMap) -> Vec<ResourceEvent> {
        let previous = self
            .objects
            .insert(object_name(&config_map), config_map.clone());
        match previous {
            Some(_) => vec![ResourceEvent::Updated(config_map)],
            None => vec![ResourceEvent::Added(config_map)],
        }
    }

    fn resync(&self) -> Vec<ResourceEvent> {
        self.objects
            .values()
            .cloned()
            .map(ResourceEvent::Updated)
            .collect()
    }
}
