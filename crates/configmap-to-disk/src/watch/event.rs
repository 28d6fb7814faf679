//! Notifications flowing from a watch source to the controller.

use std::sync::Arc;

use k8s_openapi::api::core::v1::ConfigMap;
use tokio::sync::{mpsc, watch};

/// A change to the tracked ConfigMap.
#[derive(Debug, Clone)]
pub enum ResourceEvent {
    Added(ConfigMap),
    Updated(ConfigMap),
    Deleted,
}

impl ResourceEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ResourceEvent::Added(_) => "added",
            ResourceEvent::Updated(_) => "updated",
            ResourceEvent::Deleted => "deleted",
        }
    }
}

/// Consumer half: the ordered event stream plus the initial-sync flag.
pub struct EventFeed {
    pub events: mpsc::Receiver<ResourceEvent>,
    pub synced: watch::Receiver<bool>,
}

/// Producer half, held by the watch source.
#[derive(Clone)]
pub struct EventSink {
    events: mpsc::Sender<ResourceEvent>,
    synced: Arc<watch::Sender<bool>>,
}

impl EventSink {
    /// Queues an event. Returns `false` once the feed has been dropped.
    pub async fn send(&self, event: ResourceEvent) -> bool {
        self.events.send(event).await.is_ok()
    }

    /// Flips the sync flag to `true`. Only the first call has an effect.
    pub fn mark_synced(&self) -> bool {
        self.synced.send_if_modified(|synced| {
            if *synced {
                false
            } else {
                *synced = true;
                true
            }
        })
    }

    pub fn has_synced(&self) -> bool {
        *self.synced.borrow()
    }
}

/// Creates a connected sink/feed pair buffering up to `capacity` events.
pub fn channel(capacity: usize) -> (EventSink, EventFeed) {
    let (events_tx, events_rx) = mpsc::channel(capacity);
    let (synced_tx, synced_rx) = watch::channel(false);
    (
        EventSink {
            events: events_tx,
            synced: Arc::new(synced_tx),
        },
        EventFeed {
            events: events_rx,
            synced: synced_rx,
        },
    )
}
