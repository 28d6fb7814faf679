//! Watch-mode controller: waits for the initial listing, then reconciles
//! every notification until told to stop.

pub mod reconciler;

use std::fmt;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::watch::EventFeed;

pub use reconciler::{ReconcileOutcome, Reconciler};

/// Lifecycle of the watch actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Starting,
    WaitingForSync,
    Watching,
    Stopped,
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ControllerState::Starting => "starting",
            ControllerState::WaitingForSync => "waiting-for-sync",
            ControllerState::Watching => "watching",
            ControllerState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

pub struct Controller {
    reconciler: Reconciler,
    sync_timeout: Duration,
    state: ControllerState,
}

impl Controller {
    pub fn new(reconciler: Reconciler, sync_timeout: Duration) -> Self {
        Self {
            reconciler,
            sync_timeout,
            state: ControllerState::Starting,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Runs until `stop` is cancelled.
    ///
    /// Returns an error if the initial listing does not complete within the
    /// sync timeout, if `stop` fires before it completes, or if the feed
    /// closes while watching. Per-event failures never end the loop.
    pub async fn run(&mut self, feed: EventFeed, stop: CancellationToken) -> Result<()> {
        let EventFeed {
            mut events,
            mut synced,
        } = feed;

        self.transition(ControllerState::WaitingForSync);
        let sync_timeout = self.sync_timeout;
        let sync = tokio::select! {
            biased;
            _ = stop.cancelled() => Err(Error::CacheSyncAborted),
            waited = tokio::time::timeout(sync_timeout, synced.wait_for(|done| *done)) => {
                match waited {
                    Ok(Ok(_)) => Ok(()),
                    Ok(Err(_)) => Err(Error::CacheSyncAborted),
                    Err(_) => Err(Error::CacheSyncTimeout(sync_timeout)),
                }
            }
        };
        if let Err(e) = sync {
            self.transition(ControllerState::Stopped);
            return Err(e);
        }

        self.transition(ControllerState::Watching);
        log::info!(
            "Watching ConfigMap {} key {} -> {}",
            self.reconciler.resource(),
            self.reconciler.key(),
            self.reconciler.path().display()
        );

        let result = loop {
            tokio::select! {
                biased;
                _ = stop.cancelled() => break Ok(()),
                event = events.recv() => match event {
                    Some(event) => {
                        let outcome = self.reconciler.handle(&event);
                        log::debug!("Handled {} event: {:?}", event.kind(), outcome);
                    }
                    None => break Err(Error::WatchSourceClosed),
                },
            }
        };

        self.transition(ControllerState::Stopped);
        result
    }

    fn transition(&mut self, next: ControllerState) {
        log::debug!("Controller state {} -> {}", self.state, next);
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::ReconcileMetrics;
    use crate::resource::ResourceRef;
    use crate::watch::{channel, ResourceEvent};
    use tempfile::TempDir;

    fn setup_controller(dir: &TempDir, sync_timeout: Duration) -> Controller {
        let reconciler = Reconciler::new(
            ResourceRef::new("default", "app-config"),
            "config.yaml",
            dir.path().join("config.yaml"),
            ReconcileMetrics::new().unwrap(),
        );
        Controller::new(reconciler, sync_timeout)
    }

    #[tokio::test]
    async fn test_sync_timeout() {
        let dir = TempDir::new().unwrap();
        let mut controller = setup_controller(&dir, Duration::from_millis(20));
        let (_sink, feed) = channel(4);

        let err = controller
            .run(feed, CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::CacheSyncTimeout(_)));
        assert!(err.to_string().starts_with("sync peer cache"));
        assert_eq!(controller.state(), ControllerState::Stopped);
    }

    #[tokio::test]
    async fn test_stop_before_sync_is_an_error() {
        let dir = TempDir::new().unwrap();
        let mut controller = setup_controller(&dir, Duration::from_secs(30));
        let (sink, feed) = channel(4);
        sink.send(ResourceEvent::Deleted).await;

        let stop = CancellationToken::new();
        stop.cancel();
        let err = controller.run(feed, stop).await.unwrap_err();

        assert!(matches!(err, Error::CacheSyncAborted));
        // Nothing may be handled before the initial listing completes.
        assert_eq!(controller.reconciler().metrics().attempts(), 0);
    }

    #[tokio::test]
    async fn test_source_dropped_before_sync() {
        let dir = TempDir::new().unwrap();
        let mut controller = setup_controller(&dir, Duration::from_secs(30));
        let (sink, feed) = channel(4);
        drop(sink);

        let err = controller
            .run(feed, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CacheSyncAborted));
    }

    #[tokio::test]
    async fn test_feed_closed_while_watching() {
        let dir = TempDir::new().unwrap();
        let mut controller = setup_controller(&dir, Duration::from_secs(30));
        let (sink, feed) = channel(4);
        sink.mark_synced();
        sink.send(ResourceEvent::Deleted).await;
        drop(sink);

        let err = controller
            .run(feed, CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::WatchSourceClosed));
        assert_eq!(controller.reconciler().metrics().attempts(), 1);
    }

    #[tokio::test]
    async fn test_stop_while_watching_is_success() {
        let dir = TempDir::new().unwrap();
        let mut controller = setup_controller(&dir, Duration::from_secs(30));
        let (sink, feed) = channel(4);
        sink.mark_synced();

        let stop = CancellationToken::new();
        let trigger = stop.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        controller.run(feed, stop).await.unwrap();
        assert_eq!(controller.state(), ControllerState::Stopped);
        drop(sink);
    }
}
