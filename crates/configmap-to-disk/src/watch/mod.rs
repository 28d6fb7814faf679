//! Change notifications for the tracked ConfigMap.
//!
//! A [`WatchSource`] produces notifications into an [`EventSink`]; the
//! controller consumes them from the paired [`EventFeed`]. The feed is a
//! single-consumer channel, so events are applied one at a time and in the
//! order the source delivered them.

pub mod event;
pub mod informer;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

pub use event::{channel, EventFeed, EventSink, ResourceEvent};
pub use informer::Informer;

/// Something that can feed resource notifications to the controller.
///
/// Implementations must call [`EventSink::mark_synced`] once their initial
/// listing is complete and return when `stop` is cancelled.
#[async_trait]
pub trait WatchSource: Send {
    async fn run(self, sink: EventSink, stop: CancellationToken);
}
