//! Wires settings, the Kubernetes client and the actors together.

use k8s_openapi::api::core::v1::ConfigMap;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config};
use prometheus::Registry;
use tokio_util::sync::CancellationToken;

use crate::config::Settings;
use crate::controller::{Controller, Reconciler};
use crate::error::{Error, Result};
use crate::group::Group;
use crate::metrics::{self, ReconcileMetrics};
use crate::oneshot::OneShotSync;
use crate::resource::ResourceRef;
use crate::server;
use crate::watch::{self, Informer, WatchSource};

/// Buffered notifications between the watch source and the controller.
const EVENT_BUFFER: usize = 64;

/// Entry point for both modes. `--one-time` selects one-shot mode.
pub async fn run(settings: Settings) -> Result<()> {
    settings.validate()?;
    let client = build_client(&settings).await?;
    if settings.one_time {
        run_once(&settings, client).await
    } else {
        run_watch(&settings, client).await
    }
}

/// Builds a client from `--kubeconfig` when given, otherwise from the
/// in-cluster or default kubeconfig.
pub async fn build_client(settings: &Settings) -> Result<Client> {
    let config = match &settings.kubeconfig {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path).map_err(|source| Error::Kubeconfig {
                path: path.clone(),
                source,
            })?;
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .map_err(|source| Error::Kubeconfig {
                    path: path.clone(),
                    source,
                })?
        }
        None => Config::infer().await?,
    };
    Client::try_from(config).map_err(Error::Client)
}

/// The tracked ConfigMap, defaulting the namespace to the client's.
pub fn resource_ref(settings: &Settings, client: &Client) -> ResourceRef {
    let namespace = settings
        .namespace
        .clone()
        .filter(|ns| !ns.is_empty())
        .unwrap_or_else(|| client.default_namespace().to_string());
    ResourceRef::new(namespace, settings.name.clone())
}

pub async fn run_once(settings: &Settings, client: Client) -> Result<()> {
    log::info!("Running configmap-to-disk in one time mode.");
    let resource = resource_ref(settings, &client);
    let api: Api<ConfigMap> = Api::namespaced(client, &resource.namespace);
    OneShotSync::new(resource, settings.key.clone(), settings.path.clone())
        .run(&api)
        .await
}

pub async fn run_watch(settings: &Settings, client: Client) -> Result<()> {
    let reconcile_metrics = ReconcileMetrics::new()?;
    let registry = metrics::registry(&reconcile_metrics)?;

    let resource = resource_ref(settings, &client);
    let api: Api<ConfigMap> = Api::namespaced(client, &resource.namespace);
    let informer = Informer::new(api, resource.clone(), settings.resync_interval);
    let reconciler = Reconciler::new(
        resource,
        settings.key.clone(),
        settings.path.clone(),
        reconcile_metrics,
    );
    let mut controller = Controller::new(reconciler, settings.sync_timeout);

    let shutdown = termination_token()?;
    supervise(&settings.listen, registry, &mut controller, informer, shutdown).await
}

/// Cancelled on SIGINT or SIGTERM.
pub fn termination_token() -> Result<CancellationToken> {
    let token = CancellationToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || handler_token.cancel())?;
    Ok(token)
}

/// Runs the HTTP server, the controller and the signal watcher as one group.
///
/// Whichever returns first cancels the shared stop token; the result is the
/// first error any of them reported.
pub async fn supervise<S>(
    listen: &str,
    registry: Registry,
    controller: &mut Controller,
    source: S,
    shutdown: CancellationToken,
) -> Result<()>
where
    S: WatchSource + 'static,
{
    let stop = CancellationToken::new();
    let mut group = Group::new();

    {
        let stop_rx = stop.clone();
        let stop_tx = stop.clone();
        group.add(
            "http server",
            server::serve(listen, registry, stop_rx),
            move |_| stop_tx.cancel(),
        );
    }

    {
        let stop_rx = stop.clone();
        let stop_tx = stop.clone();
        group.add(
            "controller",
            watch_until_stopped(controller, source, stop_rx),
            move |_| stop_tx.cancel(),
        );
    }

    {
        let stop_rx = stop.clone();
        let stop_tx = stop.clone();
        group.add(
            "signal handler",
            async move {
                tokio::select! {
                    _ = shutdown.cancelled() => log::info!("Received termination signal"),
                    _ = stop_rx.cancelled() => {}
                }
                Ok(())
            },
            move |_| stop_tx.cancel(),
        );
    }

    group.run().await
}

/// Starts the watch source in the background and runs the controller on its feed.
async fn watch_until_stopped<S>(
    controller: &mut Controller,
    source: S,
    stop: CancellationToken,
) -> Result<()>
where
    S: WatchSource + 'static,
{
    let (sink, feed) = watch::channel(EVENT_BUFFER);
    let source_stop = stop.child_token();
    let source_task = tokio::spawn(source.run(sink, source_stop.clone()));

    let result = controller.run(feed, stop).await;

    source_stop.cancel();
    if let Err(e) = source_task.await {
        log::error!("Watch source task failed: {}", e);
    }
    result
}
