use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::Parser;

use configmap_to_disk::config::{
    LogLevel, Settings, DEFAULT_LISTEN, DEFAULT_RESYNC_INTERVAL, DEFAULT_SYNC_TIMEOUT,
};
use configmap_to_disk::{app, logging};

/// Watch ConfigMaps in the API and write them to disk.
#[derive(Parser, Debug)]
#[command(name = "configmap-to-disk", version, about)]
struct Cli {
    /// Path to kubeconfig.
    #[arg(long, env = "KUBECONFIG")]
    kubeconfig: Option<PathBuf>,

    /// The namespace to watch.
    #[arg(long)]
    namespace: Option<String>,

    /// Where to write the file.
    #[arg(long)]
    path: Option<PathBuf>,

    /// The ConfigMap name.
    #[arg(long, default_value = "")]
    name: String,

    /// The ConfigMap key to read.
    #[arg(long, default_value = "")]
    key: String,

    /// The address at which to listen for health and metrics.
    #[arg(long, default_value = DEFAULT_LISTEN)]
    listen: String,

    /// Log level to use. Possible values: all, debug, info, warn, error, none.
    #[arg(long, default_value = "info")]
    log_level: LogLevel,

    /// Syncs the configmap to disk a single time and exits.
    #[arg(long)]
    one_time: bool,

    /// Seconds to wait for the initial listing before giving up.
    #[arg(long, default_value_t = DEFAULT_SYNC_TIMEOUT.as_secs())]
    sync_timeout: u64,

    /// Seconds between re-deliveries of the cached ConfigMap.
    #[arg(long, default_value_t = DEFAULT_RESYNC_INTERVAL.as_secs())]
    resync_interval: u64,
}

impl Cli {
    fn into_settings(self) -> Settings {
        Settings {
            kubeconfig: self.kubeconfig.filter(|p| !p.as_os_str().is_empty()),
            namespace: self.namespace,
            path: self.path.unwrap_or_default(),
            name: self.name,
            key: self.key,
            listen: self.listen,
            log_level: self.log_level,
            one_time: self.one_time,
            sync_timeout: Duration::from_secs(self.sync_timeout),
            resync_interval: Duration::from_secs(self.resync_interval),
        }
    }
}

/// Exit code for a failed parse. Help and version output are not failures.
fn parse_exit_code(err: &clap::Error) -> u8 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let settings = match Cli::try_parse() {
        Ok(cli) => cli.into_settings(),
        Err(e) => {
            let code = parse_exit_code(&e);
            // Help and version go to stdout, everything else to stderr.
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    if let Err(e) = logging::init(settings.log_level) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    match app::run(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
