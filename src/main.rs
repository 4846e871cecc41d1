use anyhow::Context;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use fieldlink::config::{NodeConfig, CONFIG_ENV};
use fieldlink::kernel::time::MonotonicClock;
use fieldlink::link::{HostLink, LogSession};
use fieldlink::outputs::HeartbeatSource;
use fieldlink::storage::DurableQueue;
use fieldlink::{FieldNode, Shutdown};

/// EX_TEMPFAIL: the supervisor restarts the device.
const RESTART_EXIT_CODE: i32 = 75;

fn config_path() -> Option<PathBuf> {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber).context("installing log subscriber")?;

    let config = NodeConfig::load_or_default(config_path().as_deref()).context("loading config")?;
    config.validate().context("validating config")?;
    tracing::info!("fieldlink {} starting as {}", env!("CARGO_PKG_VERSION"), config.device_id);

    let link = HostLink::new(&config.link);
    let session = LogSession::new(&config.device_id, link.attach_state());
    let queue = DurableQueue::open(&config.storage);
    let source = HeartbeatSource::new(&config.device_id);

    let mut node = FieldNode::new(&config, link, session, MonotonicClock::new(), source, queue);
    node.begin();

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    match node.run(cancel).await {
        Shutdown::Interrupted => {
            tracing::info!("fieldlink stopped");
            Ok(())
        }
        Shutdown::Restart(reason) => {
            tracing::error!("restart requested ({}), handing over to supervisor", reason.as_str());
            std::process::exit(RESTART_EXIT_CODE);
        }
    }
}
