//! Offline inspection of a node's queue journal.
//!
//! `queue_tool [CONFIG] <size|peek|drain|clear>`. `drain` prints every record
//! to stdout, oldest first, and removes it.

use anyhow::{bail, Context};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use fieldlink::config::{NodeConfig, CONFIG_ENV};
use fieldlink::storage::{DurableQueue, QueueError, StorageTier};

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("installing log subscriber")?;

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.pop() else {
        bail!("usage: queue_tool [CONFIG] <size|peek|drain|clear>");
    };
    let path = args
        .pop()
        .map(PathBuf::from)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

    let config = NodeConfig::load_or_default(path.as_deref()).context("loading config")?;
    let mut queue = DurableQueue::open(&config.storage);
    if queue.tier() == StorageTier::Tertiary {
        eprintln!("warning: no persistent journal found, operating on an empty RAM queue");
    }

    match command.as_str() {
        "size" => println!("{} {}", queue.tier_name(), queue.size()),
        "peek" => match queue.peek_oldest() {
            Ok(record) => println!("{record}"),
            Err(QueueError::Empty) => eprintln!("queue is empty"),
            Err(e) => return Err(e).context("reading oldest record"),
        },
        "drain" => {
            let mut dropped = 0usize;
            loop {
                match queue.dequeue_oldest() {
                    Ok(record) => println!("{record}"),
                    Err(QueueError::Empty) => break,
                    Err(e) if e.consumed_record() => dropped += 1,
                    Err(e) => return Err(e).context("draining queue"),
                }
            }
            if dropped > 0 {
                eprintln!("dropped {dropped} unreadable records");
            }
        }
        "clear" => {
            queue.clear().context("clearing queue")?;
            println!("cleared {}", queue.tier_name());
        }
        other => bail!("unknown command '{other}', expected size, peek, drain or clear"),
    }
    Ok(())
}
