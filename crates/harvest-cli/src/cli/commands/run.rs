//! `harvest run` – partition the window, launch workers, print progress until done.

use anyhow::{bail, Context, Result};
use harvest_core::config::{self, HarvestConfig};
use harvest_core::fetch::CurlFetcher;
use harvest_core::partition::parse_cli_time;
use harvest_core::scheduler::Scheduler;
use harvest_core::store::{ConversionDb, MemoryStore, RecordStore};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::table::{print_rows, print_totals};
use crate::cli::control_socket;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const TABLE_INTERVAL: Duration = Duration::from_secs(1);

pub async fn run_harvest(
    cfg: &HarvestConfig,
    from: &str,
    to: &str,
    workers: Option<usize>,
    dry_run: bool,
) -> Result<()> {
    let from_t = parse_cli_time(from).with_context(|| format!("invalid --from {:?}", from))?;
    let to_t = parse_cli_time(to).with_context(|| format!("invalid --to {:?}", to))?;
    let workers = workers.unwrap_or(cfg.workers);

    let socket_path = config::control_socket_path().ok();
    if let Some(path) = &socket_path {
        if control_socket::harvest_is_live(path).await? {
            bail!("a harvest is already running (control socket {})", path.display());
        }
    }

    let store: Arc<dyn RecordStore> = if dry_run {
        tracing::info!("dry run: records kept in memory");
        Arc::new(MemoryStore::new())
    } else {
        let db = match &cfg.database {
            Some(path) => ConversionDb::open_at(path).await?,
            None => ConversionDb::open_default().await?,
        };
        Arc::new(db)
    };
    let fetcher = Arc::new(CurlFetcher::new().with_connect_timeout(CONNECT_TIMEOUT));
    let sched = Scheduler::from_config(cfg, fetcher, store);

    // Bound before launch so a concurrent `harvest run` sees us and refuses.
    let socket = match &socket_path {
        Some(path) => match control_socket::spawn_control_listener(Arc::clone(&sched), path).await {
            Ok(socket) => {
                tracing::debug!(path = %socket.path().display(), "control socket listening");
                Some(socket)
            }
            Err(e) => {
                tracing::warn!("control socket unavailable: {:#}", e);
                None
            }
        },
        None => None,
    };

    if let Err(e) = sched.partition_and_launch(from_t, to_t, workers) {
        if let Some(socket) = socket {
            socket.close();
        }
        return Err(e.into());
    }

    let started = Instant::now();
    wait_printing(&sched, tokio::signal::ctrl_c).await;

    print_rows(&sched.worker_rows());
    print_totals(&sched.snapshot());
    println!("elapsed {:.1}s", started.elapsed().as_secs_f64());

    let failures = sched.failures().entries();
    if !failures.is_empty() {
        println!("{} failure(s):", failures.len());
        for (at, what) in failures {
            println!("  {}  {}", at, what);
        }
    }

    if let Some(socket) = socket {
        socket.close();
    }
    Ok(())
}

/// Prints the worker table every tick until all workers are idle. Each
/// completion of `interrupt` stops all workers; it is then armed again.
async fn wait_printing<S, F>(sched: &Scheduler, mut interrupt: S)
where
    S: FnMut() -> F,
    F: Future<Output = std::io::Result<()>>,
{
    let mut tick = tokio::time::interval(TABLE_INTERVAL);
    let idle = sched.wait_idle();
    tokio::pin!(idle);
    let signal = interrupt();
    tokio::pin!(signal);
    let mut armed = true;
    loop {
        tokio::select! {
            _ = &mut idle => break,
            _ = tick.tick() => {
                print_rows(&sched.worker_rows());
                println!();
            }
            res = &mut signal, if armed => match res {
                Ok(()) => {
                    println!("Stopping workers after their current page...");
                    sched.stop_all();
                    signal.set(interrupt());
                }
                Err(e) => {
                    tracing::warn!("cannot listen for Ctrl-C: {}", e);
                    armed = false;
                }
            },
        }
    }
}
