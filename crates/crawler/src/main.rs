//! Crawler entry point: wires `SeedLoader`, `RobotsRegistry`, `ChromeFetcher`,
//! `SnapshotStore`, and `Scheduler` together, and tears everything down
//! cleanly on SIGINT/SIGTERM (§4.10).

mod config;

use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use config::{Cli, CrawlerConfig};
use crawler_core::SeedLoader;
use crawler_fetch::ChromeFetcher;
use crawler_robots::{ReqwestRobotsFetcher, RobotsRegistry};
use crawler_scheduler::{Scheduler, SchedulerConfig};
use crawler_storage::SnapshotStore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match CrawlerConfig::load(cli) {
        Ok(c) => c,
        Err(err) => {
            error!(%err, "fatal: invalid configuration");
            std::process::exit(1);
        }
    };

    if let Err(err) = run(config).await {
        error!(%err, "crawl exited with error");
        std::process::exit(1);
    }
}

async fn run(config: CrawlerConfig) -> anyhow::Result<()> {
    let seeds = SeedLoader::load(&config.seeds)?;
    info!(count = seeds.len(), "loaded seed urls");

    let cancel = CancellationToken::new();
    spawn_shutdown_signal_handler(cancel.clone());

    let (fetcher, handler_task) = ChromeFetcher::launch().await?;
    let fetcher: Arc<dyn crawler_fetch::Fetcher> = Arc::new(fetcher);

    let robots_fetcher = ReqwestRobotsFetcher::new(config.robots_timeout);
    let robots = Arc::new(RobotsRegistry::new(robots_fetcher, config.agent_name.clone()));

    let eviction_task = {
        let robots = robots.clone();
        let cancel = cancel.clone();
        let evict_interval = config.evict_interval;
        tokio::spawn(async move { robots.run_eviction(evict_interval, cancel).await })
    };

    let storage = Arc::new(SnapshotStore::new(config.output_root.clone()));

    let scheduler_config = SchedulerConfig {
        max_depth: config.max_depth,
        concurrent_workers: config.concurrent_workers,
        job_queue_size: config.job_queue_size,
        goto_timeout: config.goto_timeout,
        requeue_threshold: config.requeue_threshold,
        jitter_min: config.jitter_min,
        jitter_max: config.jitter_max,
        same_origin_only: config.same_origin_only,
        agent_name: config.agent_name,
    };

    let scheduler = Scheduler::new(scheduler_config, fetcher, robots, storage, cancel);

    let started = Instant::now();
    scheduler.run(seeds).await;
    info!(elapsed_secs = started.elapsed().as_secs_f64(), "crawl finished");

    eviction_task.abort();
    handler_task.abort();
    Ok(())
}

fn spawn_shutdown_signal_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install SIGTERM handler");
            tokio::select! {
                _ = ctrl_c => {}
                _ = terminate.recv() => {}
            }
        }
        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
        }
        info!("shutdown signal received, cancelling crawl");
        cancel.cancel();
    });
}
