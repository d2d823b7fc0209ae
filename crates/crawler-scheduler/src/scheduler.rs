//! `Scheduler`: the crawler's worker pool, visit-set, depth accounting, job
//! queue, and cancellation loop (§4.10) — the hard part.

use std::sync::Arc;
use std::time::Duration;

use crawler_core::{CrawlJob, ErrorKind, UrlFilter, VisitSet, WaitGroup};
use crawler_fetch::{Fetcher, GoToOptions};
use crawler_robots::{RobotsFetcher, RobotsRegistry};
use crawler_storage::SnapshotStore;
use rand::Rng;
use tokio::sync::{mpsc, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::SchedulerConfig;

pub struct Scheduler<F: RobotsFetcher + 'static> {
    config: SchedulerConfig,
    fetcher: Arc<dyn Fetcher>,
    robots: Arc<RobotsRegistry<F>>,
    storage: Arc<SnapshotStore>,
    url_filter: Arc<UrlFilter>,
    visits: Arc<VisitSet>,
    cancel: CancellationToken,
}

impl<F: RobotsFetcher + 'static> Scheduler<F> {
    pub fn new(
        config: SchedulerConfig,
        fetcher: Arc<dyn Fetcher>,
        robots: Arc<RobotsRegistry<F>>,
        storage: Arc<SnapshotStore>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            fetcher,
            robots,
            storage,
            url_filter: Arc::new(UrlFilter::new()),
            visits: Arc::new(VisitSet::new()),
            cancel,
        }
    }

    /// Runs the crawl to completion: every seed and every link discovered
    /// transitively from them, bounded by `max_depth`. Returns once the
    /// waitgroup has drained to zero or the cancellation token trips
    /// (SIGINT/SIGTERM, wired by the caller).
    pub async fn run(self, seeds: Vec<CrawlJob>) {
        let (job_tx, mut job_rx) = mpsc::channel::<CrawlJob>(self.config.job_queue_size);
        let (err_tx, mut err_rx) = mpsc::channel::<ErrorKind>(self.config.job_queue_size);
        let visit_wg = Arc::new(WaitGroup::new());
        let sem = Arc::new(Semaphore::new(self.config.concurrent_workers));

        visit_wg.add(seeds.len() as i64);
        for seed in seeds {
            if job_tx.send(seed).await.is_err() {
                warn!("failed to enqueue seed: job queue closed immediately");
            }
        }

        // The reaper stands in for the source's "close the channel once the
        // waitgroup drains": tripping the shared cancellation token is the
        // idiomatic Rust analogue, since channel senders are cloned out to
        // every worker and can't be force-closed from here directly.
        let reaper = {
            let visit_wg = visit_wg.clone();
            let cancel = self.cancel.clone();
            tokio::spawn(async move {
                visit_wg.wait().await;
                info!("crawl waitgroup drained, stopping dispatcher");
                cancel.cancel();
            })
        };

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("scheduler cancelled, dispatcher exiting");
                    break;
                }
                maybe_job = job_rx.recv() => {
                    let Some(job) = maybe_job else { break };
                    self.dispatch(job, &job_tx, &err_tx, &visit_wg, &sem).await;
                }
                maybe_err = err_rx.recv() => {
                    if let Some(err) = maybe_err {
                        warn!(%err, "crawler job error");
                    }
                }
            }
        }

        reaper.abort();
        self.fetcher.close().await;
    }

    async fn dispatch(
        &self,
        job: CrawlJob,
        job_tx: &mpsc::Sender<CrawlJob>,
        err_tx: &mpsc::Sender<ErrorKind>,
        visit_wg: &Arc<WaitGroup>,
        sem: &Arc<Semaphore>,
    ) {
        let url_str = job.url.as_str().to_string();

        if !self.visits.mark_visited(&url_str) {
            visit_wg.done();
            return;
        }
        if job.depth > self.config.max_depth {
            debug!(url = %job.url, depth = job.depth, "max depth exceeded, skipping");
            visit_wg.done();
            return;
        }

        if self.url_filter.should_skip(&job.url).await {
            debug!(url = %job.url, "binary/asset url, skipping");
            visit_wg.done();
            return;
        }

        let permit = match sem.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                visit_wg.done();
                return;
            }
        };

        let fetcher = self.fetcher.clone();
        let robots = self.robots.clone();
        let storage = self.storage.clone();
        let visits = self.visits.clone();
        let visit_wg = visit_wg.clone();
        let job_tx = job_tx.clone();
        let err_tx = err_tx.clone();
        let cancel = self.cancel.clone();
        let config = self.config.clone();

        tokio::spawn(async move {
            let _permit = permit;
            run_worker(job, url_str, fetcher, robots, storage, visits, visit_wg, job_tx, err_tx, cancel, config)
                .await;
        });
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_worker<F: RobotsFetcher + 'static>(
    job: CrawlJob,
    url_str: String,
    fetcher: Arc<dyn Fetcher>,
    robots: Arc<RobotsRegistry<F>>,
    storage: Arc<SnapshotStore>,
    visits: Arc<VisitSet>,
    visit_wg: Arc<WaitGroup>,
    job_tx: mpsc::Sender<CrawlJob>,
    err_tx: mpsc::Sender<ErrorKind>,
    cancel: CancellationToken,
    config: SchedulerConfig,
) {
    let policy = match robots.get_policy(&job.url).await {
        Ok(policy) => policy,
        Err(err) => {
            warn!(url = %job.url, %err, "robots policy lookup failed");
            visit_wg.done();
            return;
        }
    };

    if !policy.is_allowed(job.url.path()) {
        debug!(url = %job.url, "robots disallow");
        visit_wg.done();
        return;
    }

    let reservation = policy.reserve();
    if !reservation.ok() {
        visit_wg.done();
        return;
    }
    let delay = reservation.delay();

    if delay > config.requeue_threshold {
        reservation.cancel();
        visits.remove(&url_str);
        visit_wg.add(1);
        let requeue_cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = requeue_cancel.cancelled() => {
                    visit_wg.done();
                }
                _ = tokio::time::sleep(delay) => {
                    if job_tx.send(job).await.is_err() {
                        visit_wg.done();
                    }
                    // else: the redelivered job decrements visit_wg itself
                    // on its own eventual completion.
                }
            }
        });
        // original dequeue's unit of work is now represented by the
        // requeue task above (net delta zero).
        return;
    } else if !delay.is_zero() {
        tokio::select! {
            _ = cancel.cancelled() => { visit_wg.done(); return; }
            _ = tokio::time::sleep(delay) => {}
        }
    }

    let jitter = jitter_duration(config.jitter_min, config.jitter_max);
    if !jitter.is_zero() {
        tokio::select! {
            _ = cancel.cancelled() => { visit_wg.done(); return; }
            _ = tokio::time::sleep(jitter) => {}
        }
    }

    let options = GoToOptions { wait_until_network_idle: true, timeout: config.goto_timeout };
    if let Err(err) = fetcher.go_to(&job.url, &options).await {
        warn!(url = %job.url, %err, "navigation failed");
        fetcher.close_page(&job.url).await;
        visit_wg.done();
        return;
    }

    let snapshot = match fetcher.fetch_mhtml(&job.url).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(url = %job.url, %err, "snapshot failed");
            fetcher.close_page(&job.url).await;
            visit_wg.done();
            return;
        }
    };

    if let Err(err) = storage.write(&job.url, time::OffsetDateTime::now_utc(), &snapshot) {
        warn!(url = %job.url, %err, "failed to persist snapshot");
        fetcher.close_page(&job.url).await;
        visit_wg.done();
        return;
    }

    if let Err(err) = fetcher
        .locate_links(&job, job_tx.clone(), err_tx.clone(), visit_wg.clone(), config.same_origin_only)
        .await
    {
        warn!(url = %job.url, %err, "link extraction failed");
    }

    fetcher.close_page(&job.url).await;
    visit_wg.done();
}

fn jitter_duration(min: Duration, max: Duration) -> Duration {
    if max <= min {
        return min;
    }
    let min_ms = min.as_millis() as u64;
    let max_ms = max.as_millis() as u64;
    let ms = rand::thread_rng().gen_range(min_ms..=max_ms);
    Duration::from_millis(ms)
}
