use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use crawler_core::{CrawlJob, ErrorKind, WaitGroup};
use crawler_fetch::{Fetcher, GoToOptions};
use crawler_robots::{RobotsFetchOutcome, RobotsFetcher, RobotsRegistry};
use crawler_scheduler::{Scheduler, SchedulerConfig};
use crawler_storage::SnapshotStore;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use url::Url;

struct CountingFetcher {
    goto_calls: AtomicUsize,
}

impl CountingFetcher {
    fn new() -> Self {
        Self { goto_calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl Fetcher for CountingFetcher {
    async fn fetch_robots(&self, _url: &Url) -> Result<Vec<u8>, ErrorKind> {
        Ok(Vec::new())
    }

    async fn go_to(&self, _url: &Url, _options: &GoToOptions) -> Result<(), ErrorKind> {
        self.goto_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn locate_links(
        &self,
        _parent: &CrawlJob,
        _job_tx: mpsc::Sender<CrawlJob>,
        _err_tx: mpsc::Sender<ErrorKind>,
        _visit_wg: Arc<WaitGroup>,
        _same_origin_only: bool,
    ) -> Result<(), ErrorKind> {
        Ok(())
    }

    async fn fetch_mhtml(&self, _url: &Url) -> Result<Vec<u8>, ErrorKind> {
        Ok(b"<html></html>".to_vec())
    }

    async fn close_page(&self, _url: &Url) {}

    async fn close(&self) {}
}

struct AllowAllRobots;

#[async_trait]
impl RobotsFetcher for AllowAllRobots {
    async fn fetch(&self, _robots_url: &Url) -> RobotsFetchOutcome {
        RobotsFetchOutcome::Status { status: 404, body: Vec::new() }
    }
}

/// Synthesizes `User-agent: *\nDisallow: /` for every host, the §4.8
/// policy for a 401/403 robots.txt response.
struct DenyAllRobots;

#[async_trait]
impl RobotsFetcher for DenyAllRobots {
    async fn fetch(&self, _robots_url: &Url) -> RobotsFetchOutcome {
        RobotsFetchOutcome::Status { status: 403, body: Vec::new() }
    }
}

/// A fetcher over a fixed link graph (`parent url -> child urls`),
/// recording every URL `go_to` was actually called with so a test can
/// assert which depths were (or weren't) fetched.
struct LinkGraphFetcher {
    graph: HashMap<String, Vec<String>>,
    visited: Mutex<Vec<String>>,
}

impl LinkGraphFetcher {
    fn new(graph: HashMap<String, Vec<String>>) -> Self {
        Self { graph, visited: Mutex::new(Vec::new()) }
    }

    fn visited(&self) -> Vec<String> {
        self.visited.lock().clone()
    }
}

#[async_trait]
impl Fetcher for LinkGraphFetcher {
    async fn fetch_robots(&self, _url: &Url) -> Result<Vec<u8>, ErrorKind> {
        Ok(Vec::new())
    }

    async fn go_to(&self, url: &Url, _options: &GoToOptions) -> Result<(), ErrorKind> {
        self.visited.lock().push(url.as_str().to_string());
        Ok(())
    }

    async fn locate_links(
        &self,
        parent: &CrawlJob,
        job_tx: mpsc::Sender<CrawlJob>,
        _err_tx: mpsc::Sender<ErrorKind>,
        visit_wg: Arc<WaitGroup>,
        _same_origin_only: bool,
    ) -> Result<(), ErrorKind> {
        let children = self.graph.get(parent.url.as_str()).cloned().unwrap_or_default();
        let jobs: Vec<CrawlJob> = children
            .into_iter()
            .filter_map(|href| Url::parse(&href).ok())
            .map(|url| CrawlJob::new(url, parent.depth + 1))
            .collect();

        visit_wg.add(jobs.len() as i64);
        for job in jobs {
            let _ = job_tx.send(job).await;
        }
        Ok(())
    }

    async fn fetch_mhtml(&self, _url: &Url) -> Result<Vec<u8>, ErrorKind> {
        Ok(b"<html></html>".to_vec())
    }

    async fn close_page(&self, _url: &Url) {}

    async fn close(&self) {}
}

#[tokio::test]
async fn crawls_every_seed_exactly_once() {
    let fetcher = Arc::new(CountingFetcher::new());
    let robots = Arc::new(RobotsRegistry::new(AllowAllRobots, "test-agent"));
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(SnapshotStore::new(dir.path()));
    let cancel = CancellationToken::new();

    let mut config = SchedulerConfig::default();
    config.jitter_min = Duration::ZERO;
    config.jitter_max = Duration::ZERO;

    let scheduler = Scheduler::new(config, fetcher.clone(), robots, storage, cancel);

    let seeds = vec![
        CrawlJob::new(Url::parse("https://example.test/a").unwrap(), 0),
        CrawlJob::new(Url::parse("https://example.test/b").unwrap(), 0),
    ];

    tokio::time::timeout(Duration::from_secs(5), scheduler.run(seeds)).await.unwrap();

    assert_eq!(fetcher.goto_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn duplicate_seed_is_visited_once() {
    let fetcher = Arc::new(CountingFetcher::new());
    let robots = Arc::new(RobotsRegistry::new(AllowAllRobots, "test-agent"));
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(SnapshotStore::new(dir.path()));
    let cancel = CancellationToken::new();

    let mut config = SchedulerConfig::default();
    config.jitter_min = Duration::ZERO;
    config.jitter_max = Duration::ZERO;

    let scheduler = Scheduler::new(config, fetcher.clone(), robots, storage, cancel);

    let same = Url::parse("https://example.test/a").unwrap();
    let seeds = vec![CrawlJob::new(same.clone(), 0), CrawlJob::new(same, 0)];

    tokio::time::timeout(Duration::from_secs(5), scheduler.run(seeds)).await.unwrap();

    assert_eq!(fetcher.goto_calls.load(Ordering::SeqCst), 1);
}

/// Literal spec scenario (§8.5): seed `https://example.test/`, `MAX_DEPTH=1`
/// — the crawler fetches the seed and its direct links, but no URL at
/// depth 2+.
#[tokio::test]
async fn depth_limit_stops_fetching_beyond_max_depth() {
    let seed = "https://example.test/".to_string();
    let depth1 = "https://example.test/a".to_string();
    let depth2 = "https://example.test/a/too-deep".to_string();

    let mut graph = HashMap::new();
    graph.insert(seed.clone(), vec![depth1.clone()]);
    graph.insert(depth1.clone(), vec![depth2.clone()]);

    let fetcher = Arc::new(LinkGraphFetcher::new(graph));
    let robots = Arc::new(RobotsRegistry::new(AllowAllRobots, "test-agent"));
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(SnapshotStore::new(dir.path()));
    let cancel = CancellationToken::new();

    let mut config = SchedulerConfig::default();
    config.jitter_min = Duration::ZERO;
    config.jitter_max = Duration::ZERO;
    config.max_depth = 1;

    let scheduler = Scheduler::new(config, fetcher.clone(), robots, storage, cancel);
    let seeds = vec![CrawlJob::new(Url::parse(&seed).unwrap(), 0)];

    tokio::time::timeout(Duration::from_secs(5), scheduler.run(seeds)).await.unwrap();

    let visited = fetcher.visited();
    assert!(visited.contains(&seed));
    assert!(visited.contains(&depth1));
    assert!(!visited.contains(&depth2), "depth-2 url must never reach go_to: {visited:?}");
}

/// Literal spec scenario (§8.6): a host whose robots.txt is
/// `User-agent: *\nDisallow: /` must never have `Fetcher::go_to` called
/// against it.
#[tokio::test]
async fn robots_denial_prevents_any_fetch() {
    let fetcher = Arc::new(CountingFetcher::new());
    let robots = Arc::new(RobotsRegistry::new(DenyAllRobots, "test-agent"));
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(SnapshotStore::new(dir.path()));
    let cancel = CancellationToken::new();

    let mut config = SchedulerConfig::default();
    config.jitter_min = Duration::ZERO;
    config.jitter_max = Duration::ZERO;

    let scheduler = Scheduler::new(config, fetcher.clone(), robots, storage, cancel);
    let seeds = vec![CrawlJob::new(Url::parse("https://example.test/").unwrap(), 0)];

    tokio::time::timeout(Duration::from_secs(5), scheduler.run(seeds)).await.unwrap();

    assert_eq!(fetcher.goto_calls.load(Ordering::SeqCst), 0);
}
