//! `RobotsRegistry`: per-host cache of `DomainPolicy`, filled lazily (§4.8).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use texting_robots::Robot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::policy::DomainPolicy;

/// Outcome of fetching `scheme://host/robots.txt`, abstracted so the
/// registry doesn't care whether the fetch went over `reqwest` or through
/// the crawler's own headless-browser `Fetcher`.
pub enum RobotsFetchOutcome {
    Status { status: u16, body: Vec<u8> },
    TransportError(String),
}

#[async_trait]
pub trait RobotsFetcher: Send + Sync {
    async fn fetch(&self, robots_url: &Url) -> RobotsFetchOutcome;
}

/// Default `RobotsFetcher` backed by a plain HTTP client.
pub struct ReqwestRobotsFetcher {
    client: reqwest::Client,
}

impl ReqwestRobotsFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .expect("reqwest client with static timeout config is always buildable"),
        }
    }
}

#[async_trait]
impl RobotsFetcher for ReqwestRobotsFetcher {
    async fn fetch(&self, robots_url: &Url) -> RobotsFetchOutcome {
        match self.client.get(robots_url.clone()).send().await {
            Ok(resp) => {
                let status = resp.status().as_u16();
                match resp.bytes().await {
                    Ok(body) => RobotsFetchOutcome::Status { status, body: body.to_vec() },
                    Err(err) => RobotsFetchOutcome::TransportError(err.to_string()),
                }
            }
            Err(err) => RobotsFetchOutcome::TransportError(err.to_string()),
        }
    }
}

pub struct RobotsRegistry<F: RobotsFetcher> {
    policies: RwLock<HashMap<String, Arc<DomainPolicy>>>,
    fetcher: F,
    agent_name: String,
}

impl<F: RobotsFetcher> RobotsRegistry<F> {
    pub fn new(fetcher: F, agent_name: impl Into<String>) -> Self {
        Self {
            policies: RwLock::new(HashMap::new()),
            fetcher,
            agent_name: agent_name.into(),
        }
    }

    /// `GetPolicy` (§4.8). Never fails except when `url` has no host: any
    /// fetch failure resolves to a synthesized disallow-all policy rather
    /// than propagating an error, so the scheduler always gets a usable
    /// policy to reserve against.
    pub async fn get_policy(&self, url: &Url) -> Result<Arc<DomainPolicy>, crawler_core::ErrorKind> {
        let host = url
            .host_str()
            .ok_or_else(|| crawler_core::ErrorKind::InvalidUrl(url.to_string()))?
            .to_string();

        if let Some(policy) = self.lookup(&host) {
            return Ok(policy);
        }

        let robots_url = format!("{}://{}/robots.txt", url.scheme(), host);
        let robots_url = match Url::parse(&robots_url) {
            Ok(u) => u,
            Err(_) => return Ok(self.insert_if_absent(host, Arc::new(DomainPolicy::disallow_all()))),
        };

        let fetched = self.fetch_and_build(&robots_url).await;
        Ok(self.insert_if_absent(host, Arc::new(fetched)))
    }

    fn lookup(&self, host: &str) -> Option<Arc<DomainPolicy>> {
        let table = self.policies.read();
        let policy = table.get(host).cloned();
        if let Some(p) = &policy {
            p.touch();
        }
        policy
    }

    /// Double-checked insert: the fetch happens outside any lock (it's
    /// async), so a second caller may have raced us to populate the same
    /// host while we were fetching. Whoever gets here first wins; the
    /// loser's freshly-built policy is simply dropped.
    fn insert_if_absent(&self, host: String, built: Arc<DomainPolicy>) -> Arc<DomainPolicy> {
        let mut table = self.policies.write();
        let policy = table.entry(host).or_insert(built).clone();
        policy.touch();
        policy
    }

    async fn fetch_and_build(&self, robots_url: &Url) -> DomainPolicy {
        match self.fetcher.fetch(robots_url).await {
            RobotsFetchOutcome::Status { status: 404, .. } => DomainPolicy::allow_all(),
            RobotsFetchOutcome::Status { status: 401, .. } | RobotsFetchOutcome::Status { status: 403, .. } => {
                DomainPolicy::disallow_all()
            }
            RobotsFetchOutcome::Status { status, body } => {
                if !(200..300).contains(&status) {
                    debug!(%robots_url, status, "unexpected robots.txt status, treating as allow-all");
                    return DomainPolicy::allow_all();
                }
                match Robot::new(&self.agent_name, &body) {
                    Ok(robot) => {
                        let delay = robot.delay;
                        DomainPolicy::new(Some(robot), delay)
                    }
                    Err(err) => {
                        warn!(%robots_url, %err, "failed to parse robots.txt, treating as allow-all");
                        DomainPolicy::allow_all()
                    }
                }
            }
            RobotsFetchOutcome::TransportError(err) => {
                warn!(%robots_url, %err, "robots.txt fetch failed, disallowing host");
                DomainPolicy::disallow_all()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.policies.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Background eviction: wakes every `evict_interval`, drops any host
    /// whose `last_touched` predates the interval, terminates on cancellation.
    pub async fn run_eviction(&self, evict_interval: Duration, cancellation: CancellationToken) {
        let mut ticker = tokio::time::interval(evict_interval);
        loop {
            tokio::select! {
                _ = cancellation.cancelled() => {
                    info!("robots registry eviction task stopping");
                    return;
                }
                _ = ticker.tick() => {
                    let mut table = self.policies.write();
                    let before = table.len();
                    table.retain(|_, policy| !policy.is_stale(evict_interval));
                    let evicted = before - table.len();
                    if evicted > 0 {
                        debug!(evicted, remaining = table.len(), "evicted stale robots policies");
                    }
                }
            }
        }
    }
}
