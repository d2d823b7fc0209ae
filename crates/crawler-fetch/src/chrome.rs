//! `ChromeFetcher`: the `Fetcher` capability backed by headless Chrome over
//! CDP, via `chromiumoxide`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::EventResponseReceived;
use chromiumoxide::cdp::browser_protocol::page::{CaptureSnapshotFormat, CaptureSnapshotParams};
use chromiumoxide::page::Page;
use crawler_core::{CrawlJob, ErrorKind, WaitGroup};
use futures::StreamExt;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};
use url::Url;

use crate::fetcher::Fetcher;
use crate::options::GoToOptions;

/// One open tab per visited URL, keyed by the URL's canonical string form,
/// guarded by its own lock so `go_to`, `close_page`, `locate_links`, and
/// `fetch_mhtml` may interleave across distinct URLs safely (§5).
pub struct ChromeFetcher {
    browser: Browser,
    pages: RwLock<HashMap<String, Page>>,
}

impl ChromeFetcher {
    /// Launches a headless Chrome instance and spawns the CDP event-loop
    /// handler that drives it. The returned join handle should be held by
    /// the caller for the lifetime of the crawl; dropping the `ChromeFetcher`
    /// without awaiting `close()` first will leave the handler task running
    /// against a closed connection until it observes the stream end.
    pub async fn launch() -> Result<(Self, tokio::task::JoinHandle<()>), ErrorKind> {
        let config = BrowserConfig::builder()
            .build()
            .map_err(|err| ErrorKind::Navigation(format!("browser config: {err}")))?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|err| ErrorKind::Navigation(format!("browser launch: {err}")))?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    warn!(%err, "chrome CDP handler event error");
                }
            }
        });
        Ok((Self { browser, pages: RwLock::new(HashMap::new()) }, handler_task))
    }

    async fn get_or_create_page(&self, url: &Url) -> Result<Page, ErrorKind> {
        let key = url.as_str().to_string();
        if let Some(page) = self.pages.read().await.get(&key) {
            return Ok(page.clone());
        }
        let mut pages = self.pages.write().await;
        if let Some(page) = pages.get(&key) {
            return Ok(page.clone());
        }
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|err| ErrorKind::Navigation(err.to_string()))?;
        pages.insert(key, page.clone());
        Ok(page)
    }
}

#[async_trait]
impl Fetcher for ChromeFetcher {
    async fn fetch_robots(&self, url: &Url) -> Result<Vec<u8>, ErrorKind> {
        let page = self.get_or_create_page(url).await?;
        page.goto(url.as_str())
            .await
            .map_err(|err| ErrorKind::RobotsFetchFailed(err.to_string()))?;
        let body = page
            .content()
            .await
            .map_err(|err| ErrorKind::RobotsFetchFailed(err.to_string()))?;
        Ok(body.into_bytes())
    }

    async fn go_to(&self, url: &Url, options: &GoToOptions) -> Result<(), ErrorKind> {
        let page = self.get_or_create_page(url).await?;

        let mut responses = page
            .event_listener::<EventResponseReceived>()
            .await
            .map_err(|err| ErrorKind::Navigation(err.to_string()))?;

        let navigation = page.goto(url.as_str());
        let navigation = tokio::time::timeout(options.timeout, navigation)
            .await
            .map_err(|_| ErrorKind::Navigation(format!("timed out navigating to {url}")))?
            .map_err(|err| ErrorKind::Navigation(err.to_string()))?;

        if options.wait_until_network_idle {
            let _ = tokio::time::timeout(options.timeout, navigation.wait_for_navigation()).await;
        }

        if let Some(event) = responses.next().await {
            let status = event.response.status as u16;
            if event.response.url == url.as_str() && !(200..300).contains(&status) {
                return Err(ErrorKind::Navigation(format!("{url} responded with status {status}")));
            }
        }

        Ok(())
    }

    async fn locate_links(
        &self,
        parent: &CrawlJob,
        job_tx: mpsc::Sender<CrawlJob>,
        err_tx: mpsc::Sender<ErrorKind>,
        visit_wg: Arc<WaitGroup>,
        same_origin_only: bool,
    ) -> Result<(), ErrorKind> {
        let page = self.get_or_create_page(&parent.url).await?;
        let anchors = page
            .find_elements("a[href]")
            .await
            .map_err(|err| ErrorKind::Navigation(err.to_string()))?;

        let mut hrefs = Vec::with_capacity(anchors.len());
        for anchor in anchors {
            if let Ok(Some(href)) = anchor.attribute("href").await {
                hrefs.push(href);
            }
        }

        let parent_origin = parent.url.origin();
        let next_depth = parent.depth + 1;
        let jobs: Vec<CrawlJob> = hrefs
            .into_iter()
            .filter_map(|href| CrawlJob::from_link(&parent.url, &href, next_depth))
            .filter(|job| !same_origin_only || job.url.origin() == parent_origin)
            .collect();

        // Critical (§4.9): the waitgroup is incremented for every discovered
        // link BEFORE any of them are sent, so the reaper can never observe
        // a zero count while a send is still pending.
        visit_wg.add(jobs.len() as i64);

        tokio::spawn(async move {
            let mut jobs = jobs.into_iter();
            for job in jobs.by_ref() {
                if job_tx.send(job).await.is_err() {
                    debug!("job queue closed while draining discovered links");
                    let _ = err_tx.send(ErrorKind::Cancelled).await;
                    break;
                }
            }
            // Any jobs still left in the iterator were never sent, so the
            // waitgroup credit taken for them up front (§4.9) must be
            // refunded here or it never drains to zero.
            for _ in jobs {
                visit_wg.done();
            }
        });

        Ok(())
    }

    async fn fetch_mhtml(&self, url: &Url) -> Result<Vec<u8>, ErrorKind> {
        let page = self.get_or_create_page(url).await?;
        let params = CaptureSnapshotParams::builder().format(CaptureSnapshotFormat::Mhtml).build();
        let snapshot = page
            .execute(params)
            .await
            .map_err(|err| ErrorKind::SnapshotFailed(err.to_string()))?;
        Ok(snapshot.result.data.clone().into_bytes())
    }

    async fn close_page(&self, url: &Url) {
        let mut pages = self.pages.write().await;
        if let Some(page) = pages.remove(url.as_str()) {
            if let Err(err) = page.close().await {
                warn!(%url, %err, "failed to close page");
            }
        }
    }

    async fn close(&self) {
        let mut pages = self.pages.write().await;
        for (url, page) in pages.drain() {
            if let Err(err) = page.close().await {
                warn!(%url, %err, "failed to close page during shutdown");
            }
        }
        drop(pages);
        if let Err(err) = self.browser.close().await {
            warn!(%err, "failed to close browser");
        }
    }
}
