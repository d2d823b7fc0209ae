//! `Fetcher`: headless-browser abstraction consumed by the scheduler (§4.9).

use std::sync::Arc;

use async_trait::async_trait;
use crawler_core::{CrawlJob, ErrorKind, WaitGroup};
use tokio::sync::mpsc;
use url::Url;

use crate::options::GoToOptions;

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Synchronous-from-the-caller's-perspective robots fetch, used by
    /// `RobotsRegistry` when it is wired to go through the browser rather
    /// than a bare HTTP client.
    async fn fetch_robots(&self, url: &Url) -> Result<Vec<u8>, ErrorKind>;

    /// Navigates the page keyed by `url`'s string form, opening a new tab
    /// on first access. Non-2xx HTTP responses are reported as an error.
    async fn go_to(&self, url: &Url, options: &GoToOptions) -> Result<(), ErrorKind>;

    /// Reads every `<a href>` on the page at `parent.url`, resolves each to
    /// an absolute URL with its fragment stripped, optionally drops
    /// cross-origin links, then sends the resulting jobs to `job_tx`.
    ///
    /// Increments `visit_wg` by the number of discovered links BEFORE
    /// sending begins — a caller observing the waitgroup hit zero must
    /// never be able to race ahead of a send that is still in flight. The
    /// sends themselves run on a spawned task so a full `job_tx` can't
    /// block the caller.
    async fn locate_links(
        &self,
        parent: &CrawlJob,
        job_tx: mpsc::Sender<CrawlJob>,
        err_tx: mpsc::Sender<ErrorKind>,
        visit_wg: Arc<WaitGroup>,
        same_origin_only: bool,
    ) -> Result<(), ErrorKind>;

    /// Captures an MHTML snapshot of the page at `url`.
    async fn fetch_mhtml(&self, url: &Url) -> Result<Vec<u8>, ErrorKind>;

    /// Closes and forgets the page for `url`. A no-op if no page is open.
    async fn close_page(&self, url: &Url);

    /// Closes every open page, then tears down the browser.
    async fn close(&self);
}
