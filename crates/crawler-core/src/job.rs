//! `CrawlJob`: one unit of scheduler work.

use url::Url;

/// A URL to visit at a given crawl depth.
///
/// URLs are canonicalized before a `CrawlJob` is constructed: fragment
/// stripped, resolved against the parent page's URL (§3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlJob {
    pub url: Url,
    pub depth: u32,
}

impl CrawlJob {
    pub fn new(url: Url, depth: u32) -> Self {
        Self { url: canonicalize(url), depth }
    }

    /// Builds a job for a link found on `parent`'s page, resolving
    /// `href` against `parent`'s URL.
    pub fn from_link(parent: &Url, href: &str, depth: u32) -> Option<Self> {
        let resolved = parent.join(href).ok()?;
        Some(Self::new(resolved, depth))
    }
}

/// Strips the fragment from a URL; used both when constructing `CrawlJob`s
/// and when computing `VisitSet` membership so `https://x/#a` and
/// `https://x/#b` are treated as the same page.
pub fn canonicalize(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}
