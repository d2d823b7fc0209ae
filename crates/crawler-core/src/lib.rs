//! Shared types for the polite concurrent crawler: errors, jobs, seed
//! loading, URL filtering, and visit tracking.

pub mod error;
pub mod job;
pub mod seed;
pub mod url_filter;
pub mod visit_set;
pub mod waitgroup;

pub use error::{ErrorKind, Result};
pub use job::CrawlJob;
pub use seed::SeedLoader;
pub use url_filter::UrlFilter;
pub use visit_set::VisitSet;
pub use waitgroup::WaitGroup;
