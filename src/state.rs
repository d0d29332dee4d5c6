//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::cache::PageCache;
use crate::config::{ConfigError, RepositoryName, SiteConfig};
use crate::content::ContentSource;

/// Shared application state available to all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<SiteConfig>,

    /// Resolved once at startup; keys the provider's preview cookie.
    pub repository: RepositoryName,

    /// Where posts come from.
    pub source: Arc<dyn ContentSource>,

    /// Generated pages, keyed by route.
    pub pages: Arc<PageCache>,
}

impl AppState {
    /// Create state with an empty page cache.
    pub fn new(config: SiteConfig, source: Arc<dyn ContentSource>) -> Result<Self, ConfigError> {
        let repository = config.repository()?;
        let pages = PageCache::new(config.revalidate.interval());
        Ok(Self {
            config: Arc::new(config),
            repository,
            source,
            pages: Arc::new(pages),
        })
    }
}
