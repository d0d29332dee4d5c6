//! Generated-page cache and incremental regeneration bookkeeping.
//!
//! Every generated page has an age. A page younger than the revalidation
//! window is served as is; an older one is still served, but the caller is
//! told to regenerate it in the background. A path that was never generated
//! is missing, and the caller decides what to show meanwhile (the post route
//! shows a loading page). A path whose generation found no content is
//! remembered as not found for one window, then retried.
//!
//! # Build manifest
//!
//! `build` writes `.build-manifest.json` next to the generated site:
//!
//! ```json
//! {
//!   "version": 1,
//!   "entries": {
//!     "/": { "file": "index.html", "generated_at": 1700000000, "content_hash": "9f86..." },
//!     "/post/hello": { "file": "post/hello/index.html", "generated_at": 1700000000, "content_hash": "..." }
//!   }
//! }
//! ```
//!
//! `serve` seeds its in-memory [`PageCache`] from it, so pages prebuilt by
//! `build` keep their original generation time and age out on schedule.
//! The content hash lets the next build report which pages actually changed.

use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::{Mutex, RwLock};

/// Name of the build manifest file within the output directory.
const MANIFEST_FILENAME: &str = ".build-manifest.json";

/// Version of the manifest format. Bump to ignore manifests from older builds.
const MANIFEST_VERSION: u32 = 1;

/// One generated page on disk.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct PageEntry {
    /// Path relative to the output directory.
    pub file: String,
    /// Unix seconds.
    pub generated_at: u64,
    pub content_hash: String,
}

/// On-disk record of what the last build generated, keyed by route.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BuildManifest {
    pub version: u32,
    pub entries: HashMap<String, PageEntry>,
}

impl BuildManifest {
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: HashMap::new(),
        }
    }

    /// Load from the output directory. Returns an empty manifest if the
    /// file doesn't exist or can't be parsed.
    pub fn load(output_dir: &Path) -> Self {
        let path = output_dir.join(MANIFEST_FILENAME);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => return Self::empty(),
        };
        match serde_json::from_str::<Self>(&content) {
            Ok(m) if m.version == MANIFEST_VERSION => m,
            _ => Self::empty(),
        }
    }

    pub fn save(&self, output_dir: &Path) -> io::Result<()> {
        let path = output_dir.join(MANIFEST_FILENAME);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }

    /// Whether `route` was generated before with exactly this content.
    pub fn is_unchanged(&self, route: &str, content_hash: &str) -> bool {
        self.entries
            .get(route)
            .is_some_and(|e| e.content_hash == content_hash)
    }

    pub fn insert(&mut self, route: String, entry: PageEntry) {
        self.entries.insert(route, entry);
    }
}

/// SHA-256 of rendered HTML, as hex.
pub fn hash_html(html: &str) -> String {
    format!("{:x}", Sha256::digest(html.as_bytes()))
}

/// Current time as unix seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// A page held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedPage {
    pub html: String,
    pub generated_at: u64,
}

#[derive(Debug, Clone)]
enum Entry {
    Page(CachedPage),
    NotFound { checked_at: u64 },
}

/// Result of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Within the revalidation window.
    Fresh(String),
    /// Past the window: serve it, and regenerate.
    Stale(String),
    /// Generation recently found nothing at this path.
    NotFound,
    /// Never generated, or a not-found result has expired.
    Missing,
}

/// Most not-found paths remembered at once.
const NOT_FOUND_LIMIT: usize = 1024;

/// In-memory page store for `serve`.
pub struct PageCache {
    pages: RwLock<HashMap<String, Entry>>,
    regenerating: Mutex<HashSet<String>>,
    revalidate: Duration,
    not_found_limit: usize,
}

impl PageCache {
    pub fn new(revalidate: Duration) -> Self {
        Self {
            pages: RwLock::new(HashMap::new()),
            regenerating: Mutex::new(HashSet::new()),
            revalidate,
            not_found_limit: NOT_FOUND_LIMIT,
        }
    }

    /// Cap the number of remembered not-found paths (at least one).
    pub fn with_not_found_limit(mut self, limit: usize) -> Self {
        self.not_found_limit = limit.max(1);
        self
    }

    pub fn revalidate_after(&self) -> Duration {
        self.revalidate
    }

    /// Look up `route` as of `now` (unix seconds).
    pub async fn lookup(&self, route: &str, now: u64) -> Lookup {
        let window = self.revalidate.as_secs();
        let pages = self.pages.read().await;
        match pages.get(route) {
            Some(Entry::Page(page)) if now.saturating_sub(page.generated_at) < window => {
                Lookup::Fresh(page.html.clone())
            }
            Some(Entry::Page(page)) => Lookup::Stale(page.html.clone()),
            Some(Entry::NotFound { checked_at }) if now.saturating_sub(*checked_at) < window => {
                Lookup::NotFound
            }
            Some(Entry::NotFound { .. }) | None => Lookup::Missing,
        }
    }

    pub async fn store(&self, route: &str, html: String, generated_at: u64) {
        self.pages.write().await.insert(
            route.to_string(),
            Entry::Page(CachedPage { html, generated_at }),
        );
    }

    /// Record that generating `route` found no content. Replaces any page
    /// previously stored there.
    ///
    /// Expired not-found entries are dropped first. When the remaining ones
    /// are at the limit, the oldest is evicted.
    pub async fn mark_not_found(&self, route: &str, checked_at: u64) {
        let window = self.revalidate.as_secs();
        let mut pages = self.pages.write().await;
        pages.retain(|_, entry| match entry {
            Entry::NotFound { checked_at: at } => checked_at.saturating_sub(*at) < window,
            Entry::Page(_) => true,
        });

        let mut misses: Vec<(&String, u64)> = pages
            .iter()
            .filter(|(key, _)| key.as_str() != route)
            .filter_map(|(key, entry)| match entry {
                Entry::NotFound { checked_at } => Some((key, *checked_at)),
                Entry::Page(_) => None,
            })
            .collect();
        if misses.len() >= self.not_found_limit {
            misses.sort_by_key(|(_, at)| *at);
            let evict: Vec<String> = misses[..=misses.len() - self.not_found_limit]
                .iter()
                .map(|(key, _)| (*key).clone())
                .collect();
            for key in evict {
                pages.remove(&key);
            }
        }

        pages.insert(route.to_string(), Entry::NotFound { checked_at });
    }

    pub async fn len(&self) -> usize {
        self.pages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.pages.read().await.is_empty()
    }

    /// Claim the right to regenerate `route`. Returns `false` if another
    /// regeneration of the same route is already running.
    pub async fn begin_regeneration(&self, route: &str) -> bool {
        self.regenerating.lock().await.insert(route.to_string())
    }

    pub async fn finish_regeneration(&self, route: &str) {
        self.regenerating.lock().await.remove(route);
    }

    /// Load every page listed in the build manifest of `output_dir`.
    ///
    /// Entries whose file is gone are skipped. Returns the number of pages
    /// loaded.
    pub async fn seed_from_build(&self, output_dir: &Path) -> io::Result<usize> {
        let manifest = BuildManifest::load(output_dir);
        let mut loaded = 0;
        for (route, entry) in &manifest.entries {
            let path = output_dir.join(&entry.file);
            match std::fs::read_to_string(&path) {
                Ok(html) => {
                    self.store(route, html, entry.generated_at).await;
                    loaded += 1;
                }
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    tracing::debug!(route = %route, "prebuilt page missing on disk");
                }
                Err(err) => return Err(err),
            }
        }
        Ok(loaded)
    }
}
