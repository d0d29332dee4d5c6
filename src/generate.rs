//! Page generation: fetch content, render it, and write the static site.
//!
//! The same functions back both commands. `build` renders the home page and
//! the prebuilt post paths into the output directory; `serve` calls
//! [`render_home_page`] and [`render_post_page`] to fill and refresh its
//! page cache.
//!
//! ## Output Structure
//!
//! ```text
//! dist/
//! ├── index.html                 # Home: first page of posts
//! ├── post/
//! │   ├── <uid>/index.html       # One per prebuilt post path
//! │   └── ...
//! ├── style.css
//! ├── load-more.js
//! ├── images/logo.svg
//! └── .build-manifest.json       # Generation time + content hash per route
//! ```
//!
//! Only `static_paths_size` posts are prebuilt. Every other post is generated
//! on its first request by `serve`. Post pages left over from an earlier build
//! whose post is no longer prebuilt are deleted.
//!
//! ## Pipeline
//!
//! All fetching happens first, sequentially, against the content API. The
//! fetched views are then rendered in parallel with rayon, since rendering
//! needs nothing but the data already in hand. Each page's hash is compared
//! with the previous build manifest to report what changed.

use crate::cache::{BuildManifest, PageEntry, hash_html, unix_now};
use crate::config::SiteConfig;
use crate::content::{ContentError, ContentSource, Query};
use crate::detail::{self, PostView};
use crate::listing::PostListing;
use crate::render::{self, ASSETS, RenderContext};
use rayon::prelude::*;
use std::fs;
use std::path::Path;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("content API error: {0}")]
    Content(#[from] ContentError),
}

/// Route of the home page.
pub const HOME_ROUTE: &str = "/";

/// Fields the post list needs.
const SUMMARY_FIELDS: &[&str] = &["title", "subtitle", "author"];

/// Route of a post page.
pub fn post_route(uid: &str) -> String {
    format!("/post/{uid}")
}

/// File a route is written to, relative to the output directory.
pub fn route_file(route: &str) -> String {
    let trimmed = route.trim_matches('/');
    if trimmed.is_empty() {
        "index.html".to_string()
    } else {
        format!("{trimmed}/index.html")
    }
}

/// The first page of the post list, `home_page_size` long.
pub async fn home_listing(
    source: &dyn ContentSource,
    config: &SiteConfig,
    reference: Option<&str>,
) -> Result<PostListing, ContentError> {
    let query = Query::posts()
        .fetch(SUMMARY_FIELDS)
        .page_size(config.content.home_page_size)
        .with_ref(reference);
    Ok(PostListing::new(source.query(&query).await?))
}

/// Uids of the posts generated ahead of time.
pub async fn static_paths(
    source: &dyn ContentSource,
    config: &SiteConfig,
) -> Result<Vec<String>, ContentError> {
    let query = Query::posts()
        .fetch(&["title"])
        .page_size(config.content.static_paths_size);
    let page = source.query(&query).await?;
    Ok(page.results.into_iter().map(|p| p.uid).collect())
}

/// Fetch and render the home page. A `reference` renders it as a preview.
pub async fn render_home_page(
    source: &dyn ContentSource,
    config: &SiteConfig,
    reference: Option<&str>,
) -> Result<String, ContentError> {
    let listing = home_listing(source, config, reference).await?;
    let ctx = RenderContext::new(config).previewing(reference.is_some());
    Ok(render::render_home(&listing, ctx).into_string())
}

/// Fetch and render a post page. `Ok(None)` when no post has this slug.
pub async fn render_post_page(
    source: &dyn ContentSource,
    config: &SiteConfig,
    slug: &str,
    reference: Option<&str>,
) -> Result<Option<String>, ContentError> {
    let Some(view) = detail::resolve(source, slug, reference).await? else {
        return Ok(None);
    };
    let ctx = RenderContext::new(config).previewing(reference.is_some());
    Ok(Some(render::render_post(&view, ctx).into_string()))
}

/// How a page compares with the previous build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    New,
    Changed,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPage {
    pub route: String,
    pub file: String,
    pub status: PageStatus,
}

/// Summary of a `build` run, for CLI output.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub pages: Vec<BuiltPage>,
    /// Asset files written, relative to the output directory.
    pub assets: Vec<String>,
    /// Prebuilt paths whose post could not be found.
    pub skipped: Vec<String>,
    /// Stale page files deleted, relative to the output directory.
    pub removed: Vec<String>,
}

impl BuildReport {
    pub fn count(&self, status: PageStatus) -> usize {
        self.pages.iter().filter(|p| p.status == status).count()
    }
}

/// Generate the static site into `output_dir`.
pub async fn build(
    source: &dyn ContentSource,
    config: &SiteConfig,
    output_dir: &Path,
) -> Result<BuildReport, GenerateError> {
    let listing = home_listing(source, config, None).await?;

    let mut views: Vec<PostView> = Vec::new();
    let mut skipped = Vec::new();
    for uid in static_paths(source, config).await? {
        match detail::resolve(source, &uid, None).await? {
            Some(view) => views.push(view),
            None => {
                tracing::warn!(uid = %uid, "prebuilt path has no post");
                skipped.push(uid);
            }
        }
    }

    let ctx = RenderContext::new(config);
    let mut rendered: Vec<(String, String)> = vec![(
        HOME_ROUTE.to_string(),
        render::render_home(&listing, ctx).into_string(),
    )];
    rendered.par_extend(views.par_iter().map(|view| {
        (
            post_route(&view.post.uid),
            render::render_post(view, ctx).into_string(),
        )
    }));

    fs::create_dir_all(output_dir)?;
    let previous = BuildManifest::load(output_dir);
    let mut manifest = BuildManifest::empty();
    let generated_at = unix_now();
    let mut pages = Vec::with_capacity(rendered.len());

    for (route, html) in rendered {
        let file = route_file(&route);
        write_file(output_dir, &file, &html)?;

        let content_hash = hash_html(&html);
        let status = if !previous.entries.contains_key(&route) {
            PageStatus::New
        } else if previous.is_unchanged(&route, &content_hash) {
            PageStatus::Unchanged
        } else {
            PageStatus::Changed
        };
        manifest.insert(
            route.clone(),
            PageEntry {
                file: file.clone(),
                generated_at,
                content_hash,
            },
        );
        pages.push(BuiltPage {
            route,
            file,
            status,
        });
    }
    manifest.save(output_dir)?;
    let removed = prune_stale_posts(output_dir, &manifest)?;

    let mut assets = Vec::with_capacity(ASSETS.len());
    for asset in ASSETS {
        let file = asset.path.trim_start_matches('/');
        write_file(output_dir, file, asset.body)?;
        assets.push(file.to_string());
    }

    Ok(BuildReport {
        pages,
        assets,
        skipped,
        removed,
    })
}

/// Delete post pages under `output_dir/post` that `manifest` doesn't list.
fn prune_stale_posts(output_dir: &Path, manifest: &BuildManifest) -> std::io::Result<Vec<String>> {
    let post_dir = output_dir.join("post");
    if !post_dir.exists() {
        return Ok(Vec::new());
    }
    let mut removed = Vec::new();
    for entry in WalkDir::new(&post_dir)
        .min_depth(2)
        .max_depth(2)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.file_name() == "index.html")
    {
        let Ok(relative) = entry.path().strip_prefix(output_dir) else {
            continue;
        };
        let relative = relative.to_string_lossy().replace('\\', "/");
        if manifest.entries.values().any(|e| e.file == relative) {
            continue;
        }
        fs::remove_file(entry.path())?;
        if let Some(dir) = entry.path().parent() {
            // Only succeeds when nothing else lives there.
            let _ = fs::remove_dir(dir);
        }
        tracing::debug!(file = %relative, "removed stale page");
        removed.push(relative);
    }
    removed.sort();
    Ok(removed)
}

fn write_file(output_dir: &Path, relative: &str, contents: &str) -> std::io::Result<()> {
    let path = output_dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use tempfile::TempDir;

    fn source() -> FakeSource {
        FakeSource::new(vec![
            post("first", "First", Some("2021-03-01T10:00:00+0000")),
            post("second", "Second", Some("2021-03-08T10:00:00+0000")),
            post("third", "Third", Some("2021-03-15T10:00:00+0000")),
        ])
    }

    #[test]
    fn route_files() {
        assert_eq!(route_file("/"), "index.html");
        assert_eq!(route_file("/post/hello"), "post/hello/index.html");
        assert_eq!(route_file(&post_route("a-b")), "post/a-b/index.html");
    }

    #[tokio::test]
    async fn home_listing_uses_home_page_size() {
        let config = SiteConfig::default();
        let listing = home_listing(&source(), &config, None).await.unwrap();
        assert_eq!(listing.posts().len(), 1);
        assert!(listing.has_more());
    }

    #[tokio::test]
    async fn static_paths_uses_static_paths_size() {
        let config = SiteConfig::default();
        let uids = static_paths(&source(), &config).await.unwrap();
        assert_eq!(uids, ["first", "second"]);
    }

    #[tokio::test]
    async fn render_post_page_unknown_slug() {
        let config = SiteConfig::default();
        let page = render_post_page(&source(), &config, "nope", None)
            .await
            .unwrap();
        assert!(page.is_none());
    }

    #[tokio::test]
    async fn render_post_page_preview_shows_exit_link() {
        let config = SiteConfig::default();
        let src = source().with_draft("draft", vec![post("first", "First draft", None)]);
        let html = render_post_page(&src, &config, "first", Some("draft"))
            .await
            .unwrap()
            .unwrap();
        assert!(html.contains("First draft"));
        assert!(html.contains(crate::preview::EXIT_PATH));
    }

    #[tokio::test]
    async fn build_writes_pages_assets_and_manifest() {
        let tmp = TempDir::new().unwrap();
        let config = SiteConfig::default();
        let report = build(&source(), &config, tmp.path()).await.unwrap();

        assert_eq!(report.pages.len(), 3);
        assert_eq!(report.count(PageStatus::New), 3);
        assert!(report.skipped.is_empty());
        assert!(tmp.path().join("index.html").exists());
        assert!(tmp.path().join("post/first/index.html").exists());
        assert!(tmp.path().join("post/second/index.html").exists());
        assert!(!tmp.path().join("post/third").exists());
        assert!(tmp.path().join("style.css").exists());
        assert!(tmp.path().join("load-more.js").exists());
        assert!(tmp.path().join("images/logo.svg").exists());

        let manifest = BuildManifest::load(tmp.path());
        assert_eq!(manifest.entries.len(), 3);
        assert_eq!(manifest.entries["/post/first"].file, "post/first/index.html");
    }

    #[tokio::test]
    async fn rebuild_reports_unchanged_pages() {
        let tmp = TempDir::new().unwrap();
        let config = SiteConfig::default();
        build(&source(), &config, tmp.path()).await.unwrap();
        let report = build(&source(), &config, tmp.path()).await.unwrap();
        assert_eq!(report.count(PageStatus::Unchanged), 3);
    }

    #[tokio::test]
    async fn rebuild_removes_pages_no_longer_prebuilt() {
        let tmp = TempDir::new().unwrap();
        let config = SiteConfig::default();
        build(&source(), &config, tmp.path()).await.unwrap();

        let src = FakeSource::new(vec![
            post("second", "Second", Some("2021-03-08T10:00:00+0000")),
            post("third", "Third", Some("2021-03-15T10:00:00+0000")),
        ]);
        let report = build(&src, &config, tmp.path()).await.unwrap();
        assert_eq!(report.removed, ["post/first/index.html"]);
        assert!(!tmp.path().join("post/first").exists());
        assert!(tmp.path().join("post/third/index.html").exists());
    }

    #[tokio::test]
    async fn rebuild_reports_changed_pages() {
        let tmp = TempDir::new().unwrap();
        let config = SiteConfig::default();
        build(&source(), &config, tmp.path()).await.unwrap();

        let src = FakeSource::new(vec![
            post("first", "First, revised", Some("2021-03-01T10:00:00+0000")),
            post("second", "Second", Some("2021-03-08T10:00:00+0000")),
            post("third", "Third", Some("2021-03-15T10:00:00+0000")),
        ]);
        let report = build(&src, &config, tmp.path()).await.unwrap();
        let first = report
            .pages
            .iter()
            .find(|p| p.route == "/post/first")
            .unwrap();
        assert_eq!(first.status, PageStatus::Changed);
    }
}
