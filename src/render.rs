//! HTML rendering.
//!
//! Every page the site serves is produced here with [maud](https://maud.lambda.xyz/),
//! so text coming from the content API is escaped on the way out. The renderers
//! are pure: they take already-resolved data plus a [`RenderContext`] and
//! return markup. Fetching happens in [`crate::generate`].
//!
//! ## Pages
//!
//! - **Home**: post cards in received order and a "load more" button that
//!   carries the next cursor in `data-next` (driven by `static/load-more.js`).
//! - **Post**: banner, title, date, author, reading time, optional "edited on"
//!   annotation, the content blocks, neighbor links, and either the comment
//!   widget (published) or the exit-preview link (preview).
//! - **Loading**: placeholder for a post path that is still being generated.
//! - **Error**: status pages for the server.
//!
//! ## Assets
//!
//! The stylesheet, the load-more script and the logo are embedded at compile
//! time. [`ASSETS`] lists them with the path they are served from; `build`
//! writes them to the output directory and `serve` answers them directly.
//! Links carry `?v=<build version>` so a new binary busts browser caches.

use crate::config::{CommentsConfig, SiteConfig, SiteSection};
use crate::dates::{self, Locale};
use crate::detail::{self, PostView};
use crate::listing::PostListing;
use crate::preview::EXIT_PATH;
use crate::richtext::{self, is_safe_url};
use crate::types::{NeighborLink, PostSummary};
use maud::{DOCTYPE, Markup, html};
use serde::Serialize;

const ASSET_VERSION: &str = env!("ASSET_VERSION");

pub const STYLE_PATH: &str = "/style.css";
pub const LOAD_MORE_PATH: &str = "/load-more.js";
pub const LOGO_PATH: &str = "/images/logo.svg";

/// Seconds before the loading placeholder reloads itself.
const LOADING_REFRESH_SECS: u32 = 2;

const UTTERANCES_CLIENT: &str = "https://utteranc.es/client.js";

/// A static file embedded in the binary.
#[derive(Debug, Clone, Copy)]
pub struct Asset {
    /// URL path, also the file path relative to the output directory.
    pub path: &'static str,
    pub content_type: &'static str,
    pub body: &'static str,
}

pub const ASSETS: &[Asset] = &[
    Asset {
        path: STYLE_PATH,
        content_type: "text/css; charset=utf-8",
        body: include_str!("../static/style.css"),
    },
    Asset {
        path: LOAD_MORE_PATH,
        content_type: "text/javascript; charset=utf-8",
        body: include_str!("../static/load-more.js"),
    },
    Asset {
        path: LOGO_PATH,
        content_type: "image/svg+xml",
        body: include_str!("../static/logo.svg"),
    },
];

/// Find the embedded asset served at `path`.
pub fn asset(path: &str) -> Option<&'static Asset> {
    ASSETS.iter().find(|a| a.path == path)
}

/// Site-wide settings every renderer needs.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub site: &'a SiteSection,
    pub comments: &'a CommentsConfig,
    /// Rendering draft content for a preview session.
    pub preview: bool,
}

impl<'a> RenderContext<'a> {
    pub fn new(config: &'a SiteConfig) -> Self {
        Self {
            site: &config.site,
            comments: &config.comments,
            preview: false,
        }
    }

    pub fn previewing(self, preview: bool) -> Self {
        Self { preview, ..self }
    }

    fn locale(&self) -> Locale {
        self.site.locale
    }
}

/// A post card as the load-more endpoint returns it: everything already
/// formatted, so the script only has to place text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryView {
    pub uid: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: String,
}

impl SummaryView {
    pub fn new(summary: &PostSummary, locale: Locale) -> Self {
        Self {
            uid: summary.uid.clone(),
            title: summary.title.clone(),
            subtitle: summary.subtitle.clone(),
            author: summary.author.clone(),
            date: dates::format_date(summary.first_publication_date.as_deref(), locale),
        }
    }
}

fn versioned(path: &str) -> String {
    format!("{path}?v={ASSET_VERSION}")
}

// ============================================================================
// HTML Components
// ============================================================================

/// Renders the base HTML document structure
fn base_document(title: &str, locale: Locale, head_extra: Markup, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang=(locale.tag()) {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                link rel="stylesheet" href=(versioned(STYLE_PATH));
                (head_extra)
            }
            body {
                (content)
            }
        }
    }
}

/// Renders the site header: the logo, linking home
fn site_header(site: &SiteSection) -> Markup {
    html! {
        header.site-header {
            div.container {
                a href="/" {
                    img src=(site.logo) alt="logo";
                }
            }
        }
    }
}

fn post_meta(date: &str, author: &str, reading_minutes: Option<usize>) -> Markup {
    html! {
        div.post-meta {
            time { (date) }
            span.author { (author) }
            @if let Some(minutes) = reading_minutes {
                span.reading-time { (minutes) " min" }
            }
        }
    }
}

fn post_card(summary: &PostSummary, locale: Locale) -> Markup {
    let date = dates::format_date(summary.first_publication_date.as_deref(), locale);
    html! {
        a.post-card href={ "/post/" (summary.uid) } {
            strong { (summary.title) }
            p { (summary.subtitle) }
            (post_meta(&date, &summary.author, None))
        }
    }
}

fn neighbor_link(link: &NeighborLink, class: &str, label: &str) -> Markup {
    html! {
        a class=(class) href={ "/post/" (link.uid) } {
            (link.title)
            span { (label) }
        }
    }
}

/// The utterances comment thread, in its own container.
fn comments_widget(comments: &CommentsConfig) -> Markup {
    html! {
        @if let Some(repo) = &comments.repo {
            section.comments {
                script src=(UTTERANCES_CLIENT)
                    repo=(repo)
                    issue-term=(comments.issue_term)
                    theme=(comments.theme)
                    crossorigin="anonymous"
                    async {}
            }
        }
    }
}

fn exit_preview_link(locale: Locale) -> Markup {
    html! {
        a.exit-preview href=(EXIT_PATH) { (locale.exit_preview_label()) }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

/// Renders the home page from the current state of the listing
pub fn render_home(listing: &PostListing, ctx: RenderContext<'_>) -> Markup {
    let locale = ctx.locale();
    let content = html! {
        (site_header(ctx.site))
        main.container {
            div.post-list data-post-list {
                @for summary in listing.posts() {
                    (post_card(summary, locale))
                }
            }
            p.load-status data-load-status hidden { (locale.load_failed_label()) }
            @if let Some(cursor) = listing.next_page() {
                button.load-more type="button" data-load-more data-next=(cursor) {
                    (locale.load_more_label())
                }
            }
            @if ctx.preview {
                (exit_preview_link(locale))
            }
        }
        script src=(versioned(LOAD_MORE_PATH)) defer {}
    };

    base_document(&ctx.site.title, locale, html! {}, content)
}

/// Renders a post page
pub fn render_post(view: &PostView, ctx: RenderContext<'_>) -> Markup {
    let locale = ctx.locale();
    let post = &view.post;
    let banner = post
        .data
        .banner
        .url
        .as_deref()
        .filter(|url| is_safe_url(url))
        .unwrap_or(&ctx.site.banner_placeholder);
    let banner_alt = post.data.banner.alt.as_deref().unwrap_or(&post.data.title);
    let date = dates::format_date(post.first_publication_date.as_deref(), locale);
    let edited = dates::edited_annotation(
        post.first_publication_date.as_deref(),
        post.last_publication_date.as_deref(),
        locale,
    );
    let title = format!("{} | {}", post.data.title, ctx.site.title);

    let content = html! {
        (site_header(ctx.site))
        img.banner src=(banner) alt=(banner_alt);
        main.container {
            article.post {
                h1 { (post.data.title) }
                (post_meta(&date, &post.data.author, Some(detail::reading_time(post))))
                @if let Some(edited) = edited {
                    p.edited { (edited) }
                }
                @for block in &post.data.content {
                    section.post-block {
                        @if let Some(heading) = &block.heading {
                            strong { (heading) }
                        }
                        div.post-body {
                            (richtext::as_html(&block.body))
                        }
                    }
                }
            }
            nav.neighbors {
                @if let Some(previous) = &view.neighbors.previous {
                    (neighbor_link(previous, "previous", locale.previous_label()))
                }
                @if let Some(next) = &view.neighbors.next {
                    (neighbor_link(next, "next", locale.next_label()))
                }
            }
            @if ctx.preview {
                (exit_preview_link(locale))
            } @else {
                (comments_widget(ctx.comments))
            }
        }
    };

    base_document(&title, locale, html! {}, content)
}

/// Renders the placeholder for a post that is still being generated.
/// The page reloads itself until the real one is in the cache.
pub fn render_loading(ctx: RenderContext<'_>) -> Markup {
    let locale = ctx.locale();
    let refresh = html! {
        meta http-equiv="refresh" content=(LOADING_REFRESH_SECS);
    };
    let content = html! {
        (site_header(ctx.site))
        main.container {
            p.loading { (locale.loading_label()) }
        }
    };
    base_document(&ctx.site.title, locale, refresh, content)
}

/// Renders an error page
pub fn render_error(status: u16, message: &str) -> Markup {
    let title = format!("{status} | SpaceTraveling");
    let content = html! {
        main.container.error-page {
            h1 { (status) }
            p { (message) }
            a href="/" { "SpaceTraveling" }
        }
    };
    base_document(&title, Locale::default(), html! {}, content)
}

// ============================================================================
// Tests
// ============================================================================
