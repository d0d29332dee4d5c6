//! # SpaceTraveling
//!
//! A blog engine for posts kept in a headless CMS. Posts live in a Prismic
//! repository; this crate turns them into plain HTML pages and serves them.
//!
//! # Two Ways to Run
//!
//! ```text
//! build   content API  →  dist/           (home + prebuilt posts, build manifest)
//! serve   dist/ + content API  →  HTTP    (page cache, regeneration, preview)
//! ```
//!
//! `build` writes a static site that any file server can host. `serve` starts
//! from that output and keeps it current: every page is regenerated in the
//! background once it is older than the revalidation window (8 hours by
//! default), and posts that weren't prebuilt are generated on first request.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`content`] | Content API access behind the `ContentSource` trait; Prismic HTTP client |
//! | [`types`] | Post documents and pages as the API returns them, plus reduced views |
//! | [`listing`] | Home post list and ticketed "load more" pagination |
//! | [`detail`] | Post resolution, neighbor links, reading time |
//! | [`richtext`] | Structured rich text to escaped HTML; word counting |
//! | [`dates`] | Fixed-locale date labels |
//! | [`preview`] | Preview session reconciliation and cookie plumbing |
//! | [`render`] | Maud page renderers and embedded assets |
//! | [`generate`] | Fetch + render pipeline; the `build` command |
//! | [`cache`] | Build manifest and the in-memory page cache |
//! | [`routes`] | axum handlers for `serve` |
//! | [`config`] | `config.toml` loading, merging, and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Published Pages Are Cached, Previews Never
//!
//! Published pages are identical for every visitor, so they are rendered
//! once per revalidation window and shared. A preview is one editor looking
//! at one draft ref; it is rendered on every request and marked `no-store`.
//!
//! ## Preview State Lives in Cookies
//!
//! The provider's toolbar owns one cookie (which draft the editor is on), the
//! site owns another (which draft it is rendering). Post pages compare the two
//! on every preview request and redirect to adopt the new draft or to leave
//! preview. No server-side session store is needed.
//!
//! ## Maud for HTML
//!
//! As with every page here, text from the CMS is interpolated through Maud
//! and escaped. Rich text is rendered by walking its structure, never by
//! trusting HTML from the API.

pub mod cache;
pub mod config;
pub mod content;
pub mod dates;
pub mod detail;
pub mod error;
pub mod generate;
pub mod listing;
pub mod output;
pub mod preview;
pub mod render;
pub mod richtext;
pub mod routes;
pub mod state;
pub mod types;

pub use routes::router;
pub use state::AppState;

#[cfg(test)]
pub(crate) mod test_helpers;
