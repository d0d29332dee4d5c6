//! CLI output formatting.
//!
//! Output is **content-first**: each line leads with what the entity is (a
//! page route, a post title) and shows files and identifiers as secondary,
//! indented context.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! Pages
//! 001 Home → index.html (new)
//! 002 /post/hello → post/hello/index.html (changed)
//! 003 /post/world → post/world/index.html (unchanged)
//!
//! Removed
//!     post/old-post/index.html
//!
//! Assets
//!     style.css
//!     load-more.js
//!
//! Generated 3 pages (1 new, 1 changed, 1 unchanged) in dist
//! ```
//!
//! ## Posts
//!
//! ```text
//! 001 Como utilizar Hooks
//!     uid: como-utilizar-hooks
//!     15 mar 2021 · Joseph Oliveira
//!     Pensando em sincronização em vez de ciclos de vida.
//!
//! 12 posts
//! ```
//!
//! ## Check
//!
//! ```text
//! Config
//!     endpoint: https://03-ignite.cdn.prismic.io/api/v2
//!     repository: 03-ignite
//!     revalidate: 28800s
//! Content API
//!     master ref: YEt0ahAAACIAzSHL
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::config::{RepositoryName, SiteConfig};
use crate::dates::{self, Locale};
use crate::generate::{BuildReport, HOME_ROUTE, PageStatus};
use crate::types::PostSummary;
use std::path::Path;

/// Subtitles longer than this are cut in listings.
const SUBTITLE_MAX: usize = 60;

// ============================================================================
// Helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut)
    }
}

fn status_label(status: PageStatus) -> &'static str {
    match status {
        PageStatus::New => "new",
        PageStatus::Changed => "changed",
        PageStatus::Unchanged => "unchanged",
    }
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{} {}", n, one)
    } else {
        format!("{} {}", n, many)
    }
}

// ============================================================================
// Build
// ============================================================================

pub fn format_build_output(report: &BuildReport, output_dir: &Path) -> Vec<String> {
    let mut lines = vec!["Pages".to_string()];
    for (i, page) in report.pages.iter().enumerate() {
        let name = if page.route == HOME_ROUTE {
            "Home"
        } else {
            page.route.as_str()
        };
        lines.push(format!(
            "{} {} \u{2192} {} ({})",
            format_index(i + 1),
            name,
            page.file,
            status_label(page.status)
        ));
    }

    if !report.skipped.is_empty() {
        lines.push(String::new());
        lines.push("Skipped (no post found)".to_string());
        for uid in &report.skipped {
            lines.push(format!("{}{}", indent(1), uid));
        }
    }

    if !report.removed.is_empty() {
        lines.push(String::new());
        lines.push("Removed".to_string());
        for file in &report.removed {
            lines.push(format!("{}{}", indent(1), file));
        }
    }

    if !report.assets.is_empty() {
        lines.push(String::new());
        lines.push("Assets".to_string());
        for asset in &report.assets {
            lines.push(format!("{}{}", indent(1), asset));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Generated {} ({} new, {} changed, {} unchanged) in {}",
        plural(report.pages.len(), "page", "pages"),
        report.count(PageStatus::New),
        report.count(PageStatus::Changed),
        report.count(PageStatus::Unchanged),
        output_dir.display()
    ));
    lines
}

pub fn print_build_output(report: &BuildReport, output_dir: &Path) {
    for line in format_build_output(report, output_dir) {
        println!("{}", line);
    }
}

// ============================================================================
// Posts
// ============================================================================

/// Listing of post summaries, in the order received.
///
/// `more` is true when the listing stopped before the last page.
pub fn format_posts_output(posts: &[PostSummary], locale: Locale, more: bool) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, post) in posts.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), post.title));
        lines.push(format!("{}uid: {}", indent(1), post.uid));
        lines.push(format!(
            "{}{} \u{00b7} {}",
            indent(1),
            dates::format_date(post.first_publication_date.as_deref(), locale),
            post.author
        ));
        if !post.subtitle.is_empty() {
            lines.push(format!(
                "{}{}",
                indent(1),
                truncate(&post.subtitle, SUBTITLE_MAX)
            ));
        }
    }
    if !posts.is_empty() {
        lines.push(String::new());
    }
    let mut total = plural(posts.len(), "post", "posts");
    if more {
        total.push_str(" (more available)");
    }
    lines.push(total);
    lines
}

pub fn print_posts_output(posts: &[PostSummary], locale: Locale, more: bool) {
    for line in format_posts_output(posts, locale, more) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Resolved configuration plus the result of contacting the content API.
pub fn format_check_output(
    config: &SiteConfig,
    repository: &RepositoryName,
    master_ref: &Result<String, String>,
) -> Vec<String> {
    let mut lines = vec![
        "Config".to_string(),
        format!("{}endpoint: {}", indent(1), config.content.endpoint),
        format!("{}repository: {}", indent(1), repository),
        format!("{}locale: {}", indent(1), config.site.locale.tag()),
        format!("{}revalidate: {}s", indent(1), config.revalidate.seconds),
        format!(
            "{}access token: {}",
            indent(1),
            if config.content.access_token.is_some() {
                "set"
            } else {
                "none"
            }
        ),
    ];
    if let Some(repo) = &config.comments.repo {
        lines.push(format!("{}comments: {}", indent(1), repo));
    }
    lines.push("Content API".to_string());
    match master_ref {
        Ok(reference) => lines.push(format!("{}master ref: {}", indent(1), reference)),
        Err(err) => lines.push(format!("{}unreachable: {}", indent(1), err)),
    }
    lines
}

pub fn print_check_output(
    config: &SiteConfig,
    repository: &RepositoryName,
    master_ref: &Result<String, String>,
) {
    for line in format_check_output(config, repository, master_ref) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::BuiltPage;

    fn summary(uid: &str, title: &str, date: Option<&str>) -> PostSummary {
        PostSummary {
            uid: uid.into(),
            first_publication_date: date.map(str::to_string),
            title: title.into(),
            subtitle: String::new(),
            author: "Ana".into(),
        }
    }

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn truncate_short() {
        assert_eq!(truncate("Short text", 40), "Short text");
    }

    #[test]
    fn truncate_long() {
        let text = "a".repeat(50);
        assert_eq!(truncate(&text, 40), format!("{}...", "a".repeat(40)));
    }

    #[test]
    fn truncate_counts_characters_not_bytes() {
        assert_eq!(truncate("ação ação", 4), "ação...");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "page", "pages"), "1 page");
        assert_eq!(plural(0, "page", "pages"), "0 pages");
    }

    // =========================================================================
    // Build
    // =========================================================================

    #[test]
    fn build_output_lists_pages_and_summary() {
        let report = BuildReport {
            pages: vec![
                BuiltPage {
                    route: "/".into(),
                    file: "index.html".into(),
                    status: PageStatus::New,
                },
                BuiltPage {
                    route: "/post/hello".into(),
                    file: "post/hello/index.html".into(),
                    status: PageStatus::Unchanged,
                },
            ],
            assets: vec!["style.css".into()],
            skipped: vec![],
            removed: vec![],
        };
        let lines = format_build_output(&report, Path::new("dist"));
        assert_eq!(lines[0], "Pages");
        assert_eq!(lines[1], "001 Home \u{2192} index.html (new)");
        assert_eq!(
            lines[2],
            "002 /post/hello \u{2192} post/hello/index.html (unchanged)"
        );
        assert!(lines.contains(&"    style.css".to_string()));
        assert_eq!(
            lines.last().unwrap(),
            "Generated 2 pages (1 new, 0 changed, 1 unchanged) in dist"
        );
    }

    #[test]
    fn build_output_lists_skipped_and_removed() {
        let report = BuildReport {
            skipped: vec!["gone".into()],
            removed: vec!["post/old/index.html".into()],
            ..Default::default()
        };
        let lines = format_build_output(&report, Path::new("out"));
        assert!(lines.contains(&"Skipped (no post found)".to_string()));
        assert!(lines.contains(&"    gone".to_string()));
        assert!(lines.contains(&"Removed".to_string()));
        assert!(lines.contains(&"    post/old/index.html".to_string()));
        assert_eq!(
            lines.last().unwrap(),
            "Generated 0 pages (0 new, 0 changed, 0 unchanged) in out"
        );
    }

    // =========================================================================
    // Posts
    // =========================================================================

    #[test]
    fn posts_output_format() {
        let mut first = summary("hooks", "Hooks", Some("2021-03-15T19:25:28+0000"));
        first.subtitle = "Sync, not lifecycles".into();
        let posts = vec![first, summary("draft", "Draft", None)];
        let lines = format_posts_output(&posts, Locale::PtBr, false);
        assert_eq!(lines[0], "001 Hooks");
        assert_eq!(lines[1], "    uid: hooks");
        assert_eq!(lines[2], "    15 mar 2021 \u{00b7} Ana");
        assert_eq!(lines[3], "    Sync, not lifecycles");
        assert_eq!(lines[4], "002 Draft");
        assert_eq!(lines[6], "    pendente \u{00b7} Ana");
        assert_eq!(lines.last().unwrap(), "2 posts");
    }

    #[test]
    fn posts_output_notes_more() {
        let lines = format_posts_output(&[summary("a", "A", None)], Locale::EnUs, true);
        assert_eq!(lines.last().unwrap(), "1 post (more available)");
    }

    #[test]
    fn posts_output_empty() {
        assert_eq!(format_posts_output(&[], Locale::EnUs, false), ["0 posts"]);
    }

    // =========================================================================
    // Check
    // =========================================================================

    #[test]
    fn check_output_reachable() {
        let config = SiteConfig::default();
        let repo = config.repository().unwrap();
        let lines = format_check_output(&config, &repo, &Ok("REF123".into()));
        assert!(lines.contains(&"    repository: 03-ignite".to_string()));
        assert!(lines.contains(&"    revalidate: 28800s".to_string()));
        assert!(lines.contains(&"    access token: none".to_string()));
        assert_eq!(lines.last().unwrap(), "    master ref: REF123");
    }

    #[test]
    fn check_output_unreachable() {
        let config = SiteConfig::default();
        let repo = config.repository().unwrap();
        let lines = format_check_output(&config, &repo, &Err("timed out".into()));
        assert_eq!(lines.last().unwrap(), "    unreachable: timed out");
    }
}
